//! Service lookup that tolerates any plugin load order.
//!
//! A consumer asks for a service by name with [`ServiceLocator::with_service`] and gets it
//! whenever it becomes available. A producer publishes it with
//! [`ServiceLocator::register_service`]. Delivery always goes through the scheduler, so the
//! callback never runs inside either call.
//!
//! # Invariants
//!
//! - Each callback runs at most once, and only while a provider for its name is registered.
//! - Callbacks waiting on one name run in the order they were queued.
//! - The provider is read when the callback runs, not when it was queued. If the provider is
//!   gone by then, the callback goes back to waiting, ahead of anything queued after it.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use courier_worker::{Scheduler, panic_message};
use parking_lot::Mutex;

use crate::report::{CallbackFailure, ErrorReporter};
use crate::runtime::RegistryRuntime;

/// Type-erased service provider.
pub type Provider = Arc<dyn Any + Send + Sync>;

/// Callback waiting for a provider. Returns the expected type name when the provider does not
/// downcast to it.
type Waiter = Box<dyn FnOnce(&Provider) -> Result<(), &'static str> + Send>;

/// A waiter tagged with the order it was queued in, so requeued batches slot back in place.
struct Queued {
	seq: u64,
	waiter: Waiter,
}

#[derive(Clone)]
struct Binding {
	provider: Provider,
	type_name: &'static str,
}

#[derive(Default)]
struct ServiceState {
	providers: HashMap<String, Binding>,
	waiting: HashMap<String, VecDeque<Queued>>,
	next_seq: u64,
}

impl ServiceState {
	fn queued(&mut self, waiter: Waiter) -> Queued {
		let seq = self.next_seq;
		self.next_seq += 1;
		Queued { seq, waiter }
	}

	/// Puts undelivered waiters back, keeping the queue sorted by enqueue order.
	fn requeue(&mut self, name: &str, batch: VecDeque<Queued>) {
		let queue = self.waiting.entry(name.to_owned()).or_default();
		for queued in batch {
			let at = queue.partition_point(|q| q.seq < queued.seq);
			queue.insert(at, queued);
		}
	}
}

struct ServiceShared {
	scheduler: Arc<dyn Scheduler>,
	reporter: Arc<dyn ErrorReporter>,
	state: Mutex<ServiceState>,
}

impl ServiceShared {
	fn schedule(self: &Arc<Self>, name: String, batch: VecDeque<Queued>) {
		let shared: Weak<Self> = Arc::downgrade(self);
		self.scheduler.defer(Box::new(move || {
			if let Some(shared) = shared.upgrade() {
				shared.deliver(&name, batch);
			}
		}));
	}

	fn deliver(&self, name: &str, mut batch: VecDeque<Queued>) {
		while let Some(queued) = batch.pop_front() {
			let binding = self.state.lock().providers.get(name).cloned();
			let Some(binding) = binding else {
				batch.push_front(queued);
				tracing::trace!(service = name, requeued = batch.len(), "services.provider_gone");
				self.state.lock().requeue(name, batch);
				return;
			};

			match catch_unwind(AssertUnwindSafe(|| (queued.waiter)(&binding.provider))) {
				Ok(Ok(())) => {}
				Ok(Err(expected)) => self.reporter.report(CallbackFailure::ServiceTypeMismatch {
					service: name.to_owned(),
					expected,
					actual: binding.type_name,
				}),
				Err(payload) => self.reporter.report(CallbackFailure::ServicePanicked {
					service: name.to_owned(),
					message: panic_message(payload.as_ref()),
				}),
			}
		}
	}
}

/// Name to provider map with deferred delivery. Clones share state.
#[derive(Clone)]
pub struct ServiceLocator {
	shared: Arc<ServiceShared>,
}

impl std::fmt::Debug for ServiceLocator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.shared.state.lock();
		let mut services: Vec<_> = state.providers.keys().cloned().collect();
		services.sort();
		f.debug_struct("ServiceLocator")
			.field("services", &services)
			.field("waiting", &state.waiting.values().map(VecDeque::len).sum::<usize>())
			.finish()
	}
}

impl ServiceLocator {
	pub fn new(runtime: &RegistryRuntime) -> Self {
		Self {
			shared: Arc::new(ServiceShared {
				scheduler: Arc::clone(runtime.scheduler()),
				reporter: Arc::clone(runtime.reporter()),
				state: Mutex::new(ServiceState::default()),
			}),
		}
	}

	/// Hands the provider of `name` to `callback` on a later turn.
	///
	/// If nothing provides `name` yet, the callback waits until something does, and never runs
	/// if nothing ever does. A provider of a type other than `S` is reported as
	/// [`CallbackFailure::ServiceTypeMismatch`] and the callback is dropped.
	pub fn with_service<S, F>(&self, name: &str, callback: F)
	where
		S: Any + Send + Sync,
		F: FnOnce(Arc<S>) + Send + 'static,
	{
		let waiter: Waiter = Box::new(move |provider: &Provider| match Arc::clone(provider).downcast::<S>() {
			Ok(service) => {
				callback(service);
				Ok(())
			}
			Err(_) => Err(std::any::type_name::<S>()),
		});

		let mut state = self.shared.state.lock();
		let queued = state.queued(waiter);
		if state.providers.contains_key(name) {
			drop(state);
			tracing::trace!(service = name, "services.deliver_later");
			self.shared.schedule(name.to_owned(), VecDeque::from([queued]));
		} else {
			tracing::trace!(service = name, "services.wait");
			state.waiting.entry(name.to_owned()).or_default().push_back(queued);
		}
	}

	/// Publishes `provider` under `name`, replacing any previous one, and schedules delivery to
	/// everything waiting for it. Returns the replaced provider.
	pub fn register_service<S>(&self, name: &str, provider: Arc<S>) -> Option<Provider>
	where
		S: Any + Send + Sync,
	{
		let binding = Binding {
			provider,
			type_name: std::any::type_name::<S>(),
		};
		let (previous, waiting) = {
			let mut state = self.shared.state.lock();
			let previous = state.providers.insert(name.to_owned(), binding);
			(previous, state.waiting.remove(name).unwrap_or_default())
		};

		tracing::debug!(service = name, waiting = waiting.len(), replaced = previous.is_some(), "services.register");
		if !waiting.is_empty() {
			self.shared.schedule(name.to_owned(), waiting);
		}
		previous.map(|b| b.provider)
	}

	/// Withdraws the provider of `name`. Callbacks already waiting keep waiting.
	pub fn unregister_service(&self, name: &str) -> Option<Provider> {
		let removed = self.shared.state.lock().providers.remove(name);
		tracing::debug!(service = name, removed = removed.is_some(), "services.unregister");
		removed.map(|b| b.provider)
	}

	pub fn has_service(&self, name: &str) -> bool {
		self.shared.state.lock().providers.contains_key(name)
	}

	/// Current provider of `name`, if it is an `S`.
	pub fn service<S: Any + Send + Sync>(&self, name: &str) -> Option<Arc<S>> {
		let provider = self.shared.state.lock().providers.get(name).map(|b| Arc::clone(&b.provider))?;
		provider.downcast::<S>().ok()
	}

	/// Number of callbacks waiting for `name`.
	pub fn pending_count(&self, name: &str) -> usize {
		self.shared.state.lock().waiting.get(name).map_or(0, VecDeque::len)
	}
}
