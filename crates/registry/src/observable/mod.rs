//! Listener lists with immediate and debounced notification.
//!
//! # Dispatch contract
//!
//! [`Observable::trigger`] copies the listener list when it starts and walks the copy in
//! subscription order:
//!
//! - A listener added while a dispatch is running is first called on the next trigger.
//! - A listener disposed while a dispatch is running is skipped if its turn has not come yet.
//!   Once [`Subscription::dispose`] returns, that listener is never called again.
//! - A panicking listener is reported to the [`ErrorReporter`] and the walk continues.
//!
//! [`Observable::trigger_debounced`] restarts a trailing-edge timer on every call and delivers
//! the last event of the burst once the window passes without another call. The listener
//! list is read when the timer fires, not when the burst started.

mod subscriptions;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use courier_worker::{Scheduler, TimerHandle, panic_message};
use parking_lot::Mutex;

pub use self::subscriptions::SubscriptionSet;
use crate::report::{CallbackFailure, ErrorReporter};

/// Debounce window used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1);

static NEXT_OBSERVABLE: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an [`Observable`], shared by its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservableId(u64);

struct Listener<E> {
	id: u64,
	active: AtomicBool,
	callback: Box<dyn Fn(&E) + Send + Sync>,
}

struct Debounced<E> {
	timer: TimerHandle,
	event: E,
}

struct Shared<E> {
	id: ObservableId,
	label: &'static str,
	window: Duration,
	scheduler: Arc<dyn Scheduler>,
	reporter: Arc<dyn ErrorReporter>,
	next_listener: AtomicU64,
	listeners: Mutex<Vec<Arc<Listener<E>>>>,
	pending: Mutex<Option<Debounced<E>>>,
}

impl<E> Shared<E> {
	fn dispatch(&self, event: &E) {
		let snapshot = self.listeners.lock().clone();
		tracing::trace!(observable = self.label, listeners = snapshot.len(), "observable.trigger");

		for listener in snapshot {
			if !listener.active.load(Ordering::Acquire) {
				continue;
			}
			if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (listener.callback)(event))) {
				self.reporter.report(CallbackFailure::ListenerPanicked {
					observable: self.label,
					message: panic_message(payload.as_ref()),
				});
			}
		}
	}
}

impl<E> Drop for Shared<E> {
	fn drop(&mut self) {
		if let Some(pending) = self.pending.get_mut().take() {
			pending.timer.cancel();
		}
	}
}

/// Pub/sub primitive that registries use to announce changes.
///
/// Clones share the listener list.
pub struct Observable<E> {
	shared: Arc<Shared<E>>,
}

impl<E> Clone for Observable<E> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

impl<E> std::fmt::Debug for Observable<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Observable")
			.field("id", &self.shared.id)
			.field("label", &self.shared.label)
			.field("listeners", &self.shared.listeners.lock().len())
			.finish()
	}
}

impl<E: Send + 'static> Observable<E> {
	/// Creates an observable with the default debounce window.
	pub fn new(label: &'static str, scheduler: Arc<dyn Scheduler>, reporter: Arc<dyn ErrorReporter>) -> Self {
		Self::with_window(label, DEFAULT_DEBOUNCE, scheduler, reporter)
	}

	/// Creates an observable whose debounced triggers coalesce within `window`.
	pub fn with_window(
		label: &'static str,
		window: Duration,
		scheduler: Arc<dyn Scheduler>,
		reporter: Arc<dyn ErrorReporter>,
	) -> Self {
		Self {
			shared: Arc::new(Shared {
				id: ObservableId(NEXT_OBSERVABLE.fetch_add(1, Ordering::Relaxed)),
				label,
				window,
				scheduler,
				reporter,
				next_listener: AtomicU64::new(0),
				listeners: Mutex::new(Vec::new()),
				pending: Mutex::new(None),
			}),
		}
	}

	pub fn id(&self) -> ObservableId {
		self.shared.id
	}

	pub fn label(&self) -> &'static str {
		self.shared.label
	}

	pub fn listener_count(&self) -> usize {
		self.shared.listeners.lock().len()
	}

	/// Adds `callback` to the end of the listener list.
	pub fn listen(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
		let listener = Arc::new(Listener {
			id: self.shared.next_listener.fetch_add(1, Ordering::Relaxed),
			active: AtomicBool::new(true),
			callback: Box::new(callback),
		});
		self.shared.listeners.lock().push(Arc::clone(&listener));

		let shared: Weak<Shared<E>> = Arc::downgrade(&self.shared);
		Subscription {
			observable: self.shared.id,
			disposer: Mutex::new(Some(Box::new(move || {
				listener.active.store(false, Ordering::Release);
				if let Some(shared) = shared.upgrade() {
					shared.listeners.lock().retain(|l| l.id != listener.id);
				}
			}))),
		}
	}

	/// Notifies every current listener before returning.
	pub fn trigger(&self, event: E) {
		self.shared.dispatch(&event);
	}

	/// Schedules a coalesced notification carrying `event`.
	///
	/// Replaces the event of a burst still waiting and restarts its window.
	pub fn trigger_debounced(&self, event: E) {
		let shared = Arc::downgrade(&self.shared);
		let mut pending = self.shared.pending.lock();
		if let Some(previous) = pending.take() {
			previous.timer.cancel();
		}
		let timer = self.shared.scheduler.defer_after(
			self.shared.window,
			Box::new(move || {
				let Some(shared) = shared.upgrade() else {
					return;
				};
				let event = shared.pending.lock().take().map(|p| p.event);
				if let Some(event) = event {
					shared.dispatch(&event);
				}
			}),
		);
		*pending = Some(Debounced { timer, event });
	}

	/// Drops a scheduled debounced notification. Returns true if one was waiting.
	pub fn cancel_pending(&self) -> bool {
		match self.shared.pending.lock().take() {
			Some(pending) => {
				pending.timer.cancel();
				true
			}
			None => false,
		}
	}

	/// Returns true while a debounced notification is waiting for its window.
	pub fn has_pending(&self) -> bool {
		self.shared.pending.lock().is_some()
	}
}

/// Handle returned by [`Observable::listen`].
///
/// Disposing, explicitly or by drop, removes the listener. Disposing twice does nothing.
#[must_use = "dropping a Subscription removes its listener"]
pub struct Subscription {
	observable: ObservableId,
	disposer: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("observable", &self.observable)
			.field("disposed", &self.is_disposed())
			.finish()
	}
}

impl Subscription {
	/// Identity of the observable this subscription listens to.
	pub fn observable(&self) -> ObservableId {
		self.observable
	}

	pub fn dispose(&self) {
		let disposer = self.disposer.lock().take();
		if let Some(disposer) = disposer {
			disposer();
		}
	}

	pub fn is_disposed(&self) -> bool {
		self.disposer.lock().is_none()
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.dispose();
	}
}

#[cfg(test)]
mod tests;
