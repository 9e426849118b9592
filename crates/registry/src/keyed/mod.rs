//! Named, prioritized extension lists.
//!
//! # Ordering
//!
//! Entries iterate in ascending [`RegisterOptions::priority`] (lower first). Entries with equal
//! priority keep the order they were registered in: a new entry goes after every existing entry
//! whose priority is less than or equal to its own.
//!
//! # Concurrency
//!
//! - Reads load an immutable [`Snapshot`] and never block.
//! - Writes build a new snapshot and publish it with a compare-and-swap retry loop, so the
//!   uniqueness check and the insert happen against the same state.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::{RegistryError, validate_name};
use crate::observable::{Observable, Subscription};
use crate::runtime::RegistryRuntime;

/// A payload that can be stored in a [`KeyedRegistry`] or
/// [`ComponentRegistry`](crate::ComponentRegistry).
pub trait Extension: Send + Sync + 'static {
	/// Name that identifies the payload within one registry.
	fn name(&self) -> &str;
}

/// Per-registration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterOptions {
	pub priority: i32,
}

impl RegisterOptions {
	pub const fn priority(priority: i32) -> Self {
		Self { priority }
	}
}

struct Record<T> {
	name: Arc<str>,
	priority: i32,
	payload: Arc<T>,
}

impl<T> Clone for Record<T> {
	fn clone(&self) -> Self {
		Self {
			name: Arc::clone(&self.name),
			priority: self.priority,
			payload: Arc::clone(&self.payload),
		}
	}
}

/// Immutable view of a registry at one point in time.
pub struct Snapshot<T> {
	records: Vec<Record<T>>,
}

impl<T> Snapshot<T> {
	fn empty() -> Self {
		Self { records: Vec::new() }
	}

	fn position(&self, name: &str) -> Option<usize> {
		self.records.iter().position(|r| &*r.name == name)
	}

	/// Payloads in iteration order.
	pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
		self.records.iter().map(|r| &r.payload)
	}

	/// Looks up a payload by name.
	pub fn get(&self, name: &str) -> Option<&Arc<T>> {
		self.position(name).map(|idx| &self.records[idx].payload)
	}

	/// Priority an entry was registered with.
	pub fn priority_of(&self, name: &str) -> Option<i32> {
		self.position(name).map(|idx| self.records[idx].priority)
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

/// Ordered collection of uniquely named extensions for one UI surface.
pub struct KeyedRegistry<T: Extension> {
	label: &'static str,
	snap: ArcSwap<Snapshot<T>>,
	changes: Observable<()>,
}

impl<T: Extension> std::fmt::Debug for KeyedRegistry<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("KeyedRegistry")
			.field("label", &self.label)
			.field("len", &self.len())
			.finish()
	}
}

impl<T: Extension> KeyedRegistry<T> {
	/// Creates an empty registry that announces changes through `runtime`.
	pub fn new(label: &'static str, runtime: &RegistryRuntime) -> Self {
		Self {
			label,
			snap: ArcSwap::from_pointee(Snapshot::empty()),
			changes: runtime.observable(label),
		}
	}

	pub fn label(&self) -> &'static str {
		self.label
	}

	/// Adds `extension` in priority order.
	///
	/// Fails without mutating when the name is empty or already registered, whatever the
	/// priority. Schedules a debounced change notification on success.
	pub fn register(&self, extension: Arc<T>, options: RegisterOptions) -> Result<&Self, RegistryError> {
		let name: Arc<str> = Arc::from(validate_name(self.label, extension.name())?);

		loop {
			let old = self.snap.load_full();
			if old.position(&name).is_some() {
				tracing::warn!(registry = self.label, name = %name, "registry.duplicate_name");
				return Err(RegistryError::DuplicateName {
					registry: self.label,
					name: name.to_string(),
				});
			}

			let mut records = old.records.clone();
			let at = records.partition_point(|r| r.priority <= options.priority);
			records.insert(
				at,
				Record {
					name: Arc::clone(&name),
					priority: options.priority,
					payload: Arc::clone(&extension),
				},
			);

			let prev = self.snap.compare_and_swap(&old, Arc::new(Snapshot { records }));
			if Arc::ptr_eq(&prev, &old) {
				break;
			}
		}

		tracing::debug!(registry = self.label, name = %name, priority = options.priority, "registry.register");
		self.changes.trigger_debounced(());
		Ok(self)
	}

	/// Removes every record holding this exact payload.
	///
	/// Matching is by identity, not by name. Removing something that is not registered is not
	/// an error. A debounced change notification is scheduled either way.
	pub fn unregister(&self, extension: &Arc<T>) -> Result<&Self, RegistryError> {
		validate_name(self.label, extension.name())?;

		let removed = loop {
			let old = self.snap.load_full();
			let records: Vec<_> = old.records.iter().filter(|r| !Arc::ptr_eq(&r.payload, extension)).cloned().collect();
			let removed = old.records.len() - records.len();
			if removed == 0 {
				break 0;
			}
			let prev = self.snap.compare_and_swap(&old, Arc::new(Snapshot { records }));
			if Arc::ptr_eq(&prev, &old) {
				break removed;
			}
		};

		tracing::debug!(registry = self.label, name = extension.name(), removed, "registry.unregister");
		self.changes.trigger_debounced(());
		Ok(self)
	}

	/// Payloads in iteration order, detached from later mutation.
	pub fn extensions(&self) -> Vec<Arc<T>> {
		self.snap.load().iter().cloned().collect()
	}

	/// Current immutable snapshot.
	pub fn snapshot(&self) -> Arc<Snapshot<T>> {
		self.snap.load_full()
	}

	pub fn get(&self, name: &str) -> Option<Arc<T>> {
		self.snap.load().get(name).cloned()
	}

	pub fn len(&self) -> usize {
		self.snap.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Empties the registry without notifying listeners.
	pub fn clear(&self) {
		self.snap.store(Arc::new(Snapshot::empty()));
	}

	/// Subscribes to change notifications.
	pub fn listen(&self, callback: impl Fn(&()) + Send + Sync + 'static) -> Subscription {
		self.changes.listen(callback)
	}

	pub fn changes(&self) -> &Observable<()> {
		&self.changes
	}
}
