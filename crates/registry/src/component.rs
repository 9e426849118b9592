//! Components placed into UI roles and locations.
//!
//! A component is registered once under its name together with a [`ComponentDescriptor`]
//! saying where it may appear. Surfaces look components up with a [`ComponentQuery`].

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{RegistryError, validate_name};
use crate::keyed::Extension;
use crate::observable::{Observable, Subscription};
use crate::runtime::RegistryRuntime;

/// Where a component may be shown.
///
/// An empty `modes` list means every mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentDescriptor {
	pub roles: Vec<String>,
	pub locations: Vec<String>,
	pub modes: Vec<String>,
}

impl ComponentDescriptor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn role(mut self, role: impl Into<String>) -> Self {
		self.roles.push(role.into());
		self
	}

	pub fn location(mut self, location: impl Into<String>) -> Self {
		self.locations.push(location.into());
		self
	}

	pub fn mode(mut self, mode: impl Into<String>) -> Self {
		self.modes.push(mode.into());
		self
	}
}

/// Lookup for [`ComponentRegistry::find_matching`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentQuery {
	pub roles: Vec<String>,
	pub locations: Vec<String>,
	pub mode: Option<String>,
}

impl ComponentQuery {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn role(mut self, role: impl Into<String>) -> Self {
		self.roles.push(role.into());
		self
	}

	pub fn location(mut self, location: impl Into<String>) -> Self {
		self.locations.push(location.into());
		self
	}

	pub fn mode(mut self, mode: impl Into<String>) -> Self {
		self.mode = Some(mode.into());
		self
	}

	fn matches(&self, descriptor: &ComponentDescriptor) -> bool {
		let placed = self.roles.iter().any(|r| descriptor.roles.contains(r))
			|| self.locations.iter().any(|l| descriptor.locations.contains(l));
		let mode_ok = match &self.mode {
			None => true,
			Some(mode) => descriptor.modes.is_empty() || descriptor.modes.contains(mode),
		};
		placed && mode_ok
	}
}

struct Registered<T> {
	component: Arc<T>,
	descriptor: ComponentDescriptor,
}

/// Name-unique component table kept in registration order.
pub struct ComponentRegistry<T: Extension> {
	label: &'static str,
	entries: RwLock<IndexMap<String, Registered<T>>>,
	changes: Observable<()>,
}

impl<T: Extension> std::fmt::Debug for ComponentRegistry<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ComponentRegistry")
			.field("label", &self.label)
			.field("len", &self.entries.read().len())
			.finish()
	}
}

impl<T: Extension> ComponentRegistry<T> {
	pub fn new(label: &'static str, runtime: &RegistryRuntime) -> Self {
		Self {
			label,
			entries: RwLock::new(IndexMap::new()),
			changes: runtime.observable(label),
		}
	}

	/// Registers `component`, or updates the descriptor of an already registered one.
	///
	/// A different component under the same name is a [`RegistryError::DuplicateName`].
	pub fn register(&self, component: Arc<T>, descriptor: ComponentDescriptor) -> Result<&Self, RegistryError> {
		let name = validate_name(self.label, component.name())?.to_owned();
		{
			let mut entries = self.entries.write();
			if let Some(existing) = entries.get_mut(&name) {
				if !Arc::ptr_eq(&existing.component, &component) {
					tracing::warn!(registry = self.label, name = %name, "registry.duplicate_name");
					return Err(RegistryError::DuplicateName {
						registry: self.label,
						name,
					});
				}
				existing.descriptor = descriptor;
			} else {
				entries.insert(name.clone(), Registered { component, descriptor });
			}
		}
		tracing::debug!(registry = self.label, name = %name, "registry.register");
		self.changes.trigger_debounced(());
		Ok(self)
	}

	/// Removes `component` if it is the registered instance for its name.
	pub fn unregister(&self, component: &Arc<T>) -> Result<&Self, RegistryError> {
		let name = validate_name(self.label, component.name())?;
		let removed = {
			let mut entries = self.entries.write();
			let before = entries.len();
			entries.retain(|_, r| !Arc::ptr_eq(&r.component, component));
			before - entries.len()
		};
		tracing::debug!(registry = self.label, name, removed, "registry.unregister");
		self.changes.trigger_debounced(());
		Ok(self)
	}

	pub fn find_by_name(&self, name: &str) -> Option<Arc<T>> {
		self.entries.read().get(name).map(|r| Arc::clone(&r.component))
	}

	pub fn descriptor(&self, name: &str) -> Option<ComponentDescriptor> {
		self.entries.read().get(name).map(|r| r.descriptor.clone())
	}

	/// Components placed in any queried role or location and allowed in the queried mode,
	/// in registration order.
	pub fn find_matching(&self, query: &ComponentQuery) -> Result<Vec<Arc<T>>, RegistryError> {
		if query.roles.is_empty() && query.locations.is_empty() {
			return Err(RegistryError::EmptyQuery { registry: self.label });
		}
		Ok(self
			.entries
			.read()
			.values()
			.filter(|r| query.matches(&r.descriptor))
			.map(|r| Arc::clone(&r.component))
			.collect())
	}

	pub fn components(&self) -> Vec<Arc<T>> {
		self.entries.read().values().map(|r| Arc::clone(&r.component)).collect()
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Empties the registry without notifying listeners.
	pub fn clear(&self) {
		self.entries.write().clear();
	}

	pub fn listen(&self, callback: impl Fn(&()) + Send + Sync + 'static) -> Subscription {
		self.changes.listen(callback)
	}
}
