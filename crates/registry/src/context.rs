use std::sync::Arc;

use courier_worker::Scheduler;

use crate::component::ComponentRegistry;
use crate::config::RuntimeSettings;
use crate::keyed::{Extension, KeyedRegistry};
use crate::observable::Observable;
use crate::report::{ErrorReporter, TracingReporter};
use crate::resources::ResourceRegistry;
use crate::runtime::RegistryRuntime;
use crate::services::ServiceLocator;

/// Process-scoped owner of the shared registries.
///
/// Built once at startup and handed to every package that registers or consumes
/// extensions, services, or resources. Registries created through the context share its
/// scheduler, error reporter, and debounce window.
#[derive(Debug)]
pub struct RegistryContext {
	runtime: RegistryRuntime,
	settings: RuntimeSettings,
	services: ServiceLocator,
	sounds: ResourceRegistry,
}

impl RegistryContext {
	pub fn new(settings: RuntimeSettings, scheduler: Arc<dyn Scheduler>, reporter: Arc<dyn ErrorReporter>) -> Self {
		let runtime = RegistryRuntime::new(scheduler, reporter).with_debounce(settings.debounce());
		let services = ServiceLocator::new(&runtime);
		let sounds = ResourceRegistry::new("sounds", &settings, &runtime);
		tracing::debug!(resource_dir = %settings.resource_dir.display(), debounce_ms = settings.debounce_ms, "context.init");
		Self {
			runtime,
			settings,
			services,
			sounds,
		}
	}

	/// Builds a context that logs callback failures through `tracing`.
	pub fn with_tracing(settings: RuntimeSettings, scheduler: Arc<dyn Scheduler>) -> Self {
		Self::new(settings, scheduler, Arc::new(TracingReporter))
	}

	pub fn runtime(&self) -> &RegistryRuntime {
		&self.runtime
	}

	pub fn settings(&self) -> &RuntimeSettings {
		&self.settings
	}

	pub fn services(&self) -> &ServiceLocator {
		&self.services
	}

	/// Sound registry consulted when playing notification sounds.
	pub fn sounds(&self) -> &ResourceRegistry {
		&self.sounds
	}

	/// Creates an extension registry for one UI surface.
	pub fn extension_registry<T: Extension>(&self, label: &'static str) -> KeyedRegistry<T> {
		KeyedRegistry::new(label, &self.runtime)
	}

	pub fn component_registry<T: Extension>(&self, label: &'static str) -> ComponentRegistry<T> {
		ComponentRegistry::new(label, &self.runtime)
	}

	/// Creates another resource registry resolving against the configured resource directory.
	pub fn resource_registry(&self, label: &'static str) -> ResourceRegistry {
		ResourceRegistry::new(label, &self.settings, &self.runtime)
	}

	/// Creates a store-style observable.
	pub fn observable<E: Send + 'static>(&self, label: &'static str) -> Observable<E> {
		self.runtime.observable(label)
	}
}
