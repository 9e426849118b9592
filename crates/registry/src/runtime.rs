use std::sync::Arc;
use std::time::Duration;

use courier_worker::Scheduler;

use crate::observable::{DEFAULT_DEBOUNCE, Observable};
use crate::report::ErrorReporter;

/// Scheduler, error channel, and debounce window shared by every registry in a process.
#[derive(Clone)]
pub struct RegistryRuntime {
	scheduler: Arc<dyn Scheduler>,
	reporter: Arc<dyn ErrorReporter>,
	debounce: Duration,
}

impl std::fmt::Debug for RegistryRuntime {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RegistryRuntime").field("debounce", &self.debounce).finish_non_exhaustive()
	}
}

impl RegistryRuntime {
	/// Creates a runtime with the default 1ms debounce window.
	pub fn new(scheduler: Arc<dyn Scheduler>, reporter: Arc<dyn ErrorReporter>) -> Self {
		Self {
			scheduler,
			reporter,
			debounce: DEFAULT_DEBOUNCE,
		}
	}

	/// Overrides the debounce window used by observables built from this runtime.
	pub fn with_debounce(mut self, window: Duration) -> Self {
		self.debounce = window;
		self
	}

	pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
		&self.scheduler
	}

	pub fn reporter(&self) -> &Arc<dyn ErrorReporter> {
		&self.reporter
	}

	pub fn debounce(&self) -> Duration {
		self.debounce
	}

	/// Builds an observable wired to this runtime.
	pub fn observable<E: Send + 'static>(&self, label: &'static str) -> Observable<E> {
		Observable::with_window(label, self.debounce, Arc::clone(&self.scheduler), Arc::clone(&self.reporter))
	}
}
