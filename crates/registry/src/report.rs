//! Host error channel for failures inside deferred callbacks.
//!
//! Listener and service callbacks run detached from whoever caused them, so their failures
//! cannot be returned. They are caught per callback and handed to an [`ErrorReporter`] instead.

use std::sync::Arc;

use parking_lot::Mutex;

/// A callback that failed while the registry was delivering to it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackFailure {
	#[error("listener on {observable} panicked: {message}")]
	ListenerPanicked { observable: &'static str, message: String },
	#[error("callback for service {service:?} panicked: {message}")]
	ServicePanicked { service: String, message: String },
	#[error("service {service:?} is a {actual}, callback expected {expected}")]
	ServiceTypeMismatch {
		service: String,
		expected: &'static str,
		actual: &'static str,
	},
	#[error("resource {name:?} could not be opened: {message}")]
	ResourceUnavailable { name: String, message: String },
}

/// Receives callback failures.
pub trait ErrorReporter: Send + Sync + 'static {
	fn report(&self, failure: CallbackFailure);
}

/// Logs every failure at `error` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
	fn report(&self, failure: CallbackFailure) {
		tracing::error!(error = %failure, "registry.callback_failed");
	}
}

/// Keeps failures in memory so the host can inspect or surface them later.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
	failures: Arc<Mutex<Vec<CallbackFailure>>>,
}

impl MemoryReporter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Copies the failures recorded so far.
	pub fn failures(&self) -> Vec<CallbackFailure> {
		self.failures.lock().clone()
	}

	/// Removes and returns the failures recorded so far.
	pub fn take(&self) -> Vec<CallbackFailure> {
		std::mem::take(&mut *self.failures.lock())
	}
}

impl ErrorReporter for MemoryReporter {
	fn report(&self, failure: CallbackFailure) {
		tracing::debug!(error = %failure, "registry.callback_failed");
		self.failures.lock().push(failure);
	}
}
