use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Source of deferred execution.
///
/// Implementations run tasks one at a time and never inside the call that queued them. Tasks
/// deferred from one thread run in the order they were deferred.
pub trait Scheduler: Send + Sync + 'static {
	/// Queues `task` for a later turn.
	fn defer(&self, task: Task);

	/// Queues `task` to run once `delay` has elapsed, unless the returned handle is cancelled
	/// before it starts.
	fn defer_after(&self, delay: Duration, task: Task) -> TimerHandle;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
	fn defer(&self, task: Task) {
		(**self).defer(task);
	}

	fn defer_after(&self, delay: Duration, task: Task) -> TimerHandle {
		(**self).defer_after(delay, task)
	}
}

/// Cancellation handle for a delayed task.
///
/// Dropping the handle leaves the timer armed.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
	cancel: CancellationToken,
}

impl TimerHandle {
	/// Creates an armed handle.
	pub fn new() -> Self {
		Self::default()
	}

	/// Prevents the task from running if it has not started yet.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Returns true once [`Self::cancel`] has been called.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Future resolving when the handle is cancelled.
	pub(crate) async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clones_share_cancellation() {
		let handle = TimerHandle::new();
		let other = handle.clone();
		assert!(!other.is_cancelled());
		handle.cancel();
		assert!(other.is_cancelled());
	}
}
