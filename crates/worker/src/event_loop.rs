use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{Scheduler, Task, TimerHandle, panic_message};

/// Tokio-backed scheduler that runs every task on a single driver.
///
/// Deferred tasks go through an unbounded FIFO channel and run one after another on the
/// driver task, so callbacks never overlap. Delayed tasks sleep on the tokio timer and then
/// join the same queue.
#[derive(Debug, Clone)]
pub struct EventLoop {
	tx: mpsc::UnboundedSender<Task>,
	shutdown: CancellationToken,
	runtime: Handle,
}

/// Owner side of an [`EventLoop`], used to stop the driver.
#[derive(Debug)]
pub struct EventLoopHandle {
	shutdown: CancellationToken,
	driver: JoinHandle<()>,
}

impl EventLoop {
	/// Starts the loop on the current tokio runtime.
	///
	/// # Panics
	///
	/// Panics when called outside a tokio runtime, like [`tokio::spawn`].
	pub fn start() -> (Self, EventLoopHandle) {
		Self::start_on(Handle::current())
	}

	/// Starts the loop on `runtime`. Timers armed later from any thread also run there.
	pub fn start_on(runtime: Handle) -> (Self, EventLoopHandle) {
		let (tx, rx) = mpsc::unbounded_channel();
		let shutdown = CancellationToken::new();
		tracing::trace!(task = "event_loop.driver", "worker.spawn");
		let driver = runtime.spawn(drive(rx, shutdown.clone()));
		(
			Self {
				tx,
				shutdown: shutdown.clone(),
				runtime,
			},
			EventLoopHandle { shutdown, driver },
		)
	}

	/// Returns true once the driver has stopped accepting work.
	pub fn is_closed(&self) -> bool {
		self.shutdown.is_cancelled() || self.tx.is_closed()
	}

	fn enqueue(&self, task: Task) {
		if self.tx.send(task).is_err() {
			tracing::trace!("event_loop.dropped_task");
		}
	}
}

impl EventLoopHandle {
	/// Stops the driver and waits for the task it is running to finish.
	///
	/// Tasks still queued are dropped without running.
	pub async fn shutdown(self) {
		self.shutdown.cancel();
		if let Err(err) = self.driver.await {
			tracing::warn!(error = %err, "event_loop.join_failed");
		}
	}
}

async fn drive(mut rx: mpsc::UnboundedReceiver<Task>, shutdown: CancellationToken) {
	loop {
		let next = tokio::select! {
			biased;
			_ = shutdown.cancelled() => break,
			task = rx.recv() => task,
		};
		let Some(task) = next else {
			break;
		};
		if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
			tracing::error!(panic = %panic_message(payload.as_ref()), "event_loop.task_panicked");
		}
	}
	tracing::debug!("event_loop.stopped");
}

impl Scheduler for EventLoop {
	fn defer(&self, task: Task) {
		self.enqueue(task);
	}

	fn defer_after(&self, delay: Duration, task: Task) -> TimerHandle {
		let handle = TimerHandle::new();
		let timer = handle.clone();
		let shutdown = self.shutdown.clone();
		let this = self.clone();

		self.runtime.spawn(async move {
			tokio::select! {
				_ = timer.cancelled() => {}
				_ = shutdown.cancelled() => {}
				_ = tokio::time::sleep(delay) => {
					// Cancellation stays effective until the task is actually picked up.
					this.enqueue(Box::new(move || {
						if !timer.is_cancelled() {
							task();
						}
					}));
				}
			}
		});
		handle
	}
}
