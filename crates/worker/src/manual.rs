use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::{Scheduler, Task, TimerHandle};

struct Timer {
	handle: TimerHandle,
	task: Task,
}

#[derive(Default)]
struct ManualState {
	now: Duration,
	seq: u64,
	ready: VecDeque<Task>,
	/// Keyed by (deadline, scheduling sequence) so equal deadlines fire in scheduling order.
	timers: BTreeMap<(Duration, u64), Timer>,
}

/// Scheduler that only runs work when driven, against a virtual clock.
///
/// Nothing happens in the background: deferred tasks wait in a FIFO queue until
/// [`Self::run_until_idle`] and timers wait until [`Self::advance`] moves the clock past their
/// deadline. Clones share the same queue and clock.
#[derive(Clone, Default)]
pub struct ManualScheduler {
	state: Arc<Mutex<ManualState>>,
}

impl std::fmt::Debug for ManualScheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.lock();
		f.debug_struct("ManualScheduler")
			.field("now", &state.now)
			.field("ready", &state.ready.len())
			.field("timers", &state.timers.len())
			.finish()
	}
}

impl ManualScheduler {
	/// Creates a scheduler with an empty queue at virtual time zero.
	pub fn new() -> Self {
		Self::default()
	}

	/// Virtual time elapsed since construction.
	pub fn elapsed(&self) -> Duration {
		self.state.lock().now
	}

	/// Number of queued tasks plus armed timers.
	pub fn pending(&self) -> usize {
		let state = self.state.lock();
		state.ready.len() + state.timers.values().filter(|t| !t.handle.is_cancelled()).count()
	}

	/// Runs queued tasks, including tasks they defer, until the queue is empty.
	///
	/// Does not move the clock. Returns the number of tasks run.
	pub fn run_until_idle(&self) -> usize {
		let mut ran = 0;
		loop {
			let next = self.state.lock().ready.pop_front();
			let Some(task) = next else {
				break;
			};
			task();
			ran += 1;
		}
		ran
	}

	/// Moves the clock forward by `by`, firing due timers in deadline order.
	///
	/// The ready queue is drained before the first timer and after each one, so work a timer
	/// defers runs at that timer's instant. Returns the number of tasks run.
	pub fn advance(&self, by: Duration) -> usize {
		let mut ran = self.run_until_idle();
		let target = self.state.lock().now + by;

		loop {
			let due = {
				let mut state = self.state.lock();
				let is_due = state.timers.first_key_value().is_some_and(|(&(at, _), _)| at <= target);
				let popped = if is_due { state.timers.pop_first() } else { None };
				match popped {
					Some(((at, _), timer)) => {
						state.now = at;
						Some(timer)
					}
					None => {
						state.now = target;
						None
					}
				}
			};
			let Some(timer) = due else {
				break;
			};
			if !timer.handle.is_cancelled() {
				(timer.task)();
				ran += 1;
			}
			ran += self.run_until_idle();
		}
		ran
	}
}

impl Scheduler for ManualScheduler {
	fn defer(&self, task: Task) {
		self.state.lock().ready.push_back(task);
	}

	fn defer_after(&self, delay: Duration, task: Task) -> TimerHandle {
		let handle = TimerHandle::new();
		let mut state = self.state.lock();
		let key = (state.now + delay, state.seq);
		state.seq = state.seq.wrapping_add(1);
		state.timers.insert(
			key,
			Timer {
				handle: handle.clone(),
				task,
			},
		);
		handle
	}
}
