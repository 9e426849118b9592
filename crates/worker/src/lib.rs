//! Deferred execution primitives shared by the registry layer.
//!
//! Registry callbacks never run inside the call that caused them. Everything that has to happen
//! "later" goes through a [`Scheduler`]: plain deferral for service delivery, and cancellable
//! timers for debounced change notifications.
//!
//! Two schedulers ship with the crate:
//!
//! - [`ManualScheduler`] keeps a virtual clock and only runs work when asked to. Tests and
//!   embedders that own their main loop drive it with [`ManualScheduler::run_until_idle`] and
//!   [`ManualScheduler::advance`].
//! - [`EventLoop`] runs tasks one at a time on a tokio driver task, with delayed work parked on
//!   the tokio timer until it is due.

mod event_loop;
mod manual;
mod panic;
mod scheduler;

pub use event_loop::{EventLoop, EventLoopHandle};
pub use manual::ManualScheduler;
pub use panic::panic_message;
pub use scheduler::{Scheduler, Task, TimerHandle};
