use std::sync::Arc;
use std::time::Duration;

use courier_worker::ManualScheduler;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use super::*;
use crate::report::MemoryReporter;

type Log = Arc<Mutex<Vec<String>>>;

fn fixture() -> (ManualScheduler, MemoryReporter, Observable<u32>) {
	let sched = ManualScheduler::new();
	let reporter = MemoryReporter::new();
	let obs = Observable::new("test", Arc::new(sched.clone()), Arc::new(reporter.clone()));
	(sched, reporter, obs)
}

fn record(log: &Log, tag: &'static str) -> impl Fn(&u32) + Send + Sync + 'static {
	let log = Arc::clone(log);
	move |n: &u32| log.lock().push(format!("{tag}:{n}"))
}

#[test]
fn trigger_notifies_in_subscription_order() {
	let (_sched, _reporter, obs) = fixture();
	let log = Log::default();
	let _l1 = obs.listen(record(&log, "l1"));
	let _l2 = obs.listen(record(&log, "l2"));

	obs.trigger(7);
	assert_eq!(*log.lock(), ["l1:7", "l2:7"]);
}

#[test]
fn dispose_is_idempotent() {
	let (_sched, _reporter, obs) = fixture();
	let log = Log::default();
	let sub = obs.listen(record(&log, "l1"));
	sub.dispose();
	sub.dispose();
	assert!(sub.is_disposed());
	assert_eq!(obs.listener_count(), 0);

	obs.trigger(1);
	assert!(log.lock().is_empty());
}

#[test]
fn dropping_subscription_unsubscribes() {
	let (_sched, _reporter, obs) = fixture();
	let log = Log::default();
	drop(obs.listen(record(&log, "gone")));
	obs.trigger(1);
	assert!(log.lock().is_empty());
}

#[test]
fn listener_disposed_mid_dispatch_is_skipped() {
	let (_sched, _reporter, obs) = fixture();
	let log = Log::default();
	let victim: Arc<Mutex<Option<Subscription>>> = Arc::default();

	let slot = Arc::clone(&victim);
	let first_log = Arc::clone(&log);
	let _l1 = obs.listen(move |n| {
		first_log.lock().push(format!("l1:{n}"));
		if let Some(sub) = slot.lock().as_ref() {
			sub.dispose();
		}
	});
	*victim.lock() = Some(obs.listen(record(&log, "l2")));
	let _l3 = obs.listen(record(&log, "l3"));

	obs.trigger(1);
	assert_eq!(*log.lock(), ["l1:1", "l3:1"]);
}

#[test]
fn listener_added_mid_dispatch_waits_for_next_trigger() {
	let (_sched, _reporter, obs) = fixture();
	let log = Log::default();
	let added: Arc<Mutex<Vec<Subscription>>> = Arc::default();

	let (handle, slot, inner_log) = (obs.clone(), Arc::clone(&added), Arc::clone(&log));
	let _l1 = obs.listen(move |_| {
		if slot.lock().is_empty() {
			let sub = handle.listen(record(&inner_log, "late"));
			slot.lock().push(sub);
		}
	});

	obs.trigger(1);
	assert!(log.lock().is_empty());
	obs.trigger(2);
	assert_eq!(*log.lock(), ["late:2"]);
}

#[test]
fn panicking_listener_is_reported_and_isolated() {
	let (_sched, reporter, obs) = fixture();
	let log = Log::default();
	let _bad = obs.listen(|_| panic!("listener exploded"));
	let _good = obs.listen(record(&log, "good"));

	obs.trigger(3);

	assert_eq!(*log.lock(), ["good:3"]);
	assert_eq!(
		reporter.take(),
		[CallbackFailure::ListenerPanicked {
			observable: "test",
			message: "listener exploded".to_string(),
		}]
	);
}

#[test]
fn debounced_burst_delivers_last_event_once() {
	let (sched, _reporter, obs) = fixture();
	let log = Log::default();
	let _l = obs.listen(record(&log, "l"));

	obs.trigger_debounced(1);
	obs.trigger_debounced(2);
	obs.trigger_debounced(3);
	assert!(log.lock().is_empty(), "debounced trigger must not deliver inline");
	assert!(obs.has_pending());

	sched.advance(Duration::from_millis(5));
	assert_eq!(*log.lock(), ["l:3"]);
	assert!(!obs.has_pending());
}

#[test]
fn debounce_window_restarts_on_each_call() {
	let sched = ManualScheduler::new();
	let obs: Observable<u32> = Observable::with_window(
		"windowed",
		Duration::from_millis(10),
		Arc::new(sched.clone()),
		Arc::new(MemoryReporter::new()),
	);
	let log = Log::default();
	let _l = obs.listen(record(&log, "l"));

	obs.trigger_debounced(1);
	sched.advance(Duration::from_millis(8));
	obs.trigger_debounced(2);
	sched.advance(Duration::from_millis(8));
	assert!(log.lock().is_empty());

	sched.advance(Duration::from_millis(2));
	assert_eq!(*log.lock(), ["l:2"]);
}

#[test]
fn unsubscribing_before_debounce_fires_prevents_delivery() {
	let (sched, _reporter, obs) = fixture();
	let log = Log::default();
	let sub = obs.listen(record(&log, "l"));

	obs.trigger_debounced(1);
	sub.dispose();
	sched.advance(Duration::from_millis(5));
	assert!(log.lock().is_empty());
}

#[test]
fn cancel_pending_drops_notification() {
	let (sched, _reporter, obs) = fixture();
	let log = Log::default();
	let _l = obs.listen(record(&log, "l"));

	obs.trigger_debounced(1);
	assert!(obs.cancel_pending());
	assert!(!obs.cancel_pending());
	sched.advance(Duration::from_millis(5));
	assert!(log.lock().is_empty());
	assert_eq!(sched.pending(), 0);
}

#[test]
fn dropping_observable_cancels_debounce() {
	let (sched, _reporter, obs) = fixture();
	obs.trigger_debounced(1);
	assert_eq!(sched.pending(), 1);
	drop(obs);
	assert_eq!(sched.pending(), 0);
}

#[test]
fn subscription_set_tracks_observables() {
	let (_sched, _reporter, a) = fixture();
	let (_sched_b, _reporter_b, b) = fixture();
	let log = Log::default();
	let mut set = SubscriptionSet::new();

	set.listen_to(&a, record(&log, "a1"));
	set.listen_to(&a, record(&log, "a2"));
	set.listen_to(&b, record(&log, "b"));
	assert!(set.has_listener(a.id()));
	assert_eq!(set.len(), 3);

	assert!(set.stop_listening_to(a.id()));
	a.trigger(1);
	b.trigger(2);
	assert_eq!(*log.lock(), ["a2:1", "b:2"]);

	set.stop_listening_to_all();
	assert!(set.is_empty());
	assert!(!set.stop_listening_to(b.id()));
	assert_eq!(a.listener_count() + b.listener_count(), 0);
}

#[test]
fn dropping_subscription_set_releases_listeners() {
	let (_sched, _reporter, obs) = fixture();
	{
		let mut set = SubscriptionSet::new();
		set.listen_to(&obs, |_| {});
		set.adopt(obs.listen(|_| {}));
		assert_eq!(obs.listener_count(), 2);
	}
	assert_eq!(obs.listener_count(), 0);
}
