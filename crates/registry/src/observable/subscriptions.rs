use super::{Observable, ObservableId, Subscription};

/// Subscriptions owned by one consumer, released together on teardown.
///
/// Dropping the set disposes every subscription it still holds.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
	entries: Vec<Subscription>,
}

impl SubscriptionSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Subscribes `callback` to `observable` and keeps the handle.
	pub fn listen_to<E: Send + 'static>(&mut self, observable: &Observable<E>, callback: impl Fn(&E) + Send + Sync + 'static) {
		self.entries.push(observable.listen(callback));
	}

	/// Takes ownership of an existing subscription.
	pub fn adopt(&mut self, subscription: Subscription) {
		self.entries.push(subscription);
	}

	/// Returns true if any held subscription targets `observable`.
	pub fn has_listener(&self, observable: ObservableId) -> bool {
		self.entries.iter().any(|s| s.observable() == observable)
	}

	/// Disposes the oldest subscription to `observable`. Returns false if there was none.
	pub fn stop_listening_to(&mut self, observable: ObservableId) -> bool {
		match self.entries.iter().position(|s| s.observable() == observable) {
			Some(idx) => {
				self.entries.remove(idx).dispose();
				true
			}
			None => false,
		}
	}

	pub fn stop_listening_to_all(&mut self) {
		for subscription in self.entries.drain(..) {
			subscription.dispose();
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
