//! Async event handlers keyed by registration id.
//!
//! Handlers live in an [`IndexMap`] so delivery follows registration order and
//! removal stays O(1). Registering returns a [`Subscription`] guard.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tabwire_runtime::Result;

pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

fn next_handler_id() -> HandlerId {
	NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed)
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Type-erased handler for events of type `E`.
pub type HandlerFn<E> = Arc<dyn Fn(E) -> HandlerFuture + Send + Sync>;

/// Shared handler table of one event source.
pub type HandlerMap<E> = Arc<Mutex<IndexMap<HandlerId, HandlerFn<E>>>>;

/// Returns a snapshot of the handlers in `handlers`, in registration order.
///
/// Taken under the lock and released before any handler runs, so handlers may
/// register or drop subscriptions while being delivered to.
pub fn snapshot<E>(handlers: &HandlerMap<E>) -> Vec<(HandlerId, HandlerFn<E>)> {
	handlers
		.lock()
		.iter()
		.map(|(id, handler)| (*id, Arc::clone(handler)))
		.collect()
}

/// Inserts `handler` into `handlers` and returns its subscription.
pub fn register<E, F, Fut>(handlers: &HandlerMap<E>, handler: F) -> Subscription
where
	E: Send + 'static,
	F: Fn(E) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<()>> + Send + 'static,
{
	let id = next_handler_id();
	let erased: HandlerFn<E> = Arc::new(move |event: E| -> HandlerFuture { Box::pin(handler(event)) });
	handlers.lock().insert(id, erased);

	let table: Weak<Mutex<IndexMap<HandlerId, HandlerFn<E>>>> = Arc::downgrade(handlers);
	Subscription::new(
		id,
		Arc::new(move |id| {
			if let Some(table) = table.upgrade() {
				table.lock().shift_remove(&id);
			}
		}),
	)
}

type Unregister = Arc<dyn Fn(HandlerId) + Send + Sync>;

/// Guard that removes its handler when dropped.
///
/// Only weakly tied to the handler table, so it may outlive the [`Page`] that
/// issued it.
///
/// [`Page`]: crate::Page
pub struct Subscription {
	id: HandlerId,
	unregister: Option<Unregister>,
}

impl Subscription {
	fn new(id: HandlerId, unregister: Unregister) -> Self {
		Self {
			id,
			unregister: Some(unregister),
		}
	}

	pub fn id(&self) -> HandlerId {
		self.id
	}

	/// Removes the handler now. Same as dropping the guard.
	pub fn unsubscribe(self) {}

	/// Keeps the handler registered for the lifetime of its table.
	pub fn detach(mut self) {
		self.unregister = None;
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(unregister) = self.unregister.take() {
			unregister(self.id);
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.unregister.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table() -> HandlerMap<String> {
		Arc::new(Mutex::new(IndexMap::new()))
	}

	#[test]
	fn test_ids_are_unique() {
		let table = table();
		let a = register(&table, |_: String| async { Ok(()) });
		let b = register(&table, |_: String| async { Ok(()) });
		assert_ne!(a.id(), b.id());
	}

	#[test]
	fn test_unsubscribe_removes_handler() {
		let table = table();
		let sub = register(&table, |_: String| async { Ok(()) });
		assert_eq!(table.lock().len(), 1);

		sub.unsubscribe();
		assert!(table.lock().is_empty());
	}

	#[test]
	fn test_detached_subscription_stays_registered() {
		let table = table();
		register(&table, |_: String| async { Ok(()) }).detach();
		assert_eq!(table.lock().len(), 1);
	}

	#[test]
	fn test_subscription_outlives_table() {
		let table = table();
		let sub = register(&table, |_: String| async { Ok(()) });

		drop(table);
		drop(sub);
	}

	#[tokio::test]
	async fn test_snapshot_keeps_registration_order() {
		let table = table();
		let seen = Arc::new(Mutex::new(Vec::new()));

		let mut subs = Vec::new();
		for tag in ["first", "second", "third"] {
			let seen = Arc::clone(&seen);
			subs.push(register(&table, move |event: String| {
				seen.lock().push(format!("{tag}:{event}"));
				async { Ok(()) }
			}));
		}
		subs.remove(1).unsubscribe();

		for (_, handler) in snapshot(&table) {
			handler("popup".to_string()).await.unwrap();
		}

		assert_eq!(*seen.lock(), vec!["first:popup", "third:popup"]);
	}
}
