//! Compute-once futures.
//!
//! [`LazySlot`] holds at most one shared future. The first caller installs it
//! under a lock, before any await, so every later caller (concurrent or not)
//! awaits the same in-flight or completed work.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, Shared};
use futures_util::{FutureExt, TryFutureExt};
use parking_lot::Mutex;
use tabwire_runtime::{Error, Result};

/// Outcome shared by every waiter. Errors are reference counted so each
/// waiter sees the same failure.
pub type SharedResult<T> = std::result::Result<T, Arc<Error>>;

/// Cloneable handle to the memoized computation.
pub type SharedFuture<T> = Shared<BoxFuture<'static, SharedResult<T>>>;

/// Slot holding a memoized async computation.
///
/// Failures are memoized too; a failed slot is never retried.
pub struct LazySlot<T: Clone> {
	slot: Mutex<Option<SharedFuture<T>>>,
}

impl<T> LazySlot<T>
where
	T: Clone + Send + Sync + 'static,
{
	pub fn new() -> Self {
		Self { slot: Mutex::new(None) }
	}

	/// Returns the installed future, installing `init()` first if the slot is
	/// empty. `init` runs at most once per slot.
	pub fn get_or_init<F, Fut>(&self, init: F) -> SharedFuture<T>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<T>> + Send + 'static,
	{
		let mut slot = self.slot.lock();
		if let Some(existing) = slot.as_ref() {
			return existing.clone();
		}
		let future = init().map_err(Arc::new).boxed().shared();
		*slot = Some(future.clone());
		future
	}

	/// Returns the installed future without installing one.
	pub fn current(&self) -> Option<SharedFuture<T>> {
		self.slot.lock().clone()
	}

	/// Returns `true` once a computation has been installed.
	pub fn is_initialized(&self) -> bool {
		self.slot.lock().is_some()
	}

	/// Returns the outcome if the computation already finished.
	pub fn peek(&self) -> Option<SharedResult<T>> {
		self.slot.lock().as_ref().and_then(|future| future.peek().cloned())
	}
}

impl<T> Default for LazySlot<T>
where
	T: Clone + Send + Sync + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Clone> fmt::Debug for LazySlot<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = match self.slot.lock().as_ref() {
			None => "empty",
			Some(future) => match future.peek() {
				None => "pending",
				Some(Ok(_)) => "ready",
				Some(Err(_)) => "failed",
			},
		};
		f.debug_struct("LazySlot").field("state", &state).finish()
	}
}
