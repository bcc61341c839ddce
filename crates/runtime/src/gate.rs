//! Single-resolution futures.
//!
//! A [`Gate`] settles exactly once. Any number of tasks can await it, before
//! or after it settles, and all observe the same value. Built on
//! [`tokio::sync::watch`] so the check-and-set of the slot is atomic.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Single-assignment cell that can be awaited.
///
/// Cloning a gate shares the cell.
pub struct Gate<T> {
	name: &'static str,
	tx: Arc<watch::Sender<Option<T>>>,
}

impl<T> Clone for Gate<T> {
	fn clone(&self) -> Self {
		Self {
			name: self.name,
			tx: Arc::clone(&self.tx),
		}
	}
}

impl<T: Clone> Gate<T> {
	/// Creates an unsettled gate. `name` shows up in errors and logs.
	pub fn new(name: &'static str) -> Self {
		let (tx, _) = watch::channel(None);
		Self { name, tx: Arc::new(tx) }
	}

	/// Settles the gate.
	///
	/// # Errors
	///
	/// Returns [`Error::AlreadyResolved`] if the gate was already settled. The
	/// stored value is left untouched.
	pub fn resolve(&self, value: T) -> Result<()> {
		if self.try_resolve(value) {
			Ok(())
		} else {
			Err(Error::AlreadyResolved(self.name))
		}
	}

	/// Settles the gate if it is still open. Returns `false` if it was not.
	pub fn try_resolve(&self, value: T) -> bool {
		let mut value = Some(value);
		self.tx.send_if_modified(|slot| {
			if slot.is_some() {
				return false;
			}
			*slot = value.take();
			true
		})
	}

	/// Returns the settled value without waiting, `None` while unsettled.
	pub fn get(&self) -> Option<T> {
		self.tx.borrow().clone()
	}

	pub fn is_resolved(&self) -> bool {
		self.tx.borrow().is_some()
	}

	/// Waits for the gate to settle and returns its value.
	pub async fn wait(&self) -> T {
		let mut rx = self.tx.subscribe();
		loop {
			if let Some(value) = rx.borrow_and_update().clone() {
				return value;
			}
			// `self` keeps the sender alive, so this only returns on a change.
			let _ = rx.changed().await;
		}
	}
}

impl<T: fmt::Debug> fmt::Debug for Gate<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Gate")
			.field("name", &self.name)
			.field("value", &*self.tx.borrow())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[test]
	fn test_resolve_once() {
		let gate = Gate::new("init");
		assert!(gate.get().is_none());
		assert!(!gate.is_resolved());

		gate.resolve(true).unwrap();
		assert_eq!(gate.get(), Some(true));

		let err = gate.resolve(false).unwrap_err();
		assert!(err.is_already_resolved());
		assert_eq!(gate.get(), Some(true));
		assert!(!gate.try_resolve(false));
	}

	#[tokio::test]
	async fn test_waiters_before_and_after_resolution() {
		let gate: Gate<u32> = Gate::new("value");

		let early = {
			let gate = gate.clone();
			tokio::spawn(async move { gate.wait().await })
		};
		tokio::task::yield_now().await;
		assert!(!early.is_finished());

		gate.resolve(7).unwrap();
		assert_eq!(early.await.unwrap(), 7);
		assert_eq!(gate.wait().await, 7);
	}

	#[tokio::test]
	async fn test_unresolved_gate_stays_pending() {
		let gate: Gate<()> = Gate::new("closed");
		let result = tokio::time::timeout(Duration::from_millis(20), gate.wait()).await;
		assert!(result.is_err());
	}
}
