//! Protocol sessions and the capability that opens them.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// Boxed future returned by session operations.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Shared handle to an open session.
pub type SessionRef = Arc<dyn Session>;

/// A protocol channel scoped to one target.
///
/// Implemented by the transport layer. Futures are boxed so the trait stays
/// object-safe.
pub trait Session: Send + Sync {
	/// Returns the protocol session id.
	fn id(&self) -> &str;

	/// Sends a command and awaits its result.
	fn send(&self, method: &str, params: Value) -> SessionFuture<'_, Value>;

	/// Detaches from the target. Further sends fail.
	fn detach(&self) -> SessionFuture<'_, ()>;
}

type OpenFn = dyn Fn() -> SessionFuture<'static, SessionRef> + Send + Sync;

/// Capability that opens a fresh session bound to one target.
///
/// Every call to [`open`](Self::open) opens a new session; nothing is cached
/// here.
#[derive(Clone)]
pub struct SessionFactory {
	target_id: Arc<str>,
	open: Arc<OpenFn>,
}

impl SessionFactory {
	pub fn new<F, Fut>(target_id: impl Into<Arc<str>>, open: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<SessionRef>> + Send + 'static,
	{
		let open: Arc<OpenFn> = Arc::new(move || -> SessionFuture<'static, SessionRef> { Box::pin(open()) });
		Self {
			target_id: target_id.into(),
			open,
		}
	}

	/// Returns the id of the target sessions are opened for.
	pub fn target_id(&self) -> &str {
		&self.target_id
	}

	/// Opens a new session.
	pub fn open(&self) -> SessionFuture<'static, SessionRef> {
		tracing::debug!(target_id = %self.target_id, "Opening session");
		(self.open)()
	}
}

impl fmt::Debug for SessionFactory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionFactory")
			.field("target_id", &self.target_id)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;
	use crate::error::Error;

	struct EchoSession {
		id: String,
	}

	impl Session for EchoSession {
		fn id(&self) -> &str {
			&self.id
		}

		fn send(&self, method: &str, params: Value) -> SessionFuture<'_, Value> {
			let method = method.to_string();
			Box::pin(async move { Ok(serde_json::json!({"method": method, "params": params})) })
		}

		fn detach(&self) -> SessionFuture<'_, ()> {
			Box::pin(async { Ok(()) })
		}
	}

	#[tokio::test]
	async fn test_factory_opens_fresh_session_each_call() {
		let opened = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&opened);
		let factory = SessionFactory::new("T1", move || {
			let n = counter.fetch_add(1, Ordering::SeqCst);
			async move { Ok(Arc::new(EchoSession { id: format!("S{n}") }) as SessionRef) }
		});

		let first = factory.open().await.unwrap();
		let second = factory.open().await.unwrap();

		assert_eq!(first.id(), "S0");
		assert_eq!(second.id(), "S1");
		assert_eq!(opened.load(Ordering::SeqCst), 2);

		let reply = first.send("Page.enable", serde_json::json!({})).await.unwrap();
		assert_eq!(reply["method"], "Page.enable");
	}

	#[tokio::test]
	async fn test_factory_propagates_open_failure() {
		let factory = SessionFactory::new("T1", || async { Err(Error::SessionFailed("no transport".into())) });
		let err = factory.open().await.err().unwrap();
		assert!(matches!(err, Error::SessionFailed(_)));
	}
}
