//! [`Worker`] wrapper around a service or shared worker target's session.

use std::fmt;
use std::sync::Arc;

use serde_json::{Value, json};
use tabwire_protocol::{CONSOLE_API_CALLED, ConsoleApiCalled, EXCEPTION_THROWN, ExceptionThrown};
use tabwire_runtime::{Result, SessionRef};

/// Called with each `Runtime.consoleAPICalled` event.
pub type ConsoleApiCallback = Arc<dyn Fn(ConsoleApiCalled) + Send + Sync>;

/// Called with each `Runtime.exceptionThrown` event.
pub type ExceptionCallback = Arc<dyn Fn(ExceptionThrown) + Send + Sync>;

/// Sinks for the runtime events a worker reports.
#[derive(Clone)]
pub struct WorkerCallbacks {
	pub console_api_called: ConsoleApiCallback,
	pub exception_thrown: ExceptionCallback,
}

impl WorkerCallbacks {
	/// Callbacks that drop every event.
	///
	/// Targets hand these to the workers they create: worker console output
	/// and exceptions are not surfaced yet.
	pub fn inert() -> Self {
		Self {
			console_api_called: Arc::new(|_: ConsoleApiCalled| {}),
			exception_thrown: Arc::new(|_: ExceptionThrown| {}),
		}
	}
}

impl fmt::Debug for WorkerCallbacks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WorkerCallbacks").finish_non_exhaustive()
	}
}

/// A service worker or shared worker.
///
/// Produced by [`Target::worker`](crate::Target::worker).
#[derive(Clone)]
pub struct Worker {
	inner: Arc<WorkerInner>,
}

struct WorkerInner {
	url: String,
	session: SessionRef,
	callbacks: WorkerCallbacks,
}

impl Worker {
	/// Wraps `session` and enables the runtime domain.
	///
	/// A failing `Runtime.enable` is logged, not returned: the worker may
	/// already be shutting down and the handle stays usable for inspection.
	pub async fn create(session: SessionRef, url: impl Into<String>, callbacks: WorkerCallbacks) -> Self {
		let url = url.into();

		if let Err(err) = session.send("Runtime.enable", json!({})).await {
			tracing::debug!(url = %url, error = %err, "Runtime.enable failed on worker");
		}

		Self {
			inner: Arc::new(WorkerInner { url, session, callbacks }),
		}
	}

	/// Returns the worker script URL as of creation.
	pub fn url(&self) -> &str {
		&self.inner.url
	}

	pub fn session(&self) -> &SessionRef {
		&self.inner.session
	}

	/// Routes a session event to the matching callback.
	///
	/// # Errors
	///
	/// Returns [`Error::Json`](tabwire_runtime::Error::Json) if a runtime
	/// event's params are malformed.
	pub fn dispatch_event(&self, method: &str, params: Value) -> Result<()> {
		match method {
			CONSOLE_API_CALLED => {
				let event: ConsoleApiCalled = serde_json::from_value(params)?;
				(self.inner.callbacks.console_api_called)(event);
			}
			EXCEPTION_THROWN => {
				let event: ExceptionThrown = serde_json::from_value(params)?;
				(self.inner.callbacks.exception_thrown)(event);
			}
			_ => tracing::trace!(url = %self.inner.url, method, "Ignoring worker event"),
		}
		Ok(())
	}

	/// Returns `true` if both handles refer to the same worker instance.
	pub fn same(a: &Worker, b: &Worker) -> bool {
		Arc::ptr_eq(&a.inner, &b.inner)
	}
}

impl fmt::Debug for Worker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Worker")
			.field("url", &self.inner.url)
			.field("session_id", &self.inner.session.id())
			.finish()
	}
}
