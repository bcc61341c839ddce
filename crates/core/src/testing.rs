//! Test doubles for sessions.
//!
//! [`MockSession`] records every command and answers from a reply table;
//! [`MockOpener`] builds a [`SessionFactory`] that hands out mock sessions and
//! counts how often it was asked to.
//!
//! # Example
//!
//! ```ignore
//! let opener = MockOpener::new();
//! let target = registry.target_created(info, context, opener.factory("T1"));
//! target.page().await?;
//! assert_eq!(opener.open_count(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::{Value, json};
use tabwire_runtime::{Error, Gate, Session, SessionFactory, SessionFuture, SessionRef};

/// In-memory [`Session`] that records commands.
///
/// Unknown commands succeed with `{}`.
#[derive(Default)]
pub struct MockSession {
	id: String,
	sent: Mutex<Vec<(String, Value)>>,
	replies: Mutex<HashMap<String, Value>>,
	failures: Mutex<HashMap<String, String>>,
	detached: AtomicBool,
}

impl MockSession {
	pub fn new(id: impl Into<String>) -> Arc<Self> {
		Arc::new(Self {
			id: id.into(),
			..Default::default()
		})
	}

	/// Answers `method` with `result`.
	pub fn reply(&self, method: &str, result: Value) {
		self.replies.lock().insert(method.to_string(), result);
	}

	/// Rejects `method` with a remote error carrying `message`.
	pub fn fail(&self, method: &str, message: &str) {
		self.failures.lock().insert(method.to_string(), message.to_string());
	}

	/// Returns every command sent so far, in order.
	pub fn sent(&self) -> Vec<(String, Value)> {
		self.sent.lock().clone()
	}

	pub fn sent_methods(&self) -> Vec<String> {
		self.sent.lock().iter().map(|(method, _)| method.clone()).collect()
	}

	pub fn is_detached(&self) -> bool {
		self.detached.load(Ordering::SeqCst)
	}
}

impl Session for MockSession {
	fn id(&self) -> &str {
		&self.id
	}

	fn send(&self, method: &str, params: Value) -> SessionFuture<'_, Value> {
		let method = method.to_string();
		Box::pin(async move {
			if self.is_detached() {
				return Err(Error::SessionClosed(format!("{} is detached", self.id)));
			}
			self.sent.lock().push((method.clone(), params));
			if let Some(message) = self.failures.lock().get(&method) {
				return Err(Error::Remote {
					code: -32000,
					message: message.clone(),
				});
			}
			Ok(self.replies.lock().get(&method).cloned().unwrap_or_else(|| json!({})))
		})
	}

	fn detach(&self) -> SessionFuture<'_, ()> {
		Box::pin(async move {
			self.detached.store(true, Ordering::SeqCst);
			Ok(())
		})
	}
}

type Configure = Arc<dyn Fn(&MockSession) + Send + Sync>;

#[derive(Default)]
struct OpenerState {
	opened: AtomicUsize,
	sessions: Mutex<Vec<Arc<MockSession>>>,
	fail_open: Mutex<Option<String>>,
	hold: Mutex<Option<Gate<()>>>,
	configure: Mutex<Option<Configure>>,
	failing_methods: Mutex<HashSet<String>>,
}

/// Source of mock sessions for a [`SessionFactory`].
#[derive(Clone, Default)]
pub struct MockOpener {
	state: Arc<OpenerState>,
}

impl MockOpener {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a factory whose every open is counted and served by this opener.
	pub fn factory(&self, target_id: &str) -> SessionFactory {
		let state = Arc::clone(&self.state);
		SessionFactory::new(target_id, move || {
			let state = Arc::clone(&state);
			async move {
				let n = state.opened.fetch_add(1, Ordering::SeqCst);
				let hold = state.hold.lock().clone();
				if let Some(hold) = hold {
					hold.wait().await;
				}
				if let Some(message) = state.fail_open.lock().clone() {
					return Err(Error::SessionFailed(message));
				}

				let session = MockSession::new(format!("session-{n}"));
				for method in state.failing_methods.lock().iter() {
					session.fail(method, "mock failure");
				}
				let configure = state.configure.lock().clone();
				if let Some(configure) = configure {
					configure(&session);
				}
				state.sessions.lock().push(Arc::clone(&session));
				Ok(session as SessionRef)
			}
		})
	}

	/// Number of times any factory from this opener was asked to open.
	pub fn open_count(&self) -> usize {
		self.state.opened.load(Ordering::SeqCst)
	}

	/// Sessions opened so far.
	pub fn sessions(&self) -> Vec<Arc<MockSession>> {
		self.state.sessions.lock().clone()
	}

	/// Makes every later open fail with [`Error::SessionFailed`].
	pub fn fail_open(&self, message: &str) {
		*self.state.fail_open.lock() = Some(message.to_string());
	}

	/// Makes every later session reject `method`.
	pub fn fail_method(&self, method: &str) {
		self.state.failing_methods.lock().insert(method.to_string());
	}

	/// Makes opens wait until `gate` resolves.
	pub fn hold_until(&self, gate: Gate<()>) {
		*self.state.hold.lock() = Some(gate);
	}

	/// Runs `configure` on every session before it is handed out.
	pub fn on_open<F>(&self, configure: F)
	where
		F: Fn(&MockSession) + Send + Sync + 'static,
	{
		*self.state.configure.lock() = Some(Arc::new(configure));
	}
}
