//! [`Target`]: handle to one announced remote debugging target.
//!
//! # Lifecycle
//!
//! A handle is created as soon as the protocol announces a target and moves
//! through two independent one-way transitions:
//!
//! - `Uninitialized -> Initialized`, observed through [`Target::when_initialized`].
//!   Pages announced with an empty URL stay uninitialized until an update
//!   supplies one; every other target is initialized at construction.
//! - `Open -> Closed`, observed through [`Target::when_closed`].
//!
//! Closing an uninitialized target settles the readiness gate with `false`.
//! A closed handle stays a valid read-only record.
//!
//! # Popups
//!
//! When a page target with an opener becomes ready, and the opener's page has
//! already been materialized and has popup handlers, the new page is
//! materialized and delivered to those handlers. [`Target::when_initialized`]
//! does not settle until that delivery finished.
//!
//! Delivery is spawned on the tokio runtime current at the transition. A
//! transition outside any runtime defers delivery to the first await of
//! [`Target::when_initialized`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::RwLock;
use tabwire_protocol::{TargetInfo, TargetOptions, TargetType};
use tabwire_runtime::{Error, Gate, Result, SessionFactory, SessionRef, TaskQueue};

use crate::context::BrowserContext;
use crate::lazy::LazySlot;
use crate::page::Page;
use crate::registry::TargetRegistry;
use crate::worker::{Worker, WorkerCallbacks};


/// Handle to a page, background page, worker or browser target.
///
/// Clones share state. See the [module docs](self) for the lifecycle.
#[derive(Clone)]
pub struct Target {
	inner: Arc<TargetInner>,
}

struct TargetInner {
	id: Arc<str>,
	info: RwLock<TargetInfo>,
	context: BrowserContext,
	session_factory: SessionFactory,
	options: TargetOptions,
	screenshot_queue: TaskQueue,
	initialized: AtomicBool,
	/// Raw readiness outcome, before popup delivery.
	init_gate: Gate<bool>,
	/// Readiness outcome after popup delivery; what callers await.
	ready: Shared<BoxFuture<'static, bool>>,
	closed_gate: Gate<()>,
	page: LazySlot<Page>,
	worker: LazySlot<Worker>,
}

impl Target {
	/// Creates a handle for a freshly announced target.
	///
	/// `options` and `screenshot_queue` are only passed through to the page
	/// this target may materialize.
	pub fn new(
		info: TargetInfo,
		context: BrowserContext,
		session_factory: SessionFactory,
		options: TargetOptions,
		screenshot_queue: TaskQueue,
	) -> Self {
		let init_gate = Gate::new("target initialized");
		let ready_now = info.is_ready();

		let inner = Arc::new_cyclic(|weak: &Weak<TargetInner>| {
			let ready = readiness(init_gate.clone(), weak.clone()).boxed().shared();
			TargetInner {
				id: Arc::from(info.target_id.as_str()),
				info: RwLock::new(info),
				context,
				session_factory,
				options,
				screenshot_queue,
				initialized: AtomicBool::new(false),
				init_gate,
				ready,
				closed_gate: Gate::new("target closed"),
				page: LazySlot::new(),
				worker: LazySlot::new(),
			}
		});
		let target = Self { inner };

		tracing::debug!(
			target_id = %target.id(),
			kind = %target.kind(),
			ready = ready_now,
			"Target created"
		);
		if ready_now {
			target.initialize(true);
		}
		target
	}

	/// Returns the protocol target id. Stable for the handle's lifetime.
	pub fn id(&self) -> &str {
		&self.inner.id
	}

	/// Returns the last reported URL.
	pub fn url(&self) -> String {
		self.inner.info.read().url.clone()
	}

	/// Returns the target kind derived from the last reported snapshot.
	pub fn kind(&self) -> TargetType {
		self.inner.info.read().kind()
	}

	/// Returns a copy of the last reported snapshot.
	pub fn info(&self) -> TargetInfo {
		self.inner.info.read().clone()
	}

	pub fn opener_id(&self) -> Option<String> {
		self.inner.info.read().opener_id.clone()
	}

	/// Returns the browsing context that owns this target.
	pub fn browser_context(&self) -> &BrowserContext {
		&self.inner.context
	}

	/// Returns the registry of the owning browser, if it is still alive.
	pub fn registry(&self) -> Option<Arc<TargetRegistry>> {
		self.inner.context.registry()
	}

	/// Returns the target that opened this one.
	///
	/// `None` if there is no opener or the opener is no longer registered.
	pub fn opener(&self) -> Option<Target> {
		let opener_id = self.opener_id()?;
		self.registry()?.get(&opener_id)
	}

	/// Returns `true` once the readiness transition happened, with either outcome.
	pub fn is_initialized(&self) -> bool {
		self.inner.initialized.load(Ordering::SeqCst)
	}

	pub fn is_closed(&self) -> bool {
		self.inner.closed_gate.is_resolved()
	}

	/// Waits until the target is usable.
	///
	/// Resolves to `true` once initialized (after any popup delivery it
	/// triggers), or `false` if the target was destroyed first.
	pub async fn when_initialized(&self) -> bool {
		self.inner.ready.clone().await
	}

	/// Waits until the target is torn down.
	pub async fn when_closed(&self) {
		self.inner.closed_gate.wait().await
	}

	/// Opens a new session to this target. Never cached.
	pub async fn open_session(&self) -> Result<SessionRef> {
		self.inner.session_factory.open().await
	}

	/// Returns this target's page, creating it on first call.
	///
	/// `None` for targets that are not pages or background pages. Every
	/// caller shares one creation; a failed creation is not retried. Once
	/// created, the page stays reachable even if a later snapshot changes
	/// the kind.
	pub async fn page(&self) -> Result<Option<Page>> {
		let future = match self.inner.page.current() {
			Some(future) => future,
			None if !self.kind().is_page_like() => return Ok(None),
			None => self.inner.page.get_or_init(|| {
				let factory = self.inner.session_factory.clone();
				let target_id = Arc::clone(&self.inner.id);
				let options = self.inner.options.clone();
				let queue = self.inner.screenshot_queue.clone();
				async move {
					let session = factory.open().await?;
					Page::create(session, target_id, &options, queue).await
				}
			}),
		};

		future
			.await
			.map(Some)
			.map_err(|source| Error::shared(self.id(), "page", source))
	}

	/// Returns this target's worker, creating it on first call.
	///
	/// `None` for targets that are not service or shared workers. The worker's
	/// console and exception events are dropped.
	pub async fn worker(&self) -> Result<Option<Worker>> {
		let future = match self.inner.worker.current() {
			Some(future) => future,
			None if !self.kind().is_worker() => return Ok(None),
			None => self.inner.worker.get_or_init(|| {
				let factory = self.inner.session_factory.clone();
				let url = self.url();
				async move {
					let session = factory.open().await?;
					// Worker console messages and exceptions are not surfaced.
					Ok(Worker::create(session, url, WorkerCallbacks::inert()).await)
				}
			}),
		};

		future
			.await
			.map(Some)
			.map_err(|source| Error::shared(self.id(), "worker", source))
	}

	/// Applies a new snapshot from `Target.targetInfoChanged`.
	///
	/// Replaces the snapshot wholesale. An uninitialized target whose new
	/// snapshot is ready becomes initialized; later changes never re-fire
	/// readiness.
	pub fn report_info_changed(&self, info: TargetInfo) {
		if info.target_id != *self.inner.id {
			tracing::warn!(
				target_id = %self.id(),
				reported_id = %info.target_id,
				"Snapshot reported for a different target id"
			);
		}

		let ready = {
			let mut current = self.inner.info.write();
			*current = info;
			current.is_ready()
		};

		if !ready || self.is_initialized() {
			tracing::trace!(target_id = %self.id(), ready, "Target info changed");
			return;
		}
		tracing::debug!(target_id = %self.id(), url = %self.url(), "Target committed first navigation");
		self.initialize(true);
	}

	/// Marks the target as destroyed.
	///
	/// Settles the closed gate and, if the target never became ready,
	/// settles readiness with `false`. Repeated calls are no-ops.
	pub fn report_closed(&self) {
		if !self.inner.closed_gate.try_resolve(()) {
			tracing::trace!(target_id = %self.id(), "Target already closed");
			return;
		}
		tracing::debug!(target_id = %self.id(), "Target closed");
		self.initialize(false);
	}

	/// Returns `true` if both handles refer to the same target state.
	pub fn same(a: &Target, b: &Target) -> bool {
		Arc::ptr_eq(&a.inner, &b.inner)
	}

	fn initialize(&self, success: bool) {
		if self.inner.initialized.swap(true, Ordering::SeqCst) {
			return;
		}
		let _ = self.inner.init_gate.try_resolve(success);

		// Drive popup delivery even if nobody awaits readiness.
		if success {
			if let Ok(runtime) = tokio::runtime::Handle::try_current() {
				runtime.spawn(self.inner.ready.clone());
			}
		}
	}

	/// Delivers this target's page to its opener's popup handlers.
	async fn deliver_popup(&self) {
		if self.kind() != TargetType::Page {
			return;
		}
		let Some(opener) = self.opener() else {
			return;
		};
		let Some(opener_page) = opener.inner.page.current() else {
			return;
		};
		let opener_page = match opener_page.await {
			Ok(page) => page,
			Err(err) => {
				tracing::debug!(target_id = %self.id(), opener_id = %opener.id(), error = %err, "Opener page unavailable");
				return;
			}
		};
		if opener_page.popup_listener_count() == 0 {
			return;
		}

		match self.page().await {
			Ok(Some(popup)) => {
				tracing::debug!(target_id = %self.id(), opener_id = %opener.id(), "Delivering popup");
				opener_page.emit_popup(popup).await;
			}
			Ok(None) => {}
			Err(err) => {
				tracing::warn!(target_id = %self.id(), error = %err, "Failed to create popup page");
			}
		}
	}
}

/// Readiness continuation: the raw outcome, plus popup delivery on success.
async fn readiness(init_gate: Gate<bool>, target: Weak<TargetInner>) -> bool {
	if !init_gate.wait().await {
		return false;
	}
	if let Some(inner) = target.upgrade() {
		Target { inner }.deliver_popup().await;
	}
	true
}

impl fmt::Debug for Target {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let info = self.inner.info.read();
		f.debug_struct("Target")
			.field("id", &self.inner.id)
			.field("kind", &info.kind())
			.field("url", &info.url)
			.field("initialized", &self.inner.init_gate.get())
			.field("closed", &self.inner.closed_gate.is_resolved())
			.finish()
	}
}
