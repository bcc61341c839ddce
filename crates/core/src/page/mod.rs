//! [`Page`] wrapper around a page-kind target's session.

mod page_events;
mod screenshot;

use std::sync::Arc;

use futures_util::future::try_join_all;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use tabwire_protocol::{TargetOptions, Viewport};
use tabwire_runtime::{Result, SessionRef, TaskQueue};

pub use crate::handlers::Subscription;
use crate::handlers::HandlerMap;
pub use screenshot::{ScreenshotFormat, ScreenshotOptions};

/// Domains enabled on every new page session.
const PAGE_DOMAINS: [&str; 4] = ["Page.enable", "Runtime.enable", "Network.enable", "Log.enable"];

/// A browser tab or background page.
///
/// Produced by [`Target::page`](crate::Target::page). Clones share state and
/// count as the same instance (see [`Page::same`]).
#[derive(Clone)]
pub struct Page {
	inner: Arc<PageInner>,
}

struct PageInner {
	target_id: Arc<str>,
	session: SessionRef,
	ignore_https_errors: bool,
	viewport: RwLock<Option<Viewport>>,
	screenshot_queue: TaskQueue,
	/// Popup handlers, called when a target this page opened becomes ready.
	popup_handlers: HandlerMap<Page>,
}

impl Page {
	/// Prepares `session` for page automation and wraps it.
	///
	/// Enables the page, runtime, network and log domains, turns off
	/// certificate checks when `options.ignore_https_errors` is set, and
	/// applies `options.default_viewport`.
	///
	/// # Errors
	///
	/// Fails if any setup command fails.
	pub async fn create(
		session: SessionRef,
		target_id: impl Into<Arc<str>>,
		options: &TargetOptions,
		screenshot_queue: TaskQueue,
	) -> Result<Self> {
		let target_id = target_id.into();

		try_join_all(PAGE_DOMAINS.iter().map(|method| session.send(method, json!({})))).await?;
		session
			.send("Page.setLifecycleEventsEnabled", json!({ "enabled": true }))
			.await?;

		if options.ignore_https_errors {
			session
				.send("Security.setIgnoreCertificateErrors", json!({ "ignore": true }))
				.await?;
		}

		let page = Self {
			inner: Arc::new(PageInner {
				target_id,
				session,
				ignore_https_errors: options.ignore_https_errors,
				viewport: RwLock::new(None),
				screenshot_queue,
				popup_handlers: Arc::new(Mutex::new(IndexMap::new())),
			}),
		};

		if let Some(viewport) = &options.default_viewport {
			page.set_viewport(viewport.clone()).await?;
		}

		tracing::debug!(target_id = %page.inner.target_id, session_id = page.inner.session.id(), "Page created");
		Ok(page)
	}

	/// Returns the id of the target this page belongs to.
	pub fn target_id(&self) -> &str {
		&self.inner.target_id
	}

	/// Returns the session this page drives.
	pub fn session(&self) -> &SessionRef {
		&self.inner.session
	}

	pub fn ignore_https_errors(&self) -> bool {
		self.inner.ignore_https_errors
	}

	/// Returns the emulated viewport, `None` when the window size is used.
	pub fn viewport(&self) -> Option<Viewport> {
		self.inner.viewport.read().clone()
	}

	/// Emulates `viewport` (device metrics, orientation and touch).
	pub async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
		let orientation = if viewport.is_landscape {
			json!({ "angle": 90, "type": "landscapePrimary" })
		} else {
			json!({ "angle": 0, "type": "portraitPrimary" })
		};

		let session = &self.inner.session;
		session
			.send(
				"Emulation.setDeviceMetricsOverride",
				json!({
					"width": viewport.width,
					"height": viewport.height,
					"deviceScaleFactor": viewport.device_scale_factor.unwrap_or(1.0),
					"mobile": viewport.is_mobile,
					"screenOrientation": orientation,
				}),
			)
			.await?;
		session
			.send(
				"Emulation.setTouchEmulationEnabled",
				json!({ "enabled": viewport.has_touch }),
			)
			.await?;

		*self.inner.viewport.write() = Some(viewport);
		Ok(())
	}

	/// Returns `true` if both handles refer to the same page instance.
	pub fn same(a: &Page, b: &Page) -> bool {
		Arc::ptr_eq(&a.inner, &b.inner)
	}
}

impl std::fmt::Debug for Page {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Page")
			.field("target_id", &self.inner.target_id)
			.field("session_id", &self.inner.session.id())
			.field("popup_listeners", &self.popup_listener_count())
			.finish()
	}
}
