//! Popup notification for [`Page`].

use std::future::Future;

use tabwire_runtime::Result;

use super::Page;
use crate::handlers::{self, Subscription};

impl Page {
	/// Registers a popup handler.
	///
	/// The handler receives the popup's page once a target opened by this
	/// page becomes ready. Returns a [`Subscription`] that unregisters the
	/// handler when dropped.
	pub fn on_popup<F, Fut>(&self, handler: F) -> Subscription
	where
		F: Fn(Page) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<()>> + Send + 'static,
	{
		handlers::register(&self.inner.popup_handlers, handler)
	}

	/// Returns the number of registered popup handlers.
	pub fn popup_listener_count(&self) -> usize {
		self.inner.popup_handlers.lock().len()
	}

	/// Delivers `popup` to every popup handler, in registration order.
	///
	/// Each handler is awaited before the next runs. A failing handler is
	/// logged and does not stop delivery.
	pub async fn emit_popup(&self, popup: Page) {
		for (handler_id, handler) in handlers::snapshot(&self.inner.popup_handlers) {
			if let Err(err) = handler(popup.clone()).await {
				tracing::warn!(
					target_id = %self.inner.target_id,
					popup_target_id = %popup.target_id(),
					handler_id,
					error = %err,
					"Popup handler failed"
				);
			}
		}
	}
}
