//! [`TargetRegistry`]: the known targets of one browser.
//!
//! Uses [`DashMap`] for concurrent lookup by target id. The registry owns the
//! target handles; targets only refer back to it weakly through their
//! [`BrowserContext`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tabwire_protocol::{
	TARGET_CREATED, TARGET_DESTROYED, TARGET_INFO_CHANGED, TargetCreated, TargetDestroyed, TargetInfo,
	TargetInfoChanged, TargetOptions,
};
use tabwire_runtime::{Error, Result, SessionFactory, TaskQueue};
use tokio::sync::broadcast;

use crate::context::BrowserContext;
use crate::target::Target;

/// Lifecycle notification published by a [`TargetRegistry`].
#[derive(Debug, Clone)]
pub enum TargetEvent {
	/// A target was announced and registered.
	Created(Target),
	/// A registered target reported a new snapshot.
	Changed(Target),
	/// A target was destroyed and removed.
	Destroyed(Target),
}

impl TargetEvent {
	pub fn target(&self) -> &Target {
		match self {
			Self::Created(target) | Self::Changed(target) | Self::Destroyed(target) => target,
		}
	}
}

/// Registry of the targets of one browser, keyed by target id.
pub struct TargetRegistry {
	targets: DashMap<Arc<str>, Target>,
	options: TargetOptions,
	screenshot_queue: TaskQueue,
	events: broadcast::Sender<TargetEvent>,
}

impl TargetRegistry {
	/// Creates an empty registry. `options` are handed to every target.
	pub fn new(options: TargetOptions) -> Arc<Self> {
		let (events, _) = broadcast::channel(256);
		Arc::new(Self {
			targets: DashMap::new(),
			options,
			screenshot_queue: TaskQueue::new(),
			events,
		})
	}

	/// Returns a handle to the browser context `id` (`None` for the default).
	pub fn context(self: &Arc<Self>, id: Option<&str>) -> BrowserContext {
		BrowserContext::new(id, self)
	}

	pub fn options(&self) -> &TargetOptions {
		&self.options
	}

	/// Handles `Target.targetCreated`: builds and registers a handle.
	///
	/// A target already registered under the same id is replaced, and the
	/// stale handle is closed so its waiters settle.
	pub fn target_created(&self, info: TargetInfo, context: BrowserContext, session_factory: SessionFactory) -> Target {
		let target = Target::new(
			info,
			context,
			session_factory,
			self.options.clone(),
			self.screenshot_queue.clone(),
		);

		if let Some(previous) = self.targets.insert(Arc::from(target.id()), target.clone()) {
			tracing::warn!(target_id = %previous.id(), "Target announced twice, replacing");
			previous.report_closed();
			let _ = self.events.send(TargetEvent::Destroyed(previous));
		}
		let _ = self.events.send(TargetEvent::Created(target.clone()));
		target
	}

	/// Handles `Target.targetInfoChanged`. Unknown ids are ignored.
	pub fn target_info_changed(&self, info: TargetInfo) {
		let Some(target) = self.get(&info.target_id) else {
			tracing::trace!(target_id = %info.target_id, "Info changed for unknown target");
			return;
		};
		target.report_info_changed(info);
		let _ = self.events.send(TargetEvent::Changed(target));
	}

	/// Handles `Target.targetDestroyed`: unregisters and closes the target.
	pub fn target_destroyed(&self, target_id: &str) {
		let Some((_, target)) = self.targets.remove(target_id) else {
			tracing::trace!(target_id, "Destroyed unknown target");
			return;
		};
		target.report_closed();
		let _ = self.events.send(TargetEvent::Destroyed(target));
	}

	/// Routes a raw `Target.*` event to the matching entry point.
	///
	/// `open` supplies the session factory of a newly announced target. Returns
	/// the handle the event concerned; other methods are ignored.
	///
	/// # Errors
	///
	/// Returns [`Error::Json`] if `params` do not match the event's shape.
	pub fn dispatch_event<F>(self: &Arc<Self>, method: &str, params: Value, open: F) -> Result<Option<Target>>
	where
		F: FnOnce(&TargetInfo) -> SessionFactory,
	{
		match method {
			TARGET_CREATED => {
				let TargetCreated { target_info } = serde_json::from_value(params)?;
				let context = self.context(target_info.browser_context_id.as_deref());
				let session_factory = open(&target_info);
				Ok(Some(self.target_created(target_info, context, session_factory)))
			}
			TARGET_INFO_CHANGED => {
				let TargetInfoChanged { target_info } = serde_json::from_value(params)?;
				let target = self.get(&target_info.target_id);
				self.target_info_changed(target_info);
				Ok(target)
			}
			TARGET_DESTROYED => {
				let TargetDestroyed { target_id } = serde_json::from_value(params)?;
				let target = self.get(&target_id);
				self.target_destroyed(&target_id);
				Ok(target)
			}
			_ => {
				tracing::trace!(method, "Ignoring non-target event");
				Ok(None)
			}
		}
	}

	/// Looks up a target by id.
	pub fn get(&self, target_id: &str) -> Option<Target> {
		self.targets.get(target_id).map(|entry| entry.value().clone())
	}

	/// Returns every registered target.
	pub fn targets(&self) -> Vec<Target> {
		self.targets.iter().map(|entry| entry.value().clone()).collect()
	}

	pub fn len(&self) -> usize {
		self.targets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.targets.is_empty()
	}

	/// Subscribes to lifecycle events. Events sent before subscribing are not received.
	pub fn subscribe(&self) -> broadcast::Receiver<TargetEvent> {
		self.events.subscribe()
	}

	/// Waits for an initialized, open target matching `predicate`.
	///
	/// Targets registered before the call count. Subscribes before scanning so
	/// no event between the two is lost.
	///
	/// # Errors
	///
	/// Returns [`Error::Timeout`] if no target matched within `timeout`.
	pub async fn wait_for_target<F>(&self, predicate: F, timeout: Duration) -> Result<Target>
	where
		F: Fn(&Target) -> bool,
	{
		let mut rx = self.subscribe();

		tokio::time::timeout(timeout, async move {
			loop {
				if let Some(target) = self
					.targets()
					.into_iter()
					.find(|target| target.is_initialized() && !target.is_closed() && predicate(target))
				{
					return Ok(target);
				}

				match rx.recv().await {
					Ok(_) => continue,
					Err(broadcast::error::RecvError::Lagged(n)) => {
						tracing::warn!(dropped = n, "Target event receiver lagged");
					}
					Err(broadcast::error::RecvError::Closed) => {
						return Err(Error::ChannelClosed);
					}
				}
			}
		})
		.await
		.map_err(|_| Error::Timeout("Timeout waiting for target".to_string()))?
	}
}

impl fmt::Debug for TargetRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TargetRegistry")
			.field("targets", &self.targets.len())
			.field("options", &self.options)
			.finish()
	}
}
