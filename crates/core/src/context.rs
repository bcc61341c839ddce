//! [`BrowserContext`]: the isolation group that owns a target.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::registry::TargetRegistry;
use crate::target::Target;

/// An isolated group of targets sharing cookies and storage.
///
/// Holds only a weak reference to the registry; the registry owns the
/// targets, and targets own their context.
#[derive(Clone)]
pub struct BrowserContext {
	id: Option<Arc<str>>,
	registry: Weak<TargetRegistry>,
}

impl BrowserContext {
	/// Creates a context handle. `None` is the browser's default context.
	pub fn new(id: Option<&str>, registry: &Arc<TargetRegistry>) -> Self {
		Self {
			id: id.map(Arc::from),
			registry: Arc::downgrade(registry),
		}
	}

	/// Returns the protocol `browserContextId`, `None` for the default context.
	pub fn id(&self) -> Option<&str> {
		self.id.as_deref()
	}

	pub fn is_default(&self) -> bool {
		self.id.is_none()
	}

	/// Returns the browser's target registry, if it is still alive.
	pub fn registry(&self) -> Option<Arc<TargetRegistry>> {
		self.registry.upgrade()
	}

	/// Returns the known targets owned by this context.
	pub fn targets(&self) -> Vec<Target> {
		let Some(registry) = self.registry() else {
			return Vec::new();
		};
		registry
			.targets()
			.into_iter()
			.filter(|target| target.browser_context().id() == self.id())
			.collect()
	}
}

impl fmt::Debug for BrowserContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BrowserContext")
			.field("id", &self.id)
			.field("registry_alive", &(self.registry.strong_count() > 0))
			.finish()
	}
}
