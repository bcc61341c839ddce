//! Handles to remote debugging targets.
//!
//! A target (tab, background page, worker, or the browser itself) is announced
//! by the protocol before it is usable. [`Target`] is created as soon as the
//! announcement arrives and:
//!
//! - exposes a readiness gate ([`Target::when_initialized`]) and a teardown
//!   gate ([`Target::when_closed`]),
//! - materializes a [`Page`] or [`Worker`] on demand, at most once per target,
//! - delivers popup notifications to the opener's page when it becomes ready.
//!
//! [`TargetRegistry`] holds the known targets of a browser and feeds protocol
//! lifecycle events into them.
//!
//! # Example
//!
//! ```ignore
//! use tabwire::{TargetRegistry, TargetOptions};
//!
//! let registry = TargetRegistry::new(TargetOptions::default());
//! let context = registry.context(info.browser_context_id.as_deref());
//! let target = registry.target_created(info, context, session_factory);
//!
//! if target.when_initialized().await {
//!     if let Some(page) = target.page().await? {
//!         let png = page.screenshot(Default::default()).await?;
//!     }
//! }
//! ```

pub mod context;
pub mod handlers;
pub mod lazy;
pub mod page;
pub mod registry;
pub mod target;
pub mod testing;
pub mod worker;

pub use context::BrowserContext;
pub use handlers::Subscription;
pub use lazy::LazySlot;
pub use page::{Page, ScreenshotFormat, ScreenshotOptions};
pub use registry::{TargetEvent, TargetRegistry};
pub use tabwire_protocol::{TargetInfo, TargetOptions, TargetType, Viewport};
pub use tabwire_runtime::{Error, Gate, Result, Session, SessionFactory, SessionRef, TaskQueue};
pub use target::Target;
pub use worker::{Worker, WorkerCallbacks};
