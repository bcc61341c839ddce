//! Tabwire Runtime - sessions, gates and errors
//!
//! Low-level pieces the target layer is built from:
//!
//! - **Errors**: the [`Error`] taxonomy shared by every crate in the workspace
//! - **Sessions**: the [`Session`] trait and the [`SessionFactory`] capability
//!   that opens one per call
//! - **Gates**: [`Gate`], a single-resolution future any number of tasks can await
//! - **Task queue**: [`TaskQueue`], a FIFO serializer for work that must not
//!   interleave (screenshots)
//!
//! The transport that actually talks to the browser is not part of this crate;
//! it plugs in by implementing [`Session`].

pub mod error;
pub mod gate;
pub mod session;
pub mod task_queue;

pub use error::{Error, Result};
pub use gate::Gate;
pub use session::{Session, SessionFactory, SessionFuture, SessionRef};
pub use task_queue::TaskQueue;
