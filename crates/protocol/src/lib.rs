//! Wire types for the remote debugging target domain.
//!
//! This crate contains the serde-serializable types a transport hands to the
//! target layer: target snapshots as announced by `Target.targetCreated` and
//! friends, plus the per-browser options every target handle receives.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization and small derived queries
//! - **1:1 with protocol**: Field names follow the protocol's camelCase JSON
//! - **Stable**: Changes only when the wire protocol changes
//!
//! The live target handle built on top of these types lives in `tabwire`.

pub mod events;
pub mod options;
pub mod target;

pub use events::*;
pub use options::*;
pub use target::*;
