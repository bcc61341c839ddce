//! Error types for the target runtime.

use std::sync::Arc;

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a target.
#[derive(Debug, Error)]
pub enum Error {
	/// The session was detached or its transport went away.
	#[error("Session closed: {0}")]
	SessionClosed(String),

	/// Opening a session failed.
	#[error("Failed to open session: {0}")]
	SessionFailed(String),

	/// Protocol-level error (malformed or unexpected message).
	#[error("Protocol error: {0}")]
	Protocol(String),

	/// Error object returned by the remote end for a command.
	#[error("Remote error {code}: {message}")]
	Remote {
		/// Protocol error code
		code: i64,
		/// Human-readable error message
		message: String,
	},

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// A memoized page or worker materialization failed.
	///
	/// Every waiter on the memoized future observes the same failure.
	#[error("Failed to create {kind} for target {target_id}: {source}")]
	Materialization {
		target_id: String,
		kind: &'static str,
		source: Arc<Error>,
	},

	/// Timeout waiting for a condition.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// A single-resolution gate was resolved twice.
	#[error("Gate already resolved: {0}")]
	AlreadyResolved(&'static str),

	/// Channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,
}

impl Error {
	/// Wraps a memoized failure for one more waiter.
	pub fn shared(target_id: impl Into<String>, kind: &'static str, source: Arc<Error>) -> Self {
		Error::Materialization {
			target_id: target_id.into(),
			kind,
			source,
		}
	}

	/// Returns true if the session went away, directly or behind a memoized
	/// materialization failure.
	pub fn is_target_closed(&self) -> bool {
		match self {
			Error::SessionClosed(_) => true,
			Error::Materialization { source, .. } => source.is_target_closed(),
			_ => false,
		}
	}

	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}

	/// Returns true if a gate was resolved twice.
	pub fn is_already_resolved(&self) -> bool {
		matches!(self, Error::AlreadyResolved(_))
	}

	/// Returns the remote error code, if the remote end rejected a command.
	pub fn remote_code(&self) -> Option<i64> {
		match self {
			Error::Remote { code, .. } => Some(*code),
			Error::Materialization { source, .. } => source.remote_code(),
			_ => None,
		}
	}
}
