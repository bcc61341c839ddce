//! Target snapshot and kind.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Snapshot of a target as reported by the protocol.
///
/// Replaced wholesale on every `Target.targetInfoChanged`; never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
	pub target_id: String,
	/// Raw protocol type string. Use [`TargetInfo::kind`] for the collapsed kind.
	#[serde(rename = "type")]
	pub target_type: String,
	#[serde(default)]
	pub title: String,
	pub url: String,
	#[serde(default)]
	pub attached: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub opener_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub browser_context_id: Option<String>,
}

impl TargetInfo {
	/// Creates a snapshot with the given id, protocol type and URL.
	pub fn new(target_id: impl Into<String>, target_type: impl Into<String>, url: impl Into<String>) -> Self {
		Self {
			target_id: target_id.into(),
			target_type: target_type.into(),
			title: String::new(),
			url: url.into(),
			attached: false,
			opener_id: None,
			browser_context_id: None,
		}
	}

	/// Sets the id of the target that opened this one.
	pub fn opener_id(mut self, opener_id: impl Into<String>) -> Self {
		self.opener_id = Some(opener_id.into());
		self
	}

	/// Sets the owning browser context id.
	pub fn browser_context_id(mut self, id: impl Into<String>) -> Self {
		self.browser_context_id = Some(id.into());
		self
	}

	/// Returns the collapsed [`TargetType`] of this snapshot.
	pub fn kind(&self) -> TargetType {
		TargetType::from_protocol(&self.target_type)
	}

	/// Returns `true` once the target is usable.
	///
	/// Pages announced before their first commit carry an empty URL and are
	/// not ready until an update supplies one. Every other kind is ready
	/// immediately.
	pub fn is_ready(&self) -> bool {
		self.kind() != TargetType::Page || !self.url.is_empty()
	}
}

/// Kind of a debuggable target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
	Page,
	BackgroundPage,
	ServiceWorker,
	SharedWorker,
	Browser,
	/// Any protocol type outside the five above (iframe, webview, worker, ...).
	#[serde(other)]
	Other,
}

impl TargetType {
	/// Collapses a raw protocol type string.
	pub fn from_protocol(s: &str) -> Self {
		match s {
			"page" => Self::Page,
			"background_page" => Self::BackgroundPage,
			"service_worker" => Self::ServiceWorker,
			"shared_worker" => Self::SharedWorker,
			"browser" => Self::Browser,
			_ => Self::Other,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Page => "page",
			Self::BackgroundPage => "background_page",
			Self::ServiceWorker => "service_worker",
			Self::SharedWorker => "shared_worker",
			Self::Browser => "browser",
			Self::Other => "other",
		}
	}

	/// Returns `true` for kinds that can produce a page wrapper.
	pub fn is_page_like(&self) -> bool {
		matches!(self, Self::Page | Self::BackgroundPage)
	}

	/// Returns `true` for kinds that can produce a worker wrapper.
	pub fn is_worker(&self) -> bool {
		matches!(self, Self::ServiceWorker | Self::SharedWorker)
	}
}

impl fmt::Display for TargetType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
