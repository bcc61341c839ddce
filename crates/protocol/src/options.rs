//! Per-browser options handed to every target handle.

use serde::{Deserialize, Serialize};

/// Viewport applied to newly materialized pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
	pub width: u32,
	pub height: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub device_scale_factor: Option<f64>,
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub is_mobile: bool,
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub has_touch: bool,
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub is_landscape: bool,
}

impl Viewport {
	pub fn new(width: u32, height: u32) -> Self {
		Self {
			width,
			height,
			device_scale_factor: None,
			is_mobile: false,
			has_touch: false,
			is_landscape: false,
		}
	}
}

/// Options shared by all targets of a browser.
///
/// # Example
///
/// ```ignore
/// let options = TargetOptions::new()
///     .ignore_https_errors(true)
///     .default_viewport(Viewport::new(1280, 720));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetOptions {
	/// Whether pages ignore certificate errors
	pub ignore_https_errors: bool,

	/// Viewport emulated on every new page (`None` keeps the window size)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub default_viewport: Option<Viewport>,
}

impl TargetOptions {
	/// Creates new options with default values.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets whether pages ignore certificate errors.
	pub fn ignore_https_errors(mut self, ignore: bool) -> Self {
		self.ignore_https_errors = ignore;
		self
	}

	/// Sets the default viewport.
	pub fn default_viewport(mut self, viewport: Viewport) -> Self {
		self.default_viewport = Some(viewport);
		self
	}
}
