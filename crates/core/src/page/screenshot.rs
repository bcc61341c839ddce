//! Screenshot methods for [`Page`].

use base64::Engine;
use serde::{Deserialize, Serialize};
use tabwire_runtime::{Error, Result};

use super::Page;

/// Image format for [`Page::screenshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
	#[default]
	Png,
	Jpeg,
	Webp,
}

/// Params of `Page.captureScreenshot`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotOptions {
	pub format: ScreenshotFormat,

	/// Compression quality (jpeg and webp only)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub quality: Option<u8>,

	/// Capture the full scrollable page instead of the viewport
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub capture_beyond_viewport: bool,
}

#[derive(Deserialize)]
struct ScreenshotResponse {
	data: String,
}

impl Page {
	/// Captures a screenshot and returns the image bytes.
	///
	/// Runs on the browser-wide screenshot queue, so captures from different
	/// pages never overlap.
	pub async fn screenshot(&self, options: ScreenshotOptions) -> Result<Vec<u8>> {
		let params = serde_json::to_value(&options)?;
		let session = self.session().clone();

		let response = self
			.inner
			.screenshot_queue
			.post_task(async move { session.send("Page.captureScreenshot", params).await })
			.await?;
		let response: ScreenshotResponse = serde_json::from_value(response)?;

		base64::prelude::BASE64_STANDARD
			.decode(&response.data)
			.map_err(|e| Error::Protocol(format!("decode screenshot: {e}")))
	}
}
