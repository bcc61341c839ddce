//! Event payloads consumed by the target layer.
//!
//! Params of `Target.targetCreated`, `Target.targetInfoChanged` and
//! `Target.targetDestroyed`, plus the two `Runtime` events workers report.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::target::TargetInfo;

pub const TARGET_CREATED: &str = "Target.targetCreated";
pub const TARGET_INFO_CHANGED: &str = "Target.targetInfoChanged";
pub const TARGET_DESTROYED: &str = "Target.targetDestroyed";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCreated {
	pub target_info: TargetInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfoChanged {
	pub target_info: TargetInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDestroyed {
	pub target_id: String,
}

pub const CONSOLE_API_CALLED: &str = "Runtime.consoleAPICalled";
pub const EXCEPTION_THROWN: &str = "Runtime.exceptionThrown";

/// Params of `Runtime.consoleAPICalled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleApiCalled {
	/// Console method (`log`, `error`, `warning`, ...)
	#[serde(rename = "type")]
	pub kind: String,
	/// Remote objects passed to the console call
	#[serde(default)]
	pub args: Vec<Value>,
	#[serde(default)]
	pub execution_context_id: i64,
	#[serde(default)]
	pub timestamp: f64,
}

/// Params of `Runtime.exceptionThrown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionThrown {
	#[serde(default)]
	pub timestamp: f64,
	/// Raw `Runtime.ExceptionDetails` object
	pub exception_details: Value,
}
