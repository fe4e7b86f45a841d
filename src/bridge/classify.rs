//! Classification of executor failures
//!
//! Not every executor failure is an error: a result that cannot cross the
//! transport is a completed evaluation whose value is unrepresentable, which
//! is what most chained host calls return (the map object itself).

use serde_json::Value as Json;

use super::executor::{ExecutionFailure, HostExceptionInfo, RawExecutionResult};
use super::value::{DecodedValue, decode};
use crate::error::{BridgeError, BridgeResult};

/// Keys searched, in order, for a reason inside structured exception details
const REASON_KEYS: &[&str] = &["reason", "message", "WKJavaScriptExceptionMessage"];

/// Map an executor failure onto the error taxonomy
///
/// Returns `Ok(DecodedValue::UnsupportedType)` for unsupported-type
/// completions.
pub fn classify(failure: ExecutionFailure) -> BridgeResult<DecodedValue> {
    match failure {
        ExecutionFailure::UnsupportedType => Ok(DecodedValue::UnsupportedType),
        ExecutionFailure::HostException(info) => match extract_reason(&info) {
            Some(reason) => Err(BridgeError::HostException {
                code: info.code,
                reason,
            }),
            None => Err(BridgeError::UnknownFailure(format!(
                "host exception {} without a reason",
                info.code
            ))),
        },
        ExecutionFailure::Transport(detail) => Err(BridgeError::UnknownFailure(detail)),
    }
}

/// Run a complete executor outcome through the decoder or the classifier
pub fn interpret(result: RawExecutionResult) -> BridgeResult<DecodedValue> {
    match result {
        Ok(raw) => decode(raw),
        Err(failure) => classify(failure),
    }
}

fn extract_reason(info: &HostExceptionInfo) -> Option<String> {
    if let Some(message) = non_empty(info.message.as_deref()) {
        return Some(message);
    }

    match info.details.as_ref()? {
        Json::String(text) => non_empty(Some(text)),
        Json::Object(fields) => REASON_KEYS
            .iter()
            .find_map(|key| non_empty(fields.get(*key).and_then(Json::as_str))),
        _ => None,
    }
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
