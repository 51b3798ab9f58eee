//! Request/response contract of the remote export services
//!
//! The PDF and DOCX services run elsewhere. Both accept the same JSON body,
//! render it, store the bytes under a generated key and answer with a
//! signed download link. This module holds that contract so the gateway
//! and the services agree on one definition, and so tests can stand in for
//! a real service.

use crate::renderer::ExportTarget;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Longest file name stem kept in a storage key
const MAX_FILENAME_LEN: usize = 120;

/// Stem used when the request carries no usable filename hint
const DEFAULT_FILENAME: &str = "document";

/// Headers sent with every reply
pub const REPLY_HEADERS: &[(&str, &str)] = &[
    ("Content-Type", "application/json"),
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "*"),
    ("Access-Control-Allow-Methods", "OPTIONS,POST"),
];

/// Input errors rejected before any rendering happens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Invalid JSON input")]
    InvalidJson,

    #[error("Missing html")]
    MissingHtml,
}

/// The part of an export request a service acts on
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingExport {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub filename_hint: Option<String>,
}

/// An HTTP reply from an export service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ServiceReply {
    fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: REPLY_HEADERS
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            body: body.to_string(),
        }
    }

    /// 200 with the storage key and its download link
    pub fn success(key: &str, url: &str) -> Self {
        Self::json(200, json!({ "key": key, "url": url }))
    }

    /// Error reply with a human-readable message
    pub fn failure(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }
}

impl From<ServiceError> for ServiceReply {
    fn from(error: ServiceError) -> Self {
        ServiceReply::failure(400, &error.to_string())
    }
}

/// Parse and validate an export request body
///
/// # Returns
/// * `Ok(IncomingExport)` - A request with non-empty HTML
/// * `Err(ServiceError)` - The body is not JSON, or carries no HTML
pub fn parse_request(body: &str) -> Result<IncomingExport, ServiceError> {
    let request: IncomingExport =
        serde_json::from_str(body).map_err(|_| ServiceError::InvalidJson)?;
    if request.html.is_empty() {
        return Err(ServiceError::MissingHtml);
    }
    Ok(request)
}

/// Make a filename hint safe for a storage key
///
/// Runs of characters outside `A-Z a-z 0-9 . _ -` become a single `-` and
/// the result is cut to 120 characters. An empty hint becomes `document`.
pub fn safe_filename(hint: Option<&str>) -> String {
    let hint = match hint {
        Some(hint) if !hint.is_empty() => hint,
        _ => DEFAULT_FILENAME,
    };

    let mut safe = String::with_capacity(hint.len());
    let mut in_run = false;
    for c in hint.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            safe.push(c);
            in_run = false;
        } else if !in_run {
            safe.push('-');
            in_run = true;
        }
    }
    // Only ASCII is left, so byte truncation is on a char boundary
    safe.truncate(MAX_FILENAME_LEN);
    safe
}

/// Storage key for an exported artifact
///
/// # Parameters
/// * `kind` - Artifact type; selects the key prefix and extension
/// * `hint` - Filename hint from the request
/// * `millis` - Creation time in milliseconds since the epoch
/// * `nonce` - Unique token keeping simultaneous exports apart
pub fn storage_key(kind: ExportTarget, hint: Option<&str>, millis: u128, nonce: &str) -> String {
    format!(
        "{ext}/{}-{}-{}.{ext}",
        millis,
        nonce,
        safe_filename(hint),
        ext = kind.extension()
    )
}

/// Run one export request through a service
///
/// `render` turns the HTML into the artifact bytes and `upload` stores them
/// under the key with the artifact's content type, returning the download
/// link.
///
/// # Returns
/// * The reply the service sends back: 400 for input errors, 500 when
///   rendering or upload fails, 200 with `{key, url}` otherwise
pub fn handle_export<R, U>(
    kind: ExportTarget,
    body: &str,
    millis: u128,
    nonce: &str,
    render: R,
    upload: U,
) -> ServiceReply
where
    R: FnOnce(&str) -> Result<Vec<u8>, String>,
    U: FnOnce(&str, &str, Vec<u8>) -> Result<String, String>,
{
    let request = match parse_request(body) {
        Ok(request) => request,
        Err(e) => return e.into(),
    };

    let key = storage_key(kind, request.filename_hint.as_deref(), millis, nonce);
    let failed = format!("{} generation failed", kind.extension().to_uppercase());

    let bytes = match render(&request.html) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("{}: {}", failed, e);
            return ServiceReply::failure(500, &failed);
        }
    };

    match upload(&key, kind.content_type(), bytes) {
        Ok(url) => ServiceReply::success(&key, &url),
        Err(e) => {
            log::error!("Upload of {} failed: {}", key, e);
            ServiceReply::failure(500, &failed)
        }
    }
}
