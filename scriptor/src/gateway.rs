//! Export gateway
//!
//! Posts rendered HTML and page geometry to the remote PDF or DOCX service
//! and turns whatever the service answers into a download link. Services
//! are inconsistent about the response shape, so the link is looked up
//! through a fixed fallback chain:
//!
//! 1. JSON field `url`, then `Location`, `location`, `file`
//! 2. JSON field `key`, joined onto the storage bucket URL
//! 3. The whole body, when it is a bare `http(s)://` URL
//!
//! There is no retry. Any failure is returned once to the caller.

use crate::config::ScriptorConfig;
use crate::geometry::PageGeometry;
use crate::renderer::ExportTarget;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// JSON fields that may carry the download link, in lookup order
const URL_FIELDS: &[&str] = &["url", "Location", "location", "file"];

/// Errors that can occur while requesting an export
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Export request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Export service returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Export succeeded but no URL found:\n{body}")]
    NoUrl { body: String },

    #[error("Failed to serialize export request: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Page size in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

/// Page margins in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

/// Body of an export request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub html: String,
    pub filename_hint: String,
    pub page_size: PageSize,
    pub margins: Margins,
}

impl ExportRequest {
    /// Build a request with the same margin on every side
    pub fn new(html: &str, filename_hint: &str, geometry: &PageGeometry) -> Self {
        let margin = geometry.margin_twips;
        Self {
            html: html.to_string(),
            filename_hint: filename_hint.to_string(),
            page_size: PageSize {
                width: geometry.width_twips,
                height: geometry.height_twips,
            },
            margins: Margins {
                top: margin,
                right: margin,
                bottom: margin,
                left: margin,
            },
        }
    }
}

/// Status and body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a JSON body to an endpoint
///
/// Non-2xx answers are responses, not errors; only failures to get any
/// answer at all are reported as [`GatewayError::Transport`].
pub trait ExportTransport {
    fn post_json(&self, url: &str, body: &str) -> Result<TransportResponse, GatewayError>;
}

/// HTTP transport backed by a `ureq` agent
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl ExportTransport for UreqTransport {
    fn post_json(&self, url: &str, body: &str) -> Result<TransportResponse, GatewayError> {
        let result = self
            .agent
            .post(url)
            .set("Content-Type", "application/json")
            .send_string(body);

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => {
                return Err(GatewayError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
        };

        let status = response.status();
        let body = response
            .into_string()
            .map_err(|e| GatewayError::Transport {
                url: url.to_string(),
                message: format!("failed to read response body: {}", e),
            })?;
        Ok(TransportResponse { status, body })
    }
}

/// Client for the remote export services
pub struct ExportGateway<T: ExportTransport> {
    transport: T,
    pdf_url: String,
    docx_url: String,
    bucket_url: String,
}

impl ExportGateway<UreqTransport> {
    /// Gateway using HTTP and the endpoints from `config`
    pub fn from_config(config: &ScriptorConfig) -> Self {
        let transport = UreqTransport::new(Duration::from_secs(config.export.timeout_secs));
        Self::with_transport(transport, config)
    }
}

impl<T: ExportTransport> ExportGateway<T> {
    /// Gateway using a custom transport
    pub fn with_transport(transport: T, config: &ScriptorConfig) -> Self {
        Self {
            transport,
            pdf_url: config.export.pdf_url.clone(),
            docx_url: config.export.docx_url.clone(),
            bucket_url: config.storage.bucket_url(),
        }
    }

    /// Endpoint for an export kind
    pub fn endpoint(&self, kind: ExportTarget) -> &str {
        match kind {
            ExportTarget::Pdf => &self.pdf_url,
            ExportTarget::Docx => &self.docx_url,
        }
    }

    /// Request an export and return its download link
    ///
    /// # Parameters
    /// * `kind` - Which service to call
    /// * `html` - Fully rendered document HTML
    /// * `filename_hint` - Name the service uses for the stored file
    /// * `geometry` - Page size and margins
    ///
    /// # Returns
    /// * `Ok(String)` - Download link
    /// * `Err(GatewayError)` - Transport failure, non-2xx status, or no link
    ///   in the response
    pub fn request_export(
        &self,
        kind: ExportTarget,
        html: &str,
        filename_hint: &str,
        geometry: &PageGeometry,
    ) -> Result<String, GatewayError> {
        let url = self.endpoint(kind);
        let request = ExportRequest::new(html, filename_hint, geometry);
        let body = serde_json::to_string(&request)?;

        log::info!(
            "Requesting {} export of '{}' ({} bytes of HTML) from {}",
            kind,
            filename_hint,
            html.len(),
            url
        );
        let response = self.transport.post_json(url, &body)?;

        if !(200..300).contains(&response.status) {
            log::warn!("{} export rejected with HTTP {}", kind, response.status);
            return Err(GatewayError::Rejected {
                status: response.status,
                body: response.body,
            });
        }

        let link = extract_download_url(&response.body, &self.bucket_url)?;
        log::info!("{} export ready at {}", kind, link);
        Ok(link)
    }
}

/// Filename hint for a document title (`document` when blank)
pub fn filename_hint(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        "document".to_string()
    } else {
        title.to_string()
    }
}

/// Find the download link in an export response body
///
/// # Parameters
/// * `body` - Raw response body
/// * `bucket_url` - Prefix (ending in `/`) for links built from a bare key
///
/// # Returns
/// * `Ok(String)` - The download link
/// * `Err(GatewayError::NoUrl)` - Nothing usable; the error carries the body
pub fn extract_download_url(body: &str, bucket_url: &str) -> Result<String, GatewayError> {
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str::<serde_json::Value>(body)
    {
        let field = |name: &str| {
            fields
                .get(name)
                .and_then(|value| value.as_str())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = URL_FIELDS.iter().find_map(|name| field(name)) {
            return Ok(url.to_string());
        }
        if let Some(key) = field("key") {
            log::debug!("Response carries only a storage key, building bucket URL");
            return Ok(format!("{}{}", bucket_url, key));
        }
    }

    let trimmed = body.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(trimmed.to_string());
    }

    Err(GatewayError::NoUrl {
        body: body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{handle_export, ServiceReply};
    use std::cell::RefCell;

    const BUCKET: &str = "https://crafted-scriptor-exports.s3.ca-central-1.amazonaws.com/";

    /// Transport answering with a fixed reply and recording what was sent
    struct FixedTransport {
        reply: TransportResponse,
        sent: RefCell<Vec<(String, String)>>,
    }

    impl FixedTransport {
        fn new(status: u16, body: &str) -> Self {
            Self {
                reply: TransportResponse {
                    status,
                    body: body.to_string(),
                },
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl ExportTransport for FixedTransport {
        fn post_json(&self, url: &str, body: &str) -> Result<TransportResponse, GatewayError> {
            self.sent
                .borrow_mut()
                .push((url.to_string(), body.to_string()));
            Ok(self.reply.clone())
        }
    }

    /// Transport running the service contract in-process
    struct InProcessService;

    impl ExportTransport for InProcessService {
        fn post_json(&self, url: &str, body: &str) -> Result<TransportResponse, GatewayError> {
            let kind = if url.ends_with("/docx") {
                ExportTarget::Docx
            } else {
                ExportTarget::Pdf
            };
            let reply: ServiceReply = handle_export(
                kind,
                body,
                42,
                "nonce",
                |html| Ok(html.as_bytes().to_vec()),
                |key, _, _| Ok(format!("https://signed.example/{}?sig=1", key)),
            );
            Ok(TransportResponse {
                status: reply.status,
                body: reply.body,
            })
        }
    }

    #[test]
    fn test_url_field_wins() {
        let body = r#"{"key":"pdf/a.pdf","url":"https://signed/a","Location":"https://loc"}"#;
        assert_eq!(extract_download_url(body, BUCKET).unwrap(), "https://signed/a");
    }

    #[test]
    fn test_field_precedence() {
        assert_eq!(
            extract_download_url(r#"{"location":"l","Location":"L"}"#, BUCKET).unwrap(),
            "L"
        );
        assert_eq!(
            extract_download_url(r#"{"file":"f","location":"l"}"#, BUCKET).unwrap(),
            "l"
        );
        assert_eq!(
            extract_download_url(r#"{"file":"https://f"}"#, BUCKET).unwrap(),
            "https://f"
        );
    }

    #[test]
    fn test_key_builds_bucket_url() {
        let url = extract_download_url(r#"{"key":"pdf/abc.pdf"}"#, BUCKET).unwrap();
        assert_eq!(
            url,
            "https://crafted-scriptor-exports.s3.ca-central-1.amazonaws.com/pdf/abc.pdf"
        );
    }

    #[test]
    fn test_bare_url_body() {
        assert_eq!(
            extract_download_url("https://x/y.pdf", BUCKET).unwrap(),
            "https://x/y.pdf"
        );
        assert_eq!(
            extract_download_url("  http://x/y.pdf\n", BUCKET).unwrap(),
            "http://x/y.pdf"
        );
    }

    #[test]
    fn test_no_url_error_embeds_body() {
        let err = extract_download_url("{}", BUCKET).unwrap_err();
        assert!(matches!(err, GatewayError::NoUrl { .. }));
        assert_eq!(err.to_string(), "Export succeeded but no URL found:\n{}");

        let err = extract_download_url("ftp://nope", BUCKET).unwrap_err();
        assert!(err.to_string().contains("ftp://nope"));
    }

    #[test]
    fn test_empty_fields_are_skipped() {
        let body = r#"{"url":"","key":"docx/k.docx"}"#;
        assert!(extract_download_url(body, BUCKET)
            .unwrap()
            .ends_with("/docx/k.docx"));
    }

    #[test]
    fn test_request_body_shape() {
        let transport = FixedTransport::new(200, r#"{"url":"https://done"}"#);
        let gateway = ExportGateway::with_transport(transport, &ScriptorConfig::default());
        let geometry = PageGeometry::default();

        let url = gateway
            .request_export(ExportTarget::Docx, "<p>x</p>", "Book", &geometry)
            .unwrap();
        assert_eq!(url, "https://done");

        let sent = gateway.transport.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].0.ends_with("/export/docx"));
        let value: serde_json::Value = serde_json::from_str(&sent[0].1).unwrap();
        assert_eq!(value["html"], "<p>x</p>");
        assert_eq!(value["filenameHint"], "Book");
        assert_eq!(value["pageSize"]["width"], 12240);
        assert_eq!(value["pageSize"]["height"], 15840);
        assert_eq!(value["margins"]["left"], 1440);
    }

    #[test]
    fn test_non_success_status_is_rejected() {
        let transport = FixedTransport::new(500, r#"{"error":"PDF generation failed"}"#);
        let gateway = ExportGateway::with_transport(transport, &ScriptorConfig::default());
        let err = gateway
            .request_export(ExportTarget::Pdf, "<p>x</p>", "Book", &PageGeometry::default())
            .unwrap_err();
        match err {
            GatewayError::Rejected { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("PDF generation failed"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_round_trip_through_service_contract() {
        let gateway = ExportGateway::with_transport(InProcessService, &ScriptorConfig::default());
        let url = gateway
            .request_export(ExportTarget::Pdf, "<p>x</p>", "My Book", &PageGeometry::default())
            .unwrap();
        assert_eq!(url, "https://signed.example/pdf/42-nonce-My-Book.pdf?sig=1");
    }

    #[test]
    fn test_filename_hint() {
        assert_eq!(filename_hint("  My Book "), "My Book");
        assert_eq!(filename_hint(" "), "document");
    }
}
