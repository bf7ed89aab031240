//! Wire types and request plumbing for the reports API.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::ReportStatus;

pub const REPORTS_PATH: &str = "/api/reports";

/// Server-assigned report identifier. The API serves numeric ids; treat
/// them as opaque beyond equality.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReportId(pub i64);

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A server-owned report. The cached copy is a disposable projection and
/// never the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    #[serde(default)]
    pub created_at: String,
    pub description: String,
    pub reporter_name: String,
    pub reporter_phone: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub assigned_ngo: Option<String>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    pub status: ReportStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateReportResponse {
    pub id: ReportId,
    pub message: String,
    #[serde(default)]
    pub assigned_ngo: Option<String>,
    #[serde(default)]
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ReportStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// Message for a non-2xx response: the body's `error` field when present,
/// else a generic status-code line.
#[must_use]
pub fn error_message(status: u16, body: &[u8]) -> String {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    if parsed.error.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        parsed.error
    }
}

pub fn reports_url(api_base: &str, only_open: bool) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(api_base)?.join(REPORTS_PATH)?;
    if only_open {
        url.query_pairs_mut().append_pair("onlyOpen", "true");
    }
    Ok(url)
}

pub fn report_status_url(api_base: &str, id: ReportId) -> Result<Url, url::ParseError> {
    Url::parse(api_base)?.join(&format!("{REPORTS_PATH}/{id}/status"))
}

/// Image assets are served relative to the API origin.
#[must_use]
pub fn image_url(api_base: &str, image_path: &str) -> Option<String> {
    let url = Url::parse(api_base).ok()?.join(image_path).ok()?;
    Some(url.to_string())
}

#[must_use]
pub fn maps_url(lat: f64, lon: f64) -> String {
    format!("https://www.google.com/maps/search/?api=1&query={lat},{lon}")
}

/// Minimal `multipart/form-data` writer for the create-report request.
///
/// The report endpoint takes text fields plus an optional photo part, which
/// is little enough that the framing is written out directly.
#[derive(Debug)]
pub struct MultipartForm {
    boundary: String,
    buf: Vec<u8>,
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: format!("rescue-core-{}", Uuid::new_v4().simple()),
            buf: Vec::new(),
        }
    }

    pub fn text(&mut self, name: &str, value: &str) {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n",
                self.boundary, name
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
    }

    pub fn file(&mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) {
        let file_name = file_name.replace('"', "_");
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: {}\r\n\r\n",
                self.boundary, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
    }

    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.buf
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}
