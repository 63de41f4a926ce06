//! ApiClient - handles communication with the attendance server.

use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::device::Snapshot;

/// The environment variable holding the attendance server base URL.
pub const SERVER_URL_ENV: &str = "ATTENDANCE_SERVER";

/// Default base URL for a locally running attendance server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Path of the face recognition endpoint.
pub const RECOGNITION_PATH: &str = "/api/face_recognition";

/// Path of the attendance records endpoint.
pub const RECORDS_PATH: &str = "/api/attendance_records";

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Request body for face recognition.
#[derive(Debug, Serialize)]
struct RecognizeRequest {
    /// Data-URL encoded snapshot. The server strips the prefix before
    /// decoding, so the `data:<mime>;base64,` form is part of the wire
    /// contract.
    image: String,
}

/// Reply from the recognition endpoint.
///
/// The server answers 200 for both matches and business-level failures;
/// `success` carries the distinction.
#[derive(Debug, Clone, Deserialize)]
pub struct RecognizeReply {
    pub success: bool,
    #[serde(default)]
    pub student_name: Option<String>,
    /// Confidence on a 0-100 scale.
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply from the records endpoint.
#[derive(Debug, Deserialize)]
struct RecordsReply {
    success: bool,
    #[serde(default)]
    records: Vec<AttendanceRecord>,
    #[serde(default)]
    message: Option<String>,
}

/// One attendance record as served by the records endpoint.
///
/// Unknown fields (the server also sends a numeric row id) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub student_name: String,
    pub status: String,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Errors from talking to the attendance server.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {status}: {body}")]
    Server { status: u16, body: String },

    #[error("API error: {0}")]
    Api(String),
}

/// Submits snapshots to the recognition service.
///
/// This is the seam the capture workflow depends on; the HTTP client and the
/// test doubles both implement it.
pub trait RecognitionClient {
    fn recognize(
        &self,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<RecognizeReply, ApiError>>;
}

/// Read-only query for the recent attendance list.
pub trait AttendanceRecordsQuery {
    fn recent_records(&self) -> impl Future<Output = Result<Vec<AttendanceRecord>, ApiError>>;
}

impl<C: RecognitionClient> RecognitionClient for &C {
    fn recognize(
        &self,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<RecognizeReply, ApiError>> {
        (**self).recognize(snapshot)
    }
}

impl<Q: AttendanceRecordsQuery> AttendanceRecordsQuery for &Q {
    fn recent_records(&self) -> impl Future<Output = Result<Vec<AttendanceRecord>, ApiError>> {
        (**self).recent_records()
    }
}

/// Client for the attendance server's JSON API.
pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the given base URL with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: normalize_base_url(base_url.into()),
            http_client,
        })
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: normalize_base_url(base_url.into()),
            http_client,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_recognition(&self, snapshot: &Snapshot) -> Result<RecognizeReply, ApiError> {
        let url = format!("{}{}", self.base_url, RECOGNITION_PATH);
        let body = RecognizeRequest {
            image: image_payload(snapshot),
        };

        let response = self.http_client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Server { status, body });
        }

        Ok(response.json().await?)
    }

    async fn get_records(&self) -> Result<Vec<AttendanceRecord>, ApiError> {
        let url = format!("{}{}", self.base_url, RECORDS_PATH);

        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Server { status, body });
        }

        let reply: RecordsReply = response.json().await?;
        if !reply.success {
            return Err(ApiError::Api(
                reply
                    .message
                    .unwrap_or_else(|| "records query failed".to_string()),
            ));
        }
        Ok(reply.records)
    }
}

impl RecognitionClient for ApiClient {
    fn recognize(
        &self,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<RecognizeReply, ApiError>> {
        self.post_recognition(snapshot)
    }
}

impl AttendanceRecordsQuery for ApiClient {
    fn recent_records(&self) -> impl Future<Output = Result<Vec<AttendanceRecord>, ApiError>> {
        self.get_records()
    }
}

/// Encode a snapshot as the data-URL payload the server expects.
pub fn image_payload(snapshot: &Snapshot) -> String {
    format!(
        "data:{};base64,{}",
        snapshot.mime,
        BASE64.encode(&snapshot.data)
    )
}

fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
