//! Uniform response envelope.
//!
//! Every response body, success or failure, has the shape
//! `{success, statusCode, message, timestamp, path, payload}`. The builder is
//! pure apart from the injected clock: it reads the local wall clock once,
//! when [`ApiResponseBuilder::build_with_clock`] runs.

use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder};
use chrono::NaiveDateTime;
use mockable::{Clock, DefaultClock};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path recorded when no request is supplied.
pub const DEFAULT_PATH: &str = "N/A";

/// Fixed timestamp pattern of the envelope.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Canonical response body.
///
/// ## Invariants
/// - `status_code` is the HTTP status the envelope is sent with.
/// - `message` and `payload` serialise as `null` when absent.
///
/// # Examples
/// ```
/// use actix_web::http::StatusCode;
/// use backend::inbound::http::envelope::ApiResponse;
///
/// let envelope = ApiResponse::with_status(StatusCode::NOT_FOUND)
///     .message("X not found")
///     .path("/api/x/1")
///     .build();
/// assert!(!envelope.is_success());
/// assert_eq!(envelope.status_code(), 404);
/// assert!(envelope.payload().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T = Value> {
    success: bool,
    status_code: u16,
    message: Option<String>,
    #[serde(with = "timestamp_format")]
    timestamp: NaiveDateTime,
    path: String,
    payload: Option<T>,
}

impl ApiResponse {
    /// Start a success envelope: status 200, `success = true`.
    #[must_use]
    pub fn success() -> ApiResponseBuilder {
        ApiResponseBuilder::new(StatusCode::OK, Some(true))
    }

    /// Start an error envelope: status 400, `success = false`.
    #[must_use]
    pub fn error() -> ApiResponseBuilder {
        ApiResponseBuilder::new(StatusCode::BAD_REQUEST, Some(false))
    }

    /// Start an envelope whose success flag follows the status class.
    #[must_use]
    pub fn with_status(status: StatusCode) -> ApiResponseBuilder {
        ApiResponseBuilder::new(status, None)
    }
}

impl<T> ApiResponse<T> {
    /// Whether the envelope reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// HTTP status the envelope is sent with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Human-readable message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Local wall-clock time the envelope was built.
    #[must_use]
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Request path, or `N/A` when none was recorded.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Response data or error details.
    #[must_use]
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Render the envelope with its own status.
    pub fn into_http_response(self) -> HttpResponse {
        HttpResponse::build(self.status()).json(self)
    }
}

impl<T: Serialize> Responder for ApiResponse<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        self.into_http_response()
    }
}

/// Builder for [`ApiResponse`]. Every field is optional.
#[derive(Debug, Clone)]
#[must_use]
pub struct ApiResponseBuilder<T = Value> {
    status: StatusCode,
    success: Option<bool>,
    message: Option<String>,
    path: Option<String>,
    payload: Option<T>,
}

impl ApiResponseBuilder {
    fn new(status: StatusCode, success: Option<bool>) -> Self {
        Self {
            status,
            success,
            message: None,
            path: None,
            payload: None,
        }
    }
}

impl<T> ApiResponseBuilder<T> {
    /// Set the HTTP status.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Force the success flag instead of deriving it from the status.
    pub fn success_flag(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Set the message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the request path explicitly.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Record the path of `req`, without its query string.
    pub fn request(self, req: &HttpRequest) -> Self {
        let path = req.path().to_owned();
        self.path(path)
    }

    /// Attach a payload.
    pub fn payload<U>(self, payload: U) -> ApiResponseBuilder<U> {
        self.optional_payload(Some(payload))
    }

    /// Attach a payload that may be absent.
    pub fn optional_payload<U>(self, payload: Option<U>) -> ApiResponseBuilder<U> {
        ApiResponseBuilder {
            status: self.status,
            success: self.success,
            message: self.message,
            path: self.path,
            payload,
        }
    }

    /// Build, timestamping from the system clock.
    pub fn build(self) -> ApiResponse<T> {
        self.build_with_clock(&DefaultClock)
    }

    /// Build, timestamping from `clock`'s local time.
    pub fn build_with_clock(self, clock: &dyn Clock) -> ApiResponse<T> {
        ApiResponse {
            success: self.success.unwrap_or_else(|| self.status.is_success()),
            status_code: self.status.as_u16(),
            message: self.message,
            timestamp: clock.local().naive_local(),
            path: self.path.unwrap_or_else(|| DEFAULT_PATH.to_owned()),
            payload: self.payload,
        }
    }
}
