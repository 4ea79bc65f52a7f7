//! Error-to-envelope translation.
//!
//! Purpose: keep the domain error taxonomy HTTP-agnostic while turning every
//! [`Fault`] that leaves a handler into exactly one envelope. Known taxonomy
//! errors keep their own status, message and details; anything else becomes a
//! 500 whose detail is disclosed only when the request scope allows it.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use mockable::{Clock, DefaultClock};
use serde_json::Value;
use tracing::{debug, error};

use crate::domain::{ErrorCode, Fault};
use crate::inbound::http::envelope::{ApiResponse, DEFAULT_PATH};
use crate::middleware::{FaultDisclosure, RequestContext};

/// Message sent for every unclassified fault.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Fault>;

/// HTTP status belonging to each error code.
#[must_use]
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the envelope for `fault`.
///
/// `context` supplies the request path and disclosure policy; without one the
/// path is `"N/A"` and unclassified detail is redacted.
///
/// # Examples
/// ```
/// use backend::domain::{Error, Fault};
/// use backend::inbound::http::error::translate;
/// use backend::middleware::{FaultDisclosure, RequestContext};
/// use mockable::DefaultClock;
///
/// let context = RequestContext::new("/api/users/7", FaultDisclosure::Redact);
/// let fault = Fault::from(Error::not_found("User 7 not found"));
/// let envelope = translate(&fault, Some(&context), &DefaultClock);
/// assert_eq!(envelope.status_code(), 404);
/// assert_eq!(envelope.path(), "/api/users/7");
/// ```
pub fn translate(
    fault: &Fault,
    context: Option<&RequestContext>,
    clock: &dyn Clock,
) -> ApiResponse<Value> {
    let path = context.map_or(DEFAULT_PATH, RequestContext::path);
    let builder = match fault {
        Fault::Known(err) => {
            debug!(code = %err.code(), %path, message = err.message(), "taxonomy error translated");
            ApiResponse::with_status(status_for(err.code()))
                .message(err.message())
                .optional_payload(err.details().cloned())
        }
        Fault::Unclassified { message } => {
            error!(%path, fault = %message, "unclassified fault translated");
            let disclosure = context.map_or(FaultDisclosure::Redact, RequestContext::disclosure);
            let payload = match disclosure {
                FaultDisclosure::Expose => Some(Value::String(message.clone())),
                FaultDisclosure::Redact => None,
            };
            ApiResponse::with_status(StatusCode::INTERNAL_SERVER_ERROR)
                .message(INTERNAL_ERROR_MESSAGE)
                .optional_payload(payload)
        }
    };
    builder
        .success_flag(false)
        .path(path)
        .build_with_clock(clock)
}

impl ResponseError for Fault {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let context = RequestContext::current();
        translate(self, context.as_ref(), &DefaultClock).into_http_response()
    }
}

impl From<actix_web::Error> for Fault {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to unclassified fault");
        Fault::unclassified(err)
    }
}

#[cfg(test)]
mod tests;
