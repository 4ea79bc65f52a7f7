//! HTTP inbound adapter exposing REST endpoints.
//!
//! Every response, including framework-level failures such as malformed JSON,
//! bad path parameters and unknown routes, is wrapped in the envelope.

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};

use crate::domain::{Error, Fault};

pub mod envelope;
pub mod error;
pub mod identity;
pub mod state;
pub mod users;

pub use error::ApiResult;

/// Register extractor error handlers and the versioned API scope.
///
/// # Examples
/// ```no_run
/// use actix_web::{App, web};
/// use backend::inbound::http::{self, state::HttpState};
///
/// # fn build(state: HttpState) {
/// let _app = App::new()
///     .app_data(web::Data::new(state))
///     .configure(http::configure)
///     .default_service(web::to(http::route_not_found));
/// # }
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(web::scope("/api/v1").configure(users::configure));
}

/// Fallback handler for requests matching no route.
pub async fn route_not_found(req: HttpRequest) -> ApiResult<HttpResponse> {
    Err(Error::not_found(format!("No route for {} {}", req.method(), req.path())).into())
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Fault::from(Error::bad_request(format!("invalid JSON body: {err}"))).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Fault::from(Error::bad_request(format!("invalid query string: {err}"))).into()
}

fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    Fault::from(Error::bad_request(format!("invalid path parameter: {err}"))).into()
}
