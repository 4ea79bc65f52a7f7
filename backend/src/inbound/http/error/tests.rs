//! Tests for error-to-envelope translation.

use super::*;
use crate::RequestScope;
use crate::domain::Error;
use crate::test_support::FixtureClock;
use actix_web::body::to_bytes;
use actix_web::{App, HttpResponse, test as actix_test, web};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn clock() -> FixtureClock {
    FixtureClock::default()
}

fn scoped(path: &str, disclosure: FaultDisclosure) -> RequestContext {
    RequestContext::new(path, disclosure)
}

#[rstest]
#[case(ErrorCode::BadRequest, StatusCode::BAD_REQUEST)]
#[case(ErrorCode::Unauthorized, StatusCode::UNAUTHORIZED)]
#[case(ErrorCode::Forbidden, StatusCode::FORBIDDEN)]
#[case(ErrorCode::NotFound, StatusCode::NOT_FOUND)]
#[case(ErrorCode::InternalError, StatusCode::INTERNAL_SERVER_ERROR)]
fn status_matches_error_code(#[case] code: ErrorCode, #[case] expected: StatusCode) {
    assert_eq!(status_for(code), expected);
}

#[rstest]
fn not_found_keeps_message_and_request_path(clock: FixtureClock) {
    let fault = Fault::from(Error::not_found("User 7 not found"));
    let context = scoped("/api/users/7", FaultDisclosure::Redact);

    let envelope = translate(&fault, Some(&context), &clock);

    assert!(!envelope.is_success());
    assert_eq!(envelope.status_code(), 404);
    assert_eq!(envelope.message(), Some("User 7 not found"));
    assert_eq!(envelope.path(), "/api/users/7");
    assert!(envelope.payload().is_none());
    assert_eq!(envelope.timestamp(), clock.local().naive_local());
}

#[rstest]
fn known_errors_carry_their_details(clock: FixtureClock) {
    let fault = Fault::from(Error::bad_request("bad").with_details(json!({ "field": "email" })));
    let envelope = translate(&fault, None, &clock);

    assert_eq!(envelope.status_code(), 400);
    assert_eq!(envelope.payload(), Some(&json!({ "field": "email" })));
    assert_eq!(envelope.path(), "N/A");
}

#[rstest]
#[case(Error::unauthorized("login required"), 401)]
#[case(Error::access_denied("admins only"), 403)]
fn access_errors_map_to_their_status(
    clock: FixtureClock,
    #[case] error: Error,
    #[case] expected: u16,
) {
    let message = error.message().to_owned();
    let envelope = translate(&Fault::from(error), None, &clock);

    assert_eq!(envelope.status_code(), expected);
    assert_eq!(envelope.message(), Some(message.as_str()));
    assert!(!envelope.is_success());
}

#[rstest]
fn unclassified_fault_is_disclosed_when_exposed(clock: FixtureClock) {
    let fault = Fault::unclassified("npe");
    let context = scoped("/api/orders", FaultDisclosure::Expose);

    let envelope = translate(&fault, Some(&context), &clock);

    assert!(!envelope.is_success());
    assert_eq!(envelope.status_code(), 500);
    assert_eq!(envelope.message(), Some(INTERNAL_ERROR_MESSAGE));
    assert_eq!(envelope.path(), "/api/orders");
    assert_eq!(envelope.payload(), Some(&json!("npe")));
}

#[rstest]
fn unclassified_fault_is_redacted_by_default(clock: FixtureClock) {
    let fault = Fault::unclassified("connection string postgres://secret");

    let scoped_envelope = translate(
        &fault,
        Some(&scoped("/api/orders", FaultDisclosure::Redact)),
        &clock,
    );
    let unscoped_envelope = translate(&fault, None, &clock);

    for envelope in [scoped_envelope, unscoped_envelope] {
        assert_eq!(envelope.status_code(), 500);
        assert_eq!(envelope.message(), Some(INTERNAL_ERROR_MESSAGE));
        assert!(envelope.payload().is_none());
    }
}

#[rstest]
#[actix_web::test]
async fn error_response_outside_request_scope_uses_default_path() {
    let fault = Fault::from(Error::not_found("missing"));
    let response = ResponseError::error_response(&fault);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = to_bytes(response.into_body()).await.expect("body reads");
    let body: Value = serde_json::from_slice(&bytes).expect("envelope json");
    assert_eq!(body["path"], json!("N/A"));
    assert_eq!(body["success"], json!(false));
}

#[test]
fn actix_errors_become_unclassified() {
    let actix_err = actix_web::error::ErrorBadRequest("boom");
    let fault: Fault = actix_err.into();

    assert_eq!(fault.code(), ErrorCode::InternalError);
    assert!(matches!(fault, Fault::Unclassified { ref message } if message == "boom"));
}

async fn user_seven() -> ApiResult<HttpResponse> {
    Err(Error::not_found("User 7 not found").into())
}

async fn orders() -> ApiResult<HttpResponse> {
    Err(Fault::unclassified("npe"))
}

async fn ledger_entry() -> ApiResult<HttpResponse> {
    let entries: Vec<u32> = Vec::new();
    let first = entries.first().copied().unwrap_or_else(|| panic!("ledger is empty"));
    Ok(HttpResponse::Ok().json(first))
}

async fn call_scoped(disclosure: FaultDisclosure, uri: &str) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new()
            .wrap(RequestScope::new(disclosure))
            .route("/api/users/7", web::get().to(user_seven))
            .route("/api/orders", web::get().to(orders))
            .route("/api/ledger", web::get().to(ledger_entry)),
    )
    .await;
    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
    let status = res.status();
    let body: Value = actix_test::read_body_json(res).await;
    (status, body)
}

#[rstest]
#[actix_web::test]
async fn handler_not_found_is_enveloped_with_request_path() {
    let (status, body) = call_scoped(FaultDisclosure::Redact, "/api/users/7").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["statusCode"], json!(404));
    assert_eq!(body["message"], json!("User 7 not found"));
    assert_eq!(body["path"], json!("/api/users/7"));
    assert_eq!(body["payload"], Value::Null);
}

#[rstest]
#[case(FaultDisclosure::Expose, json!("npe"))]
#[case(FaultDisclosure::Redact, Value::Null)]
#[actix_web::test]
async fn handler_fault_follows_disclosure(
    #[case] disclosure: FaultDisclosure,
    #[case] expected_payload: Value,
) {
    let (status, body) = call_scoped(disclosure, "/api/orders").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["statusCode"], json!(500));
    assert_eq!(body["message"], json!("Internal server error"));
    assert_eq!(body["path"], json!("/api/orders"));
    assert_eq!(body["payload"], expected_payload);
}

#[rstest]
#[case(FaultDisclosure::Expose, json!("ledger is empty"))]
#[case(FaultDisclosure::Redact, Value::Null)]
#[actix_web::test]
async fn handler_panic_is_enveloped_as_unclassified(
    #[case] disclosure: FaultDisclosure,
    #[case] expected_payload: Value,
) {
    let (status, body) = call_scoped(disclosure, "/api/ledger").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["statusCode"], json!(500));
    assert_eq!(body["message"], json!("Internal server error"));
    assert_eq!(body["path"], json!("/api/ledger"));
    assert_eq!(body["payload"], expected_payload);
}
