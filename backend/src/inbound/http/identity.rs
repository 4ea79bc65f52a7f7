//! Caller identity extraction.
//!
//! Authentication happens upstream; the gateway asserts the principal name in
//! the `x-authenticated-user` header. Handlers receive the result as an
//! explicit [`SecurityContext`] and pass it into domain services.

use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};
use tracing::warn;

use crate::domain::{ANONYMOUS_PRINCIPAL, Authentication, SecurityContext};

/// Header carrying the authenticated principal name.
pub const AUTHENTICATED_USER_HEADER: &str = "x-authenticated-user";

/// Build the security context asserted by `headers`.
///
/// - Missing header: [`SecurityContext::Empty`].
/// - The anonymous principal: an unauthenticated [`Authentication`].
/// - Unreadable value: [`SecurityContext::Unavailable`].
/// - Anything else: an authenticated principal with that name.
#[must_use]
pub fn security_context_from_headers(headers: &HeaderMap) -> SecurityContext {
    let Some(value) = headers.get(AUTHENTICATED_USER_HEADER) else {
        return SecurityContext::Empty;
    };
    match value.to_str() {
        Ok(ANONYMOUS_PRINCIPAL) => Authentication::unauthenticated(ANONYMOUS_PRINCIPAL).into(),
        Ok(name) => SecurityContext::authenticated(name),
        Err(error) => {
            warn!(%error, "authenticated user header is not visible ASCII");
            SecurityContext::unavailable(format!("unreadable {AUTHENTICATED_USER_HEADER} header"))
        }
    }
}

/// Extractor wrapping the caller's [`SecurityContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext(pub SecurityContext);

impl CallerContext {
    /// Borrow the wrapped context.
    #[must_use]
    pub fn security(&self) -> &SecurityContext {
        &self.0
    }
}

impl FromRequest for CallerContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self(security_context_from_headers(req.headers()))))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::resolve_auditor;
    use actix_web::http::header::HeaderValue;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    fn headers_with(value: HeaderValue) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            actix_web::http::header::HeaderName::from_static(AUTHENTICATED_USER_HEADER),
            value,
        );
        headers
    }

    #[rstest]
    fn missing_header_is_empty_context() {
        assert_eq!(
            security_context_from_headers(&HeaderMap::new()),
            SecurityContext::Empty
        );
    }

    #[rstest]
    #[case("ada", "ada")]
    #[case("anonymousUser", "ANONYMOUS")]
    #[case("", "SYSTEM")]
    fn header_values_resolve_to_auditors(#[case] raw: &'static str, #[case] expected: &str) {
        let context = security_context_from_headers(&headers_with(HeaderValue::from_static(raw)));
        assert_eq!(resolve_auditor(&context).as_str(), expected);
    }

    #[rstest]
    fn opaque_bytes_are_a_resolution_fault() {
        let value = HeaderValue::from_bytes(b"caf\xe9").expect("opaque header bytes");
        let context = security_context_from_headers(&headers_with(value));

        assert!(matches!(context, SecurityContext::Unavailable { .. }));
        assert_eq!(resolve_auditor(&context).as_str(), "SYSTEM");
    }

    #[actix_web::test]
    async fn extractor_reads_request_headers() {
        let req = TestRequest::default()
            .insert_header((AUTHENTICATED_USER_HEADER, "grace"))
            .to_http_request();
        let caller = CallerContext::extract(&req).await.expect("extraction succeeds");
        assert_eq!(caller.security(), &SecurityContext::authenticated("grace"));
    }
}
