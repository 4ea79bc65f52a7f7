//! Middleware establishing the per-request context.
//!
//! Each incoming request receives a UUID trace identifier, returned in the
//! `trace-id` response header, and a [`RequestContext`] held in task-local
//! storage for the duration of the request. The error translator reads the
//! context to fill in the envelope path and to decide whether unclassified
//! fault detail may be disclosed.
//!
//! Tokio task-local variables are not inherited across spawned tasks. Use
//! [`RequestContext::scope`] when moving request work onto another task.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use mockable::DefaultClock;
use tokio::task_local;
use tracing::{Instrument, error, info_span};
use uuid::Uuid;

use crate::domain::Fault;
use crate::inbound::http::error::translate;

/// Response header carrying the request's trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// Whether raw detail of unclassified faults reaches clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultDisclosure {
    /// Put the fault's own message in the envelope payload.
    Expose,
    /// Keep the payload `null`.
    #[default]
    Redact,
}

impl FaultDisclosure {
    /// Map the `expose_fault_details` setting onto a policy.
    #[must_use]
    pub const fn from_flag(expose: bool) -> Self {
        if expose { Self::Expose } else { Self::Redact }
    }
}

/// Request facts available to code running inside the request scope.
///
/// # Examples
/// ```
/// use backend::middleware::{FaultDisclosure, RequestContext};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let context = RequestContext::new("/api/orders", FaultDisclosure::Redact);
/// let path = RequestContext::scope(context, async {
///     RequestContext::current().map(|ctx| ctx.path().to_owned())
/// })
/// .await;
/// assert_eq!(path.as_deref(), Some("/api/orders"));
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    trace_id: Uuid,
    path: String,
    disclosure: FaultDisclosure,
}

impl RequestContext {
    /// Context for `path` with a freshly generated trace identifier.
    pub fn new(path: impl Into<String>, disclosure: FaultDisclosure) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            path: path.into(),
            disclosure,
        }
    }

    /// Trace identifier of the request.
    #[must_use]
    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Disclosure policy in force for the request.
    #[must_use]
    pub fn disclosure(&self) -> FaultDisclosure {
        self.disclosure
    }

    /// Returns the current context if one is in scope.
    #[must_use]
    #[rustfmt::skip]
    pub fn current() -> Option<Self> { REQUEST_CONTEXT.try_with(|context| context.clone()).ok() }

    /// Execute `fut` with `context` in scope.
    pub async fn scope<Fut>(context: RequestContext, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        REQUEST_CONTEXT.scope(context, fut).await
    }
}

/// Middleware attaching a [`RequestContext`] and a `trace-id` header to every
/// request.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use backend::RequestScope;
/// use backend::middleware::FaultDisclosure;
///
/// let app = App::new().wrap(RequestScope::new(FaultDisclosure::Redact));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestScope {
    disclosure: FaultDisclosure,
}

impl RequestScope {
    /// Scope requests under the given disclosure policy.
    #[must_use]
    pub const fn new(disclosure: FaultDisclosure) -> Self {
        Self { disclosure }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestScope
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestScopeMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestScopeMiddleware {
            service,
            disclosure: self.disclosure,
        }))
    }
}

/// Service wrapper produced by [`RequestScope`].
///
/// Applications should not use this type directly. A panic raised by the
/// wrapped service is answered with an unclassified-fault envelope.
pub struct RequestScopeMiddleware<S> {
    service: S,
    disclosure: FaultDisclosure,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_owned()
    }
}

impl<S, B> Service<ServiceRequest> for RequestScopeMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let context = RequestContext::new(req.path(), self.disclosure);
        let trace_id = context.trace_id();
        let span = info_span!(
            "request",
            %trace_id,
            method = %req.method(),
            path = %req.path(),
        );
        let http_req = req.request().clone();
        // Inner services may do synchronous work in `call`; keep the context
        // visible there as well as in the returned future.
        let called = REQUEST_CONTEXT.sync_scope(context.clone(), || {
            let _entered = span.enter();
            panic::catch_unwind(AssertUnwindSafe(|| self.service.call(req)))
        });
        let header_value = trace_id.to_string();
        Box::pin(
            RequestContext::scope(context.clone(), async move {
                let outcome = match called {
                    Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
                    Err(payload) => Err(payload),
                };
                let mut res = match outcome {
                    Ok(res) => res?.map_into_boxed_body(),
                    Err(payload) => {
                        let fault = Fault::unclassified(panic_message(payload.as_ref()));
                        let envelope = translate(&fault, Some(&context), &DefaultClock);
                        ServiceResponse::new(http_req, envelope.into_http_response())
                    }
                };
                match HeaderValue::from_str(&header_value) {
                    Ok(value) => {
                        res.response_mut()
                            .headers_mut()
                            .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                    }
                    Err(error) => {
                        error!(%error, %trace_id, "failed to encode trace identifier header");
                    }
                }
                Ok(res)
            })
            .instrument(span),
        )
    }
}
