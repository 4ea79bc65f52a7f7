//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such as
//! trace correlation and the per-request context read by the error translator.

pub mod request_scope;

pub use request_scope::{
    FaultDisclosure, RequestContext, RequestScope, RequestScopeMiddleware, TRACE_ID_HEADER,
};
