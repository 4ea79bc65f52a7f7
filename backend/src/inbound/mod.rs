//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! HTTP handlers and the error-to-envelope translator live under [`http`].

pub mod http;
