//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use backend::middleware::FaultDisclosure;
use mockable::{Clock, DefaultClock};

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) disclosure: FaultDisclosure,
    pub(crate) clock: Arc<dyn Clock>,
}

impl ServerConfig {
    /// Construct a configuration binding `bind_addr` with redacted faults and
    /// the system clock.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            disclosure: FaultDisclosure::default(),
            clock: Arc::new(DefaultClock),
        }
    }

    /// Choose whether unclassified fault messages reach clients.
    #[must_use]
    pub fn with_disclosure(mut self, disclosure: FaultDisclosure) -> Self {
        self.disclosure = disclosure;
        self
    }

    /// Replace the clock used for lifecycle timestamps.
    #[cfg_attr(
        not(test),
        expect(dead_code, reason = "Swapped for a fixture clock in tests")
    )]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
