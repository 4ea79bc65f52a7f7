//! Application settings loaded via OrthoConfig.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::middleware::FaultDisclosure;

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 8080;

/// Error raised when the configured host is not an IP address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid host address: {host}")]
pub struct InvalidHost {
    host: String,
}

/// Settings controlling the HTTP listener and fault disclosure.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SCAFFOLD")]
pub struct AppSettings {
    /// Address to bind; defaults to all interfaces.
    pub host: Option<String>,
    /// Port to bind.
    pub port: Option<u16>,
    /// Attach unclassified fault messages to error envelopes.
    #[ortho_config(default = false)]
    pub expose_fault_details: bool,
}

impl AppSettings {
    /// Return the configured port, falling back to the default.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Resolve the socket address the server binds to.
    ///
    /// # Errors
    /// Returns [`InvalidHost`] when `host` does not parse as an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr, InvalidHost> {
        let ip = match self.host.as_deref() {
            None => DEFAULT_HOST,
            Some(raw) => raw.parse().map_err(|_| InvalidHost {
                host: raw.to_owned(),
            })?,
        };
        Ok(SocketAddr::new(ip, self.port()))
    }

    /// Disclosure policy for unclassified faults.
    pub fn fault_disclosure(&self) -> FaultDisclosure {
        FaultDisclosure::from_flag(self.expose_fault_details)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("scaffold-backend")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env([
            ("SCAFFOLD_HOST", None::<String>),
            ("SCAFFOLD_PORT", None::<String>),
            ("SCAFFOLD_EXPOSE_FAULT_DETAILS", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.port(), DEFAULT_PORT);
        assert_eq!(
            settings.bind_addr(),
            Ok(SocketAddr::new(DEFAULT_HOST, DEFAULT_PORT))
        );
        assert_eq!(settings.fault_disclosure(), FaultDisclosure::Redact);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("SCAFFOLD_HOST", Some("127.0.0.1".to_owned())),
            ("SCAFFOLD_PORT", Some("9090".to_owned())),
            ("SCAFFOLD_EXPOSE_FAULT_DETAILS", Some("true".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr(),
            Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9090))
        );
        assert_eq!(settings.fault_disclosure(), FaultDisclosure::Expose);
    }

    #[rstest]
    fn unparseable_host_is_rejected() {
        let settings = AppSettings {
            host: Some("not a host".to_owned()),
            port: None,
            expose_fault_details: false,
        };
        assert_eq!(
            settings.bind_addr(),
            Err(InvalidHost {
                host: "not a host".to_owned()
            })
        );
    }
}
