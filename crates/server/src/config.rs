//! Configuration loading and validation for the MVRP server.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::server::state::Limits;

/// Validated server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Socket address the TLS listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Filesystem path to the PEM-encoded certificate chain. **Required.**
    pub tls_cert_path: String,

    /// Filesystem path to the PEM-encoded private key. **Required.**
    pub tls_key_path: String,

    /// PEM bundle of issuers trusted to sign client certificates.
    ///
    /// When set, every client must present a certificate chaining to one of
    /// these issuers. When unset, client certificates are not requested.
    #[serde(default)]
    pub tls_client_ca_path: Option<String>,

    /// Maximum size of one request, head and body together.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,

    /// Deadline for the TLS handshake on each accepted connection.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,

    /// Deadline for reading one complete request.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Deadline for writing the response.
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,

    /// OTLP/gRPC endpoint for span export. Logs only when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:4443".into()
}
fn default_max_request_bytes() -> usize {
    mvrp_common::framing::DEFAULT_MAX_MESSAGE_SIZE
}
fn default_handshake_timeout() -> u64 {
    10
}
fn default_read_timeout() -> u64 {
    30
}
fn default_write_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Per-connection limits derived from this configuration.
    pub fn limits(&self) -> Limits {
        Limits {
            max_request_bytes: self.max_request_bytes,
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
        }
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.listen_addr, "LISTEN_ADDR")?;
        ensure_non_empty(&self.tls_cert_path, "TLS_CERT_PATH")?;
        ensure_non_empty(&self.tls_key_path, "TLS_KEY_PATH")?;
        if let Some(ca) = &self.tls_client_ca_path {
            ensure_non_empty(ca, "TLS_CLIENT_CA_PATH")?;
        }

        if self.max_request_bytes == 0 {
            anyhow::bail!("MAX_REQUEST_BYTES must be > 0");
        }
        if self.handshake_timeout_secs == 0 {
            anyhow::bail!("HANDSHAKE_TIMEOUT_SECS must be > 0");
        }
        if self.read_timeout_secs == 0 {
            anyhow::bail!("READ_TIMEOUT_SECS must be > 0");
        }
        if self.write_timeout_secs == 0 {
            anyhow::bail!("WRITE_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            listen_addr: default_listen_addr(),
            tls_cert_path: "/etc/mvrp/server.pem".into(),
            tls_key_path: "/etc/mvrp/server.key".into(),
            tls_client_ca_path: None,
            max_request_bytes: default_max_request_bytes(),
            handshake_timeout_secs: default_handshake_timeout(),
            read_timeout_secs: default_read_timeout(),
            write_timeout_secs: default_write_timeout(),
            otel_exporter_otlp_endpoint: None,
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_listen_addr(), "0.0.0.0:4443");
        assert_eq!(default_max_request_bytes(), 1024 * 1024);
        assert_eq!(default_handshake_timeout(), 10);
        assert_eq!(default_read_timeout(), 30);
        assert_eq!(default_write_timeout(), 30);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_cert_path() {
        let cfg = Config {
            tls_cert_path: " ".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_client_ca_path() {
        let cfg = Config {
            tls_client_ca_path: Some("".into()),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let cfg = Config {
            max_request_bytes: 0,
            ..valid()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            read_timeout_secs: 0,
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn limits_follow_config() {
        let cfg = Config {
            read_timeout_secs: 7,
            max_request_bytes: 512,
            ..valid()
        };
        let limits = cfg.limits();
        assert_eq!(limits.read_timeout, Duration::from_secs(7));
        assert_eq!(limits.max_request_bytes, 512);
    }
}
