//! Configuration loading and validation for the MVRP client.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// `host:port` of the MVRP server.
    #[serde(default = "default_server_addr")]
    pub server_addr: String,

    /// Name the server certificate must be valid for; also sent as SNI.
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// PEM certificate chain presented to the server. **Required.**
    pub tls_cert_path: String,

    /// PEM private key for `tls_cert_path`. **Required.**
    pub tls_key_path: String,

    /// PEM bundle of issuers trusted to sign the server certificate. **Required.**
    pub tls_ca_path: String,

    /// Maximum size of one response, head and body together.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,

    /// Deadline applied separately to connect, handshake, write, and read.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_server_addr() -> String {
    "127.0.0.1:4443".into()
}
fn default_server_name() -> String {
    "localhost".into()
}
fn default_max_response_bytes() -> usize {
    mvrp_common::framing::DEFAULT_MAX_MESSAGE_SIZE
}
fn default_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "warn".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build mvrp client configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise mvrp client configuration")?;

        c.validate()?;
        Ok(c)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        for (value, name) in [
            (&self.server_addr, "SERVER_ADDR"),
            (&self.server_name, "SERVER_NAME"),
            (&self.tls_cert_path, "TLS_CERT_PATH"),
            (&self.tls_key_path, "TLS_KEY_PATH"),
            (&self.tls_ca_path, "TLS_CA_PATH"),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{name} is required and must not be empty");
            }
        }
        if self.max_response_bytes == 0 {
            anyhow::bail!("MAX_RESPONSE_BYTES must be > 0");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            server_addr: default_server_addr(),
            server_name: default_server_name(),
            tls_cert_path: "/etc/mvrp/client.pem".into(),
            tls_key_path: "/etc/mvrp/client.key".into(),
            tls_ca_path: "/etc/mvrp/ca.pem".into(),
            max_response_bytes: default_max_response_bytes(),
            timeout_secs: default_timeout(),
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults() {
        assert_eq!(default_server_addr(), "127.0.0.1:4443");
        assert_eq!(default_server_name(), "localhost");
        assert_eq!(default_timeout(), 30);
        assert_eq!(default_log_level(), "warn");
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_ca_path() {
        let cfg = Config {
            tls_ca_path: "  ".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let cfg = Config {
            timeout_secs: 0,
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }
}
