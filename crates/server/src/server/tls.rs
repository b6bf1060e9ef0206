//! Server-side TLS configuration using rustls.
//!
//! The server always presents one certificate/key pair. Client certificates
//! are verified only when a client issuer bundle is supplied.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use mvrp_common::tls::{load_trust_store, Identity};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};

/// Load credentials from disk and build a [`rustls::ServerConfig`].
///
/// # Errors
///
/// Returns an error if any file is unreadable or malformed, or if rustls
/// rejects the resulting configuration.
pub fn load_server_config(
    cert_path: &Path,
    key_path: &Path,
    client_ca_path: Option<&Path>,
) -> Result<Arc<ServerConfig>> {
    let identity = Identity::load(cert_path, key_path).context("failed to load server identity")?;
    let client_roots = client_ca_path
        .map(load_trust_store)
        .transpose()
        .context("failed to load client issuer bundle")?;
    build_server_config(identity, client_roots)
}

/// Build a [`rustls::ServerConfig`] from an identity and optional client trust roots.
///
/// # Errors
///
/// Returns an error if the key does not match the certificate or the
/// verifier cannot be built from `client_roots`.
pub fn build_server_config(
    identity: Identity,
    client_roots: Option<RootCertStore>,
) -> Result<Arc<ServerConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let builder = ServerConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .context("failed to select TLS protocol versions")?;

    let builder = match client_roots {
        Some(roots) => {
            let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
                .build()
                .context("failed to build client certificate verifier")?;
            builder.with_client_cert_verifier(verifier)
        }
        None => builder.with_no_client_auth(),
    };

    let config = builder
        .with_single_cert(identity.chain, identity.key)
        .context("failed to build rustls ServerConfig")?;

    Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../fixtures/tls")
            .join(name)
    }

    #[test]
    fn builds_with_fixture_credentials() {
        let result = load_server_config(&fixture("server.pem"), &fixture("server.key"), None);
        assert!(result.is_ok());
    }

    #[test]
    fn builds_with_client_verification() {
        let result = load_server_config(
            &fixture("server.pem"),
            &fixture("server.key"),
            Some(&fixture("ca.pem")),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_missing_files() {
        let result = load_server_config(
            Path::new("/nonexistent/server.pem"),
            Path::new("/nonexistent/server.key"),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_garbage_pem() {
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        cert.write_all(b"not a pem").unwrap();
        let mut key = tempfile::NamedTempFile::new().unwrap();
        key.write_all(b"also not a pem").unwrap();
        assert!(load_server_config(cert.path(), key.path(), None).is_err());
    }
}
