//! Client-side TLS configuration: trusted issuers plus a client identity.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use mvrp_common::tls::{load_trust_store, Identity};
use rustls::{ClientConfig, RootCertStore};

/// Load credentials from disk and build a [`rustls::ClientConfig`].
///
/// # Errors
///
/// Returns an error if any file is unreadable or malformed.
pub fn load_client_config(cert_path: &Path, key_path: &Path, ca_path: &Path) -> Result<Arc<ClientConfig>> {
    let identity = Identity::load(cert_path, key_path).context("failed to load client identity")?;
    let roots = load_trust_store(ca_path).context("failed to load trusted issuer bundle")?;
    build_client_config(identity, roots)
}

/// Build a [`rustls::ClientConfig`] that verifies the server against `roots`
/// and presents `identity` when the server asks for a client certificate.
pub fn build_client_config(identity: Identity, roots: RootCertStore) -> Result<Arc<ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .context("failed to select TLS protocol versions")?
        .with_root_certificates(roots)
        .with_client_auth_cert(identity.chain, identity.key)
        .context("failed to build rustls ClientConfig")?;

    Ok(Arc::new(config))
}
