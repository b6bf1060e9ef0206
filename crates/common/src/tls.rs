//! PEM credential loading shared by the server and client transport setup.
//!
//! Each loader reads one file and fails if the file is unreadable or holds
//! no usable material. None of them return a partially-populated result.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::RootCertStore;
use thiserror::Error;

/// Errors produced while loading credential material.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The file could not be opened or its PEM could not be decoded.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file holds no certificates.
    #[error("no certificates found in {}", path.display())]
    NoCertificates { path: PathBuf },

    /// The file holds no private key.
    #[error("no private key found in {}", path.display())]
    NoPrivateKey { path: PathBuf },

    /// None of the issuer certificates could be added to the trust store.
    #[error("no usable issuer certificates in {}", path.display())]
    NoTrustAnchors { path: PathBuf },
}

/// A certificate chain and the private key for its leaf.
#[derive(Debug)]
pub struct Identity {
    pub chain: Vec<CertificateDer<'static>>,
    pub key: PrivateKeyDer<'static>,
}

impl Identity {
    /// Load a certificate chain and private key from two PEM files.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] if either file is unreadable or empty.
    pub fn load(cert_path: &Path, key_path: &Path) -> Result<Self, CredentialError> {
        Ok(Self {
            chain: load_certs(cert_path)?,
            key: load_private_key(key_path)?,
        })
    }
}

/// Load every certificate from a PEM file.
///
/// # Errors
///
/// Returns [`CredentialError::NoCertificates`] if the file holds none.
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, CredentialError> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| CredentialError::Read {
            path: path.to_owned(),
            source,
        })?;
    if certs.is_empty() {
        return Err(CredentialError::NoCertificates {
            path: path.to_owned(),
        });
    }
    Ok(certs)
}

/// Load the first private key (PKCS#8, PKCS#1, or SEC1) from a PEM file.
///
/// # Errors
///
/// Returns [`CredentialError::NoPrivateKey`] if the file holds none.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, CredentialError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| CredentialError::Read {
            path: path.to_owned(),
            source,
        })?
        .ok_or_else(|| CredentialError::NoPrivateKey {
            path: path.to_owned(),
        })
}

/// Load a bundle of trusted issuer certificates into a [`RootCertStore`].
///
/// Certificates that fail to parse as trust anchors are skipped; the bundle
/// must yield at least one.
///
/// # Errors
///
/// Returns [`CredentialError::NoTrustAnchors`] if nothing usable was found.
pub fn load_trust_store(path: &Path) -> Result<RootCertStore, CredentialError> {
    let mut roots = RootCertStore::empty();
    let (added, _ignored) = roots.add_parsable_certificates(load_certs(path)?);
    if added == 0 {
        return Err(CredentialError::NoTrustAnchors {
            path: path.to_owned(),
        });
    }
    Ok(roots)
}

fn open(path: &Path) -> Result<BufReader<File>, CredentialError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| CredentialError::Read {
            path: path.to_owned(),
            source,
        })
}
