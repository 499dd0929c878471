//! Signing key material and key-pair correspondence.
//!
//! - [`keypair`] - Proving a private key belongs to a certificate
//! - [`keys`] - Loading key material named by configuration options

pub mod keypair;
pub mod keys;
mod legacy;

pub use keypair::{certificate_fingerprint, check, matches, KeyPairError};
pub use keys::{FileKeyLoader, KeyMaterialProvider, PrivateKeyMaterial, PublicKeyMaterial};
