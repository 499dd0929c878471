//! Key-pair correspondence checks.
//!
//! A certificate and a private key correspond when the public key derived
//! from the private key equals the subject public key of the certificate.
//! This is a diagnostic, not a security gate: malformed input, a wrong
//! passphrase or an unsupported algorithm all end up as "does not match",
//! and no error carries key material.
//!
//! Accepted private key encodings:
//! - `PRIVATE KEY` (PKCS#8)
//! - `ENCRYPTED PRIVATE KEY` (PKCS#8 with PBES2)
//! - `RSA PRIVATE KEY` (PKCS#1)
//! - `EC PRIVATE KEY` (SEC1, named curves only)
//!
//! The two traditional encodings may also carry OpenSSL's legacy
//! `Proc-Type: 4,ENCRYPTED` headers.

use pkcs8::der::asn1::AnyRef;
use pkcs8::der::Encode;
use pkcs8::{AlgorithmIdentifierRef, EncryptedPrivateKeyInfo, ObjectIdentifier, PrivateKeyInfo};
use rcgen::KeyPair;
use sec1::EcPrivateKey;
use sha2::{Digest, Sha256};
use thiserror::Error;
use x509_parser::pem::{parse_x509_pem, Pem};

use super::legacy::EncryptedBlock;

/// `rsaEncryption` algorithm identifier.
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// `id-ecPublicKey` algorithm identifier.
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// Why a certificate and private key were not shown to correspond.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyPairError {
    /// The certificate is not a PEM-encoded X.509 certificate.
    #[error("Certificate is not a valid PEM-encoded X.509 certificate")]
    MalformedCertificate,

    /// The private key is not valid PEM or DER.
    #[error("Private key is not a valid PEM-encoded key")]
    MalformedKey,

    /// The PEM block holds something other than a private key.
    #[error("Unsupported private key encoding '{0}'")]
    UnsupportedKeyFormat(String),

    /// The key is encrypted and no passphrase was configured.
    #[error("Private key is encrypted and no passphrase is configured")]
    PassphraseRequired,

    /// The key is encrypted with a cipher that cannot be decrypted here.
    #[error("Private key is encrypted with unsupported cipher '{0}'")]
    UnsupportedCipher(String),

    /// The passphrase did not decrypt the key.
    #[error("Private key could not be decrypted with the configured passphrase")]
    DecryptionFailed,

    /// The key algorithm (or key size) cannot be loaded.
    #[error("Private key algorithm is not supported")]
    UnsupportedAlgorithm,

    /// Both parse, but they are not a pair.
    #[error("Private key does not belong to the certificate")]
    Mismatch,
}

/// Whether the private key belongs to the certificate.
///
/// Never fails: every problem is logged at debug level and reported as
/// `false`.
pub fn matches(certificate_pem: &str, private_key_pem: &str, passphrase: Option<&str>) -> bool {
    match check(certificate_pem, private_key_pem, passphrase) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Key pair does not match: {}", e);
            false
        }
    }
}

/// Prove that the private key belongs to the certificate.
///
/// A passphrase given for an unencrypted key is ignored.
pub fn check(
    certificate_pem: &str,
    private_key_pem: &str,
    passphrase: Option<&str>,
) -> Result<(), KeyPairError> {
    let expected = certificate_public_key(certificate_pem)?;
    let key_der = private_key_der(private_key_pem, passphrase)?;
    let key_pair =
        KeyPair::try_from(key_der.as_slice()).map_err(|_| KeyPairError::UnsupportedAlgorithm)?;

    if key_pair.public_key_raw() == expected.as_slice() {
        Ok(())
    } else {
        Err(KeyPairError::Mismatch)
    }
}

/// SHA-256 fingerprint of a certificate's DER encoding, lowercase hex.
pub fn certificate_fingerprint(certificate_pem: &str) -> Result<String, KeyPairError> {
    let pem = certificate_block(certificate_pem)?;
    Ok(hex::encode(&Sha256::digest(&pem.contents)[..]))
}

fn certificate_block(certificate_pem: &str) -> Result<Pem, KeyPairError> {
    let (_, pem) = parse_x509_pem(certificate_pem.as_bytes())
        .map_err(|_| KeyPairError::MalformedCertificate)?;
    if pem.label != "CERTIFICATE" {
        return Err(KeyPairError::MalformedCertificate);
    }
    Ok(pem)
}

/// Subject public key bits of a certificate.
fn certificate_public_key(certificate_pem: &str) -> Result<Vec<u8>, KeyPairError> {
    let pem = certificate_block(certificate_pem)?;
    let cert = pem
        .parse_x509()
        .map_err(|_| KeyPairError::MalformedCertificate)?;
    Ok(cert.public_key().subject_public_key.data.to_vec())
}

/// Unencrypted PKCS#8 DER of a private key.
fn private_key_der(
    private_key_pem: &str,
    passphrase: Option<&str>,
) -> Result<Vec<u8>, KeyPairError> {
    if let Some(block) = EncryptedBlock::parse(private_key_pem)? {
        let passphrase = passphrase.ok_or(KeyPairError::PassphraseRequired)?;
        let der = block.decrypt(passphrase)?;
        return traditional_to_pkcs8(block.label(), &der);
    }

    let (_, pem) =
        parse_x509_pem(private_key_pem.as_bytes()).map_err(|_| KeyPairError::MalformedKey)?;

    match pem.label.as_str() {
        "PRIVATE KEY" => Ok(pem.contents),
        "ENCRYPTED PRIVATE KEY" => {
            let passphrase = passphrase.ok_or(KeyPairError::PassphraseRequired)?;
            let info = EncryptedPrivateKeyInfo::try_from(pem.contents.as_slice())
                .map_err(|_| KeyPairError::MalformedKey)?;
            let document = info
                .decrypt(passphrase)
                .map_err(|_| KeyPairError::DecryptionFailed)?;
            Ok(document.as_bytes().to_vec())
        }
        label => traditional_to_pkcs8(label, &pem.contents),
    }
}

fn traditional_to_pkcs8(label: &str, der: &[u8]) -> Result<Vec<u8>, KeyPairError> {
    match label {
        "RSA PRIVATE KEY" => wrap_pkcs1(der),
        "EC PRIVATE KEY" => wrap_sec1(der),
        other => Err(KeyPairError::UnsupportedKeyFormat(other.to_string())),
    }
}

/// Wrap a PKCS#1 RSA key in a PKCS#8 envelope.
fn wrap_pkcs1(pkcs1: &[u8]) -> Result<Vec<u8>, KeyPairError> {
    let algorithm = AlgorithmIdentifierRef {
        oid: RSA_ENCRYPTION,
        parameters: Some(AnyRef::NULL),
    };
    PrivateKeyInfo::new(algorithm, pkcs1)
        .to_der()
        .map_err(|_| KeyPairError::MalformedKey)
}

/// Wrap a SEC1 EC key in a PKCS#8 envelope naming its curve.
fn wrap_sec1(sec1_der: &[u8]) -> Result<Vec<u8>, KeyPairError> {
    let key = EcPrivateKey::try_from(sec1_der).map_err(|_| KeyPairError::MalformedKey)?;
    let curve = key
        .parameters
        .and_then(|params| params.named_curve())
        .ok_or(KeyPairError::UnsupportedAlgorithm)?;

    let algorithm = AlgorithmIdentifierRef {
        oid: EC_PUBLIC_KEY,
        parameters: Some(AnyRef::from(&curve)),
    };
    PrivateKeyInfo::new(algorithm, sec1_der)
        .to_der()
        .map_err(|_| KeyPairError::MalformedKey)
}
