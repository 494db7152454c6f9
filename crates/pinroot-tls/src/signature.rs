//! Handshake signature checks against the leaf's public key.
//!
//! The key is taken from the leaf with `x509-parser` and verified with
//! `ring` directly, so v1 leaves (such as a server presenting the pinned
//! root itself) are handled the same way as v3 ones.

use ring::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use rustls::client::danger::HandshakeSignatureValid;
use rustls::{CertificateError, DigitallySignedStruct, Error, SignatureScheme};
use x509_parser::prelude::{FromDer, X509Certificate};

/// Schemes offered to the server, strongest first.
pub const SUPPORTED_SCHEMES: &[SignatureScheme] = &[
    SignatureScheme::ECDSA_NISTP384_SHA384,
    SignatureScheme::ECDSA_NISTP256_SHA256,
    SignatureScheme::ED25519,
    SignatureScheme::RSA_PSS_SHA512,
    SignatureScheme::RSA_PSS_SHA384,
    SignatureScheme::RSA_PSS_SHA256,
    SignatureScheme::RSA_PKCS1_SHA512,
    SignatureScheme::RSA_PKCS1_SHA384,
    SignatureScheme::RSA_PKCS1_SHA256,
];

/// TLS protocol generation the signature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// TLS 1.2 `ServerKeyExchange`
    Tls12,
    /// TLS 1.3 `CertificateVerify`
    Tls13,
}

fn algorithm(scheme: SignatureScheme, protocol: Protocol) -> Option<&'static dyn VerificationAlgorithm> {
    let alg: &'static dyn VerificationAlgorithm = match scheme {
        SignatureScheme::ECDSA_NISTP256_SHA256 => &signature::ECDSA_P256_SHA256_ASN1,
        SignatureScheme::ECDSA_NISTP384_SHA384 => &signature::ECDSA_P384_SHA384_ASN1,
        SignatureScheme::ED25519 => &signature::ED25519,
        SignatureScheme::RSA_PSS_SHA256 => &signature::RSA_PSS_2048_8192_SHA256,
        SignatureScheme::RSA_PSS_SHA384 => &signature::RSA_PSS_2048_8192_SHA384,
        SignatureScheme::RSA_PSS_SHA512 => &signature::RSA_PSS_2048_8192_SHA512,
        // PKCS#1 v1.5 is not allowed for TLS 1.3 handshake signatures.
        SignatureScheme::RSA_PKCS1_SHA256 if protocol == Protocol::Tls12 => {
            &signature::RSA_PKCS1_2048_8192_SHA256
        }
        SignatureScheme::RSA_PKCS1_SHA384 if protocol == Protocol::Tls12 => {
            &signature::RSA_PKCS1_2048_8192_SHA384
        }
        SignatureScheme::RSA_PKCS1_SHA512 if protocol == Protocol::Tls12 => {
            &signature::RSA_PKCS1_2048_8192_SHA512
        }
        _ => return None,
    };
    Some(alg)
}

/// Verify `dss` over `message` with the public key of the DER leaf `cert`.
pub fn verify(
    message: &[u8],
    cert: &[u8],
    dss: &DigitallySignedStruct,
    protocol: Protocol,
) -> Result<HandshakeSignatureValid, Error> {
    let alg = algorithm(dss.scheme, protocol)
        .ok_or(Error::InvalidCertificate(CertificateError::BadSignature))?;

    let (_, leaf) = X509Certificate::from_der(cert)
        .map_err(|_| Error::InvalidCertificate(CertificateError::BadEncoding))?;
    let key = &leaf.public_key().subject_public_key.data;

    UnparsedPublicKey::new(alg, key.as_ref())
        .verify(message, dss.signature())
        .map_err(|_| Error::InvalidCertificate(CertificateError::BadSignature))?;

    Ok(HandshakeSignatureValid::assertion())
}
