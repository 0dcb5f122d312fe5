//! use certbundle::error::{DecodeError, ExportError};

use thiserror::Error;

/// Errors raised while turning raw PFX, PEM or DER input into a bundle.
///
/// Decoding is all-or-nothing: any of these means no bundle was produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The PFX or DER structure is malformed.
    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    /// The PEM framing or its base64 body is malformed.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// The passphrase does not unlock the container MAC or its encrypted content.
    #[error("Authentication failed: the passphrase does not unlock the container")]
    AuthenticationFailed,

    /// Parsing succeeded but no certificate was found.
    #[error("No certificates found in input")]
    NoCertificates,

    /// More than one private key was found.
    #[error("Input contains more than one private key")]
    MultiplePrivateKeys,

    /// A private key was found but its algorithm is not supported.
    #[error("Unsupported private key type: {0}")]
    UnsupportedKeyType(String),

    /// Content is protected with an encryption scheme the decoder cannot open.
    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),

    /// The input format could not be detected.
    #[error("Unrecognized input format")]
    UnknownFormat,
}

/// Errors raised while re-encoding a bundle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// A private key export was requested on a bundle without one.
    #[error("Bundle has no private key")]
    NoPrivateKey,

    /// The bundle holds no certificates.
    #[error("Bundle has no certificates")]
    NoCertificates,

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    Encoding(String),
}

impl From<der::Error> for DecodeError {
    /// Converts a `der::Error` into a `DecodeError`.
    fn from(err: der::Error) -> Self {
        DecodeError::InvalidContainer(err.to_string())
    }
}

impl From<pem::PemError> for DecodeError {
    fn from(err: pem::PemError) -> Self {
        DecodeError::InvalidEncoding(err.to_string())
    }
}

impl From<der::Error> for ExportError {
    fn from(err: der::Error) -> Self {
        ExportError::Encoding(err.to_string())
    }
}

impl From<pkcs8::Error> for ExportError {
    fn from(err: pkcs8::Error) -> Self {
        ExportError::Encoding(err.to_string())
    }
}
