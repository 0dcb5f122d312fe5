//! Decoders turning PFX, PEM and DER input into certificates and an optional key.

pub mod der;
pub mod pem;
pub mod pfx;

use std::fmt;

use ::der::Decode;

use crate::cert::Certificate;
use crate::key::PrivateKey;
use crate::pem_utils;
use crate::pkcs12;

/// The container format a bundle was imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Pfx,
    Pem,
    Der,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Pfx => write!(f, "PKCS#12"),
            SourceFormat::Pem => write!(f, "PEM"),
            SourceFormat::Der => write!(f, "DER"),
        }
    }
}

/// What a decoder found. Decoders only return this once the certificate list
/// is known to be non-empty and the key, if any, has been classified.
#[derive(Debug)]
pub(crate) struct Decoded {
    pub certificates: Vec<Certificate>,
    pub private_key: Option<PrivateKey>,
    pub friendly_name: Option<String>,
}

/// Detect the format of raw input by inspecting its contents.
///
/// UTF-8 text with a PEM begin marker is PEM. Otherwise the bytes are tried as a
/// PFX structure (BER or DER) and then as a single X.509 certificate.
pub fn detect_format(data: &[u8]) -> Option<SourceFormat> {
    if let Ok(text) = std::str::from_utf8(data) {
        if pem_utils::has_pem_marker(text) {
            return Some(SourceFormat::Pem);
        }
    }

    if pkcs12::parse_pfx(data).is_ok() {
        return Some(SourceFormat::Pfx);
    }

    if x509_cert::Certificate::from_der(data).is_ok() {
        return Some(SourceFormat::Der);
    }

    None
}
