use der::Decode;
use sha2::Digest;
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::DecodeError;
use crate::pem_utils::{self, CERTIFICATE};

/// Represents a decoded X.509 certificate.
///
/// The original DER bytes are kept next to the parsed form, so re-encoding a
/// certificate never changes a single byte of it.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
    der: Vec<u8>,
}

impl Certificate {
    /// Parses a single DER-encoded X.509 certificate.
    ///
    /// Trailing bytes after the certificate are rejected.
    ///
    /// # Arguments
    /// * `der` - The DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, DecodeError> {
        let inner = x509_cert::Certificate::from_der(der)?;
        Ok(Self {
            inner,
            der: der.to_vec(),
        })
    }

    /// Returns the DER encoding of the certificate, exactly as it was decoded.
    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    /// Encodes the certificate into a PEM "CERTIFICATE" block.
    ///
    /// # Returns
    /// A string containing the PEM-encoded certificate, wrapped at 64 columns with LF line endings.
    pub fn to_pem(&self) -> String {
        pem_utils::der_to_pem(&self.der, CERTIFICATE)
    }

    /// The subject distinguished name as an RFC 4514 string.
    pub fn subject(&self) -> String {
        self.inner.tbs_certificate.subject.to_string()
    }

    /// The issuer distinguished name as an RFC 4514 string.
    pub fn issuer(&self) -> String {
        self.inner.tbs_certificate.issuer.to_string()
    }

    /// The serial number as lowercase hex.
    pub fn serial_number_hex(&self) -> String {
        hex::encode(self.inner.tbs_certificate.serial_number.as_bytes())
    }

    /// Start of the validity period.
    pub fn not_before(&self) -> Result<OffsetDateTime, DecodeError> {
        to_offset_date_time(self.inner.tbs_certificate.validity.not_before)
    }

    /// End of the validity period.
    pub fn not_after(&self) -> Result<OffsetDateTime, DecodeError> {
        to_offset_date_time(self.inner.tbs_certificate.validity.not_after)
    }

    /// SHA-1 thumbprint of the DER encoding, as lowercase hex.
    pub fn thumbprint_sha1(&self) -> String {
        hex::encode(sha1::Sha1::digest(&self.der))
    }

    /// SHA-256 thumbprint of the DER encoding, as lowercase hex.
    pub fn thumbprint_sha256(&self) -> String {
        hex::encode(sha2::Sha256::digest(&self.der))
    }

    /// The certificate's SubjectPublicKeyInfo.
    pub fn subject_public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }
}

fn to_offset_date_time(time: x509_cert::time::Time) -> Result<OffsetDateTime, DecodeError> {
    let seconds = i64::try_from(time.to_unix_duration().as_secs())
        .map_err(|e| DecodeError::InvalidContainer(e.to_string()))?;
    OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|e| DecodeError::InvalidContainer(e.to_string()))
}
