use tracing::debug;
use zeroize::Zeroizing;

use crate::cert::Certificate;
use crate::decode::{self, Decoded, SourceFormat};
use crate::error::{DecodeError, ExportError};
use crate::key::{PrivateKey, PrivateKeyType};
use crate::options::ImportOptions;

/// Certificates and an optional private key decoded from one PFX, PEM or DER input.
///
/// A bundle always holds at least one certificate, in the order they appeared
/// in the source. The exact input bytes are kept alongside, so
/// [`export_raw`](Self::export_raw) reproduces them unchanged.
///
/// Bundles are immutable. The private key is owned by the bundle and dropped
/// (and zeroized) with it.
#[derive(Debug)]
pub struct CertificateBundle {
    certificates: Vec<Certificate>,
    private_key: Option<PrivateKey>,
    friendly_name: Option<String>,
    format: SourceFormat,
    raw: Vec<u8>,
}

impl CertificateBundle {
    /// Imports a PKCS#12 (PFX) blob protected with the empty passphrase.
    ///
    /// # Errors
    /// `DecodeError::AuthenticationFailed` if the container needs a passphrase.
    pub fn from_pfx(raw: &[u8]) -> Result<Self, DecodeError> {
        Self::from_pfx_with_passphrase(raw, "")
    }

    /// Imports a PKCS#12 (PFX) blob.
    ///
    /// # Arguments
    /// * `raw` - The DER-encoded PFX.
    /// * `passphrase` - The passphrase protecting the MAC and encrypted bags.
    pub fn from_pfx_with_passphrase(raw: &[u8], passphrase: &str) -> Result<Self, DecodeError> {
        let decoded = decode::pfx::decode_pfx(raw, passphrase)?;
        Ok(Self::assemble(decoded, SourceFormat::Pfx, raw.to_vec()))
    }

    /// Imports concatenated PEM text holding certificates and at most one key.
    pub fn from_pem(text: &str) -> Result<Self, DecodeError> {
        Self::from_pem_with_passphrase(text, "")
    }

    /// Imports PEM text whose key may be an `ENCRYPTED PRIVATE KEY` block.
    pub fn from_pem_with_passphrase(text: &str, passphrase: &str) -> Result<Self, DecodeError> {
        let decoded = decode::pem::decode_pem(text, passphrase)?;
        Ok(Self::assemble(decoded, SourceFormat::Pem, text.as_bytes().to_vec()))
    }

    /// Imports PEM text supplied as bytes.
    ///
    /// # Errors
    /// `DecodeError::InvalidEncoding` if the bytes are not UTF-8.
    pub fn from_pem_bytes(raw: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| DecodeError::InvalidEncoding(format!("PEM input is not UTF-8: {e}")))?;
        Self::from_pem(text)
    }

    /// Imports a single DER-encoded certificate.
    pub fn from_der(raw: &[u8]) -> Result<Self, DecodeError> {
        let decoded = decode::der::decode_der(raw)?;
        Ok(Self::assemble(decoded, SourceFormat::Der, raw.to_vec()))
    }

    /// Imports input of any supported format.
    ///
    /// The format comes from `options.format`, or is detected from the input
    /// when unset.
    ///
    /// # Example
    /// ```rust,no_run
    /// use certbundle::{CertificateBundle, ImportOptions};
    ///
    /// # fn main() -> Result<(), certbundle::error::DecodeError> {
    /// let raw = std::fs::read("tls.pfx").unwrap_or_default();
    /// let options = ImportOptions::builder().passphrase("s3cret").build();
    /// let bundle = CertificateBundle::import(&raw, &options)?;
    /// println!("{} certificates", bundle.certificates().len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn import(raw: &[u8], options: &ImportOptions) -> Result<Self, DecodeError> {
        let format = match options.format {
            Some(format) => format,
            None => decode::detect_format(raw).ok_or(DecodeError::UnknownFormat)?,
        };
        debug!(%format, "importing certificate bundle");

        match format {
            SourceFormat::Pfx => Self::from_pfx_with_passphrase(raw, &options.passphrase),
            SourceFormat::Pem => {
                let text = std::str::from_utf8(raw).map_err(|e| {
                    DecodeError::InvalidEncoding(format!("PEM input is not UTF-8: {e}"))
                })?;
                Self::from_pem_with_passphrase(text, &options.passphrase)
            }
            SourceFormat::Der => Self::from_der(raw),
        }
    }

    fn assemble(decoded: Decoded, format: SourceFormat, raw: Vec<u8>) -> Self {
        Self {
            certificates: decoded.certificates,
            private_key: decoded.private_key,
            friendly_name: decoded.friendly_name,
            format,
            raw,
        }
    }

    /// The certificates, in source order.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    /// The first certificate, which is the leaf for well-formed chains.
    pub fn leaf(&self) -> Option<&Certificate> {
        self.certificates.first()
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// `PrivateKeyType::None` when the bundle has no key.
    pub fn private_key_type(&self) -> PrivateKeyType {
        self.private_key
            .as_ref()
            .map_or(PrivateKeyType::None, PrivateKey::key_type)
    }

    pub fn private_key(&self) -> Option<&PrivateKey> {
        self.private_key.as_ref()
    }

    /// The PKCS#12 `friendlyName`, for PFX input that carries one.
    pub fn friendly_name(&self) -> Option<&str> {
        self.friendly_name.as_deref()
    }

    pub fn source_format(&self) -> SourceFormat {
        self.format
    }

    /// The bytes the bundle was imported from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Exports the private key as a PKCS#8 "PRIVATE KEY" PEM block.
    ///
    /// The same key always produces the same bytes.
    pub fn export_private_key_pem(&self) -> Result<Zeroizing<Vec<u8>>, ExportError> {
        let key = self.private_key.as_ref().ok_or(ExportError::NoPrivateKey)?;
        let pem = key.to_pkcs8_pem()?;
        Ok(Zeroizing::new(pem.as_bytes().to_vec()))
    }

    /// Exports every certificate as a "CERTIFICATE" PEM block, concatenated in
    /// bundle order.
    pub fn export_public_key_pem(&self) -> Result<Vec<u8>, ExportError> {
        if self.certificates.is_empty() {
            return Err(ExportError::NoCertificates);
        }
        Ok(self
            .certificates
            .iter()
            .map(Certificate::to_pem)
            .collect::<String>()
            .into_bytes())
    }

    /// Returns the imported bytes verbatim.
    pub fn export_raw(&self) -> &[u8] {
        &self.raw
    }
}
