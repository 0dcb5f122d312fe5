//! PKCS#12 decoding: MAC check, decryption of the safe contents, bag walk.

use ::pkcs12::{
    PKCS_12_CERT_BAG_OID, PKCS_12_KEY_BAG_OID, PKCS_12_PKCS8_KEY_BAG_OID,
    PKCS_12_SAFE_CONTENTS_BAG_OID, PKCS_12_X509_CERT_OID,
};
use const_oid::db::rfc5911::{ID_DATA, ID_ENCRYPTED_DATA};
use der::asn1::{Any, OctetString};
use der::{Decode, Encode};
use pkcs8::PrivateKeyInfo;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::Decoded;
use crate::cert::Certificate;
use crate::error::DecodeError;
use crate::key::{self, describe_oid};
use crate::pkcs12::{
    self, CertBag, ContentInfo, EncryptedData, EncryptedPrivateKeyInfo, Password, SafeBag,
    SafeContents, ber, mac, pbe,
};

/// Nested `safeContentsBag`s deeper than this are rejected.
const MAX_BAG_DEPTH: usize = 8;

/// Decodes a PFX blob.
///
/// # Arguments
/// * `raw` - The BER or DER encoded PFX.
/// * `passphrase` - The import passphrase; empty for unprotected exports.
///
/// # Returns
/// The certificates in bag order, the classified private key if the PFX has
/// one, and the friendly name of the key bag (or of the first named cert bag).
pub(crate) fn decode_pfx(raw: &[u8], passphrase: &str) -> Result<Decoded, DecodeError> {
    let pfx = pkcs12::parse_pfx(raw)?;
    let content = pkcs12::auth_safe_content(&pfx)?;
    let candidates = Password::candidates(passphrase);

    match &pfx.mac_data {
        Some(mac_data) => {
            for password in &candidates {
                if mac::verify(mac_data, password.bmp(), &content)? {
                    debug!(iterations = mac_data.iterations, "PFX MAC verified");
                    return decode_auth_safe(&content, password);
                }
            }
            Err(DecodeError::AuthenticationFailed)
        }
        None => {
            debug!("PFX has no MAC, trying passphrase encodings against the content");
            let mut result = Err(DecodeError::AuthenticationFailed);
            for password in &candidates {
                result = decode_auth_safe(&content, password);
                if !matches!(result, Err(DecodeError::AuthenticationFailed)) {
                    break;
                }
            }
            result
        }
    }
}

fn decode_auth_safe(content: &[u8], password: &Password<'_>) -> Result<Decoded, DecodeError> {
    let mut collector = BagCollector::default();

    let auth_safe = ber::to_der(content)?;
    for info in Vec::<ContentInfo>::from_der(&auth_safe)? {
        let bags = open_content_info(&info, password)?;
        collector.visit(&bags, password, 0)?;
    }

    collector.finish()
}

/// Returns the `SafeContents` carried by one `ContentInfo`.
fn open_content_info(
    info: &ContentInfo,
    password: &Password<'_>,
) -> Result<SafeContents, DecodeError> {
    match info.content_type {
        ID_DATA => {
            trace!("plain safe contents");
            parse_safe_contents(info.content.decode_as::<OctetString>()?.as_bytes())
        }
        ID_ENCRYPTED_DATA => {
            let encrypted = info.content.decode_as::<EncryptedData>()?;
            let info = encrypted.enc_content_info;
            trace!(algorithm = %info.content_enc_alg.oid, "encrypted safe contents");
            let ciphertext = info
                .encrypted_content
                .as_ref()
                .map(OctetString::as_bytes)
                .unwrap_or_default();
            let plaintext = pbe::decrypt(&info.content_enc_alg, password, ciphertext)?;
            parse_safe_contents(&plaintext).map_err(pbe::plaintext_error)
        }
        other => Err(DecodeError::UnsupportedEncryption(format!(
            "content type {}",
            describe_oid(&other)
        ))),
    }
}

fn parse_safe_contents(bytes: &[u8]) -> Result<SafeContents, DecodeError> {
    let der = ber::to_der(bytes)?;
    Ok(SafeContents::from_der(&der)?)
}

#[derive(Default)]
struct BagCollector {
    certificates: Vec<Certificate>,
    key: Option<Zeroizing<Vec<u8>>>,
    key_name: Option<String>,
    cert_name: Option<String>,
}

impl BagCollector {
    fn visit(
        &mut self,
        bags: &[SafeBag],
        password: &Password<'_>,
        depth: usize,
    ) -> Result<(), DecodeError> {
        if depth > MAX_BAG_DEPTH {
            return Err(DecodeError::InvalidContainer(
                "safe contents nested too deeply".to_string(),
            ));
        }

        for bag in bags {
            match bag.bag_id {
                PKCS_12_CERT_BAG_OID => self.cert_bag(bag)?,
                PKCS_12_KEY_BAG_OID => {
                    let value = Zeroizing::new(pkcs12::bag_value::<Any>(bag)?.to_der()?);
                    self.key_bag(bag, value)?;
                }
                PKCS_12_PKCS8_KEY_BAG_OID => {
                    let shrouded = pkcs12::bag_value::<EncryptedPrivateKeyInfo>(bag)?;
                    let der = pbe::decrypt(
                        &shrouded.encryption_algorithm,
                        password,
                        shrouded.encrypted_data.as_bytes(),
                    )?;
                    PrivateKeyInfo::from_der(&der)
                        .map_err(|e| pbe::plaintext_error(e.into()))?;
                    self.key_bag(bag, der)?;
                }
                PKCS_12_SAFE_CONTENTS_BAG_OID => {
                    let nested = pkcs12::bag_value::<SafeContents>(bag)?;
                    self.visit(&nested, password, depth + 1)?;
                }
                other => debug!(bag = %describe_oid(&other), "skipping unsupported bag"),
            }
        }
        Ok(())
    }

    fn cert_bag(&mut self, bag: &SafeBag) -> Result<(), DecodeError> {
        let cert_bag = pkcs12::bag_value::<CertBag>(bag)?;
        if cert_bag.cert_id != PKCS_12_X509_CERT_OID {
            debug!(cert_type = %describe_oid(&cert_bag.cert_id), "skipping non-X.509 cert bag");
            return Ok(());
        }

        let certificate = Certificate::from_der(cert_bag.cert_value.as_bytes())?;
        trace!(subject = %certificate.subject(), "certificate bag");
        if self.cert_name.is_none() {
            self.cert_name = pkcs12::friendly_name(bag)?;
        }
        self.certificates.push(certificate);
        Ok(())
    }

    fn key_bag(&mut self, bag: &SafeBag, der: Zeroizing<Vec<u8>>) -> Result<(), DecodeError> {
        if self.key.is_some() {
            return Err(DecodeError::MultiplePrivateKeys);
        }
        self.key_name = pkcs12::friendly_name(bag)?;
        self.key = Some(der);
        Ok(())
    }

    fn finish(self) -> Result<Decoded, DecodeError> {
        if self.certificates.is_empty() {
            return Err(DecodeError::NoCertificates);
        }
        let private_key = self.key.as_deref().map(|der| key::classify(der)).transpose()?;

        Ok(Decoded {
            certificates: self.certificates,
            private_key,
            friendly_name: self.key_name.or(self.cert_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pfx_garbage() {
        assert!(matches!(
            decode_pfx(b"definitely not a pfx", ""),
            Err(DecodeError::InvalidContainer(_))
        ));
    }

    #[test]
    fn test_collector_without_certificates() {
        let collector = BagCollector::default();
        assert!(matches!(
            collector.finish(),
            Err(DecodeError::NoCertificates)
        ));
    }

    #[test]
    fn test_collector_rejects_deep_nesting() {
        let mut collector = BagCollector::default();
        let password = Password::new("");
        assert!(matches!(
            collector.visit(&[], &password, MAX_BAG_DEPTH + 1),
            Err(DecodeError::InvalidContainer(_))
        ));
    }
}
