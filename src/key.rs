use std::fmt;

use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912::RSA_ENCRYPTION;
use der::Encode;
use pkcs8::{LineEnding, PrivateKeyInfo};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePublicKey, EncodePrivateKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::cert::Certificate;
use crate::error::{DecodeError, ExportError};

/// The algorithm of the private key held by a bundle.
///
/// `None` is only reported by bundles without a private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PrivateKeyType {
    Rsa,
    None,
}

impl fmt::Display for PrivateKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivateKeyType::Rsa => write!(f, "RSA"),
            PrivateKeyType::None => write!(f, "NONE"),
        }
    }
}

/// A classified private key.
///
/// The key material never leaves the handle except through the PKCS#8
/// exports, and it is zeroized when the handle is dropped.
pub struct PrivateKey {
    material: KeyMaterial,
}

/// Recognising another algorithm means adding a variant here and a branch in
/// [`classify`].
enum KeyMaterial {
    Rsa(Box<RsaPrivateKey>),
}

impl PrivateKey {
    fn rsa(key: RsaPrivateKey) -> Self {
        PrivateKey {
            material: KeyMaterial::Rsa(Box::new(key)),
        }
    }

    /// The algorithm of this key.
    pub fn key_type(&self) -> PrivateKeyType {
        match &self.material {
            KeyMaterial::Rsa(_) => PrivateKeyType::Rsa,
        }
    }

    /// The public modulus as big-endian bytes.
    pub fn modulus(&self) -> Vec<u8> {
        match &self.material {
            KeyMaterial::Rsa(key) => key.n().to_bytes_be(),
        }
    }

    /// The public exponent as big-endian bytes.
    pub fn public_exponent(&self) -> Vec<u8> {
        match &self.material {
            KeyMaterial::Rsa(key) => key.e().to_bytes_be(),
        }
    }

    /// Encodes the key as an unencrypted PKCS#8 `PrivateKeyInfo`.
    pub fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>, ExportError> {
        let document = match &self.material {
            KeyMaterial::Rsa(key) => key.to_pkcs8_der()?,
        };
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    /// Encodes the key as a PEM "PRIVATE KEY" block.
    ///
    /// The output is deterministic: the same key always yields the same bytes.
    pub fn to_pkcs8_pem(&self) -> Result<Zeroizing<String>, ExportError> {
        match &self.material {
            KeyMaterial::Rsa(key) => Ok(key.to_pkcs8_pem(LineEnding::LF)?),
        }
    }

    /// Checks whether the certificate carries the public half of this key.
    pub fn matches_certificate(&self, certificate: &Certificate) -> bool {
        let Ok(spki) = certificate.subject_public_key_info().to_der() else {
            return false;
        };
        match &self.material {
            KeyMaterial::Rsa(key) => match RsaPublicKey::from_public_key_der(&spki) {
                Ok(public) => public == key.to_public_key(),
                Err(_) => false,
            },
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.material {
            KeyMaterial::Rsa(key) => f
                .debug_struct("PrivateKey")
                .field("type", &PrivateKeyType::Rsa)
                .field("bits", &(key.size() * 8))
                .finish_non_exhaustive(),
        }
    }
}

/// Classifies a DER-encoded PKCS#8 `PrivateKeyInfo` by its algorithm identifier.
///
/// # Arguments
/// * `der` - The unencrypted PKCS#8 key.
///
/// # Returns
/// A typed key handle, or `DecodeError::UnsupportedKeyType` naming the algorithm.
pub fn classify(der: &[u8]) -> Result<PrivateKey, DecodeError> {
    let info = PrivateKeyInfo::try_from(der)
        .map_err(|e| DecodeError::InvalidContainer(format!("private key: {e}")))?;

    match info.algorithm.oid {
        RSA_ENCRYPTION => {
            let key = RsaPrivateKey::try_from(info)
                .map_err(|e| DecodeError::InvalidContainer(format!("RSA private key: {e}")))?;
            Ok(PrivateKey::rsa(key))
        }
        oid => Err(DecodeError::UnsupportedKeyType(describe_oid(&oid))),
    }
}

/// Classifies a DER-encoded PKCS#1 `RSAPrivateKey` ("RSA PRIVATE KEY" PEM blocks).
pub fn classify_pkcs1_rsa(der: &[u8]) -> Result<PrivateKey, DecodeError> {
    let key = RsaPrivateKey::from_pkcs1_der(der)
        .map_err(|e| DecodeError::InvalidContainer(format!("RSA private key: {e}")))?;
    Ok(PrivateKey::rsa(key))
}

/// Renders an OID with its registered name when `const-oid` knows it.
pub(crate) fn describe_oid(oid: &ObjectIdentifier) -> String {
    match const_oid::db::DB.by_oid(oid) {
        Some(name) => format!("{name} ({oid})"),
        None => oid.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_type_display() {
        assert_eq!(PrivateKeyType::Rsa.to_string(), "RSA");
        assert_eq!(PrivateKeyType::None.to_string(), "NONE");
    }

    #[test]
    fn test_describe_known_oid() {
        let ec = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
        let described = describe_oid(&ec);
        assert!(described.contains("ecPublicKey"));
        assert!(described.ends_with("(1.2.840.10045.2.1)"));
    }

    #[test]
    fn test_debug_hides_key_material() {
        let pem = include_str!("../tests/data/pkcs1.pem");
        let block = pem::parse_many(pem)
            .unwrap()
            .into_iter()
            .find(|block| block.tag() == "RSA PRIVATE KEY")
            .unwrap();
        let key = classify_pkcs1_rsa(block.contents()).unwrap();

        let debug = format!("{key:?}");
        assert!(debug.starts_with("PrivateKey {"));
        assert!(debug.contains("bits: 2048"));
        assert!(!debug.contains(&format!("{:?}", key.modulus())));
    }

    #[test]
    fn test_classify_garbage() {
        assert!(matches!(
            classify(&[0x30, 0x03, 0x02, 0x01, 0x00]),
            Err(DecodeError::InvalidContainer(_))
        ));
    }
}
