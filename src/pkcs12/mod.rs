//! PKCS#12 (PFX) glue over the RustCrypto `pkcs12` and `cms` types.
//!
//! The ASN.1 structures come from those crates. This module adds what they
//! leave to the caller: BER input, bag value unwrapping, the `friendlyName`
//! attribute and the password encodings used for key derivation.

pub mod ber;
pub mod mac;
pub mod pbe;

use const_oid::db::rfc5911::ID_DATA;
use der::asn1::{BmpString, ContextSpecific, ObjectIdentifier, OctetString};
use der::Decode;
use zeroize::Zeroizing;

pub use cms::content_info::ContentInfo;
pub use cms::encrypted_data::EncryptedData;
pub use ::pkcs12::cert_type::CertBag;
pub use ::pkcs12::mac_data::MacData;
pub use ::pkcs12::pbe_params::EncryptedPrivateKeyInfo;
pub use ::pkcs12::pfx::Pfx;
pub use ::pkcs12::safe_bag::{SafeBag, SafeContents};

use crate::error::DecodeError;
use crate::key::describe_oid;

/// PKCS#9 `friendlyName` bag attribute.
pub const FRIENDLY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.20");

/// Decodes a PFX, accepting BER as well as DER.
pub fn parse_pfx(raw: &[u8]) -> Result<Pfx, DecodeError> {
    let der = ber::to_der(raw)?;
    Ok(Pfx::from_der(&der)?)
}

/// The `AuthenticatedSafe` octets, which are also the MAC input.
pub fn auth_safe_content(pfx: &Pfx) -> Result<Vec<u8>, DecodeError> {
    if pfx.auth_safe.content_type != ID_DATA {
        return Err(DecodeError::InvalidContainer(format!(
            "authSafe must be id-data, found {}",
            describe_oid(&pfx.auth_safe.content_type)
        )));
    }
    Ok(pfx.auth_safe.content.decode_as::<OctetString>()?.into_bytes())
}

/// Decodes the `[0] EXPLICIT` value of a bag.
pub fn bag_value<'a, T: Decode<'a>>(bag: &'a SafeBag) -> Result<T, DecodeError> {
    Ok(ContextSpecific::<T>::from_der(&bag.bag_value)?.value)
}

/// The `friendlyName` attribute of a bag, if present.
pub fn friendly_name(bag: &SafeBag) -> Result<Option<String>, DecodeError> {
    let Some(attributes) = &bag.bag_attributes else {
        return Ok(None);
    };
    let Some(attribute) = attributes.iter().find(|a| a.oid == FRIENDLY_NAME) else {
        return Ok(None);
    };
    match attribute.values.iter().next() {
        Some(value) => Ok(Some(value.decode_as::<BmpString>()?.to_string())),
        None => Ok(None),
    }
}

/// A passphrase together with the byte string PKCS#12 derives keys from.
///
/// PKCS#12 PBE and MAC keys are derived from the passphrase as a big-endian
/// BMPString with a two-byte NUL terminator. PBES2 uses the UTF-8 text.
pub struct Password<'a> {
    text: &'a str,
    bmp: Zeroizing<Vec<u8>>,
}

impl<'a> Password<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut bmp: Vec<u8> = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
        bmp.extend_from_slice(&[0, 0]);
        Self {
            text,
            bmp: Zeroizing::new(bmp),
        }
    }

    /// The empty passphrase encoded as zero bytes instead of a lone NUL
    /// terminator. Windows and Key Vault exports MAC with this form.
    fn zero_length() -> Password<'static> {
        Password {
            text: "",
            bmp: Zeroizing::new(Vec::new()),
        }
    }

    /// Encodings to try, in order. An empty passphrase has two.
    pub fn candidates(text: &'a str) -> Vec<Password<'a>> {
        let mut candidates = vec![Password::new(text)];
        if text.is_empty() {
            candidates.push(Password::zero_length());
        }
        candidates
    }

    pub fn text(&self) -> &str {
        self.text
    }

    pub fn bmp(&self) -> &[u8] {
        &self.bmp
    }
}
