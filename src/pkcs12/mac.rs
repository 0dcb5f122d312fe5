//! Password integrity mode: HMAC over the `AuthenticatedSafe`.

use const_oid::db::rfc5912::{ID_SHA_1, ID_SHA_256, ID_SHA_384, ID_SHA_512};
use hmac::digest::core_api::BlockSizeUser;
use hmac::digest::{Digest, FixedOutputReset};
use hmac::{Mac, SimpleHmac};
use ::pkcs12::kdf::{Pkcs12KeyType, derive_key};

use super::MacData;
use crate::error::DecodeError;
use crate::key::describe_oid;

/// Verifies the PFX MAC with one password encoding.
///
/// # Arguments
/// * `mac_data` - The `MacData` of the PFX.
/// * `password` - The BMPString form of the password (see [`super::Password::bmp`]).
/// * `content` - The DER-encoded `AuthenticatedSafe`.
///
/// # Returns
/// `Ok(false)` on a MAC mismatch, an error if the MAC algorithm is unsupported.
pub fn verify(mac_data: &MacData, password: &[u8], content: &[u8]) -> Result<bool, DecodeError> {
    let rounds = mac_data.iterations;
    if rounds < 1 {
        return Err(DecodeError::InvalidContainer(format!(
            "MAC iteration count {rounds} out of range"
        )));
    }
    let salt = mac_data.mac_salt.as_bytes();
    let expected = mac_data.mac.digest.as_bytes();

    let verified = match mac_data.mac.algorithm.oid {
        ID_SHA_1 => verify_with::<sha1::Sha1>(password, salt, rounds, content, expected),
        ID_SHA_256 => verify_with::<sha2::Sha256>(password, salt, rounds, content, expected),
        ID_SHA_384 => verify_with::<sha2::Sha384>(password, salt, rounds, content, expected),
        ID_SHA_512 => verify_with::<sha2::Sha512>(password, salt, rounds, content, expected),
        oid => {
            return Err(DecodeError::UnsupportedEncryption(format!(
                "MAC digest {}",
                describe_oid(&oid)
            )));
        }
    };
    Ok(verified)
}

fn verify_with<D>(password: &[u8], salt: &[u8], rounds: i32, content: &[u8], expected: &[u8]) -> bool
where
    D: Digest + FixedOutputReset + BlockSizeUser,
{
    let key = zeroize::Zeroizing::new(derive_key::<D>(
        password,
        salt,
        Pkcs12KeyType::Mac,
        rounds,
        <D as Digest>::output_size(),
    ));
    let Ok(mut mac) = <SimpleHmac<D> as Mac>::new_from_slice(&key) else {
        return false;
    };
    mac.update(content);
    mac.verify_slice(expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::pkcs12::digest_info::DigestInfo;
    use der::asn1::OctetString;
    use x509_cert::spki::AlgorithmIdentifierOwned;

    fn mac_data_for(password: &[u8], content: &[u8]) -> MacData {
        let salt = [7u8; 8];
        let key = derive_key::<sha2::Sha256>(password, &salt, Pkcs12KeyType::Mac, 2048, 32);
        let mut mac = <SimpleHmac<sha2::Sha256> as Mac>::new_from_slice(&key).unwrap();
        mac.update(content);
        MacData {
            mac: DigestInfo {
                algorithm: AlgorithmIdentifierOwned {
                    oid: ID_SHA_256,
                    parameters: None,
                },
                digest: OctetString::new(mac.finalize().into_bytes().to_vec()).unwrap(),
            },
            mac_salt: OctetString::new(salt.to_vec()).unwrap(),
            iterations: 2048,
        }
    }

    #[test]
    fn test_verify_accepts_matching_password() {
        let mac_data = mac_data_for(b"\0p\0w\0\0", b"content");
        assert!(verify(&mac_data, b"\0p\0w\0\0", b"content").unwrap());
    }

    #[test]
    fn test_verify_rejects_other_password_or_content() {
        let mac_data = mac_data_for(b"\0p\0w\0\0", b"content");
        assert!(!verify(&mac_data, b"\0\0", b"content").unwrap());
        assert!(!verify(&mac_data, b"\0p\0w\0\0", b"tampered").unwrap());
    }

    #[test]
    fn test_verify_rejects_non_positive_iterations() {
        let mut mac_data = mac_data_for(b"\0\0", b"content");
        mac_data.iterations = 0;
        assert!(matches!(
            verify(&mac_data, b"\0\0", b"content"),
            Err(DecodeError::InvalidContainer(_))
        ));
    }

    #[test]
    fn test_verify_unknown_digest() {
        let mut mac_data = mac_data_for(b"\0\0", b"content");
        mac_data.mac.algorithm.oid = const_oid::ObjectIdentifier::new_unwrap("1.2.840.113549.2.5");
        assert!(matches!(
            verify(&mac_data, b"\0\0", b"content"),
            Err(DecodeError::UnsupportedEncryption(_))
        ));
    }
}
