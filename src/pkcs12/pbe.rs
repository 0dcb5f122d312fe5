//! Password-based decryption of PKCS#12 content.
//!
//! Two families are handled: the RFC 7292 Appendix C PBE schemes (SHA-1 KDF
//! with 3DES or RC2) still emitted by Windows and `openssl -legacy`, and
//! PBES2 from PKCS#5, which is the OpenSSL 3 default.

use ::pkcs12::kdf::{Pkcs12KeyType, derive_key};
use ::pkcs12::pbe_params::Pkcs12PbeParams;
use ::pkcs12::{
    PKCS_12_PBE_WITH_SHAAND2_KEY_TRIPLE_DES_CBC, PKCS_12_PBE_WITH_SHAAND3_KEY_TRIPLE_DES_CBC,
    PKCS_12_PBE_WITH_SHAAND128_BIT_RC2_CBC, PKCS_12_PBEWITH_SHAAND40_BIT_RC2_CBC,
};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, InnerIvInit, KeyInit};
use der::{Decode, Encode};
use pkcs5::pbes2::PBES2_OID;
use x509_cert::spki::AlgorithmIdentifierOwned;
use zeroize::Zeroizing;

use super::Password;
use crate::error::DecodeError;
use crate::key::describe_oid;

/// Decrypts `ciphertext` with the scheme named by `algorithm`.
///
/// # Returns
/// The plaintext with padding removed, or `DecodeError::AuthenticationFailed`
/// when the padding does not check out (the usual symptom of a wrong password).
pub fn decrypt(
    algorithm: &AlgorithmIdentifierOwned,
    password: &Password<'_>,
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, DecodeError> {
    match algorithm.oid {
        PKCS_12_PBE_WITH_SHAAND3_KEY_TRIPLE_DES_CBC => {
            let (key, iv) = derive_key_iv(algorithm, password, 24, 8)?;
            cbc_decrypt(des::TdesEde3::new_from_slice(&key).map_err(invalid_key)?, &iv, ciphertext)
        }
        PKCS_12_PBE_WITH_SHAAND2_KEY_TRIPLE_DES_CBC => {
            let (key, iv) = derive_key_iv(algorithm, password, 16, 8)?;
            cbc_decrypt(des::TdesEde2::new_from_slice(&key).map_err(invalid_key)?, &iv, ciphertext)
        }
        PKCS_12_PBE_WITH_SHAAND128_BIT_RC2_CBC => {
            let (key, iv) = derive_key_iv(algorithm, password, 16, 8)?;
            cbc_decrypt(rc2::Rc2::new_with_eff_key_len(&key, 128), &iv, ciphertext)
        }
        PKCS_12_PBEWITH_SHAAND40_BIT_RC2_CBC => {
            let (key, iv) = derive_key_iv(algorithm, password, 5, 8)?;
            cbc_decrypt(rc2::Rc2::new_with_eff_key_len(&key, 40), &iv, ciphertext)
        }
        PBES2_OID => pbes2_decrypt(algorithm, password, ciphertext),
        oid => Err(DecodeError::UnsupportedEncryption(describe_oid(&oid))),
    }
}

fn derive_key_iv(
    algorithm: &AlgorithmIdentifierOwned,
    password: &Password<'_>,
    key_len: usize,
    iv_len: usize,
) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>), DecodeError> {
    let params = algorithm
        .parameters
        .as_ref()
        .ok_or_else(|| DecodeError::InvalidContainer("missing PBE parameters".to_string()))?
        .decode_as::<Pkcs12PbeParams>()?;
    let rounds = params.iterations;
    if rounds < 1 {
        return Err(DecodeError::InvalidContainer(format!(
            "PBE iteration count {rounds} out of range"
        )));
    }
    let salt = params.salt.as_bytes();

    let key = Zeroizing::new(derive_key::<sha1::Sha1>(
        password.bmp(),
        salt,
        Pkcs12KeyType::EncryptionKey,
        rounds,
        key_len,
    ));
    let iv = derive_key::<sha1::Sha1>(password.bmp(), salt, Pkcs12KeyType::Iv, rounds, iv_len);
    Ok((key, iv))
}

fn cbc_decrypt<C>(cipher: C, iv: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, DecodeError>
where
    C: BlockCipher + BlockDecryptMut,
{
    let decryptor = cbc::Decryptor::<C>::inner_iv_slice_init(cipher, iv)
        .map_err(|_| DecodeError::InvalidContainer("invalid IV length".to_string()))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| DecodeError::AuthenticationFailed)
}

fn pbes2_decrypt(
    algorithm: &AlgorithmIdentifierOwned,
    password: &Password<'_>,
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, DecodeError> {
    let encoded = algorithm.to_der()?;
    let scheme = pkcs5::EncryptionScheme::from_der(&encoded)
        .map_err(|e| DecodeError::UnsupportedEncryption(format!("PBES2: {e}")))?;
    scheme
        .decrypt(password.text().as_bytes(), ciphertext)
        .map(Zeroizing::new)
        .map_err(|e| match e {
            // pkcs5 reports a padding failure as EncryptFailed.
            pkcs5::Error::DecryptFailed | pkcs5::Error::EncryptFailed => {
                DecodeError::AuthenticationFailed
            }
            other => DecodeError::UnsupportedEncryption(format!("PBES2: {other}")),
        })
}

/// Maps a failure to parse decrypted plaintext to `AuthenticationFailed`.
///
/// A wrong password passes the padding check now and then, leaving bytes
/// that are not the expected structure.
pub fn plaintext_error(err: DecodeError) -> DecodeError {
    match err {
        DecodeError::InvalidContainer(_) => DecodeError::AuthenticationFailed,
        other => other,
    }
}

fn invalid_key(err: cbc::cipher::InvalidLength) -> DecodeError {
    DecodeError::InvalidContainer(format!("derived key has the wrong length: {err}"))
}
