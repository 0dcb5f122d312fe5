//! # CertBundle - X.509 Certificate and Key Normalization
//!
//! CertBundle turns certificate material in the three formats secret stores
//! hand out (PKCS#12, PEM and raw DER) into one [`CertificateBundle`], and
//! re-encodes selected parts of it as standard PEM. It is built entirely on
//! RustCrypto crates, with OpenSSL used only in tests.
//!
//! ## Supported Inputs
//!
//! - **PKCS#12 / PFX**: password integrity (HMAC-SHA1/SHA-2), legacy 3DES and RC2
//!   bag encryption as well as PBES2/AES, key bags and shrouded key bags
//! - **PEM**: any mix of `CERTIFICATE` blocks with at most one `PRIVATE KEY`,
//!   `RSA PRIVATE KEY` or `ENCRYPTED PRIVATE KEY` block
//! - **DER**: a single X.509 certificate
//!
//! Private keys are classified on import. RSA is the only supported key type;
//! any other algorithm fails with [`DecodeError::UnsupportedKeyType`].
//!
//! ## Quick Start
//!
//! ### Importing a PFX
//!
//! ```rust,no_run
//! use certbundle::{CertificateBundle, PrivateKeyType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = std::fs::read("tls.pfx")?;
//! let bundle = CertificateBundle::from_pfx(&raw)?;
//!
//! assert!(bundle.has_private_key());
//! assert_eq!(bundle.private_key_type(), PrivateKeyType::Rsa);
//!
//! // PEM for the key and the certificate chain
//! let key_pem = bundle.export_private_key_pem()?;
//! let chain_pem = bundle.export_public_key_pem()?;
//!
//! // The original PFX, byte for byte
//! assert_eq!(bundle.export_raw(), raw.as_slice());
//! # let _ = (key_pem, chain_pem);
//! # Ok(())
//! # }
//! ```
//!
//! ### Importing Unknown Input
//!
//! ```rust,no_run
//! use certbundle::{CertificateBundle, ImportOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = std::fs::read("secret.bin")?;
//! let options = ImportOptions::builder().passphrase("s3cret").build();
//! let bundle = CertificateBundle::import(&raw, &options)?;
//!
//! for cert in bundle.certificates() {
//!     println!("{} (issued by {})", cert.subject(), cert.issuer());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Import either yields a complete bundle or a [`DecodeError`]:
//!
//! ```rust
//! use certbundle::{CertificateBundle, error::DecodeError};
//!
//! match CertificateBundle::from_der(&[0x30, 0x03, 0x02, 0x01, 0x00]) {
//!     Ok(bundle) => println!("{} certificates", bundle.certificates().len()),
//!     Err(DecodeError::InvalidContainer(msg)) => println!("Malformed input: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bundle`]: The certificate bundle, import entry points and exporters
//! - [`cert`]: A decoded certificate and its accessors
//! - [`key`]: Private key classification and export
//! - [`decode`]: Per-format decoders and format detection
//! - [`pkcs12`]: PFX parsing (BER or DER), MAC verification and bag decryption
//! - [`options`]: Import configuration
//! - [`error`]: Error types

pub mod bundle;
pub mod cert;
pub mod decode;
pub mod error;
pub mod key;
pub mod options;
pub mod pem_utils;
pub mod pkcs12;

pub use bundle::CertificateBundle;
pub use cert::Certificate;
pub use decode::{SourceFormat, detect_format};
pub use error::{DecodeError, ExportError};
pub use key::{PrivateKey, PrivateKeyType};
pub use options::ImportOptions;
