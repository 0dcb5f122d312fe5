use std::fmt;

use bon::Builder;

use crate::decode::SourceFormat;

/// Options for [`CertificateBundle::import`](crate::bundle::CertificateBundle::import).
///
/// # Fields
/// * `passphrase` - Unlocks PFX containers and encrypted PEM keys. Defaults to empty.
/// * `format` - Forces a source format instead of detecting it from the input.
#[derive(Clone, Default, Builder)]
pub struct ImportOptions {
    #[builder(default, into)]
    pub passphrase: String,
    pub format: Option<SourceFormat>,
}

impl fmt::Debug for ImportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportOptions")
            .field("passphrase", &"<redacted>")
            .field("format", &self.format)
            .finish()
    }
}
