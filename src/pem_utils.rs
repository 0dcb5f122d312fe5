use crate::error::DecodeError;

pub const CERTIFICATE: &str = "CERTIFICATE";
pub const PRIVATE_KEY: &str = "PRIVATE KEY";
pub const RSA_PRIVATE_KEY: &str = "RSA PRIVATE KEY";
pub const EC_PRIVATE_KEY: &str = "EC PRIVATE KEY";
pub const ENCRYPTED_PRIVATE_KEY: &str = "ENCRYPTED PRIVATE KEY";

const BEGIN_MARKER: &str = "-----BEGIN ";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
///
/// Lines are wrapped at 64 columns and terminated with LF.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM‑encoded string to DER‑encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>, DecodeError> {
    let pem = pem::parse(pem_str)?;
    Ok(pem.into_contents())
}

/// Whether the text contains at least one PEM begin marker.
pub fn has_pem_marker(text: &str) -> bool {
    text.contains(BEGIN_MARKER)
}

/// Parse every PEM block of a concatenated text blob, in order of appearance.
///
/// Text between blocks is ignored. A begin marker that does not yield a
/// complete block is an encoding error rather than a silently dropped block.
pub fn parse_blocks(text: &str) -> Result<Vec<pem::Pem>, DecodeError> {
    let blocks = pem::parse_many(text)?;
    let markers = text.matches(BEGIN_MARKER).count();
    if blocks.len() != markers {
        return Err(DecodeError::InvalidEncoding(format!(
            "found {markers} PEM begin markers but only {} complete blocks",
            blocks.len()
        )));
    }
    Ok(blocks)
}
