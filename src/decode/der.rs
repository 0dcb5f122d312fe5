use tracing::trace;

use super::Decoded;
use crate::cert::Certificate;
use crate::error::DecodeError;

/// Decodes raw DER input, which carries exactly one certificate and no key.
pub(crate) fn decode_der(raw: &[u8]) -> Result<Decoded, DecodeError> {
    let certificate = Certificate::from_der(raw)?;
    trace!(subject = %certificate.subject(), "DER certificate");

    Ok(Decoded {
        certificates: vec![certificate],
        private_key: None,
        friendly_name: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &[u8] = include_bytes!("../../tests/data/reference.der");

    #[test]
    fn test_truncated_der() {
        assert!(matches!(
            decode_der(&REFERENCE[..REFERENCE.len() / 2]),
            Err(DecodeError::InvalidContainer(_))
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut raw = REFERENCE.to_vec();
        raw.push(0);
        assert!(matches!(
            decode_der(&raw),
            Err(DecodeError::InvalidContainer(_))
        ));
    }
}
