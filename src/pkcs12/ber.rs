//! Re-encoding of BER input as DER.
//!
//! Java keystores and some Windows exports write PFX files with indefinite
//! lengths and OCTET STRINGs split into chunks. `der` only reads DER, so
//! those layers are rewritten before decoding: indefinite lengths become
//! minimal definite ones and constructed strings become primitive ones.
//! Primitive contents are copied unchanged.

use zeroize::Zeroizing;

use crate::error::DecodeError;

/// Nesting deeper than this is rejected.
const MAX_DEPTH: usize = 64;

/// Universal string types that BER allows in constructed, chunked form.
const STRING_TAGS: &[u8] = &[
    0x04, // OCTET STRING
    0x0c, // UTF8String
    0x13, // PrintableString
    0x14, // TeletexString
    0x16, // IA5String
    0x1a, // VisibleString
    0x1e, // BMPString
];

/// Returns the DER encoding of the single BER element in `input`.
///
/// Input that is already DER comes back byte for byte. The output is
/// zeroized on drop because decrypted safe contents carry key material.
pub fn to_der(input: &[u8]) -> Result<Zeroizing<Vec<u8>>, DecodeError> {
    let mut reader = BerReader { data: input, pos: 0 };
    let node = reader.node(0)?;
    if reader.pos != input.len() {
        return Err(invalid(format!(
            "{} trailing bytes",
            input.len() - reader.pos
        )));
    }

    let mut out = Zeroizing::new(Vec::with_capacity(node.encoded_len()));
    node.encode(&mut out);
    Ok(out)
}

enum Node<'a> {
    Primitive {
        identifier: &'a [u8],
        content: &'a [u8],
    },
    Constructed {
        identifier: &'a [u8],
        children: Vec<Node<'a>>,
    },
    /// A constructed string, written back as one primitive string.
    Chunked { tag: u8, chunks: Vec<&'a [u8]> },
}

impl Node<'_> {
    fn content_len(&self) -> usize {
        match self {
            Node::Primitive { content, .. } => content.len(),
            Node::Constructed { children, .. } => children.iter().map(Node::encoded_len).sum(),
            Node::Chunked { chunks, .. } => chunks.iter().map(|chunk| chunk.len()).sum(),
        }
    }

    fn identifier_len(&self) -> usize {
        match self {
            Node::Primitive { identifier, .. } | Node::Constructed { identifier, .. } => {
                identifier.len()
            }
            Node::Chunked { .. } => 1,
        }
    }

    fn encoded_len(&self) -> usize {
        let len = self.content_len();
        self.identifier_len() + length_octets(len) + len
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Node::Primitive { identifier, content } => {
                out.extend_from_slice(identifier);
                encode_length(content.len(), out);
                out.extend_from_slice(content);
            }
            Node::Constructed {
                identifier,
                children,
            } => {
                out.extend_from_slice(identifier);
                encode_length(self.content_len(), out);
                for child in children {
                    child.encode(out);
                }
            }
            Node::Chunked { tag, chunks } => {
                out.push(*tag);
                encode_length(self.content_len(), out);
                for chunk in chunks {
                    out.extend_from_slice(chunk);
                }
            }
        }
    }
}

fn length_octets(len: usize) -> usize {
    if len < 0x80 {
        1
    } else {
        1 + (usize::BITS - len.leading_zeros()).div_ceil(8) as usize
    }
}

fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

fn invalid(reason: impl std::fmt::Display) -> DecodeError {
    DecodeError::InvalidContainer(format!("BER: {reason}"))
}

struct BerReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BerReader<'a> {
    fn byte(&mut self) -> Result<u8, DecodeError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| invalid("unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| invalid("length exceeds input"))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn at_end_of_contents(&self) -> bool {
        self.data[self.pos..].starts_with(&[0, 0])
    }

    /// Identifier octets, including high tag number continuation bytes.
    fn identifier(&mut self) -> Result<&'a [u8], DecodeError> {
        let start = self.pos;
        let first = self.byte()?;
        if first & 0x1f == 0x1f {
            loop {
                let next = self.byte()?;
                if next & 0x80 == 0 {
                    break;
                }
                if self.pos - start > 5 {
                    return Err(invalid("tag number too large"));
                }
            }
        }
        Ok(&self.data[start..self.pos])
    }

    /// `None` for the indefinite form.
    fn length(&mut self) -> Result<Option<usize>, DecodeError> {
        let first = self.byte()?;
        match first {
            0x00..=0x7f => Ok(Some(first as usize)),
            0x80 => Ok(None),
            0xff => Err(invalid("reserved length octet")),
            _ => {
                let count = (first & 0x7f) as usize;
                if count > size_of::<u32>() {
                    return Err(invalid("length too large"));
                }
                let mut len = 0usize;
                for _ in 0..count {
                    len = (len << 8) | self.byte()? as usize;
                }
                Ok(Some(len))
            }
        }
    }

    fn node(&mut self, depth: usize) -> Result<Node<'a>, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(invalid("nested too deeply"));
        }

        let identifier = self.identifier()?;
        let constructed = identifier[0] & 0x20 != 0;
        let length = self.length()?;

        if !constructed {
            let len = length.ok_or_else(|| invalid("indefinite length on a primitive"))?;
            let content = self.take(len)?;
            return Ok(Node::Primitive {
                identifier,
                content,
            });
        }

        let children = match length {
            Some(len) => {
                let mut inner = BerReader {
                    data: self.take(len)?,
                    pos: 0,
                };
                let mut children = Vec::new();
                while inner.pos < inner.data.len() {
                    children.push(inner.node(depth + 1)?);
                }
                children
            }
            None => {
                let mut children = Vec::new();
                loop {
                    if self.pos >= self.data.len() {
                        return Err(invalid("missing end-of-contents"));
                    }
                    if self.at_end_of_contents() {
                        self.pos += 2;
                        break;
                    }
                    children.push(self.node(depth + 1)?);
                }
                children
            }
        };

        let tag = identifier[0] & !0x20;
        if identifier.len() == 1 && STRING_TAGS.contains(&tag) {
            let mut chunks = Vec::with_capacity(children.len());
            for child in children {
                match child {
                    Node::Primitive {
                        identifier: [t],
                        content,
                    } if *t == tag => chunks.push(content),
                    Node::Chunked { tag: t, chunks: inner } if t == tag => chunks.extend(inner),
                    _ => return Err(invalid("constructed string holds a foreign element")),
                }
            }
            return Ok(Node::Chunked { tag, chunks });
        }

        Ok(Node::Constructed {
            identifier,
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_der_passes_through() {
        // SEQUENCE { INTEGER 3, OCTET STRING 'ab' }
        let der = [0x30, 0x07, 0x02, 0x01, 0x03, 0x04, 0x02, b'a', b'b'];
        assert_eq!(to_der(&der).unwrap().as_slice(), &der);
    }

    #[test]
    fn test_indefinite_lengths() {
        let ber = [
            0x30, 0x80, 0x02, 0x01, 0x03, 0xa0, 0x80, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let der = [0x30, 0x07, 0x02, 0x01, 0x03, 0xa0, 0x02, 0x05, 0x00];
        assert_eq!(to_der(&ber).unwrap().as_slice(), &der);
    }

    #[test]
    fn test_chunked_octet_string() {
        // Nested chunks flatten into one primitive string.
        let ber = [
            0x24, 0x80, 0x04, 0x01, b'a', 0x24, 0x06, 0x04, 0x01, b'b', 0x04, 0x01, b'c', 0x00,
            0x00,
        ];
        assert_eq!(
            to_der(&ber).unwrap().as_slice(),
            &[0x04, 0x03, b'a', b'b', b'c']
        );
    }

    #[test]
    fn test_long_form_lengths_are_minimised() {
        let mut ber = vec![0x04, 0x82, 0x00, 0x03];
        ber.extend_from_slice(b"xyz");
        assert_eq!(to_der(&ber).unwrap().as_slice(), &[0x04, 0x03, b'x', b'y', b'z']);

        let content = vec![7u8; 300];
        let mut ber = vec![0x24, 0x80, 0x04, 0x82, 0x01, 0x2c];
        ber.extend_from_slice(&content);
        ber.extend_from_slice(&[0, 0]);
        let der = to_der(&ber).unwrap();
        assert_eq!(&der[..4], &[0x04, 0x82, 0x01, 0x2c]);
        assert_eq!(der.len(), 304);
    }

    #[test]
    fn test_high_tag_numbers_are_kept() {
        let der = [0xbf, 0x81, 0x00, 0x02, 0x05, 0x00];
        assert_eq!(to_der(&der).unwrap().as_slice(), &der);
    }

    #[test]
    fn test_malformed_input() {
        let cases: [&[u8]; 7] = [
            &[],
            &[0x30, 0x80, 0x05, 0x00],
            &[0x04, 0x80, 0x00, 0x00],
            &[0x04, 0x05, 0x01],
            &[0x24, 0x80, 0x02, 0x01, 0x00, 0x00, 0x00],
            &[0x05, 0x00, 0x05, 0x00],
            &[0x04, 0xff],
        ];
        for ber in cases {
            assert!(
                matches!(to_der(ber), Err(DecodeError::InvalidContainer(_))),
                "{ber:02x?}"
            );
        }
    }

    #[test]
    fn test_depth_limit() {
        let mut ber = [0x30u8, 0x80].repeat(MAX_DEPTH + 2);
        ber.extend(std::iter::repeat_n(0u8, (MAX_DEPTH + 2) * 2));
        assert!(matches!(
            to_der(&ber),
            Err(DecodeError::InvalidContainer(_))
        ));
    }
}
