#![allow(dead_code)]

use std::path::PathBuf;

/// Reads a fixture from `tests/data`.
pub fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}

/// Reads a PEM fixture from `tests/data` as text.
pub fn fixture_text(name: &str) -> String {
    String::from_utf8(fixture(name)).expect("fixture is not UTF-8")
}

/// The first "CERTIFICATE" block of the reference PEM, for composing test inputs.
pub fn reference_certificate_pem() -> String {
    let text = fixture_text("reference.pem");
    let start = text
        .find("-----BEGIN CERTIFICATE-----")
        .expect("reference.pem has a certificate");
    text[start..].to_string()
}
