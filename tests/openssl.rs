mod util;

use certbundle::{CertificateBundle, PrivateKeyType};
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::PKey;
use openssl::stack::Stack;
use openssl::x509::X509;
use regex::Regex;
use std::fs;
use std::process::Command;

fn common_name(name: &openssl::x509::X509NameRef) -> String {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap()
        .to_string()
}

#[test]
fn test_openssl_crate_parses_exported_key() {
    let bundle = CertificateBundle::from_pfx(&util::fixture("reference.pfx")).unwrap();
    let key_pem = bundle.export_private_key_pem().unwrap();

    let pkey = PKey::private_key_from_pem(&key_pem).expect("OpenSSL rejected exported key");
    let rsa = pkey.rsa().unwrap();
    assert!(rsa.check_key().unwrap(), "RSA key consistency check failed");
    assert_eq!(rsa.n().to_vec(), bundle.private_key().unwrap().modulus());
    assert_eq!(rsa.e().to_vec(), bundle.private_key().unwrap().public_exponent());
}

#[test]
fn test_openssl_crate_parses_exported_chain() {
    let bundle = CertificateBundle::from_pfx(&util::fixture("chain.pfx")).unwrap();
    let chain = X509::stack_from_pem(&bundle.export_public_key_pem().unwrap())
        .expect("OpenSSL rejected exported chain");

    assert_eq!(chain.len(), 2);
    assert_eq!(common_name(chain[0].subject_name()), "leaf.bundle.test");
    assert_eq!(common_name(chain[0].issuer_name()), "Bundle Test CA");
    assert_eq!(common_name(chain[1].subject_name()), "Bundle Test CA");

    // The exported key belongs to the leaf.
    let key_pem = bundle.export_private_key_pem().unwrap();
    let pkey = PKey::private_key_from_pem(&key_pem).unwrap();
    assert!(chain[0].public_key().unwrap().public_eq(&pkey));
}

#[test]
fn test_import_openssl_built_pfx() {
    let text = util::fixture_text("chain.pem");
    let certs = X509::stack_from_pem(text.as_bytes()).unwrap();
    let pkey = PKey::private_key_from_pem(text.as_bytes()).unwrap();

    let mut ca = Stack::new().unwrap();
    ca.push(certs[1].clone()).unwrap();
    let pfx = Pkcs12::builder()
        .name("interop")
        .pkey(&pkey)
        .cert(&certs[0])
        .ca(ca)
        .build2("correct horse")
        .unwrap()
        .to_der()
        .unwrap();

    assert!(CertificateBundle::from_pfx(&pfx).is_err());

    let bundle = CertificateBundle::from_pfx_with_passphrase(&pfx, "correct horse").unwrap();
    assert_eq!(bundle.private_key_type(), PrivateKeyType::Rsa);
    assert_eq!(bundle.friendly_name(), Some("interop"));
    assert_eq!(bundle.certificates().len(), 2);
    assert_eq!(bundle.leaf().unwrap().to_der(), certs[0].to_der().unwrap());
    assert_eq!(bundle.export_raw(), pfx.as_slice());
}

#[test]
fn test_openssl_cli_reads_exported_certificate() {
    let bundle = CertificateBundle::from_der(&util::fixture("reference.der")).unwrap();
    let cert_pem = bundle.export_public_key_pem().unwrap();

    let cert_path = std::env::temp_dir().join("certbundle_exported_cert.pem");
    fs::write(&cert_path, cert_pem).expect("Failed to write exported certificate");

    let output = Command::new("openssl")
        .arg("x509")
        .arg("-in")
        .arg(&cert_path)
        .arg("-noout")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");

    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output_text = String::from_utf8_lossy(&output.stdout);
    let subject_regex = Regex::new(r"Subject: ?CN ?= ?cumulus\.spvest\.no").unwrap();
    let not_after_regex = Regex::new(r"Not After ?: .+2019 GMT").unwrap();

    assert!(
        subject_regex.is_match(&output_text),
        "Subject field is incorrect"
    );
    assert!(
        not_after_regex.is_match(&output_text),
        "Missing or incorrect Not After field"
    );

    fs::remove_file(cert_path).expect("Failed to remove exported certificate");
}
