//! FSMTP Certs - Self-signed certificate minting
//!
//! Generates a fresh RSA key pair and an X.509 certificate signed by it
//! (SHA-512), then writes both as PEM files.

pub mod minter;
pub mod persist;

pub use minter::{
    mint_certificate, CertificateMinter, KeyMaterial, MintOptions, MintedCertificate,
    DEFAULT_KEY_BITS,
};
