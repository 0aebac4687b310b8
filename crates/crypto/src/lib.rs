//! # duett-crypto
//!
//! Passwort-basierte Verschluesselung fuer Duett.
//!
//! ## Module
//! - `kdf` - PBKDF2-HMAC-SHA256 Schluesselableitung
//! - `cipher` - AES-256-GCM Verschluesselung von Texten
//! - `token` - Textformat `salt:iv:ciphertext`
//! - `error` - Fehlertypen

pub mod cipher;
pub mod error;
pub mod kdf;
pub mod token;

// Bequeme Re-Exports
pub use cipher::{entschluesseln, verschluesseln, PasswortCipher};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{schluessel_ableiten, PBKDF2_ITERATIONEN};
pub use token::VerschluesseltesToken;
