//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    /// Falsches Passwort, andere KDF-Parameter oder manipulierter Ciphertext
    #[error("Entschluesselung fehlgeschlagen")]
    Entschluesselung,

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),

    #[error("Ungueltiges Token: {0}")]
    UngueltigesToken(String),

    #[error("Ungueltige Salt-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSaltLaenge { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Nonce-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeNonce { erwartet: usize, erhalten: usize },

    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Klartext ist kein gueltiges UTF-8")]
    KeinUtf8(#[from] std::string::FromUtf8Error),

    #[error("Hintergrund-Task abgebrochen: {0}")]
    Hintergrund(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
