//! Fehlertypen fuer Duett
//!
//! Zentraler Fehler-Enum fuer die gemeinsamen Bausteine.
//! Die Fach-Crates definieren eigene Fehler und konvertieren via `#[from]`.

use thiserror::Error;

/// Globaler Result-Alias fuer Duett
pub type Result<T> = std::result::Result<T, DuettError>;

/// Fehler der gemeinsamen Bausteine
#[derive(Debug, Error)]
pub enum DuettError {
    #[error("Ungueltiger Signalisierungs-Payload: {0}")]
    UngueltigesSignal(String),

    #[error("Ungueltige Peer-ID: {0}")]
    UngueltigePeerId(String),
}

impl DuettError {
    /// Erstellt einen Signal-Fehler aus einer beliebigen Nachricht
    pub fn signal(msg: impl Into<String>) -> Self {
        Self::UngueltigesSignal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = DuettError::UngueltigePeerId("abc".into());
        assert_eq!(e.to_string(), "Ungueltige Peer-ID: abc");
    }

    #[test]
    fn signal_fehler_konstruktor() {
        let e = DuettError::signal("kein Base64");
        assert!(matches!(e, DuettError::UngueltigesSignal(_)));
        assert!(e.to_string().contains("kein Base64"));
    }
}
