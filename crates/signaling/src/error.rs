//! Fehlertypen fuer den Rendezvous-Server
//!
//! Protokollfehler einzelner Clients werden als `Error`-Frame beantwortet
//! und landen nicht hier. Nur Fehler, die den Server selbst betreffen.

use thiserror::Error;

/// Fehlertyp fuer den Rendezvous-Server
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (Binden, lokale Adresse)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

/// Result-Typ fuer den Rendezvous-Server
pub type SignalingResult<T> = Result<T, SignalingError>;
