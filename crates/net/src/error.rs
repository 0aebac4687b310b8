//! Fehlertypen fuer den Verbindungsaufbau

use duett_core::DuettError;
use duett_protocol::control::ErrorCode;
use thiserror::Error;

/// Fehlertyp fuer Link, Signalisierung und Link-Kuerzer
#[derive(Debug, Error)]
pub enum NetzError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Fehler aus den gemeinsamen Bausteinen (Peer-ID, Signal-Payload)
    #[error(transparent)]
    Kern(#[from] DuettError),

    /// Nachricht liess sich nicht als JSON serialisieren
    #[error("JSON-Fehler: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP-Fehler beim Link-Kuerzer
    #[error("HTTP-Fehler: {0}")]
    Http(#[from] reqwest::Error),

    /// URL konnte nicht gebildet oder gelesen werden
    #[error("Ungueltige URL: {0}")]
    Url(String),

    /// Rendezvous-Server hat mit einem Fehler geantwortet
    #[error("Server-Fehler ({code:?}): {message}")]
    Server { code: ErrorCode, message: String },

    /// Gegenstelle hat etwas anderes geschickt als erwartet
    #[error("Unerwartete Antwort: {0}")]
    UnerwarteteAntwort(String),

    /// Transport wurde geschlossen bevor der Kanal offen war
    #[error("Verbindung beendet bevor der Kanal bereit war")]
    NichtBereit,

    /// Signal gehoert zu einer anderen Sitzung oder ist vom falschen Typ
    #[error("Signal passt nicht: {0}")]
    FalschesSignal(String),

    /// Keine Adresse, unter der der Host erreichbar ist
    #[error("Keine Kandidaten-Adressen")]
    KeineKandidaten,

    /// Link-Kuerzer hat eine leere Antwort geliefert
    #[error("Link-Kuerzer lieferte keinen Link")]
    LeereKurzantwort,

    /// Sende-Queue ist voll
    #[error("Sende-Queue voll")]
    QueueVoll,
}

impl NetzError {
    /// Erstellt einen Fehler fuer unerwartete Antworten
    pub fn unerwartet(msg: impl Into<String>) -> Self {
        Self::UnerwarteteAntwort(msg.into())
    }
}

/// Result-Typ fuer den Verbindungsaufbau
pub type NetzResult<T> = Result<T, NetzError>;
