//! Direkt-Protokoll der manuellen Variante
//!
//! Nach dem Austausch von Angebot und Antwort verbindet sich der Gast per
//! TCP direkt mit dem Host. Der erste Frame des Gastes ist `Hello`, der Host
//! bestaetigt mit `Welcome` sobald die passende Antwort eingefuegt wurde.
//! Danach fliessen nur noch `Data`-Frames.

use duett_core::types::SitzungsId;
use serde::{Deserialize, Serialize};

/// Nachrichten auf der direkten Peer-Verbindung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectMessage {
    /// Gast -> Host: Sitzung und Token aus der Antwort
    Hello {
        session: SitzungsId,
        answer_token: String,
    },
    /// Host -> Gast: Handshake abgeschlossen
    Welcome,
    /// Anwendungsdaten (JSON-Text)
    Data { payload: String },
}
