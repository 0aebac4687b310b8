//! Rendezvous-Protokoll (TCP)
//!
//! Definiert die Nachrichten zwischen einem Peer und dem Rendezvous-Server.
//!
//! ## Ablauf
//! ```text
//! Host                    Server                    Gast
//!  |--- Register ---------->|                         |
//!  |<-- Assigned{id} -------|                         |
//!  |                        |<-------- Register ------|
//!  |                        |------ Assigned{id2} --->|
//!  |                        |<-- Connect{target=id} --|
//!  |<-- Paired{id2} --------|------ Paired{id} ------>|
//!  |--- Data{payload} ----->|------ Data{payload} --->|
//! ```
//!
//! - JSON-Serialisierung via serde, Tagged Enum mit Feld `type`
//! - `Data.payload` ist der JSON-Text der Anwendungsnachricht und wird vom
//!   Server unveraendert weitergereicht

use duett_core::types::PeerId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer Error-Antworten des Servers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    /// Aktion erfordert vorheriges `Register`
    NotRegistered,
    /// Ziel-Peer ist nicht (mehr) registriert
    UnknownPeer,
    /// Ziel-Peer ist bereits mit jemand anderem verbunden
    AlreadyPaired,
    /// Peer versucht sich mit sich selbst zu verbinden
    SelfConnect,
    /// `Data` ohne bestehende Paarung
    NotPaired,
}

// ---------------------------------------------------------------------------
// RendezvousMessage
// ---------------------------------------------------------------------------

/// Alle Nachrichten auf der Rendezvous-Verbindung (beide Richtungen)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RendezvousMessage {
    /// Client -> Server: Peer-ID anfordern
    Register,
    /// Server -> Client: zugewiesene Peer-ID
    Assigned { peer_id: PeerId },
    /// Client -> Server: mit einem registrierten Peer verbinden
    Connect { target: PeerId },
    /// Server -> beide Clients: Paarung steht, Kanal ist offen
    Paired { remote: PeerId },
    /// Anwendungsdaten (JSON-Text), wird an den Partner weitergeleitet
    Data { payload: String },
    /// Server -> Client: der Partner hat die Verbindung getrennt
    PeerLeft { peer_id: PeerId },
    /// Server -> Client: Fehlerantwort
    Error { code: ErrorCode, message: String },
}

impl RendezvousMessage {
    /// Erstellt eine Fehler-Antwort
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// Kurzname fuer Logging
    pub fn art(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Assigned { .. } => "assigned",
            Self::Connect { .. } => "connect",
            Self::Paired { .. } => "paired",
            Self::Data { .. } => "data",
            Self::PeerLeft { .. } => "peer_left",
            Self::Error { .. } => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
