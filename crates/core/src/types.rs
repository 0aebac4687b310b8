//! Gemeinsame Identifikationstypen fuer Duett
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Peer- und Sitzungs-IDs zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DuettError;

/// Vom Rendezvous-Server vergebene Peer-ID
///
/// Die Textform ist die nackte UUID, damit sie unveraendert in einem
/// Query-Parameter (`?peer=...`) transportiert werden kann.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub Uuid);

impl PeerId {
    /// Erstellt eine neue zufaellige PeerId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PeerId {
    type Err = DuettError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| DuettError::UngueltigePeerId(format!("'{s}': {e}")))
    }
}

/// ID einer manuell signalisierten Sitzung (verbindet Angebot und Antwort)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SitzungsId(pub Uuid);

impl SitzungsId {
    /// Erstellt eine neue zufaellige SitzungsId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SitzungsId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SitzungsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sitzung:{}", self.0)
    }
}

/// Rolle eines Teilnehmers in der Zwei-Personen-Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rolle {
    /// Erstellt die Einladung und wartet auf den Gast
    Host,
    /// Folgt einer Einladung
    Gast,
}

impl Rolle {
    /// Host ist, wer keinen Einladungs-Parameter mitbringt
    pub fn aus_parameter(parameter: Option<&str>) -> Self {
        match parameter {
            Some(wert) if !wert.is_empty() => Self::Gast,
            _ => Self::Host,
        }
    }

    pub fn ist_host(&self) -> bool {
        matches!(self, Self::Host)
    }
}

impl std::fmt::Display for Rolle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Gast => write!(f, "gast"),
        }
    }
}
