//! duett-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die Bausteine bereit, die von Protokoll, Signaling
//! und Netzwerk-Bootstrap gemeinsam genutzt werden.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{DuettError, Result};
pub use types::{PeerId, Rolle, SitzungsId};
