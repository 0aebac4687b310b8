//! duett-signaling – Rendezvous-Server
//!
//! Vergibt Peer-IDs, paart genau zwei Teilnehmer und leitet deren
//! Frames weiter. Der Server versteht die Anwendungsdaten nicht, er reicht
//! `Data.payload` unveraendert durch.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (RendezvousServer)
//!     |
//!     v
//! PeerConnection (pro Verbindung ein Task)
//!     |
//!     v
//! RendezvousDispatcher --> PeerRegistry (DashMap: PeerId -> Queue + Partner)
//! ```

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod server_state;
pub mod tcp;

// Bequeme Re-Exporte
pub use connection::PeerConnection;
pub use dispatcher::RendezvousDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use registry::PeerRegistry;
pub use server_state::{RendezvousConfig, RendezvousState};
pub use tcp::RendezvousServer;
