//! duett-protocol – Wire-Formate
//!
//! Definiert das Frame-Format, die Rendezvous-Nachrichten, das Direkt-
//! Protokoll der manuellen Variante und die Signalisierungs-Payloads.

pub mod control;
pub mod direct;
pub mod signal;
pub mod wire;

pub use control::{ErrorCode, RendezvousMessage};
pub use direct::DirectMessage;
pub use signal::SignalPayload;
pub use wire::FrameCodec;
