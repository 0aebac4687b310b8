//! # duett-observability
//!
//! Structured Logging fuer `duett-server` und `duett` via tracing-subscriber.
//! Bibliotheks-Crates loggen nur ueber `tracing`, initialisiert wird
//! ausschliesslich in den Binaries.

pub mod logging;

pub use logging::{logging_initialisieren, LogFormat, LoggingFehler};
