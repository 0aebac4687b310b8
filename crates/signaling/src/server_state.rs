//! Gemeinsamer Server-Zustand fuer den Rendezvous-Server
//!
//! Haelt Konfiguration und Registry als Arc-Referenzen, die sicher zwischen
//! den Verbindungs-Tasks geteilt werden koennen.

use duett_protocol::wire::DEFAULT_MAX_FRAME_SIZE;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::registry::PeerRegistry;

/// Konfiguration fuer den Rendezvous-Server
#[derive(Debug, Clone)]
pub struct RendezvousConfig {
    /// Maximale gleichzeitige Verbindungen
    pub max_clients: usize,
    /// Maximale Frame-Groesse in Bytes
    pub max_frame_groesse: usize,
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
}

impl Default for RendezvousConfig {
    fn default() -> Self {
        Self {
            max_clients: 512,
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
            send_queue_groesse: 64,
        }
    }
}

/// Gemeinsamer Server-Zustand
pub struct RendezvousState {
    /// Server-Konfiguration
    pub config: Arc<RendezvousConfig>,
    /// Registrierte Peers und Paarungen
    pub registry: PeerRegistry,
    /// Offene TCP-Verbindungen (registriert oder nicht)
    aktive_verbindungen: AtomicUsize,
    /// Startzeitpunkt des Servers (fuer Uptime-Berechnung)
    pub start_time: Instant,
}

impl RendezvousState {
    /// Erstellt einen neuen RendezvousState
    pub fn neu(config: RendezvousConfig) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            registry: PeerRegistry::neu(),
            aktive_verbindungen: AtomicUsize::new(0),
            start_time: Instant::now(),
        })
    }

    /// Reserviert einen Verbindungsplatz
    ///
    /// Gibt `false` zurueck wenn `max_clients` bereits erreicht ist.
    pub fn verbindung_reservieren(&self) -> bool {
        self.aktive_verbindungen
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |aktiv| {
                (aktiv < self.config.max_clients).then_some(aktiv + 1)
            })
            .is_ok()
    }

    /// Gibt einen Verbindungsplatz wieder frei
    pub fn verbindung_freigeben(&self) {
        self.aktive_verbindungen.fetch_sub(1, Ordering::AcqRel);
    }

    /// Anzahl offener Verbindungen
    pub fn aktive_verbindungen(&self) -> usize {
        self.aktive_verbindungen.load(Ordering::Acquire)
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
