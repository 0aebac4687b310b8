//! PeerLink – Anwendungsseite einer Zwei-Personen-Verbindung
//!
//! Beide Varianten (Rendezvous und manuell) enden im selben Muster:
//! ein tokio-Task pro Verbindung, der per `select!` eingehende Frames
//! verarbeitet und die Sende-Queue des `PeerLink` abarbeitet.
//!
//! ```text
//! PeerLink::senden --JSON--> Queue --> Transport-Task --> Framed<TcpStream>
//!                                          |
//! Callback <--serde_json::Value-- Parse <--+
//! ```

use duett_core::types::Rolle;
use duett_protocol::{
    control::RendezvousMessage, direct::DirectMessage, wire::FrameCodec,
};
use futures_util::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use crate::bereit::{bereit_signal, Bereit, BereitAusloeser};
use crate::error::{NetzError, NetzResult};

/// Groesse der Sende-Queue pro Link
pub const SENDE_QUEUE_GROESSE: usize = 256;

// ---------------------------------------------------------------------------
// PeerLink
// ---------------------------------------------------------------------------

/// Sende-Handle der Anwendung
///
/// Beim Verwerfen wird der Transport-Task abgebrochen.
#[derive(Debug)]
pub struct PeerLink {
    rolle: Rolle,
    offen: Arc<AtomicBool>,
    ausgang: mpsc::Sender<String>,
    task: Option<JoinHandle<()>>,
}

impl PeerLink {
    /// Sendet eine Nachricht als JSON an die Gegenstelle
    ///
    /// Gibt `Ok(false)` zurueck und verwirft die Nachricht, solange der
    /// Kanal nicht offen ist.
    pub fn senden<T: Serialize + ?Sized>(&self, nachricht: &T) -> NetzResult<bool> {
        if !self.ist_offen() {
            tracing::debug!(rolle = %self.rolle, "Kanal nicht offen – Nachricht verworfen");
            return Ok(false);
        }

        let payload = serde_json::to_string(nachricht)?;
        match self.ausgang.try_send(payload) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => Err(NetzError::QueueVoll),
            // Transport-Task ist beendet
            Err(mpsc::error::TrySendError::Closed(_)) => Ok(false),
        }
    }

    pub fn ist_host(&self) -> bool {
        self.rolle.ist_host()
    }

    pub fn rolle(&self) -> Rolle {
        self.rolle
    }

    /// Ist der Kanal gerade offen?
    pub fn ist_offen(&self) -> bool {
        self.offen.load(Ordering::Acquire)
    }

    pub(crate) fn task_setzen(&mut self, task: JoinHandle<()>) {
        self.task = Some(task);
    }
}

impl Drop for PeerLink {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Bausteine fuer einen neuen Link
///
/// Der Transport-Task bekommt `Kanalzustand` und `ausgang_rx`, der Aufrufer
/// `PeerLink` und `Bereit`.
pub(crate) struct LinkTeile {
    pub link: PeerLink,
    pub bereit: Bereit,
    pub zustand: Kanalzustand,
    pub ausgang_rx: mpsc::Receiver<String>,
}

pub(crate) fn link_erstellen(rolle: Rolle) -> LinkTeile {
    let offen = Arc::new(AtomicBool::new(false));
    let (ausgang, ausgang_rx) = mpsc::channel(SENDE_QUEUE_GROESSE);
    let (ausloeser, bereit) = bereit_signal();

    LinkTeile {
        link: PeerLink {
            rolle,
            offen: Arc::clone(&offen),
            ausgang,
            task: None,
        },
        bereit,
        zustand: Kanalzustand { offen, ausloeser },
        ausgang_rx,
    }
}

// ---------------------------------------------------------------------------
// Kanalzustand
// ---------------------------------------------------------------------------

/// Offen-Flag und Bereit-Ausloeser, gehalten vom Transport-Task
pub(crate) struct Kanalzustand {
    offen: Arc<AtomicBool>,
    ausloeser: BereitAusloeser,
}

impl Kanalzustand {
    pub fn oeffnen(&mut self) {
        self.offen.store(true, Ordering::Release);
        if self.ausloeser.ausloesen() {
            tracing::info!("Kanal offen");
        }
    }

    pub fn schliessen(&self) {
        self.offen.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Transport-Nachrichten
// ---------------------------------------------------------------------------

/// Was eine eingehende Transport-Nachricht fuer den Kanal bedeutet
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Ereignis {
    Geoeffnet,
    Daten(String),
    GegenstelleWeg,
    Ignoriert,
}

/// Transport-Nachricht, die Anwendungsdaten tragen kann
pub(crate) trait Kanalnachricht: Serialize + DeserializeOwned + Send + 'static {
    /// Verpackt einen JSON-Text fuer den Versand
    fn daten(payload: String) -> Self;

    /// Deutet eine eingehende Nachricht
    fn ereignis(self) -> Ereignis;
}

impl Kanalnachricht for RendezvousMessage {
    fn daten(payload: String) -> Self {
        Self::Data { payload }
    }

    fn ereignis(self) -> Ereignis {
        match self {
            Self::Paired { remote } => {
                tracing::info!(remote = %remote, "Mit Gegenstelle gepaart");
                Ereignis::Geoeffnet
            }
            Self::Data { payload } => Ereignis::Daten(payload),
            Self::PeerLeft { peer_id } => {
                tracing::info!(peer = %peer_id, "Gegenstelle hat die Verbindung verlassen");
                Ereignis::GegenstelleWeg
            }
            Self::Error { code, message } => {
                tracing::error!(?code, message = %message, "Fehler vom Rendezvous-Server");
                Ereignis::Ignoriert
            }
            andere => {
                tracing::debug!(art = andere.art(), "Unerwartete Server-Nachricht ignoriert");
                Ereignis::Ignoriert
            }
        }
    }
}

impl Kanalnachricht for DirectMessage {
    fn daten(payload: String) -> Self {
        Self::Data { payload }
    }

    fn ereignis(self) -> Ereignis {
        match self {
            Self::Welcome => Ereignis::Geoeffnet,
            Self::Data { payload } => Ereignis::Daten(payload),
            Self::Hello { .. } => {
                tracing::debug!("Wiederholtes Hello ignoriert");
                Ereignis::Ignoriert
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Transport-Schleife
// ---------------------------------------------------------------------------

/// Parst einen empfangenen Payload und reicht ihn an den Callback weiter
///
/// Ungueltiges JSON wird geloggt und verworfen, der Callback sieht es nie.
pub(crate) fn nutzdaten_zustellen<F>(payload: &str, empfaenger: &F) -> bool
where
    F: Fn(serde_json::Value),
{
    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(wert) => {
            empfaenger(wert);
            true
        }
        Err(e) => {
            tracing::error!(fehler = %e, bytes = payload.len(), "Ungueltiges JSON verworfen");
            false
        }
    }
}

/// Betreibt einen Kanal bis zum Verbindungsende
///
/// Liest Frames und arbeitet die Sende-Queue ab. Am Ende ist der Kanal
/// geschlossen und der Bereit-Ausloeser verworfen.
pub(crate) async fn kanal_betreiben<M, F>(
    mut framed: Framed<TcpStream, FrameCodec<M>>,
    mut ausgang_rx: mpsc::Receiver<String>,
    mut zustand: Kanalzustand,
    empfaenger: F,
) where
    M: Kanalnachricht,
    F: Fn(serde_json::Value) + Send + Sync + 'static,
{
    loop {
        tokio::select! {
            frame = framed.next() => {
                match frame {
                    Some(Ok(nachricht)) => match nachricht.ereignis() {
                        Ereignis::Geoeffnet => zustand.oeffnen(),
                        Ereignis::Daten(payload) => {
                            nutzdaten_zustellen(&payload, &empfaenger);
                        }
                        Ereignis::GegenstelleWeg => zustand.schliessen(),
                        Ereignis::Ignoriert => {}
                    },
                    Some(Err(e)) => {
                        tracing::warn!(fehler = %e, "Frame-Lesefehler");
                        break;
                    }
                    None => {
                        tracing::info!("Verbindung von der Gegenstelle getrennt");
                        break;
                    }
                }
            }

            Some(payload) = ausgang_rx.recv() => {
                if let Err(e) = framed.send(M::daten(payload)).await {
                    tracing::warn!(fehler = %e, "Senden fehlgeschlagen");
                    break;
                }
            }
        }
    }

    zustand.schliessen();
    tracing::debug!("Transport-Task beendet");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
