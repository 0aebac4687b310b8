//! Peer-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `PeerConnection` in einem eigenen
//! tokio-Task. Eingehende Frames gehen an den `RendezvousDispatcher`,
//! ausgehende Nachrichten anderer Verbindungen kommen ueber die eigene
//! Send-Queue.
//!
//! ## Lebenszyklus
//! ```text
//! Verbunden -> Registriert -> Gepaart
//!     |            |            |
//!     +------------+------------+--> Getrennt (Registry-Eintrag entfernt,
//!                                              Partner erhaelt PeerLeft)
//! ```

use duett_protocol::{control::RendezvousMessage, wire::FrameCodec};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;

use crate::dispatcher::{DispatcherContext, RendezvousDispatcher};
use crate::server_state::RendezvousState;

/// Verarbeitet eine einzelne TCP-Verbindung
pub struct PeerConnection {
    state: Arc<RendezvousState>,
    peer_addr: SocketAddr,
}

impl PeerConnection {
    /// Erstellt eine neue PeerConnection
    pub fn neu(state: Arc<RendezvousState>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal
    /// eingeht. Der Aufrufer hat vorher per `verbindung_reservieren` einen
    /// Platz belegt, der hier am Ende freigegeben wird.
    pub async fn verarbeiten(self, stream: TcpStream, mut shutdown_rx: watch::Receiver<bool>) {
        let peer_addr = self.peer_addr;
        tracing::info!(peer = %peer_addr, "Neue Verbindung");

        let codec = FrameCodec::<RendezvousMessage>::with_max_size(
            self.state.config.max_frame_groesse,
        );
        let mut framed = Framed::new(stream, codec);

        // Ausgehende Nachrichten von anderen Verbindungen (Paired, Data, PeerLeft)
        let (sende_tx, mut sende_rx) =
            mpsc::channel::<RendezvousMessage>(self.state.config.send_queue_groesse);

        let mut ctx = DispatcherContext {
            peer_addr,
            peer_id: None,
            sende_tx,
        };
        let dispatcher = RendezvousDispatcher::neu(Arc::clone(&self.state));

        loop {
            tokio::select! {
                // Eingehende Nachricht vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(nachricht)) => {
                            tracing::trace!(
                                peer = %peer_addr,
                                art = nachricht.art(),
                                "Nachricht empfangen"
                            );

                            if let Some(antwort) = dispatcher.dispatch(nachricht, &mut ctx) {
                                if let Err(e) = framed.send(antwort).await {
                                    tracing::warn!(
                                        peer = %peer_addr,
                                        fehler = %e,
                                        "Senden fehlgeschlagen"
                                    );
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                peer = %peer_addr,
                                fehler = %e,
                                "Frame-Lesefehler"
                            );
                            break;
                        }
                        None => {
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehende Nachricht aus der eigenen Queue
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = framed.send(ausgehend).await {
                        tracing::warn!(
                            peer = %peer_addr,
                            fehler = %e,
                            "Weiterleitung fehlgeschlagen"
                        );
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        break;
                    }
                }
            }
        }

        if let Some(peer_id) = ctx.peer_id {
            dispatcher.client_cleanup(&peer_id);
        }
        self.state.verbindung_freigeben();

        tracing::info!(peer = %peer_addr, "Verbindungs-Task beendet");
    }
}
