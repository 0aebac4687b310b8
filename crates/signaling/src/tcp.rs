//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `RendezvousServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task mit einer `PeerConnection`.
//!
//! Binden und Starten sind getrennt, damit Aufrufer (und Tests) mit Port 0
//! binden und die tatsaechliche Adresse vor dem Start abfragen koennen.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::watch;

use crate::connection::PeerConnection;
use crate::error::SignalingResult;
use crate::server_state::RendezvousState;

/// TCP-Rendezvous-Server
pub struct RendezvousServer {
    state: Arc<RendezvousState>,
    listener: TcpListener,
}

impl RendezvousServer {
    /// Bindet den TCP-Socket
    pub async fn binden(
        state: Arc<RendezvousState>,
        bind_addr: impl ToSocketAddrs,
    ) -> SignalingResult<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        Ok(Self { state, listener })
    }

    /// Gibt die tatsaechlich gebundene Adresse zurueck
    pub fn lokale_adresse(&self) -> SignalingResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` ein `true`-Signal empfaengt
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) -> SignalingResult<()> {
        tracing::info!(
            adresse = %self.lokale_adresse()?,
            max_clients = self.state.config.max_clients,
            "Rendezvous-Server gestartet"
        );

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            if !self.state.verbindung_reservieren() {
                                tracing::warn!(
                                    peer = %peer_addr,
                                    max = self.state.config.max_clients,
                                    "Server voll – Verbindung abgelehnt"
                                );
                                drop(stream);
                                continue;
                            }

                            tracing::debug!(peer = %peer_addr, "Verbindung akzeptiert");

                            let verbindung = PeerConnection::neu(
                                Arc::clone(&self.state),
                                peer_addr,
                            );
                            let shutdown_rx_clone = shutdown_rx.clone();

                            tokio::spawn(async move {
                                verbindung.verarbeiten(stream, shutdown_rx_clone).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Rendezvous-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!(uptime_sek = self.state.uptime_sek(), "Rendezvous-Server gestoppt");
        Ok(())
    }
}
