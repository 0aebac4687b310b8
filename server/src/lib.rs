//! duett-server – Bibliotheks-Root
//!
//! Stellt den Server fuer `main.rs` und fuer Integrationstests bereit.

pub mod config;

use anyhow::Result;
use config::ServerConfig;
use duett_signaling::{RendezvousServer, RendezvousState};
use std::future::Future;
use std::net::SocketAddr;
use tokio::sync::watch;

/// Haelt den Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bindet den Listener und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let gebunden = self.binden().await?;
        gebunden
            .laufen_bis(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(fehler = %e, "Ctrl-C-Handler konnte nicht installiert werden");
                }
            })
            .await
    }

    /// Bindet den TCP-Listener
    pub async fn binden(self) -> Result<GebundenerServer> {
        let state = RendezvousState::neu(self.config.rendezvous_config());
        let server = RendezvousServer::binden(state, self.config.bind_adresse()).await?;
        let adresse = server.lokale_adresse()?;

        tracing::info!(
            adresse = %adresse,
            max_clients = self.config.server.max_clients,
            max_frame_groesse = self.config.netzwerk.max_frame_groesse,
            "Server gebunden"
        );

        Ok(GebundenerServer { server, adresse })
    }
}

/// Gebundener, noch nicht laufender Server
pub struct GebundenerServer {
    server: RendezvousServer,
    adresse: SocketAddr,
}

impl GebundenerServer {
    /// Tatsaechlich gebundene Adresse (relevant bei Port 0)
    pub fn adresse(&self) -> SocketAddr {
        self.adresse
    }

    /// Laeuft bis `signal` fertig ist und trennt dann alle Verbindungen
    pub async fn laufen_bis(self, signal: impl Future<Output = ()>) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut server_task = tokio::spawn(self.server.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");

        tokio::select! {
            _ = signal => {
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                shutdown_tx.send_replace(true);
                server_task.await??;
            }
            ergebnis = &mut server_task => {
                ergebnis??;
                tracing::warn!("Server hat sich ohne Shutdown-Signal beendet");
            }
        }

        Ok(())
    }
}
