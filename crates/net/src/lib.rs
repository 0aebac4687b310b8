//! duett-net – Verbindungsaufbau zwischen genau zwei Teilnehmern
//!
//! Zwei austauschbare Varianten:
//! - **Rendezvous**: ein Server vergibt IDs und leitet Frames weiter
//! - **Manuell**: Angebot und Antwort werden von Hand uebertragen, danach
//!   direkte TCP-Verbindung
//!
//! Beide liefern einen `PeerLink` (Senden), ein einmaliges `Bereit`-Signal
//! und rufen fuer jede gueltige JSON-Nachricht den Callback auf.

pub mod bereit;
pub mod error;
pub mod kuerzer;
pub mod link;
pub mod manuell;
pub mod rendezvous;
pub mod teilen;

use duett_core::types::{PeerId, Rolle};

pub use reqwest::Url;

// Bequeme Re-Exporte
pub use bereit::Bereit;
pub use error::{NetzError, NetzResult};
pub use kuerzer::LinkKuerzer;
pub use link::PeerLink;
pub use manuell::{AntwortEingabe, HostOptionen};

/// Welche Signalisierung verwendet wird
#[derive(Debug, Clone)]
pub enum Signalisierung {
    /// Ueber einen Rendezvous-Server (`host:port`)
    Rendezvous { server: String },
    /// Von Hand, Host bindet einen Listener
    Manuell {
        host: HostOptionen,
        kuerzer: Option<LinkKuerzer>,
    },
}

/// Ergebnis von `init_network`
#[derive(Debug)]
pub struct Netzwerk {
    /// Senden und Rolle
    pub link: PeerLink,
    /// Loest aus, sobald der Kanal offen ist
    pub bereit: Bereit,
    /// Host: Link, den der Gast oeffnen soll
    pub einladung: Option<String>,
    /// Manueller Gast: Text, den der Nutzer an den Host zurueckschickt
    pub antwort: Option<String>,
    /// Manueller Host: nimmt die Antwort des Gastes entgegen
    pub antwort_eingabe: Option<AntwortEingabe>,
}

impl Netzwerk {
    pub fn ist_host(&self) -> bool {
        self.link.ist_host()
    }
}

/// Baut die Verbindung passend zur Seiten-URL auf
///
/// Die Rolle ergibt sich aus dem Query-Parameter der Variante (`peer` bzw.
/// `offer`): ohne Parameter Host, mit Parameter Gast.
pub async fn init_network<F>(
    seite: &Url,
    signalisierung: Signalisierung,
    empfaenger: F,
) -> NetzResult<Netzwerk>
where
    F: Fn(serde_json::Value) + Send + Sync + 'static,
{
    match signalisierung {
        Signalisierung::Rendezvous { server } => {
            let (rolle, peer) = teilen::rolle_bestimmen(seite, teilen::PEER_PARAMETER);
            tracing::info!(rolle = %rolle, server = %server, "Rendezvous-Verbindung wird aufgebaut");

            let verbindung = match (rolle, peer) {
                (Rolle::Gast, Some(peer)) => {
                    let ziel: PeerId = peer.parse()?;
                    rendezvous::gast_starten(server.as_str(), ziel, empfaenger).await?
                }
                _ => rendezvous::host_starten(server.as_str(), seite, empfaenger).await?,
            };

            Ok(Netzwerk {
                link: verbindung.link,
                bereit: verbindung.bereit,
                einladung: verbindung.einladung.map(String::from),
                antwort: None,
                antwort_eingabe: None,
            })
        }

        Signalisierung::Manuell { host, kuerzer } => {
            let (rolle, angebot) = teilen::rolle_bestimmen(seite, teilen::OFFER_PARAMETER);
            tracing::info!(rolle = %rolle, "Manuelle Verbindung wird aufgebaut");

            match (rolle, angebot) {
                (Rolle::Gast, Some(angebot)) => {
                    let gast = manuell::gast_starten(&angebot, empfaenger)?;
                    Ok(Netzwerk {
                        link: gast.link,
                        bereit: gast.bereit,
                        einladung: None,
                        antwort: Some(gast.antwort),
                        antwort_eingabe: None,
                    })
                }
                _ => {
                    let host =
                        manuell::host_starten(host, seite, kuerzer.as_ref(), empfaenger).await?;
                    Ok(Netzwerk {
                        link: host.link,
                        bereit: host.bereit,
                        einladung: Some(host.einladung),
                        antwort: None,
                        antwort_eingabe: Some(host.antwort),
                    })
                }
            }
        }
    }
}

