//! Verbindungsaufbau ueber den Rendezvous-Server
//!
//! ## Ablauf
//! ```text
//! Host                      Server                      Gast
//!  |--- Register ------------>|                           |
//!  |<-- Assigned{id} ---------|                           |
//!  |  Einladung ...?peer=id   |                           |
//!  |                          |<----------- Register -----|
//!  |                          |------ Assigned{id2} ----->|
//!  |                          |<----- Connect{id} --------|
//!  |<-- Paired{id2} ----------|------ Paired{id} -------->|
//!  |<========== Data{payload} weitergeleitet ============>|
//! ```

use duett_core::types::{PeerId, Rolle};
use duett_protocol::{control::RendezvousMessage, wire::FrameCodec};
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;

use crate::bereit::Bereit;
use crate::error::{NetzError, NetzResult};
use crate::link::{kanal_betreiben, link_erstellen, LinkTeile, PeerLink};
use crate::teilen::{einladungs_link, PEER_PARAMETER};

type ServerFramed = Framed<TcpStream, FrameCodec<RendezvousMessage>>;

/// Ergebnis des Rendezvous-Verbindungsaufbaus
#[derive(Debug)]
pub struct RendezvousVerbindung {
    pub link: PeerLink,
    pub bereit: Bereit,
    /// Vom Server vergebene eigene ID
    pub peer_id: PeerId,
    /// Nur beim Host: Link fuer den Gast
    pub einladung: Option<Url>,
}

/// Startet als Host und erzeugt den Einladungs-Link
///
/// Kehrt zurueck sobald der Server eine ID vergeben hat. `bereit` loest aus,
/// wenn sich ein Gast verbunden hat.
pub async fn host_starten<F>(
    server: impl ToSocketAddrs,
    seite: &Url,
    empfaenger: F,
) -> NetzResult<RendezvousVerbindung>
where
    F: Fn(serde_json::Value) + Send + Sync + 'static,
{
    let (framed, peer_id) = registrieren(server).await?;
    let einladung = einladungs_link(seite, PEER_PARAMETER, &peer_id.to_string());
    tracing::info!(peer_id = %peer_id, einladung = %einladung, "Einladung erstellt");

    let verbindung = starten(Rolle::Host, framed, peer_id, Some(einladung), empfaenger);
    Ok(verbindung)
}

/// Startet als Gast und verbindet sich mit dem Host `ziel`
///
/// Meldet der Server einen Fehler (z.B. unbekannter Host), wird er geloggt
/// und `bereit` loest erst mit dem Ende des Transports aus (als Fehler).
pub async fn gast_starten<F>(
    server: impl ToSocketAddrs,
    ziel: PeerId,
    empfaenger: F,
) -> NetzResult<RendezvousVerbindung>
where
    F: Fn(serde_json::Value) + Send + Sync + 'static,
{
    let (mut framed, peer_id) = registrieren(server).await?;
    framed.send(RendezvousMessage::Connect { target: ziel }).await?;
    tracing::info!(peer_id = %peer_id, ziel = %ziel, "Verbindung zum Host angefragt");

    Ok(starten(Rolle::Gast, framed, peer_id, None, empfaenger))
}

/// Verbindet mit dem Server und wartet auf die eigene Peer-ID
async fn registrieren(server: impl ToSocketAddrs) -> NetzResult<(ServerFramed, PeerId)> {
    let stream = TcpStream::connect(server).await?;
    let adresse = stream.peer_addr()?;
    tracing::info!(server = %adresse, "TCP-Verbindung zum Rendezvous-Server hergestellt");

    let mut framed = Framed::new(stream, FrameCodec::new());
    framed.send(RendezvousMessage::Register).await?;

    match framed.next().await {
        Some(Ok(RendezvousMessage::Assigned { peer_id })) => Ok((framed, peer_id)),
        Some(Ok(RendezvousMessage::Error { code, message })) => {
            Err(NetzError::Server { code, message })
        }
        Some(Ok(andere)) => Err(NetzError::unerwartet(format!(
            "Erwartet assigned, erhalten {}",
            andere.art()
        ))),
        Some(Err(e)) => Err(NetzError::Io(e)),
        None => Err(NetzError::unerwartet("Server hat vor Assigned getrennt")),
    }
}

fn starten<F>(
    rolle: Rolle,
    framed: ServerFramed,
    peer_id: PeerId,
    einladung: Option<Url>,
    empfaenger: F,
) -> RendezvousVerbindung
where
    F: Fn(serde_json::Value) + Send + Sync + 'static,
{
    let LinkTeile {
        mut link,
        bereit,
        zustand,
        ausgang_rx,
    } = link_erstellen(rolle);

    let task = tokio::spawn(kanal_betreiben(framed, ausgang_rx, zustand, empfaenger));
    link.task_setzen(task);

    RendezvousVerbindung {
        link,
        bereit,
        peer_id,
        einladung,
    }
}
