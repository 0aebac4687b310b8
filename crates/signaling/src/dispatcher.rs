//! Message-Dispatcher – Verarbeitet Rendezvous-Nachrichten einer Verbindung
//!
//! ## Zustandspruefung
//! - `Register` ist immer erlaubt (wiederholt: gleiche ID)
//! - `Connect` und `Data` erfordern eine Registrierung
//! - `Data` erfordert zusaetzlich eine Paarung
//! - Server-Nachrichten (`Assigned`, `Paired`, ...) vom Client sind ungueltig

use duett_core::types::PeerId;
use duett_protocol::control::{ErrorCode, RendezvousMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::server_state::RendezvousState;

/// Dispatcher-Kontext – Informationen ueber die aktuelle Verbindung
pub struct DispatcherContext {
    /// Adresse der Gegenstelle
    pub peer_addr: SocketAddr,
    /// Vergebene Peer-ID (None vor `Register`)
    pub peer_id: Option<PeerId>,
    /// Eigene Send-Queue (wird bei `Register` in der Registry hinterlegt)
    pub sende_tx: mpsc::Sender<RendezvousMessage>,
}

/// Routet eingehende Nachrichten und gibt die direkte Antwort zurueck
pub struct RendezvousDispatcher {
    state: Arc<RendezvousState>,
}

impl RendezvousDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<RendezvousState>) -> Self {
        Self { state }
    }

    /// Verarbeitet eine eingehende Nachricht
    ///
    /// Gibt `None` zurueck wenn keine direkte Antwort gesendet werden soll
    /// (z.B. bei weitergeleiteten `Data`-Frames).
    pub fn dispatch(
        &self,
        nachricht: RendezvousMessage,
        ctx: &mut DispatcherContext,
    ) -> Option<RendezvousMessage> {
        match nachricht {
            RendezvousMessage::Register => {
                let peer_id = match ctx.peer_id {
                    Some(id) => id,
                    None => {
                        let id = self
                            .state
                            .registry
                            .registrieren(ctx.peer_addr, ctx.sende_tx.clone());
                        ctx.peer_id = Some(id);
                        id
                    }
                };
                Some(RendezvousMessage::Assigned { peer_id })
            }

            RendezvousMessage::Connect { target } => {
                let Some(von) = ctx.peer_id else {
                    return Some(nicht_registriert());
                };

                match self.state.registry.paaren(von, target) {
                    Ok(ziel) => {
                        if !ziel.senden(RendezvousMessage::Paired { remote: von }) {
                            tracing::warn!(ziel = %target, "Paired konnte nicht zugestellt werden");
                        }
                        Some(RendezvousMessage::Paired { remote: target })
                    }
                    Err(code) => {
                        tracing::debug!(von = %von, ziel = %target, ?code, "Paarung abgelehnt");
                        Some(RendezvousMessage::error(code, fehlertext(code)))
                    }
                }
            }

            RendezvousMessage::Data { payload } => {
                let Some(von) = ctx.peer_id else {
                    return Some(nicht_registriert());
                };

                match self.state.registry.partner(&von) {
                    Some(partner) => {
                        tracing::trace!(
                            von = %von,
                            an = %partner.peer_id,
                            bytes = payload.len(),
                            "Data weitergeleitet"
                        );
                        partner.senden(RendezvousMessage::Data { payload });
                        None
                    }
                    None => Some(RendezvousMessage::error(
                        ErrorCode::NotPaired,
                        fehlertext(ErrorCode::NotPaired),
                    )),
                }
            }

            andere => {
                tracing::debug!(art = andere.art(), "Server-Nachricht vom Client abgelehnt");
                Some(RendezvousMessage::error(
                    ErrorCode::InvalidRequest,
                    format!("'{}' ist keine Client-Nachricht", andere.art()),
                ))
            }
        }
    }

    /// Raeumt nach dem Verbindungsende auf und benachrichtigt den Partner
    pub fn client_cleanup(&self, peer_id: &PeerId) {
        if let Some(partner) = self.state.registry.entfernen(peer_id) {
            partner.senden(RendezvousMessage::PeerLeft { peer_id: *peer_id });
        }
    }
}

fn nicht_registriert() -> RendezvousMessage {
    RendezvousMessage::error(ErrorCode::NotRegistered, fehlertext(ErrorCode::NotRegistered))
}

fn fehlertext(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::NotRegistered => "Zuerst registrieren",
        ErrorCode::UnknownPeer => "Peer ist nicht registriert",
        ErrorCode::AlreadyPaired => "Peer ist bereits verbunden",
        ErrorCode::SelfConnect => "Verbindung mit sich selbst nicht moeglich",
        ErrorCode::NotPaired => "Keine Gegenstelle verbunden",
        ErrorCode::InvalidRequest => "Ungueltige Anfrage",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_state::RendezvousConfig;

    struct Teilnehmer {
        ctx: DispatcherContext,
        rx: mpsc::Receiver<RendezvousMessage>,
    }

    fn teilnehmer() -> Teilnehmer {
        let (sende_tx, rx) = mpsc::channel(8);
        Teilnehmer {
            ctx: DispatcherContext {
                peer_addr: "127.0.0.1:6000".parse().unwrap(),
                peer_id: None,
                sende_tx,
            },
            rx,
        }
    }

    fn registrieren(d: &RendezvousDispatcher, t: &mut Teilnehmer) -> PeerId {
        match d.dispatch(RendezvousMessage::Register, &mut t.ctx) {
            Some(RendezvousMessage::Assigned { peer_id }) => peer_id,
            other => panic!("Erwartet Assigned, erhalten {other:?}"),
        }
    }

    fn dispatcher() -> RendezvousDispatcher {
        RendezvousDispatcher::neu(RendezvousState::neu(RendezvousConfig::default()))
    }

    #[test]
    fn register_ist_idempotent() {
        let d = dispatcher();
        let mut t = teilnehmer();
        let a = registrieren(&d, &mut t);
        let b = registrieren(&d, &mut t);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn connect_paart_beide_seiten() {
        let d = dispatcher();
        let mut host = teilnehmer();
        let mut gast = teilnehmer();
        let host_id = registrieren(&d, &mut host);
        let gast_id = registrieren(&d, &mut gast);

        let antwort = d.dispatch(RendezvousMessage::Connect { target: host_id }, &mut gast.ctx);
        assert_eq!(antwort, Some(RendezvousMessage::Paired { remote: host_id }));
        assert_eq!(
            host.rx.recv().await,
            Some(RendezvousMessage::Paired { remote: gast_id })
        );
    }

    #[test]
    fn connect_ohne_register() {
        let d = dispatcher();
        let mut t = teilnehmer();
        let antwort = d.dispatch(
            RendezvousMessage::Connect { target: PeerId::new() },
            &mut t.ctx,
        );
        assert!(matches!(
            antwort,
            Some(RendezvousMessage::Error { code: ErrorCode::NotRegistered, .. })
        ));
    }

    #[test]
    fn connect_unbekanntes_ziel() {
        let d = dispatcher();
        let mut t = teilnehmer();
        registrieren(&d, &mut t);
        let antwort = d.dispatch(
            RendezvousMessage::Connect { target: PeerId::new() },
            &mut t.ctx,
        );
        assert!(matches!(
            antwort,
            Some(RendezvousMessage::Error { code: ErrorCode::UnknownPeer, .. })
        ));
    }

    #[tokio::test]
    async fn data_wird_an_partner_weitergeleitet() {
        let d = dispatcher();
        let mut host = teilnehmer();
        let mut gast = teilnehmer();
        let host_id = registrieren(&d, &mut host);
        registrieren(&d, &mut gast);
        d.dispatch(RendezvousMessage::Connect { target: host_id }, &mut gast.ctx);
        let _paired = host.rx.recv().await;

        let antwort = d.dispatch(
            RendezvousMessage::Data { payload: "[1,2]".into() },
            &mut gast.ctx,
        );
        assert!(antwort.is_none());
        assert_eq!(
            host.rx.recv().await,
            Some(RendezvousMessage::Data { payload: "[1,2]".into() })
        );
    }

    #[test]
    fn data_ohne_paarung() {
        let d = dispatcher();
        let mut t = teilnehmer();
        registrieren(&d, &mut t);
        let antwort = d.dispatch(RendezvousMessage::Data { payload: "1".into() }, &mut t.ctx);
        assert!(matches!(
            antwort,
            Some(RendezvousMessage::Error { code: ErrorCode::NotPaired, .. })
        ));
    }

    #[test]
    fn server_nachricht_vom_client() {
        let d = dispatcher();
        let mut t = teilnehmer();
        let antwort = d.dispatch(
            RendezvousMessage::Paired { remote: PeerId::new() },
            &mut t.ctx,
        );
        assert!(matches!(
            antwort,
            Some(RendezvousMessage::Error { code: ErrorCode::InvalidRequest, .. })
        ));
    }

    #[tokio::test]
    async fn cleanup_meldet_peer_left() {
        let d = dispatcher();
        let mut host = teilnehmer();
        let mut gast = teilnehmer();
        let host_id = registrieren(&d, &mut host);
        let gast_id = registrieren(&d, &mut gast);
        d.dispatch(RendezvousMessage::Connect { target: host_id }, &mut gast.ctx);
        let _paired = host.rx.recv().await;

        d.client_cleanup(&gast_id);
        assert_eq!(
            host.rx.recv().await,
            Some(RendezvousMessage::PeerLeft { peer_id: gast_id })
        );
    }
}
