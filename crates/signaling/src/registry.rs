//! Peer-Registry – Wer ist registriert, wer ist mit wem gepaart
//!
//! Haelt den ephemeren Zustand aller verbundenen Peers: die Send-Queue jeder
//! Verbindung und den optionalen Partner. Eine Paarung ist immer
//! symmetrisch und exklusiv (genau zwei Teilnehmer).
//!
//! Zugriffe halten nie zwei DashMap-Eintraege gleichzeitig, damit sich zwei
//! Verbindungs-Tasks nicht gegenseitig blockieren. Alle Aenderungen an
//! Partnern laufen unter dem Paarungs-Lock der Registry.

use dashmap::DashMap;
use parking_lot::Mutex;
use duett_core::types::PeerId;
use duett_protocol::control::{ErrorCode, RendezvousMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// PeerSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Peers
#[derive(Clone, Debug)]
pub struct PeerSender {
    pub peer_id: PeerId,
    pub tx: mpsc::Sender<RendezvousMessage>,
}

impl PeerSender {
    /// Sendet eine Nachricht nicht-blockierend an den Peer
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, nachricht: RendezvousMessage) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(peer = %self.peer_id, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(peer = %self.peer_id, "Send-Queue geschlossen (Peer getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PeerEintrag
// ---------------------------------------------------------------------------

/// Registry-Eintrag eines verbundenen Peers
#[derive(Debug, Clone)]
pub struct PeerEintrag {
    pub sender: PeerSender,
    pub adresse: SocketAddr,
    pub partner: Option<PeerId>,
    pub registriert_seit: Instant,
}

// ---------------------------------------------------------------------------
// PeerRegistry
// ---------------------------------------------------------------------------

/// Verwaltet alle registrierten Peers
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct PeerRegistry {
    peers: Arc<DashMap<PeerId, PeerEintrag>>,
    /// Serialisiert `paaren` und `entfernen`
    paarung: Arc<Mutex<()>>,
}

impl PeerRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert eine Verbindung und vergibt eine frische Peer-ID
    pub fn registrieren(
        &self,
        adresse: SocketAddr,
        tx: mpsc::Sender<RendezvousMessage>,
    ) -> PeerId {
        let peer_id = PeerId::new();
        self.peers.insert(
            peer_id,
            PeerEintrag {
                sender: PeerSender { peer_id, tx },
                adresse,
                partner: None,
                registriert_seit: Instant::now(),
            },
        );
        tracing::debug!(peer = %peer_id, adresse = %adresse, "Peer registriert");
        peer_id
    }

    /// Paart `von` mit `ziel`
    ///
    /// Bei Erfolg ist die Paarung auf beiden Seiten eingetragen und der
    /// Sender des Ziels wird zurueckgegeben.
    pub fn paaren(&self, von: PeerId, ziel: PeerId) -> Result<PeerSender, ErrorCode> {
        if von == ziel {
            return Err(ErrorCode::SelfConnect);
        }

        let _paarung = self.paarung.lock();

        match self.peers.get(&von) {
            None => return Err(ErrorCode::NotRegistered),
            Some(eintrag) if eintrag.partner.is_some() => return Err(ErrorCode::AlreadyPaired),
            Some(_) => {}
        }

        let ziel_sender = match self.peers.get(&ziel) {
            None => return Err(ErrorCode::UnknownPeer),
            Some(eintrag) if eintrag.partner.is_some() => return Err(ErrorCode::AlreadyPaired),
            Some(eintrag) => eintrag.sender.clone(),
        };

        if let Some(mut eintrag) = self.peers.get_mut(&ziel) {
            eintrag.partner = Some(von);
        }
        if let Some(mut eintrag) = self.peers.get_mut(&von) {
            eintrag.partner = Some(ziel);
        }

        tracing::info!(von = %von, ziel = %ziel, "Peers gepaart");
        Ok(ziel_sender)
    }

    /// Gibt den Sender des Partners zurueck (falls gepaart)
    pub fn partner(&self, peer_id: &PeerId) -> Option<PeerSender> {
        let partner_id = self.peers.get(peer_id)?.partner?;
        self.peers.get(&partner_id).map(|e| e.sender.clone())
    }

    /// Entfernt einen Peer und loest seine Paarung
    ///
    /// Gibt den Sender des ehemaligen Partners zurueck, damit dieser
    /// benachrichtigt werden kann.
    pub fn entfernen(&self, peer_id: &PeerId) -> Option<PeerSender> {
        let _paarung = self.paarung.lock();

        let (_, eintrag) = self.peers.remove(peer_id)?;
        tracing::debug!(
            peer = %peer_id,
            adresse = %eintrag.adresse,
            dauer_ms = eintrag.registriert_seit.elapsed().as_millis() as u64,
            "Peer entfernt"
        );

        let partner_id = eintrag.partner?;
        let mut partner = self.peers.get_mut(&partner_id)?;
        if partner.partner == Some(*peer_id) {
            partner.partner = None;
        }
        Some(partner.sender.clone())
    }

    /// Prueft ob eine Peer-ID registriert ist
    pub fn ist_registriert(&self, peer_id: &PeerId) -> bool {
        self.peers.contains_key(peer_id)
    }

    /// Anzahl registrierter Peers
    pub fn anzahl(&self) -> usize {
        self.peers.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn adresse() -> SocketAddr {
        "127.0.0.1:5000".parse().unwrap()
    }

    fn registrieren(registry: &PeerRegistry) -> (PeerId, mpsc::Receiver<RendezvousMessage>) {
        let (tx, rx) = mpsc::channel(8);
        (registry.registrieren(adresse(), tx), rx)
    }

    #[test]
    fn registrieren_vergibt_eindeutige_ids() {
        let registry = PeerRegistry::neu();
        let (a, _ra) = registrieren(&registry);
        let (b, _rb) = registrieren(&registry);
        assert_ne!(a, b);
        assert_eq!(registry.anzahl(), 2);
        assert!(registry.ist_registriert(&a));
    }

    #[test]
    fn paaren_ist_symmetrisch() {
        let registry = PeerRegistry::neu();
        let (host, _rh) = registrieren(&registry);
        let (gast, _rg) = registrieren(&registry);

        let sender = registry.paaren(gast, host).unwrap();
        assert_eq!(sender.peer_id, host);
        assert_eq!(registry.partner(&gast).unwrap().peer_id, host);
        assert_eq!(registry.partner(&host).unwrap().peer_id, gast);
    }

    #[test]
    fn paaren_mit_sich_selbst() {
        let registry = PeerRegistry::neu();
        let (a, _ra) = registrieren(&registry);
        assert_eq!(registry.paaren(a, a).unwrap_err(), ErrorCode::SelfConnect);
    }

    #[test]
    fn paaren_mit_unbekanntem_peer() {
        let registry = PeerRegistry::neu();
        let (a, _ra) = registrieren(&registry);
        assert_eq!(
            registry.paaren(a, PeerId::new()).unwrap_err(),
            ErrorCode::UnknownPeer
        );
        assert!(registry.partner(&a).is_none());
    }

    #[test]
    fn paaren_ohne_registrierung() {
        let registry = PeerRegistry::neu();
        let (a, _ra) = registrieren(&registry);
        assert_eq!(
            registry.paaren(PeerId::new(), a).unwrap_err(),
            ErrorCode::NotRegistered
        );
    }

    #[test]
    fn dritter_peer_wird_abgewiesen() {
        let registry = PeerRegistry::neu();
        let (host, _rh) = registrieren(&registry);
        let (gast, _rg) = registrieren(&registry);
        let (dritter, _rd) = registrieren(&registry);

        registry.paaren(gast, host).unwrap();
        assert_eq!(
            registry.paaren(dritter, host).unwrap_err(),
            ErrorCode::AlreadyPaired
        );
        assert_eq!(
            registry.paaren(gast, dritter).unwrap_err(),
            ErrorCode::AlreadyPaired
        );
    }

    #[test]
    fn gleichzeitige_paarungen_bleiben_exklusiv() {
        use std::sync::Barrier;
        use std::thread;

        for _ in 0..500 {
            let registry = PeerRegistry::neu();
            let (a, _ra) = registrieren(&registry);
            let (b, _rb) = registrieren(&registry);
            let (c, _rc) = registrieren(&registry);
            let start = Arc::new(Barrier::new(2));

            let a_nach_b = {
                let (registry, start) = (registry.clone(), Arc::clone(&start));
                thread::spawn(move || {
                    start.wait();
                    registry.paaren(a, b).is_ok()
                })
            };
            let c_nach_a = {
                let (registry, start) = (registry.clone(), Arc::clone(&start));
                thread::spawn(move || {
                    start.wait();
                    registry.paaren(c, a).is_ok()
                })
            };
            let (ab, ca) = (a_nach_b.join().unwrap(), c_nach_a.join().unwrap());

            assert!(ab ^ ca, "genau eine Paarung muss gelingen");
            let (gewinner, verlierer) = if ab { (b, c) } else { (c, b) };
            assert_eq!(registry.partner(&a).unwrap().peer_id, gewinner);
            assert_eq!(registry.partner(&gewinner).unwrap().peer_id, a);
            assert!(registry.partner(&verlierer).is_none());
        }
    }

    #[test]
    fn entfernen_loest_paarung() {
        let registry = PeerRegistry::neu();
        let (host, _rh) = registrieren(&registry);
        let (gast, _rg) = registrieren(&registry);
        registry.paaren(gast, host).unwrap();

        let ehemaliger = registry.entfernen(&host).unwrap();
        assert_eq!(ehemaliger.peer_id, gast);
        assert!(registry.partner(&gast).is_none());
        assert!(!registry.ist_registriert(&host));
        assert_eq!(registry.anzahl(), 1);
    }

    #[test]
    fn entfernen_ohne_partner() {
        let registry = PeerRegistry::neu();
        let (a, _ra) = registrieren(&registry);
        assert!(registry.entfernen(&a).is_none());
        assert!(registry.entfernen(&a).is_none());
    }

    #[tokio::test]
    async fn sender_liefert_nachricht() {
        let registry = PeerRegistry::neu();
        let (host, mut rh) = registrieren(&registry);
        let (gast, _rg) = registrieren(&registry);

        let sender = registry.paaren(gast, host).unwrap();
        assert!(sender.senden(RendezvousMessage::Paired { remote: gast }));
        assert_eq!(
            rh.recv().await.unwrap(),
            RendezvousMessage::Paired { remote: gast }
        );
    }

    #[test]
    fn senden_an_geschlossene_queue() {
        let registry = PeerRegistry::neu();
        let (a, rx) = registrieren(&registry);
        drop(rx);
        let (b, _rb) = registrieren(&registry);
        let sender = registry.paaren(b, a).unwrap();
        assert!(!sender.senden(RendezvousMessage::Register));
    }
}
