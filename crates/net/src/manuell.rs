//! Verbindungsaufbau mit manueller Signalisierung
//!
//! Ohne Server: Angebot und Antwort werden von den Nutzern selbst
//! uebertragen (Link, Chat, Zettel).
//!
//! ## Ablauf
//! ```text
//! Host                                             Gast
//!  | bindet TCP-Listener                            |
//!  | Offer{sitzung, kandidaten} -> ...?offer=xyz ==> |  (Link teilen)
//!  |                                                | Answer{sitzung, token}
//!  |  <================= Antworttext ============== |  (von Hand zurueck)
//!  |<---------- TCP: Hello{sitzung, token} ---------|
//!  | antwort_anwenden(text), Token vergleichen      |
//!  |----------- Welcome --------------------------->|
//!  |<============== Data{payload} =================>|
//! ```
//!
//! Der Host schliesst den Handshake erst ab, wenn die eingefuegte Antwort
//! zur Sitzung passt und ihr Token mit dem `Hello` uebereinstimmt.

use duett_core::types::{Rolle, SitzungsId};
use duett_protocol::{direct::DirectMessage, signal::SignalPayload, wire::FrameCodec};
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::codec::Framed;

use crate::bereit::Bereit;
use crate::error::{NetzError, NetzResult};
use crate::kuerzer::LinkKuerzer;
use crate::link::{kanal_betreiben, link_erstellen, Kanalzustand, LinkTeile, PeerLink};
use crate::teilen::{einladungs_link, OFFER_PARAMETER};

type DirektFramed = Framed<TcpStream, FrameCodec<DirectMessage>>;

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Optionen fuer den Host
#[derive(Debug, Clone)]
pub struct HostOptionen {
    /// Lokale Adresse des Listeners (Port 0 = beliebig)
    pub bind: SocketAddr,
    /// Adressen, unter denen der Gast den Host erreicht
    ///
    /// Leer: die gebundene Adresse, sofern sie nicht unspezifiziert ist.
    pub kandidaten: Vec<SocketAddr>,
}

impl Default for HostOptionen {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            kandidaten: Vec::new(),
        }
    }
}

/// Host-Seite der manuellen Variante
#[derive(Debug)]
pub struct ManuellHost {
    pub link: PeerLink,
    pub bereit: Bereit,
    /// Link mit dem komprimierten Angebot (ggf. gekuerzt)
    pub einladung: String,
    pub antwort: AntwortEingabe,
}

/// Nimmt die vom Gast zurueckgeschickte Antwort entgegen
#[derive(Debug)]
pub struct AntwortEingabe {
    sitzung: SitzungsId,
    token_tx: watch::Sender<Option<String>>,
}

impl AntwortEingabe {
    /// Dekomprimiert und prueft eine eingefuegte Antwort
    ///
    /// # Fehler
    /// - `Kern(UngueltigesSignal)` wenn der Text kein gueltiger Payload ist
    /// - `FalschesSignal` bei einem Angebot statt einer Antwort oder einer
    ///   fremden Sitzung
    pub fn anwenden(&self, text: &str) -> NetzResult<()> {
        match SignalPayload::dekomprimieren(text)? {
            SignalPayload::Answer { session, token } if session == self.sitzung => {
                tracing::info!(sitzung = %session, "Antwort angenommen");
                self.token_tx.send_replace(Some(token));
                Ok(())
            }
            SignalPayload::Answer { session, .. } => {
                tracing::warn!(erwartet = %self.sitzung, erhalten = %session, "Antwort fuer fremde Sitzung");
                Err(NetzError::FalschesSignal(format!(
                    "Antwort gehoert zu {session}, erwartet {}",
                    self.sitzung
                )))
            }
            SignalPayload::Offer { .. } => Err(NetzError::FalschesSignal(
                "Angebot statt Antwort eingefuegt".into(),
            )),
        }
    }

    pub fn sitzung(&self) -> SitzungsId {
        self.sitzung
    }
}

/// Startet als Host: bindet den Listener und erzeugt die Einladung
///
/// Mit `kuerzer` wird der Einladungs-Link gekuerzt. Schlaegt das fehl, wird
/// der Fehler zurueckgegeben.
pub async fn host_starten<F>(
    optionen: HostOptionen,
    seite: &Url,
    kuerzer: Option<&LinkKuerzer>,
    empfaenger: F,
) -> NetzResult<ManuellHost>
where
    F: Fn(serde_json::Value) + Send + Sync + 'static,
{
    let listener = TcpListener::bind(optionen.bind).await?;
    let lokal = listener.local_addr()?;

    let kandidaten = if optionen.kandidaten.is_empty() {
        if lokal.ip().is_unspecified() {
            return Err(NetzError::KeineKandidaten);
        }
        vec![lokal]
    } else {
        optionen.kandidaten
    };

    let sitzung = SitzungsId::new();
    let angebot = SignalPayload::Offer {
        session: sitzung,
        candidates: kandidaten.clone(),
    }
    .komprimieren()?;

    let lang = einladungs_link(seite, OFFER_PARAMETER, &angebot);
    let einladung = match kuerzer {
        Some(kuerzer) => kuerzer.kuerzen(lang.as_str()).await?,
        None => lang.to_string(),
    };

    tracing::info!(
        sitzung = %sitzung,
        lokal = %lokal,
        kandidaten = ?kandidaten,
        "Angebot erstellt"
    );

    let (token_tx, token_rx) = watch::channel(None);
    let LinkTeile {
        mut link,
        bereit,
        zustand,
        ausgang_rx,
    } = link_erstellen(Rolle::Host);

    let task = tokio::spawn(host_betreiben(
        listener,
        sitzung,
        token_rx,
        ausgang_rx,
        zustand,
        empfaenger,
    ));
    link.task_setzen(task);

    Ok(ManuellHost {
        link,
        bereit,
        einladung,
        antwort: AntwortEingabe { sitzung, token_tx },
    })
}

/// Nimmt Verbindungen an, bis ein Gast den Handshake besteht
///
/// Jeder Handshake laeuft als eigene Aufgabe, eine stumme Verbindung haelt
/// den Accept-Loop nicht auf. Der erste bestandene Handshake gewinnt, alle
/// anderen werden mit dem `JoinSet` abgebrochen.
async fn host_betreiben<F>(
    listener: TcpListener,
    sitzung: SitzungsId,
    token_rx: watch::Receiver<Option<String>>,
    ausgang_rx: mpsc::Receiver<String>,
    mut zustand: Kanalzustand,
    empfaenger: F,
) where
    F: Fn(serde_json::Value) + Send + Sync + 'static,
{
    let mut handshakes: JoinSet<(SocketAddr, NetzResult<DirektFramed>)> = JoinSet::new();

    let framed = loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, adresse)) => {
                        tracing::debug!(peer = %adresse, "Verbindung akzeptiert");
                        let token_rx = token_rx.clone();
                        handshakes.spawn(async move {
                            let ergebnis = handshake_fuehren(stream, sitzung, token_rx).await;
                            (adresse, ergebnis)
                        });
                    }
                    Err(e) => {
                        tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    }
                }
            }

            Some(beendet) = handshakes.join_next() => {
                match beendet {
                    Ok((adresse, Ok(framed))) => {
                        tracing::info!(peer = %adresse, sitzung = %sitzung, "Handshake abgeschlossen");
                        break framed;
                    }
                    Ok((adresse, Err(grund))) => {
                        tracing::warn!(peer = %adresse, grund = %grund, "Verbindung abgelehnt");
                    }
                    Err(e) => {
                        tracing::error!(fehler = %e, "Handshake-Aufgabe abgebrochen");
                    }
                }
            }
        }
    };

    // Uebrige Kandidaten verwerfen
    drop(handshakes);

    zustand.oeffnen();
    kanal_betreiben(framed, ausgang_rx, zustand, empfaenger).await;
}

/// Prueft eine angenommene Verbindung und begruesst den Gast
async fn handshake_fuehren(
    stream: TcpStream,
    sitzung: SitzungsId,
    mut token_rx: watch::Receiver<Option<String>>,
) -> NetzResult<DirektFramed> {
    let mut framed = Framed::new(stream, FrameCodec::<DirectMessage>::new());
    handshake_pruefen(&mut framed, sitzung, &mut token_rx).await?;
    framed.send(DirectMessage::Welcome).await?;
    Ok(framed)
}

/// Liest das `Hello` und wartet auf die passende eingefuegte Antwort
async fn handshake_pruefen(
    framed: &mut DirektFramed,
    sitzung: SitzungsId,
    token_rx: &mut watch::Receiver<Option<String>>,
) -> NetzResult<()> {
    let (session, answer_token) = match framed.next().await {
        Some(Ok(DirectMessage::Hello {
            session,
            answer_token,
        })) => (session, answer_token),
        Some(Ok(andere)) => {
            return Err(NetzError::unerwartet(format!(
                "Erwartet hello, erhalten {andere:?}"
            )))
        }
        Some(Err(e)) => return Err(NetzError::Io(e)),
        None => return Err(NetzError::unerwartet("Getrennt vor Hello")),
    };

    if session != sitzung {
        return Err(NetzError::FalschesSignal(format!(
            "Hello fuer {session}, erwartet {sitzung}"
        )));
    }

    tracing::info!(sitzung = %sitzung, "Gast wartet – Antwort einfuegen");

    // Gast trennt waehrend des Wartens -> naechste Verbindung annehmen
    let antwort_da = async { token_rx.wait_for(Option::is_some).await.map(|_| ()) };
    tokio::select! {
        ergebnis = antwort_da => {
            if ergebnis.is_err() {
                return Err(NetzError::unerwartet("Antwort-Eingabe wurde verworfen"));
            }
        }
        _ = framed.next() => {
            return Err(NetzError::unerwartet("Gast hat vor der Antwort getrennt"));
        }
    }
    let erwartet = token_rx.borrow().clone().unwrap_or_default();

    if erwartet != answer_token {
        return Err(NetzError::FalschesSignal(
            "Token im Hello passt nicht zur Antwort".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Gast
// ---------------------------------------------------------------------------

/// Gast-Seite der manuellen Variante
#[derive(Debug)]
pub struct ManuellGast {
    pub link: PeerLink,
    pub bereit: Bereit,
    /// Komprimierte Antwort, die der Nutzer an den Host schickt
    pub antwort: String,
    pub sitzung: SitzungsId,
}

/// Startet als Gast mit dem komprimierten Angebot aus dem Link
///
/// Erzeugt sofort die Antwort und verbindet sich im Hintergrund mit dem
/// ersten erreichbaren Kandidaten. `bereit` loest nach dem `Welcome` aus.
pub fn gast_starten<F>(angebot: &str, empfaenger: F) -> NetzResult<ManuellGast>
where
    F: Fn(serde_json::Value) + Send + Sync + 'static,
{
    let (sitzung, kandidaten) = match SignalPayload::dekomprimieren(angebot)? {
        SignalPayload::Offer {
            session,
            candidates,
        } => (session, candidates),
        SignalPayload::Answer { .. } => {
            return Err(NetzError::FalschesSignal(
                "Antwort statt Angebot im Link".into(),
            ))
        }
    };
    if kandidaten.is_empty() {
        return Err(NetzError::KeineKandidaten);
    }

    let token = uuid::Uuid::new_v4().simple().to_string();
    let antwort = SignalPayload::Answer {
        session: sitzung,
        token: token.clone(),
    }
    .komprimieren()?;

    tracing::info!(sitzung = %sitzung, kandidaten = ?kandidaten, "Angebot gelesen");

    let LinkTeile {
        mut link,
        bereit,
        zustand,
        ausgang_rx,
    } = link_erstellen(Rolle::Gast);

    let task = tokio::spawn(async move {
        match gast_verbinden(&kandidaten, sitzung, token).await {
            Ok(framed) => kanal_betreiben(framed, ausgang_rx, zustand, empfaenger).await,
            Err(e) => tracing::error!(fehler = %e, "Host nicht erreichbar"),
        }
    });
    link.task_setzen(task);

    Ok(ManuellGast {
        link,
        bereit,
        antwort,
        sitzung,
    })
}

/// Verbindet mit dem ersten erreichbaren Kandidaten und sendet `Hello`
async fn gast_verbinden(
    kandidaten: &[SocketAddr],
    sitzung: SitzungsId,
    token: String,
) -> NetzResult<DirektFramed> {
    let mut letzter_fehler = None;

    for adresse in kandidaten {
        match TcpStream::connect(adresse).await {
            Ok(stream) => {
                tracing::info!(host = %adresse, "TCP-Verbindung zum Host hergestellt");
                let mut framed = Framed::new(stream, FrameCodec::new());
                framed
                    .send(DirectMessage::Hello {
                        session: sitzung,
                        answer_token: token,
                    })
                    .await?;
                return Ok(framed);
            }
            Err(e) => {
                tracing::debug!(host = %adresse, fehler = %e, "Kandidat nicht erreichbar");
                letzter_fehler = Some(e);
            }
        }
    }

    Err(letzter_fehler.map_or(NetzError::KeineKandidaten, NetzError::Io))
}
