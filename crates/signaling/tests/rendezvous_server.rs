//! Integrationstests: Rendezvous-Server ueber echte TCP-Verbindungen

use duett_core::types::PeerId;
use duett_protocol::{
    control::{ErrorCode, RendezvousMessage},
    wire::FrameCodec,
};
use duett_signaling::{RendezvousConfig, RendezvousServer, RendezvousState};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::codec::Framed;

const FRIST: Duration = Duration::from_secs(5);

type Client = Framed<TcpStream, FrameCodec<RendezvousMessage>>;

async fn server_starten() -> (SocketAddr, watch::Sender<bool>) {
    let state = RendezvousState::neu(RendezvousConfig::default());
    let server = RendezvousServer::binden(state, "127.0.0.1:0").await.unwrap();
    let adresse = server.lokale_adresse().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(server.starten(shutdown_rx));
    (adresse, shutdown_tx)
}

async fn empfangen(client: &mut Client) -> RendezvousMessage {
    timeout(FRIST, client.next())
        .await
        .expect("Timeout beim Empfangen")
        .expect("Verbindung geschlossen")
        .expect("Frame-Fehler")
}

async fn registrierter_client(adresse: SocketAddr) -> (Client, PeerId) {
    let stream = TcpStream::connect(adresse).await.unwrap();
    let mut client = Framed::new(stream, FrameCodec::new());
    client.send(RendezvousMessage::Register).await.unwrap();
    match empfangen(&mut client).await {
        RendezvousMessage::Assigned { peer_id } => (client, peer_id),
        andere => panic!("Erwartet Assigned, erhalten {andere:?}"),
    }
}

async fn gepaarte_clients(adresse: SocketAddr) -> ((Client, PeerId), (Client, PeerId)) {
    let (mut host, host_id) = registrierter_client(adresse).await;
    let (mut gast, gast_id) = registrierter_client(adresse).await;

    gast.send(RendezvousMessage::Connect { target: host_id })
        .await
        .unwrap();
    assert_eq!(
        empfangen(&mut gast).await,
        RendezvousMessage::Paired { remote: host_id }
    );
    assert_eq!(
        empfangen(&mut host).await,
        RendezvousMessage::Paired { remote: gast_id }
    );
    ((host, host_id), (gast, gast_id))
}

#[tokio::test]
async fn data_wird_in_beide_richtungen_weitergeleitet() {
    let (adresse, _shutdown) = server_starten().await;
    let ((mut host, _), (mut gast, _)) = gepaarte_clients(adresse).await;

    gast.send(RendezvousMessage::Data { payload: r#"{"a":1}"#.into() })
        .await
        .unwrap();
    assert_eq!(
        empfangen(&mut host).await,
        RendezvousMessage::Data { payload: r#"{"a":1}"#.into() }
    );

    host.send(RendezvousMessage::Data { payload: "\"pong\"".into() })
        .await
        .unwrap();
    assert_eq!(
        empfangen(&mut gast).await,
        RendezvousMessage::Data { payload: "\"pong\"".into() }
    );
}

#[tokio::test]
async fn dritter_client_kann_nicht_dazwischen() {
    let (adresse, _shutdown) = server_starten().await;
    let ((_host, host_id), (_gast, _)) = gepaarte_clients(adresse).await;
    let (mut dritter, _) = registrierter_client(adresse).await;

    dritter
        .send(RendezvousMessage::Connect { target: host_id })
        .await
        .unwrap();
    assert!(matches!(
        empfangen(&mut dritter).await,
        RendezvousMessage::Error { code: ErrorCode::AlreadyPaired, .. }
    ));
}

#[tokio::test]
async fn verbindung_mit_sich_selbst() {
    let (adresse, _shutdown) = server_starten().await;
    let (mut client, eigene_id) = registrierter_client(adresse).await;

    client
        .send(RendezvousMessage::Connect { target: eigene_id })
        .await
        .unwrap();
    assert!(matches!(
        empfangen(&mut client).await,
        RendezvousMessage::Error { code: ErrorCode::SelfConnect, .. }
    ));
}

#[tokio::test]
async fn partner_erhaelt_peer_left() {
    let (adresse, _shutdown) = server_starten().await;
    let ((mut host, _), (gast, gast_id)) = gepaarte_clients(adresse).await;

    drop(gast);
    assert_eq!(
        empfangen(&mut host).await,
        RendezvousMessage::PeerLeft { peer_id: gast_id }
    );

    // Host ist danach wieder ungepaart
    host.send(RendezvousMessage::Data { payload: "1".into() })
        .await
        .unwrap();
    assert!(matches!(
        empfangen(&mut host).await,
        RendezvousMessage::Error { code: ErrorCode::NotPaired, .. }
    ));
}

#[tokio::test]
async fn shutdown_trennt_clients() {
    let (adresse, shutdown) = server_starten().await;
    let (mut client, _) = registrierter_client(adresse).await;

    shutdown.send(true).unwrap();
    let naechstes = timeout(FRIST, client.next()).await.unwrap();
    assert!(naechstes.is_none() || matches!(naechstes, Some(Err(_))));
}
