//! Einmaliges Bereit-Signal einer Verbindung
//!
//! Der Transport-Task haelt den `BereitAusloeser`, der Aufrufer das `Bereit`.
//! Das Signal feuert hoechstens einmal. Endet der Task ohne auszuloesen,
//! liefert `warten` einen Fehler statt fuer immer zu haengen.

use tokio::sync::oneshot;

use crate::error::{NetzError, NetzResult};

/// Erzeugt ein zusammengehoeriges Paar aus Ausloeser und Bereit-Handle
pub fn bereit_signal() -> (BereitAusloeser, Bereit) {
    let (tx, rx) = oneshot::channel();
    (BereitAusloeser { tx: Some(tx) }, Bereit { rx })
}

/// Seite des Transports
#[derive(Debug)]
pub struct BereitAusloeser {
    tx: Option<oneshot::Sender<()>>,
}

impl BereitAusloeser {
    /// Loest das Signal aus
    ///
    /// Gibt `true` nur beim ersten Aufruf zurueck.
    pub fn ausloesen(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => {
                // Aufrufer hat das Handle evtl. schon verworfen
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    /// Wurde das Signal bereits ausgeloest?
    pub fn ausgeloest(&self) -> bool {
        self.tx.is_none()
    }
}

/// Seite des Aufrufers, kann genau einmal abgewartet werden
#[derive(Debug)]
pub struct Bereit {
    rx: oneshot::Receiver<()>,
}

impl Bereit {
    /// Wartet bis der Kanal offen ist
    ///
    /// # Fehler
    /// `NichtBereit` wenn der Transport vorher beendet wurde.
    pub async fn warten(self) -> NetzResult<()> {
        self.rx.await.map_err(|_| NetzError::NichtBereit)
    }
}
