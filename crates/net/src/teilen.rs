//! Rollenerkennung und Einladungs-Links
//!
//! Die Rolle ergibt sich aus einem Query-Parameter der Seiten-URL: fehlt er,
//! ist man Host und erzeugt eine Einladung, sonst Gast.

use duett_core::types::Rolle;
use reqwest::Url;

use crate::error::{NetzError, NetzResult};

/// Query-Parameter der Rendezvous-Variante (Peer-ID des Hosts)
pub const PEER_PARAMETER: &str = "peer";

/// Query-Parameter der manuellen Variante (komprimiertes Angebot)
pub const OFFER_PARAMETER: &str = "offer";

/// Parst eine Seiten-URL
pub fn seite_parsen(text: &str) -> NetzResult<Url> {
    Url::parse(text).map_err(|e| NetzError::Url(format!("{text}: {e}")))
}

/// Liest den Wert eines Query-Parameters
pub fn parameter_lesen(seite: &Url, name: &str) -> Option<String> {
    seite
        .query_pairs()
        .find(|(schluessel, _)| schluessel == name)
        .map(|(_, wert)| wert.into_owned())
}

/// Bestimmt Rolle und ggf. Einladungswert aus der Seiten-URL
pub fn rolle_bestimmen(seite: &Url, name: &str) -> (Rolle, Option<String>) {
    let wert = parameter_lesen(seite, name).filter(|w| !w.is_empty());
    (Rolle::aus_parameter(wert.as_deref()), wert)
}

/// Baut einen Link `origin + path + ?name=wert`
///
/// Vorhandene Query und Fragment der Seite werden verworfen.
pub fn einladungs_link(seite: &Url, name: &str, wert: &str) -> Url {
    let mut link = seite.clone();
    link.set_query(None);
    link.set_fragment(None);
    link.query_pairs_mut().append_pair(name, wert);
    link
}
