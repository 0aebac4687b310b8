//! Signalisierungs-Payloads der manuellen Variante
//!
//! Angebot und Antwort werden von Hand zwischen den Teilnehmern
//! transportiert (Link, Chat, Zettel). Damit sie kurz und URL-tauglich
//! bleiben, werden sie komprimiert:
//!
//! ```text
//! SignalPayload -> JSON -> DEFLATE -> Base64 (URL-safe, ohne Padding)
//! ```
//!
//! Das Ergebnis enthaelt nur `A-Z a-z 0-9 - _` und kann ohne weiteres
//! Escaping als Query-Parameter verwendet werden.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use duett_core::{types::SitzungsId, DuettError, Result};
use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::net::SocketAddr;

/// Obergrenze fuer den entpackten JSON-Text
pub const MAX_SIGNAL_GROESSE: u64 = 64 * 1024;

/// Opaker Signalisierungs-Payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalPayload {
    /// Host -> Gast: unter diesen Adressen ist der Host erreichbar
    Offer {
        session: SitzungsId,
        candidates: Vec<SocketAddr>,
    },
    /// Gast -> Host: Bestaetigung mit Einmal-Token
    Answer { session: SitzungsId, token: String },
}

impl SignalPayload {
    /// Sitzung, zu der der Payload gehoert
    pub fn sitzung(&self) -> SitzungsId {
        match self {
            Self::Offer { session, .. } | Self::Answer { session, .. } => *session,
        }
    }

    /// Komprimiert den Payload zu einem URL-sicheren String
    pub fn komprimieren(&self) -> Result<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| DuettError::signal(format!("JSON-Serialisierung: {e}")))?;

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder
            .write_all(&json)
            .map_err(|e| DuettError::signal(format!("Kompression: {e}")))?;
        let gepackt = encoder
            .finish()
            .map_err(|e| DuettError::signal(format!("Kompression: {e}")))?;

        Ok(URL_SAFE_NO_PAD.encode(gepackt))
    }

    /// Kehrt `komprimieren` um
    ///
    /// # Fehler
    /// `UngueltigesSignal` wenn eine der drei Schichten (Base64, DEFLATE,
    /// JSON) nicht passt.
    pub fn dekomprimieren(text: &str) -> Result<Self> {
        let gepackt = URL_SAFE_NO_PAD
            .decode(text.trim())
            .map_err(|e| DuettError::signal(format!("Base64: {e}")))?;

        let mut json = Vec::new();
        DeflateDecoder::new(gepackt.as_slice())
            .take(MAX_SIGNAL_GROESSE + 1)
            .read_to_end(&mut json)
            .map_err(|e| DuettError::signal(format!("Dekompression: {e}")))?;

        if json.len() as u64 > MAX_SIGNAL_GROESSE {
            return Err(DuettError::signal("Payload zu gross"));
        }

        serde_json::from_slice(&json).map_err(|e| DuettError::signal(format!("JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angebot() -> SignalPayload {
        SignalPayload::Offer {
            session: SitzungsId::new(),
            candidates: vec!["127.0.0.1:40000".parse().unwrap()],
        }
    }

    #[test]
    fn komprimiert_ist_url_sicher() {
        let text = angebot().komprimieren().unwrap();
        assert!(!text.is_empty());
        assert!(text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn angebot_ueberlebt_kompression() {
        let original = angebot();
        let text = original.komprimieren().unwrap();
        assert_eq!(SignalPayload::dekomprimieren(&text).unwrap(), original);
    }

    #[test]
    fn antwort_behaelt_sitzung() {
        let sitzung = SitzungsId::new();
        let antwort = SignalPayload::Answer {
            session: sitzung,
            token: "t0k3n".into(),
        };
        let text = antwort.komprimieren().unwrap();
        let decoded = SignalPayload::dekomprimieren(&text).unwrap();
        assert_eq!(decoded.sitzung(), sitzung);
    }

    #[test]
    fn kein_base64_wird_abgelehnt() {
        let err = SignalPayload::dekomprimieren("!!!").unwrap_err();
        assert!(matches!(err, DuettError::UngueltigesSignal(_)));
    }

    #[test]
    fn kein_deflate_wird_abgelehnt() {
        let text = URL_SAFE_NO_PAD.encode(b"das ist kein deflate strom");
        assert!(SignalPayload::dekomprimieren(&text).is_err());
    }

    #[test]
    fn falsches_json_wird_abgelehnt() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"type":"unbekannt"}"#).unwrap();
        let text = URL_SAFE_NO_PAD.encode(encoder.finish().unwrap());
        assert!(SignalPayload::dekomprimieren(&text).is_err());
    }

    #[test]
    fn abgeschnittener_text_wird_abgelehnt() {
        let text = angebot().komprimieren().unwrap();
        let halb = &text[..text.len() / 2];
        assert!(SignalPayload::dekomprimieren(halb).is_err());
    }
}
