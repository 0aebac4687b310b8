//! Link-Kuerzer ueber einen oeffentlichen HTTP-Dienst
//!
//! `GET <endpunkt>?url=<langer link>` liefert den kurzen Link als Text.
//! Schlaegt der Aufruf fehl, gibt es keinen Rueckfall auf den langen Link.

use reqwest::{Client, Url};

use crate::error::{NetzError, NetzResult};

/// Standard-Endpunkt (TinyURL)
pub const STANDARD_ENDPUNKT: &str = "https://tinyurl.com/api-create.php";

/// HTTP-Client fuer den Kuerzungsdienst
#[derive(Debug, Clone)]
pub struct LinkKuerzer {
    client: Client,
    endpunkt: Url,
}

impl LinkKuerzer {
    /// Kuerzer mit dem Standard-Endpunkt
    pub fn neu() -> NetzResult<Self> {
        Self::mit_endpunkt(STANDARD_ENDPUNKT)
    }

    /// Kuerzer mit eigenem Endpunkt (z.B. fuer Tests oder Selbst-Hosting)
    pub fn mit_endpunkt(endpunkt: &str) -> NetzResult<Self> {
        let endpunkt =
            Url::parse(endpunkt).map_err(|e| NetzError::Url(format!("{endpunkt}: {e}")))?;
        let client = Client::builder()
            .user_agent(concat!("duett/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpunkt })
    }

    pub fn endpunkt(&self) -> &Url {
        &self.endpunkt
    }

    /// Kuerzt einen Link
    ///
    /// # Fehler
    /// - `Http` bei Transportfehlern oder einem Status ausserhalb 2xx
    /// - `LeereKurzantwort` wenn der Dienst nur Leerraum liefert
    pub async fn kuerzen(&self, lang: &str) -> NetzResult<String> {
        let mut anfrage = self.endpunkt.clone();
        anfrage.query_pairs_mut().append_pair("url", lang);

        tracing::debug!(endpunkt = %self.endpunkt, "Link wird gekuerzt");

        let antwort = self
            .client
            .get(anfrage)
            .send()
            .await?
            .error_for_status()?;
        let text = antwort.text().await?;

        let kurz = text.trim();
        if kurz.is_empty() {
            return Err(NetzError::LeereKurzantwort);
        }

        tracing::info!(kurz = %kurz, "Link gekuerzt");
        Ok(kurz.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_endpunkt() {
        let kuerzer = LinkKuerzer::neu().unwrap();
        assert_eq!(kuerzer.endpunkt().as_str(), STANDARD_ENDPUNKT);
    }

    #[test]
    fn ungueltiger_endpunkt() {
        assert!(matches!(
            LinkKuerzer::mit_endpunkt("::kaputt"),
            Err(NetzError::Url(_))
        ));
    }
}
