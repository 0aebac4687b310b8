//! Passwort-basierte Verschluesselung von Texten
//!
//! ## Ablauf Verschluesseln
//! 1. Frisches Salt (16 Bytes) und frische IV (12 Bytes) aus dem OS-RNG
//! 2. Schluessel = PBKDF2-HMAC-SHA256(passwort, salt, iterationen)
//! 3. Ciphertext = AES-256-GCM(schluessel, iv, klartext)
//! 4. Token = `b64(salt):b64(iv):b64(ciphertext)`
//!
//! Entschluesseln kehrt das um und schlaegt fehl, wenn Passwort, Parameter
//! oder Token nicht passen. Es wird nie ein Teil-Klartext zurueckgegeben.
//!
//! PBKDF2 ist absichtlich teuer. Die `async`-Varianten verlagern die Arbeit
//! auf den Blocking-Pool von tokio.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce as AesNonce,
};

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{schluessel_ableiten, PBKDF2_ITERATIONEN, SALT_LAENGE};
use crate::token::{VerschluesseltesToken, IV_LAENGE};

/// Verschluesselt Texte mit einem aus dem Passwort abgeleiteten Schluessel
///
/// Haelt nur die KDF-Parameter, keine Schluessel. Jeder Aufruf leitet neu ab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswortCipher {
    iterationen: u32,
}

impl Default for PasswortCipher {
    fn default() -> Self {
        Self {
            iterationen: PBKDF2_ITERATIONEN,
        }
    }
}

impl PasswortCipher {
    /// Cipher mit Standard-Parametern (100 000 Iterationen)
    pub fn neu() -> Self {
        Self::default()
    }

    /// Cipher mit abweichender Iterationszahl
    ///
    /// Tokens sind nur mit derselben Iterationszahl wieder zu oeffnen.
    pub fn mit_iterationen(iterationen: u32) -> Self {
        Self { iterationen }
    }

    pub fn iterationen(&self) -> u32 {
        self.iterationen
    }

    /// Verschluesselt `klartext` und gibt das Token in Textform zurueck
    pub fn verschluesseln(&self, passwort: &str, klartext: &str) -> CryptoResult<String> {
        let mut salt = [0u8; SALT_LAENGE];
        let mut iv = [0u8; IV_LAENGE];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);

        let schluessel = schluessel_ableiten(passwort, &salt, self.iterationen)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&schluessel));

        let ciphertext = cipher
            .encrypt(AesNonce::from_slice(&iv), klartext.as_bytes())
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

        tracing::trace!(
            klartext_bytes = klartext.len(),
            ciphertext_bytes = ciphertext.len(),
            "Text verschluesselt"
        );

        Ok(VerschluesseltesToken { salt, iv, ciphertext }.to_string())
    }

    /// Entschluesselt ein Token in Textform
    ///
    /// # Fehler
    /// - `UngueltigesToken`, `Base64`, `UngueltigeSaltLaenge`, `UngueltigeNonce`
    ///   bei kaputtem oder abgeschnittenem Token
    /// - `Entschluesselung` bei falschem Passwort oder manipuliertem Inhalt
    pub fn entschluesseln(&self, passwort: &str, token: &str) -> CryptoResult<String> {
        let token: VerschluesseltesToken = token.parse()?;

        let schluessel = schluessel_ableiten(passwort, &token.salt, self.iterationen)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&schluessel));

        let klartext = cipher
            .decrypt(AesNonce::from_slice(&token.iv), token.ciphertext.as_slice())
            .map_err(|_| {
                tracing::debug!("Auth-Tag ungueltig, Entschluesselung abgelehnt");
                CryptoError::Entschluesselung
            })?;

        Ok(String::from_utf8(klartext)?)
    }

    /// Wie `verschluesseln`, laeuft aber auf dem Blocking-Pool
    pub async fn verschluesseln_async(
        &self,
        passwort: impl Into<String>,
        klartext: impl Into<String>,
    ) -> CryptoResult<String> {
        let cipher = *self;
        let passwort = passwort.into();
        let klartext = klartext.into();
        tokio::task::spawn_blocking(move || cipher.verschluesseln(&passwort, &klartext))
            .await
            .map_err(|e| CryptoError::Hintergrund(e.to_string()))?
    }

    /// Wie `entschluesseln`, laeuft aber auf dem Blocking-Pool
    pub async fn entschluesseln_async(
        &self,
        passwort: impl Into<String>,
        token: impl Into<String>,
    ) -> CryptoResult<String> {
        let cipher = *self;
        let passwort = passwort.into();
        let token = token.into();
        tokio::task::spawn_blocking(move || cipher.entschluesseln(&passwort, &token))
            .await
            .map_err(|e| CryptoError::Hintergrund(e.to_string()))?
    }
}

/// Verschluesselt mit Standard-Parametern
pub fn verschluesseln(passwort: &str, klartext: &str) -> CryptoResult<String> {
    PasswortCipher::neu().verschluesseln(passwort, klartext)
}

/// Entschluesselt mit Standard-Parametern
pub fn entschluesseln(passwort: &str, token: &str) -> CryptoResult<String> {
    PasswortCipher::neu().entschluesseln(passwort, token)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
