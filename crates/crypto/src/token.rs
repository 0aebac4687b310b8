//! Textformat des verschluesselten Tokens
//!
//! ## Format
//! ```text
//! base64(salt[16]) ":" base64(iv[12]) ":" base64(ciphertext + auth_tag[16])
//! ```
//!
//! Base64 im Standard-Alphabet mit Padding. Genau drei Teile, sonst ist das
//! Token ungueltig.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::str::FromStr;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::SALT_LAENGE;

/// Trennzeichen zwischen den drei Teilen
pub const TRENNER: char = ':';

/// Laenge der AES-GCM-Nonce (IV)
pub const IV_LAENGE: usize = 12;

/// Laenge des GCM-Auth-Tags am Ende des Ciphertexts
pub const TAG_LAENGE: usize = 16;

/// Zerlegtes Token: Salt, IV und Ciphertext
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerschluesseltesToken {
    pub salt: [u8; SALT_LAENGE],
    pub iv: [u8; IV_LAENGE],
    /// Ciphertext inklusive Auth-Tag
    pub ciphertext: Vec<u8>,
}

impl fmt::Display for VerschluesseltesToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{TRENNER}{}{TRENNER}{}",
            STANDARD.encode(self.salt),
            STANDARD.encode(self.iv),
            STANDARD.encode(&self.ciphertext)
        )
    }
}

impl FromStr for VerschluesseltesToken {
    type Err = CryptoError;

    fn from_str(s: &str) -> CryptoResult<Self> {
        let teile: Vec<&str> = s.trim().split(TRENNER).collect();
        let [salt_b64, iv_b64, ct_b64] = teile.as_slice() else {
            return Err(CryptoError::UngueltigesToken(format!(
                "erwartet 3 Teile, erhalten {}",
                teile.len()
            )));
        };

        let salt = STANDARD.decode(salt_b64)?;
        let salt: [u8; SALT_LAENGE] = salt
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::UngueltigeSaltLaenge {
                erwartet: SALT_LAENGE,
                erhalten: salt.len(),
            })?;

        let iv = STANDARD.decode(iv_b64)?;
        let iv: [u8; IV_LAENGE] = iv
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::UngueltigeNonce {
                erwartet: IV_LAENGE,
                erhalten: iv.len(),
            })?;

        let ciphertext = STANDARD.decode(ct_b64)?;
        if ciphertext.len() < TAG_LAENGE {
            return Err(CryptoError::UngueltigesToken(format!(
                "Ciphertext zu kurz: {} Bytes",
                ciphertext.len()
            )));
        }

        Ok(Self { salt, iv, ciphertext })
    }
}
