//! Schluesselableitung aus einem Passwort
//!
//! PBKDF2-HMAC-SHA256 mit festem Iterationszaehler. Tokens sind nur mit
//! denselben Parametern wieder zu oeffnen.

use hmac::Hmac;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};

/// Laenge des abgeleiteten Schluessels (AES-256)
pub const SCHLUESSEL_LAENGE: usize = 32;

/// Laenge des Salts in Bytes
pub const SALT_LAENGE: usize = 16;

/// Standard-Iterationszahl fuer PBKDF2
pub const PBKDF2_ITERATIONEN: u32 = 100_000;

/// Leitet einen 256-Bit-Schluessel aus Passwort und Salt ab
pub fn schluessel_ableiten(
    passwort: &str,
    salt: &[u8],
    iterationen: u32,
) -> CryptoResult<[u8; SCHLUESSEL_LAENGE]> {
    if salt.len() != SALT_LAENGE {
        return Err(CryptoError::UngueltigeSaltLaenge {
            erwartet: SALT_LAENGE,
            erhalten: salt.len(),
        });
    }
    if iterationen == 0 {
        return Err(CryptoError::KeyDerivation(
            "Iterationszahl muss groesser 0 sein".into(),
        ));
    }

    let mut schluessel = [0u8; SCHLUESSEL_LAENGE];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(passwort.as_bytes(), salt, iterationen, &mut schluessel)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(schluessel)
}
