//! Structured Logging Setup via tracing-subscriber
//!
//! Umgebungsvariablen haben Vorrang vor der Konfiguration:
//! - `DUETT_LOG_LEVEL`: Filter-Direktive (z.B. `info`, `duett_net=debug`)
//! - `DUETT_LOG_FORMAT`: `text` oder `json`

use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

/// Umgebungsvariable fuer den Log-Filter
pub const ENV_LOG_LEVEL: &str = "DUETT_LOG_LEVEL";

/// Umgebungsvariable fuer das Log-Format
pub const ENV_LOG_FORMAT: &str = "DUETT_LOG_FORMAT";

/// Fehler beim Einrichten des Loggings
#[derive(Debug, Error)]
pub enum LoggingFehler {
    #[error("Ungueltiges Log-Format '{0}' (erlaubt: text, json)")]
    UngueltigesFormat(String),

    #[error("Ungueltiger Log-Filter '{filter}': {grund}")]
    UngueltigerFilter { filter: String, grund: String },

    #[error("Logging bereits initialisiert: {0}")]
    BereitsInitialisiert(String),
}

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            andere => Err(LoggingFehler::UngueltigesFormat(andere.to_string())),
        }
    }
}

/// Initialisiert das Logging-System
///
/// `level` und `format` stammen aus der Konfiguration bzw. der CLI und
/// werden von `DUETT_LOG_LEVEL` / `DUETT_LOG_FORMAT` ueberschrieben.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<(), LoggingFehler> {
    let filter_text = wert_waehlen(level, std::env::var(ENV_LOG_LEVEL).ok());
    let format = format_waehlen(format, std::env::var(ENV_LOG_FORMAT).ok())?;

    let filter = EnvFilter::try_new(&filter_text).map_err(|e| LoggingFehler::UngueltigerFilter {
        filter: filter_text.clone(),
        grund: e.to_string(),
    })?;

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    ergebnis.map_err(|e| LoggingFehler::BereitsInitialisiert(e.to_string()))
}

/// Nicht-leerer Umgebungswert gewinnt gegen den konfigurierten Wert
fn wert_waehlen(konfiguriert: &str, umgebung: Option<String>) -> String {
    umgebung
        .filter(|wert| !wert.trim().is_empty())
        .unwrap_or_else(|| konfiguriert.to_string())
}

/// Waehlt und prueft das Log-Format
pub fn format_waehlen(
    konfiguriert: &str,
    umgebung: Option<String>,
) -> Result<LogFormat, LoggingFehler> {
    wert_waehlen(konfiguriert, umgebung).parse()
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    format.parse::<LogFormat>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_gueltige_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level), "{level} sollte gueltig sein");
        }
    }

    #[test]
    fn log_level_ungueltige_werte() {
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("INFO"));
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn log_format_werte() {
        assert!(log_format_gueltig("text"));
        assert!(log_format_gueltig("json"));
        assert!(!log_format_gueltig("xml"));
        assert!(!log_format_gueltig("JSON"));
    }

    #[test]
    fn umgebung_ueberschreibt_konfiguration() {
        assert_eq!(
            format_waehlen("text", Some("json".into())).unwrap(),
            LogFormat::Json
        );
        assert_eq!(wert_waehlen("info", Some("duett_net=trace".into())), "duett_net=trace");
    }

    #[test]
    fn leere_umgebung_wird_ignoriert() {
        assert_eq!(format_waehlen("json", Some("  ".into())).unwrap(), LogFormat::Json);
        assert_eq!(format_waehlen("text", None).unwrap(), LogFormat::Text);
    }

    #[test]
    fn ungueltiges_format_aus_umgebung() {
        assert!(matches!(
            format_waehlen("text", Some("xml".into())),
            Err(LoggingFehler::UngueltigesFormat(f)) if f == "xml"
        ));
    }
}
