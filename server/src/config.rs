//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! Standardwerte, der Server laeuft also auch ohne Konfigurationsdatei.

use duett_observability::logging::{log_format_gueltig, log_level_gueltig};
use duett_protocol::wire::DEFAULT_MAX_FRAME_SIZE;
use duett_signaling::RendezvousConfig;
use serde::{Deserialize, Serialize};

/// Kleinste sinnvolle Frame-Groesse (ein `Paired`-Frame passt hinein)
const MIN_FRAME_GROESSE: usize = 1024;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Limits des Rendezvous-Servers
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Limits des Rendezvous-Servers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_clients: usize,
    /// Ausgehende Frames, die pro Verbindung gepuffert werden
    pub send_queue_groesse: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            max_clients: 512,
            send_queue_groesse: 64,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse des TCP-Listeners
    pub bind_adresse: String,
    /// TCP-Port
    pub port: u16,
    /// Maximale Frame-Groesse in Bytes
    pub max_frame_groesse: usize,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 7600,
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if self.server.max_clients == 0 {
            anyhow::bail!("server.max_clients muss groesser als 0 sein");
        }
        if self.server.send_queue_groesse == 0 {
            anyhow::bail!("server.send_queue_groesse muss groesser als 0 sein");
        }
        if self.netzwerk.max_frame_groesse < MIN_FRAME_GROESSE {
            anyhow::bail!(
                "netzwerk.max_frame_groesse muss mindestens {MIN_FRAME_GROESSE} sein"
            );
        }
        if !log_level_gueltig(&self.logging.level) {
            anyhow::bail!("Ungueltiges logging.level '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            anyhow::bail!("Ungueltiges logging.format '{}'", self.logging.format);
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse fuer TCP zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Limits fuer den Rendezvous-Server
    pub fn rendezvous_config(&self) -> RendezvousConfig {
        RendezvousConfig {
            max_clients: self.server.max_clients,
            max_frame_groesse: self.netzwerk.max_frame_groesse,
            send_queue_groesse: self.server.send_queue_groesse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.server.max_clients, 512);
        assert_eq!(cfg.netzwerk.port, 7600);
        assert_eq!(cfg.logging.level, "info");
        cfg.pruefen().unwrap();
    }

    #[test]
    fn bind_adresse() {
        assert_eq!(ServerConfig::default().bind_adresse(), "0.0.0.0:7600");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [server]
            max_clients = 2

            [netzwerk]
            port = 9000
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server.max_clients, 2);
        assert_eq!(cfg.netzwerk.port, 9000);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.netzwerk.bind_adresse, "0.0.0.0");
        assert_eq!(cfg.server.send_queue_groesse, 64);

        let rendezvous = cfg.rendezvous_config();
        assert_eq!(rendezvous.max_clients, 2);
        assert_eq!(rendezvous.max_frame_groesse, DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn fehlende_datei_liefert_standardwerte() {
        let cfg = ServerConfig::laden("/nicht/vorhanden/duett.toml").unwrap();
        assert_eq!(cfg.netzwerk.port, 7600);
    }

    #[test]
    fn ungueltige_werte_werden_erkannt() {
        let mut cfg = ServerConfig::default();
        cfg.server.max_clients = 0;
        assert!(cfg.pruefen().is_err());

        let mut cfg = ServerConfig::default();
        cfg.logging.format = "xml".into();
        assert!(cfg.pruefen().is_err());

        let mut cfg = ServerConfig::default();
        cfg.netzwerk.max_frame_groesse = 16;
        assert!(cfg.pruefen().is_err());
    }
}
