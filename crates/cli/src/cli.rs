//! Kommandozeilen-Definition (clap derive)

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;

/// Duett - Texte mit Passwort verschluesseln und zwei Peers verbinden
#[derive(Parser)]
#[command(name = "duett")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log-Level (wird von DUETT_LOG_LEVEL ueberschrieben)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Log-Format: text oder json
    #[arg(long, global = true, default_value = "text")]
    pub log_format: String,

    #[command(subcommand)]
    pub befehl: Befehl,
}

#[derive(Subcommand)]
pub enum Befehl {
    /// Verschluesselt einen Text zu `salt:iv:ciphertext`
    Verschluesseln(KryptoArgs),

    /// Entschluesselt ein Token
    Entschluesseln(KryptoArgs),

    /// Verbindet ueber einen Rendezvous-Server
    Rendezvous(RendezvousArgs),

    /// Verbindet mit manuell ausgetauschtem Angebot und Antwort
    Manuell(ManuellArgs),
}

/// Argumente fuer `verschluesseln` und `entschluesseln`
#[derive(Args)]
pub struct KryptoArgs {
    /// Passwort
    #[arg(short, long, env = "DUETT_PASSWORT", hide_env_values = true)]
    pub passwort: String,

    /// Klartext bzw. Token (ohne Angabe: stdin)
    #[arg(value_name = "TEXT")]
    pub text: Option<String>,
}

/// Argumente fuer `rendezvous`
#[derive(Args)]
pub struct RendezvousArgs {
    /// Adresse des Rendezvous-Servers
    #[arg(long, default_value = "127.0.0.1:7600")]
    pub server: String,

    /// Seiten-URL; mit `?peer=<id>` als Gast
    #[arg(long, default_value = "http://localhost/")]
    pub seite: String,
}

/// Argumente fuer `manuell`
#[derive(Args)]
pub struct ManuellArgs {
    /// Seiten-URL; mit `?offer=<angebot>` als Gast
    #[arg(long, default_value = "http://localhost/")]
    pub seite: String,

    /// Einladungs-Link kuerzen (nur Host)
    #[arg(long)]
    pub kuerzen: bool,

    /// Endpunkt des Link-Kuerzers
    #[arg(long, value_name = "URL")]
    pub kuerzer_endpunkt: Option<String>,

    /// Lokale Adresse des Host-Listeners
    #[arg(long, default_value = "127.0.0.1:0")]
    pub bind: SocketAddr,

    /// Adresse, unter der der Gast den Host erreicht (mehrfach moeglich)
    #[arg(long = "adresse", value_name = "ADRESSE")]
    pub kandidaten: Vec<SocketAddr>,
}
