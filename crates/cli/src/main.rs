//! duett - Kommandozeile
//!
//! Verschluesselt Texte und baut Zwei-Personen-Verbindungen auf. Empfangene
//! Nachrichten landen auf stdout, jede Zeile von stdin wird als JSON-String
//! an die Gegenstelle gesendet.

mod befehle;
mod cli;

use anyhow::Result;
use clap::Parser;

use cli::{Befehl, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    duett_observability::logging_initialisieren(&cli.log_level, &cli.log_format)?;

    match cli.befehl {
        Befehl::Verschluesseln(args) => befehle::verschluesseln(args).await,
        Befehl::Entschluesseln(args) => befehle::entschluesseln(args).await,
        Befehl::Rendezvous(args) => befehle::rendezvous(args).await,
        Befehl::Manuell(args) => befehle::manuell(args).await,
    }
}
