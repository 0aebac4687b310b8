//! Umsetzung der Unterbefehle

use anyhow::{Context, Result};
use duett_crypto::PasswortCipher;
use duett_net::{
    init_network, teilen, HostOptionen, LinkKuerzer, Netzwerk, PeerLink, Signalisierung, Url,
};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader, Lines, Stdin};

use crate::cli::{KryptoArgs, ManuellArgs, RendezvousArgs};

type Eingabe = Lines<BufReader<Stdin>>;

// ---------------------------------------------------------------------------
// Verschluesselung
// ---------------------------------------------------------------------------

pub async fn verschluesseln(args: KryptoArgs) -> Result<()> {
    let klartext = text_oder_lesen(args.text, tokio::io::stdin()).await?;
    let token = PasswortCipher::neu()
        .verschluesseln_async(args.passwort, klartext)
        .await
        .context("Verschluesselung fehlgeschlagen")?;
    println!("{token}");
    Ok(())
}

pub async fn entschluesseln(args: KryptoArgs) -> Result<()> {
    let token = text_oder_lesen(args.text, tokio::io::stdin()).await?;
    let klartext = PasswortCipher::neu()
        .entschluesseln_async(args.passwort, token.trim().to_string())
        .await
        .context("Entschluesselung fehlgeschlagen (falsches Passwort oder beschaedigtes Token)")?;
    println!("{klartext}");
    Ok(())
}

/// Argument oder, falls nicht angegeben, komplette Eingabe ohne Zeilenende
async fn text_oder_lesen<R>(text: Option<String>, mut quelle: R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    if let Some(text) = text {
        return Ok(text);
    }
    let mut eingabe = String::new();
    quelle
        .read_to_string(&mut eingabe)
        .await
        .context("stdin nicht lesbar")?;
    Ok(eingabe.trim_end_matches(['\r', '\n']).to_string())
}

// ---------------------------------------------------------------------------
// Netzwerk
// ---------------------------------------------------------------------------

pub async fn rendezvous(args: RendezvousArgs) -> Result<()> {
    let seite = teilen::seite_parsen(&args.seite)?;
    sitzung_fuehren(&seite, Signalisierung::Rendezvous { server: args.server }).await
}

pub async fn manuell(args: ManuellArgs) -> Result<()> {
    let seite = teilen::seite_parsen(&args.seite)?;

    let kuerzer = match (args.kuerzen, args.kuerzer_endpunkt) {
        (false, _) => None,
        (true, Some(endpunkt)) => Some(LinkKuerzer::mit_endpunkt(&endpunkt)?),
        (true, None) => Some(LinkKuerzer::neu()?),
    };

    let signalisierung = Signalisierung::Manuell {
        host: HostOptionen {
            bind: args.bind,
            kandidaten: args.kandidaten,
        },
        kuerzer,
    };
    sitzung_fuehren(&seite, signalisierung).await
}

/// Baut die Verbindung auf und verbindet sie mit stdin/stdout
async fn sitzung_fuehren(seite: &Url, signalisierung: Signalisierung) -> Result<()> {
    let Netzwerk {
        link,
        bereit,
        einladung,
        antwort,
        antwort_eingabe,
    } = init_network(seite, signalisierung, |wert| println!("<< {wert}")).await?;

    let mut eingabe = BufReader::new(tokio::io::stdin()).lines();

    if let Some(einladung) = einladung {
        println!("Einladungs-Link fuer den Gast:\n{einladung}");
    }
    if let Some(antwort) = antwort {
        println!("Diese Antwort an den Host schicken:\n{antwort}");
    }
    if let Some(antwort_eingabe) = antwort_eingabe {
        println!("Antwort des Gastes einfuegen:");
        loop {
            let Some(zeile) = eingabe.next_line().await? else {
                anyhow::bail!("stdin geschlossen bevor eine Antwort eingefuegt wurde");
            };
            match antwort_eingabe.anwenden(&zeile) {
                Ok(()) => break,
                Err(e) => println!("Antwort ungueltig ({e}), bitte erneut einfuegen:"),
            }
        }
    }

    println!("Warte auf die Gegenstelle...");
    tokio::select! {
        ergebnis = bereit.warten() => ergebnis.context("Verbindung nicht zustande gekommen")?,
        _ = tokio::signal::ctrl_c() => return Ok(()),
    }
    println!("Verbunden als {}. Zeilen werden gesendet, Ctrl-D beendet.", link.rolle());

    nachrichten_senden(&link, &mut eingabe).await
}

async fn nachrichten_senden(link: &PeerLink, eingabe: &mut Eingabe) -> Result<()> {
    loop {
        tokio::select! {
            zeile = eingabe.next_line() => {
                let Some(zeile) = zeile? else { break };
                if !link.senden(&zeile)? {
                    println!("Nicht verbunden, Nachricht verworfen");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
