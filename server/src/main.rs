//! Relay-Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Server.

use anyhow::Result;
use relay_server::config::{ConfigQuelle, ServerConfig};
use relay_server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("RELAY_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let (config, quelle) = ServerConfig::laden(&config_pfad)?;

    relay_observability::logging_initialisieren(&config.logging.level, &config.logging.format);

    if quelle == ConfigQuelle::Standardwerte {
        tracing::warn!(
            pfad = %config_pfad,
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Relay-Server wird initialisiert"
    );

    Server::neu(config).starten().await
}
