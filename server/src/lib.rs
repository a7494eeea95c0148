//! relay-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und verdrahtet Engine, Acceptor und
//! Observability zu einem lauffaehigen Prozess.

pub mod config;

use anyhow::{Context, Result};
use config::ServerConfig;
use relay_hub::{ereignis_kanal, RelayEngine, RelayServer};
use relay_observability::RelayMetrics;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Maximale Wartezeit auf die Engine nach dem Shutdown-Signal
const ENGINE_AUSLAUF: Duration = Duration::from_secs(5);

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Koordinations-Engine starten
    /// 2. TCP-Listener binden (Fehler hier beendet den Prozess)
    /// 3. Observability-Server starten (optional)
    /// 4. Accept-Loop bis Ctrl-C, danach Worker und Engine auslaufen lassen
    pub async fn starten(self) -> Result<()> {
        let relay_config = Arc::new(self.config.relay_config()?);
        let metriken = RelayMetrics::neu()?;

        tracing::info!(
            tcp = %self.config.tcp_bind_adresse(),
            buffer_groesse = relay_config.buffer_groesse,
            min_intervall_ms = relay_config.min_nachrichten_intervall.as_millis() as u64,
            strike_limit = relay_config.strike_limit,
            ban_dauer_sek = relay_config.ban_dauer.as_secs(),
            schwaerzen = relay_config.adressen_schwaerzen,
            "Server startet"
        );

        let (events_tx, events_rx) = ereignis_kanal();
        let engine = RelayEngine::neu(Arc::clone(&relay_config), metriken.clone());
        let engine_task = tokio::spawn(engine.laufen(events_rx));

        let server = RelayServer::binden(
            &self.config.tcp_bind_adresse(),
            Arc::clone(&relay_config),
            events_tx,
        )
        .await
        .context("TCP-Listener konnte nicht gestartet werden")?;

        if self.config.observability.aktiviert {
            let adresse: SocketAddr = self
                .config
                .observability_bind_adresse()
                .parse()
                .context("Ungueltige Observability-Adresse")?;
            let metriken = metriken.clone();
            tokio::spawn(async move {
                if let Err(e) =
                    relay_observability::observability_server_starten(adresse, metriken).await
                {
                    tracing::error!(fehler = %e, "Observability-Server beendet");
                }
            });
        }

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let mut acceptor = tokio::spawn(server.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        let vorzeitig = tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                shutdown_tx.send_replace(true);
                None
            }
            // Accept-Loop endet ohne Signal nur, wenn die Engine weg ist
            ergebnis = &mut acceptor => Some(ergebnis),
        };
        match vorzeitig {
            Some(ergebnis) => ergebnis??,
            None => acceptor.await??,
        }

        // Die Engine endet, sobald alle Worker ihre Sender freigegeben haben
        if tokio::time::timeout(ENGINE_AUSLAUF, engine_task).await.is_err() {
            tracing::warn!("Koordinations-Engine nicht rechtzeitig beendet");
        }

        Ok(())
    }
}
