//! Laufzeit-Konfiguration des Relay-Hubs
//!
//! Wird vom Server-Binary aus der TOML-Konfiguration abgeleitet und als
//! `Arc<RelayConfig>` an Engine, Acceptor und Worker verteilt.

use std::time::Duration;

/// Konfiguration fuer Engine, Acceptor und Ingest-Worker
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximale Bytes pro Lesevorgang
    pub buffer_groesse: usize,
    /// Mindestabstand zwischen zwei akzeptierten Nachrichten eines Clients
    pub min_nachrichten_intervall: Duration,
    /// Anzahl Verstoesse bis zum Ban
    pub strike_limit: u32,
    /// Dauer eines Bans
    pub ban_dauer: Duration,
    /// Peer-Adressen in Log-Ausgaben durch `[REDACTED]` ersetzen
    pub adressen_schwaerzen: bool,
    /// Maximale gleichzeitige Clients (0 = unbegrenzt)
    pub max_clients: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            buffer_groesse: 512,
            min_nachrichten_intervall: Duration::from_secs(1),
            strike_limit: 10,
            ban_dauer: Duration::from_secs(10 * 60),
            adressen_schwaerzen: false,
            max_clients: 512,
        }
    }
}
