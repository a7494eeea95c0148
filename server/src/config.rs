//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use relay_core::RelayError;
use relay_hub::RelayConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Rate-Limit, Bans und Lesepuffer
    pub relay: RelayEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Maximale Anzahl gleichzeitiger Clients (0 = unbegrenzt)
    pub max_clients: u32,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self { max_clients: 512 }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse des Relay-Listeners
    pub bind_adresse: String,
    /// TCP-Port des Relay-Listeners
    pub port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 9090,
        }
    }
}

/// Rate-Limit-, Ban- und Puffer-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayEinstellungen {
    /// Maximale Bytes pro Lesevorgang
    pub buffer_groesse: usize,
    /// Mindestabstand zwischen zwei Nachrichten eines Clients in Sekunden
    pub min_nachrichten_intervall_sek: f64,
    /// Verstoesse bis zum Ban
    pub strike_limit: u32,
    /// Ban-Dauer in Sekunden
    pub ban_dauer_sek: u64,
    /// Peer-Adressen in Logs durch `[REDACTED]` ersetzen
    pub adressen_schwaerzen: bool,
}

impl Default for RelayEinstellungen {
    fn default() -> Self {
        Self {
            buffer_groesse: 512,
            min_nachrichten_intervall_sek: 1.0,
            strike_limit: 10,
            ban_dauer_sek: 10 * 60,
            adressen_schwaerzen: false,
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

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: false,
            port: 9300,
        }
    }
}

/// Woher die geladene Konfiguration stammt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigQuelle {
    /// Aus der angegebenen TOML-Datei gelesen
    Datei,
    /// Datei fehlt, Standardwerte in Verwendung
    Standardwerte,
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    ///
    /// Laeuft vor der Logging-Initialisierung, deshalb meldet der Aufrufer
    /// die Quelle selbst.
    pub fn laden(pfad: &str) -> anyhow::Result<(Self, ConfigQuelle)> {
        let (config, quelle): (Self, _) = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => (
                toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
                ConfigQuelle::Datei,
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (Self::default(), ConfigQuelle::Standardwerte)
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };
        config.validieren()?;
        Ok((config, quelle))
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn validieren(&self) -> Result<(), RelayError> {
        let relay = &self.relay;
        if relay.buffer_groesse == 0 {
            return Err(RelayError::konfiguration("relay.buffer_groesse muss groesser 0 sein"));
        }
        if relay.strike_limit == 0 {
            return Err(RelayError::konfiguration("relay.strike_limit muss groesser 0 sein"));
        }
        self.min_nachrichten_intervall()?;

        let logging = &self.logging;
        if !relay_observability::log_level_gueltig(&logging.level) {
            return Err(RelayError::konfiguration(format!(
                "logging.level ungueltig: '{}'",
                logging.level
            )));
        }
        if !relay_observability::log_format_gueltig(&logging.format) {
            return Err(RelayError::konfiguration(format!(
                "logging.format muss \"text\" oder \"json\" sein, nicht '{}'",
                logging.format
            )));
        }
        Ok(())
    }

    /// Mindestabstand als `Duration`, scheitert bei negativen, nicht
    /// endlichen oder zu grossen Werten
    fn min_nachrichten_intervall(&self) -> Result<Duration, RelayError> {
        let sek = self.relay.min_nachrichten_intervall_sek;
        Duration::try_from_secs_f64(sek).map_err(|e| {
            RelayError::konfiguration(format!(
                "relay.min_nachrichten_intervall_sek ungueltig: {sek} ({e})"
            ))
        })
    }

    /// Leitet die Laufzeit-Konfiguration des Hubs ab
    pub fn relay_config(&self) -> Result<RelayConfig, RelayError> {
        Ok(RelayConfig {
            buffer_groesse: self.relay.buffer_groesse,
            min_nachrichten_intervall: self.min_nachrichten_intervall()?,
            strike_limit: self.relay.strike_limit,
            ban_dauer: Duration::from_secs(self.relay.ban_dauer_sek),
            adressen_schwaerzen: self.relay.adressen_schwaerzen,
            max_clients: self.server.max_clients as usize,
        })
    }

    /// Gibt die vollstaendige Bind-Adresse fuer den Relay-Listener zurueck
    pub fn tcp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.observability.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert!(cfg.validieren().is_ok());
        assert_eq!(cfg.netzwerk.port, 9090);
        assert_eq!(cfg.relay.buffer_groesse, 512);
        assert_eq!(cfg.relay.strike_limit, 10);
        assert_eq!(cfg.relay.ban_dauer_sek, 600);
        assert!(!cfg.relay.adressen_schwaerzen);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn bind_adressen() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.tcp_bind_adresse(), "0.0.0.0:9090");
        assert_eq!(cfg.observability_bind_adresse(), "0.0.0.0:9300");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [netzwerk]
            port = 7000

            [relay]
            min_nachrichten_intervall_sek = 0.5
            adressen_schwaerzen = true
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.netzwerk.port, 7000);
        assert!(cfg.relay.adressen_schwaerzen);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.relay.strike_limit, 10);
        assert_eq!(cfg.netzwerk.bind_adresse, "0.0.0.0");
    }

    #[test]
    fn relay_config_umrechnung() {
        let mut cfg = ServerConfig::default();
        cfg.relay.min_nachrichten_intervall_sek = 0.25;
        cfg.server.max_clients = 3;

        let relay = cfg.relay_config().unwrap();
        assert_eq!(relay.min_nachrichten_intervall, Duration::from_millis(250));
        assert_eq!(relay.ban_dauer, Duration::from_secs(600));
        assert_eq!(relay.max_clients, 3);
    }

    #[test]
    fn ungueltige_werte_abgelehnt() {
        let mut cfg = ServerConfig::default();
        cfg.relay.strike_limit = 0;
        assert!(cfg.validieren().is_err());

        let mut cfg = ServerConfig::default();
        cfg.relay.buffer_groesse = 0;
        assert!(cfg.validieren().is_err());

        let mut cfg = ServerConfig::default();
        cfg.relay.min_nachrichten_intervall_sek = -1.0;
        assert!(cfg.validieren().is_err());

        let mut cfg = ServerConfig::default();
        cfg.relay.min_nachrichten_intervall_sek = f64::NAN;
        assert!(cfg.validieren().is_err());
    }

    #[test]
    fn zu_grosses_intervall_abgelehnt_statt_panik() {
        let mut cfg = ServerConfig::default();
        cfg.relay.min_nachrichten_intervall_sek = 1e20;
        assert!(matches!(cfg.validieren(), Err(RelayError::Konfiguration(_))));
        assert!(cfg.relay_config().is_err());
    }

    #[test]
    fn ungueltiges_logging_abgelehnt() {
        let mut cfg = ServerConfig::default();
        cfg.logging.format = "xml".into();
        let fehler = cfg.validieren().unwrap_err();
        assert!(fehler.to_string().contains("logging.format"));

        let mut cfg = ServerConfig::default();
        cfg.logging.level = "inof".into();
        let fehler = cfg.validieren().unwrap_err();
        assert!(fehler.to_string().contains("logging.level"));
    }

    #[test]
    fn logging_direktive_und_json_akzeptiert() {
        let mut cfg = ServerConfig::default();
        cfg.logging.level = "info,relay_hub=debug".into();
        cfg.logging.format = "json".into();
        assert!(cfg.validieren().is_ok());
    }

    #[test]
    fn beispielkonfiguration_entspricht_standardwerten() {
        let cfg: ServerConfig = toml::from_str(include_str!("../../config.example.toml")).unwrap();
        let standard = ServerConfig::default();
        assert!(cfg.validieren().is_ok());
        assert_eq!(cfg.tcp_bind_adresse(), standard.tcp_bind_adresse());
        assert_eq!(cfg.relay.strike_limit, standard.relay.strike_limit);
        assert_eq!(cfg.relay.ban_dauer_sek, standard.relay.ban_dauer_sek);
        assert_eq!(cfg.server.max_clients, standard.server.max_clients);
    }

    #[test]
    fn fehlende_datei_liefert_standardwerte() {
        let (cfg, quelle) = ServerConfig::laden("/pfad/der/nicht/existiert.toml").unwrap();
        assert_eq!(quelle, ConfigQuelle::Standardwerte);
        assert_eq!(cfg.netzwerk.port, 9090);
    }

    #[test]
    fn vorhandene_datei_wird_gelesen() {
        let pfad = concat!(env!("CARGO_MANIFEST_DIR"), "/../config.example.toml");
        let (cfg, quelle) = ServerConfig::laden(pfad).unwrap();
        assert_eq!(quelle, ConfigQuelle::Datei);
        assert_eq!(cfg.relay.strike_limit, 10);
    }
}
