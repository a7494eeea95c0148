//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `RELAY_LOG_LEVEL`: Log-Level bzw. EnvFilter-Direktive, ueberschreibt die Konfiguration
//! - `RELAY_LOG_FORMAT`: Format (text/json), ueberschreibt die Konfiguration

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialisiert das Logging-System.
///
/// Umgebungsvariablen haben Vorrang vor den uebergebenen Werten.
/// Faellt auf `info` zurueck wenn der Filter nicht parsebar ist.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env("RELAY_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format_env = std::env::var("RELAY_LOG_FORMAT").unwrap_or_else(|_| format.to_string());

    match format_env.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Validiert einen Log-Level bzw. eine EnvFilter-Direktive.
///
/// Ein einzelnes Wort muss ein Level sein, sonst wuerde ein Tippfehler
/// wie "inof" still als Target-Filter akzeptiert.
pub fn log_level_gueltig(level: &str) -> bool {
    let level = level.trim();
    if level.is_empty() {
        return false;
    }
    if level.contains(|c| matches!(c, '=' | ',' | '[')) {
        return EnvFilter::try_new(level).is_ok();
    }
    level.parse::<LevelFilter>().is_ok()
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_gueltige_werte() {
        for level in ["trace", "debug", "info", "warn", "error", "off", "INFO"] {
            assert!(log_level_gueltig(level), "{level} muss gueltig sein");
        }
    }

    #[test]
    fn log_level_direktiven() {
        assert!(log_level_gueltig("relay_hub=debug"));
        assert!(log_level_gueltig("info,relay_hub=trace"));
    }

    #[test]
    fn log_level_ungueltige_werte() {
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("inof"));
        assert!(!log_level_gueltig(""));
        assert!(!log_level_gueltig("   "));
    }

    #[test]
    fn log_format_werte() {
        assert!(log_format_gueltig("text"));
        assert!(log_format_gueltig("json"));
        assert!(!log_format_gueltig("xml"));
        assert!(!log_format_gueltig("JSON"));
    }
}
