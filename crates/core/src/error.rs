//! Fehlertypen fuer den Relay
//!
//! Zentraler Fehler-Enum fuer die Startphase. Fehler einzelner
//! Verbindungen (Lesen, Schreiben) sind Lebenszyklus-Ereignisse und
//! tauchen hier nicht auf. Bind-Fehler des Listeners liefert der Hub
//! als `HubError::Bind`.

use thiserror::Error;

/// Globaler Result-Alias fuer den Relay
pub type Result<T> = std::result::Result<T, RelayError>;

/// Alle prozessrelevanten Fehler im Relay
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),
}

impl RelayError {
    /// Erstellt einen Konfigurationsfehler
    pub fn konfiguration(msg: impl Into<String>) -> Self {
        Self::Konfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = RelayError::konfiguration("strike_limit muss groesser 0 sein");
        assert_eq!(
            e.to_string(),
            "Konfigurationsfehler: strike_limit muss groesser 0 sein"
        );
    }

    #[test]
    fn fehler_laesst_sich_in_anyhow_wandeln() {
        let e: anyhow::Error = RelayError::konfiguration("port").into();
        assert!(e.downcast_ref::<RelayError>().is_some());
    }
}
