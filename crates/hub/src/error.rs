//! Fehlertypen fuer den Relay-Hub

use thiserror::Error;

/// Fehlertyp fuer den Relay-Hub
#[derive(Debug, Error)]
pub enum HubError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Listener konnte nicht gebunden werden
    #[error("Bind auf {adresse} fehlgeschlagen: {quelle}")]
    Bind {
        adresse: String,
        #[source]
        quelle: std::io::Error,
    },

    /// Die Engine laeuft nicht mehr (Event-Kanal geschlossen)
    #[error("Koordinations-Engine beendet")]
    EngineBeendet,
}

/// Result-Typ fuer den Relay-Hub
pub type HubResult<T> = Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_fehler_nennt_adresse() {
        let e = HubError::Bind {
            adresse: "0.0.0.0:9090".into(),
            quelle: std::io::Error::new(std::io::ErrorKind::AddrInUse, "belegt"),
        };
        assert!(e.to_string().contains("0.0.0.0:9090"));
        assert!(e.to_string().contains("belegt"));
    }
}
