//! Gemeinsame Identifikationstypen fuer den Relay
//!
//! Verbindungen werden ueber eine beim Accept vergebene, fortlaufende ID
//! identifiziert statt ueber das Adresstupel des Transports. Die Herkunft
//! (IP-Adresse) dient nur als Schluessel fuer Bans.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Platzhalter fuer geschwaerzte Adressen in Log-Ausgaben
pub const GESCHWAERZT: &str = "[REDACTED]";

/// Eindeutige Verbindungs-ID (innerhalb eines Prozesses nie wiederverwendet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerbindungsId(pub u64);

impl fmt::Display for VerbindungsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Vergibt fortlaufende Verbindungs-IDs
///
/// Thread-safe, wird vom Acceptor gehalten.
#[derive(Debug, Default)]
pub struct IdVergabe {
    naechste: AtomicU64,
}

impl IdVergabe {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Liefert die naechste freie ID
    pub fn naechste(&self) -> VerbindungsId {
        VerbindungsId(self.naechste.fetch_add(1, Ordering::Relaxed))
    }
}

/// Anzeige einer Peer-Adresse fuer Log-Ausgaben
///
/// Bei aktivierter Schwaerzung wird statt der Adresse `[REDACTED]` ausgegeben.
#[derive(Debug, Clone, Copy)]
pub struct AdressAnzeige {
    adresse: SocketAddr,
    schwaerzen: bool,
}

impl AdressAnzeige {
    pub fn neu(adresse: SocketAddr, schwaerzen: bool) -> Self {
        Self {
            adresse,
            schwaerzen,
        }
    }
}

impl fmt::Display for AdressAnzeige {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.schwaerzen {
            f.write_str(GESCHWAERZT)
        } else {
            write!(f, "{}", self.adresse)
        }
    }
}
