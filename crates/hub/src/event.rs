//! Ereignisse zwischen Acceptor, Ingest-Workern und Engine
//!
//! Alle Produzenten schreiben in einen unbegrenzten mpsc-Kanal, die Engine
//! ist der einzige Konsument. Pro Produzent bleibt die Reihenfolge erhalten.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::sink::Verbindung;

/// Ereignis fuer die Koordinations-Engine
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// Neue Verbindung akzeptiert
    Verbunden { verbindung: Verbindung },
    /// Verbindung getrennt (Lesefehler, EOF oder Schliessen)
    Getrennt { verbindung: Verbindung },
    /// Ein Lesevorgang hat `text` geliefert
    Nachricht { verbindung: Verbindung, text: Bytes },
}

/// Produzenten-Seite des Event-Kanals
pub type EventSender = mpsc::UnboundedSender<RelayEvent>;
/// Konsumenten-Seite des Event-Kanals (nur die Engine)
pub type EventEmpfaenger = mpsc::UnboundedReceiver<RelayEvent>;

/// Erstellt den Event-Kanal
///
/// Unbegrenzt, damit die Accept-Loop nie auf die Engine warten muss.
pub fn ereignis_kanal() -> (EventSender, EventEmpfaenger) {
    mpsc::unbounded_channel()
}
