//! relay-hub – Koordination des Broadcast-Relays
//!
//! Dieser Crate enthaelt den Kern des Relays: eine serielle
//! Koordinations-Engine, die Verbindungs-Lebenszyklus, Fan-out,
//! Rate-Limit-Strikes und Bans verwaltet, sowie die I/O-Raender, die sie
//! mit Ereignissen versorgen.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (RelayServer)
//!     |  Verbunden
//!     v
//! RelayEngine  <---- Nachricht / Getrennt ---- IngestWorker (pro Verbindung ein Task)
//!     |
//!     +-- Fan-out direkt ueber die ClientSink der anderen Verbindungen
//! ```
//!
//! Die Engine ist der einzige Besitzer von Client- und Ban-Tabelle.

pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod event;
pub mod sink;
pub mod tcp;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use config::RelayConfig;
pub use connection::IngestWorker;
pub use engine::{RelayEngine, Uebergang, BAN_NACHRICHT, VOLL_NACHRICHT};
pub use error::{HubError, HubResult};
pub use event::{ereignis_kanal, EventEmpfaenger, EventSender, RelayEvent};
pub use sink::{ClientSink, TcpSink, Verbindung};
pub use tcp::RelayServer;
