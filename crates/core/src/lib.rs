//! relay-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die vom Hub,
//! der Observability und dem Server-Binary gemeinsam genutzt werden.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{RelayError, Result};
pub use types::{AdressAnzeige, IdVergabe, VerbindungsId, GESCHWAERZT};
