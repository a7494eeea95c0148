//! Gemeinsame Test-Hilfen fuer den Relay-Hub


use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::sink::ClientSink;

/// In-Memory-Senke, die Schreibvorgaenge und Schliessen protokolliert
pub(crate) struct MemorySink {
    peer: SocketAddr,
    geschrieben: Mutex<Vec<Vec<u8>>>,
    geschlossen: AtomicBool,
    schreibfehler: AtomicBool,
}

impl MemorySink {
    pub(crate) fn neu(peer: &str) -> Arc<Self> {
        Arc::new(Self {
            peer: peer.parse().expect("Test-Adresse muss gueltig sein"),
            geschrieben: Mutex::new(Vec::new()),
            geschlossen: AtomicBool::new(false),
            schreibfehler: AtomicBool::new(false),
        })
    }

    /// Alle bisher geschriebenen Puffer
    pub(crate) fn geschrieben(&self) -> Vec<Vec<u8>> {
        self.geschrieben.lock().unwrap().clone()
    }

    pub(crate) fn ist_geschlossen(&self) -> bool {
        self.geschlossen.load(Ordering::SeqCst)
    }

    /// Laesst alle folgenden Schreibvorgaenge fehlschlagen
    pub(crate) fn schreibfehler_setzen(&self) {
        self.schreibfehler.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClientSink for MemorySink {
    async fn schreiben(&self, daten: &[u8]) -> io::Result<()> {
        if self.schreibfehler.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "Gegenstelle weg"));
        }
        self.geschrieben.lock().unwrap().push(daten.to_vec());
        Ok(())
    }

    async fn schliessen(&self) {
        self.geschlossen.store(true, Ordering::SeqCst);
    }

    fn peer_adresse(&self) -> SocketAddr {
        self.peer
    }
}
