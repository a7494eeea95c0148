//! Verbindungs-Senken – Schreibseite einer Client-Verbindung
//!
//! Die Engine haelt nur eine `Verbindung` (ID + Senke) und schreibt darueber.
//! Die Leseseite gehoert exklusiv dem Ingest-Worker der Verbindung.

use async_trait::async_trait;
use relay_core::VerbindungsId;
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{watch, Mutex};

/// Schreib- und Schliess-Faehigkeit einer Verbindung
#[async_trait]
pub trait ClientSink: Send + Sync + 'static {
    /// Schreibt die Bytes vollstaendig auf die Verbindung
    async fn schreiben(&self, daten: &[u8]) -> io::Result<()>;

    /// Schliesst die Verbindung (idempotent)
    ///
    /// Muss auch die Leseseite beenden, damit der Worker ein `Getrennt` liefert.
    async fn schliessen(&self);

    /// Entfernte Adresse der Verbindung
    fn peer_adresse(&self) -> SocketAddr;

    /// Herkunft der Verbindung (Ban-Schluessel)
    fn herkunft(&self) -> IpAddr {
        self.peer_adresse().ip()
    }
}

/// Handle auf eine Verbindung, billig klonbar
#[derive(Clone)]
pub struct Verbindung {
    pub id: VerbindungsId,
    pub sink: Arc<dyn ClientSink>,
}

impl Verbindung {
    pub fn neu(id: VerbindungsId, sink: Arc<dyn ClientSink>) -> Self {
        Self { id, sink }
    }
}

impl fmt::Debug for Verbindung {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verbindung")
            .field("id", &self.id)
            .field("peer", &self.sink.peer_adresse())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TcpSink
// ---------------------------------------------------------------------------

/// Senke ueber die Schreibhaelfte eines `TcpStream`
///
/// `schliessen` faehrt die Schreibhaelfte herunter und signalisiert dem
/// Worker ueber einen `watch`-Kanal, dass er die Leseseite aufgeben soll.
pub struct TcpSink {
    writer: Mutex<Option<OwnedWriteHalf>>,
    peer: SocketAddr,
    geschlossen_tx: watch::Sender<bool>,
}

impl TcpSink {
    /// Erstellt die Senke und den Empfaenger fuer das Schliess-Signal
    pub fn neu(writer: OwnedWriteHalf, peer: SocketAddr) -> (Arc<Self>, watch::Receiver<bool>) {
        let (geschlossen_tx, geschlossen_rx) = watch::channel(false);
        let sink = Arc::new(Self {
            writer: Mutex::new(Some(writer)),
            peer,
            geschlossen_tx,
        });
        (sink, geschlossen_rx)
    }

    #[cfg(test)]
    pub(crate) fn ist_geschlossen(&self) -> bool {
        *self.geschlossen_tx.borrow()
    }
}

#[async_trait]
impl ClientSink for TcpSink {
    async fn schreiben(&self, daten: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(w) => w.write_all(daten).await,
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "Verbindung bereits geschlossen",
            )),
        }
    }

    async fn schliessen(&self) {
        if let Some(mut w) = self.writer.lock().await.take() {
            if let Err(e) = w.shutdown().await {
                tracing::trace!(fehler = %e, "Shutdown der Schreibhaelfte fehlgeschlagen");
            }
        }
        self.geschlossen_tx.send_replace(true);
    }

    fn peer_adresse(&self) -> SocketAddr {
        self.peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    async fn tcp_paar() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn schreiben_erreicht_gegenstelle() {
        let (server, mut client) = tcp_paar().await;
        let peer = server.peer_addr().unwrap();
        let (_leser, schreiber) = server.into_split();
        let (sink, _rx) = TcpSink::neu(schreiber, peer);

        sink.schreiben(b"hallo").await.unwrap();

        let mut buf = [0u8; 5];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hallo");
        assert_eq!(sink.herkunft(), peer.ip());
    }

    #[tokio::test]
    async fn schliessen_signalisiert_und_sperrt_schreiben() {
        let (server, mut client) = tcp_paar().await;
        let peer = server.peer_addr().unwrap();
        let (_leser, schreiber) = server.into_split();
        let (sink, mut rx) = TcpSink::neu(schreiber, peer);

        sink.schliessen().await;
        assert!(sink.ist_geschlossen());
        rx.changed().await.unwrap();
        assert!(*rx.borrow());

        let fehler = sink.schreiben(b"x").await.unwrap_err();
        assert_eq!(fehler.kind(), io::ErrorKind::NotConnected);

        // Gegenstelle sieht EOF
        let mut buf = [0u8; 1];
        assert_eq!(client.read(&mut buf).await.unwrap(), 0);

        // Zweites Schliessen ist ein No-op
        sink.schliessen().await;
    }
}
