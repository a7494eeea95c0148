//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `RelayServer` bindet einen TCP-Socket, vergibt fuer jede eingehende
//! Verbindung eine `VerbindungsId`, meldet sie der Engine und startet danach
//! einen eigenen `IngestWorker`-Task.

use relay_core::{AdressAnzeige, IdVergabe};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::config::RelayConfig;
use crate::connection::IngestWorker;
use crate::error::{HubError, HubResult};
use crate::event::{EventSender, RelayEvent};
use crate::sink::{TcpSink, Verbindung};

/// Pause nach einem fehlgeschlagenen Accept
const ACCEPT_PAUSE: Duration = Duration::from_millis(10);

/// TCP-Relay-Server (Connection Acceptor)
pub struct RelayServer {
    listener: TcpListener,
    config: Arc<RelayConfig>,
    events: EventSender,
    ids: IdVergabe,
}

impl RelayServer {
    /// Bindet den Listener
    ///
    /// Ein Fehler hier ist fatal, die Accept-Loop startet nicht.
    pub async fn binden(
        adresse: &str,
        config: Arc<RelayConfig>,
        events: EventSender,
    ) -> HubResult<Self> {
        let listener = TcpListener::bind(adresse)
            .await
            .map_err(|quelle| HubError::Bind {
                adresse: adresse.to_string(),
                quelle,
            })?;

        Ok(Self {
            listener,
            config,
            events,
            ids: IdVergabe::neu(),
        })
    }

    /// Tatsaechlich gebundene Adresse (relevant bei Port 0)
    pub fn lokale_adresse(&self) -> HubResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept-Loop
    ///
    /// Laeuft bis `shutdown_rx` ein `true`-Signal empfaengt oder die Engine
    /// nicht mehr erreichbar ist.
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) -> HubResult<()> {
        tracing::info!(
            adresse = %self.lokale_adresse()?,
            "TCP Relay-Server lauscht"
        );

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            self.annehmen(stream, peer_addr, &shutdown_rx)?;
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(ACCEPT_PAUSE).await;
                        }
                    }
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Relay-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!("TCP Relay-Server gestoppt");
        Ok(())
    }

    /// Meldet die Verbindung der Engine und startet ihren Worker
    fn annehmen(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
        shutdown_rx: &watch::Receiver<bool>,
    ) -> HubResult<()> {
        let id = self.ids.naechste();
        tracing::info!(
            id = %id,
            peer = %AdressAnzeige::neu(peer_addr, self.config.adressen_schwaerzen),
            "Verbindung akzeptiert"
        );

        let (leser, schreiber) = stream.into_split();
        let (sink, geschlossen_rx) = TcpSink::neu(schreiber, peer_addr);
        let verbindung = Verbindung::neu(id, sink);

        self.events
            .send(RelayEvent::Verbunden {
                verbindung: verbindung.clone(),
            })
            .map_err(|_| HubError::EngineBeendet)?;

        let worker = IngestWorker::neu(
            verbindung,
            leser,
            self.events.clone(),
            self.config.buffer_groesse,
            self.config.adressen_schwaerzen,
        );
        tokio::spawn(worker.laufen(geschlossen_rx, shutdown_rx.clone()));
        Ok(())
    }
}
