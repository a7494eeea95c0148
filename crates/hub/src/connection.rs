//! Ingest-Worker – Liest eine einzelne Verbindung
//!
//! Jede akzeptierte Verbindung bekommt einen `IngestWorker` in einem eigenen
//! tokio-Task. Der Worker besitzt die Leseseite exklusiv und meldet jeden
//! Lesevorgang als `Nachricht` an die Engine. Es gibt kein Framing: ein
//! `read` ergibt genau eine Nachricht, egal wie viele Zeilen sie enthaelt.
//!
//! ## Lebenszyklus
//! ```text
//! read n > 0  -> Nachricht
//! read n == 0 -> EOF          -+
//! read Fehler                  +-> schliessen, Getrennt, Ende
//! Schliess-Signal / Shutdown  -+
//! ```

use bytes::Bytes;
use relay_core::AdressAnzeige;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

use crate::event::{EventSender, RelayEvent};
use crate::sink::Verbindung;

/// Liest eine Verbindung und speist die Engine
pub struct IngestWorker<R> {
    verbindung: Verbindung,
    leser: R,
    events: EventSender,
    buffer_groesse: usize,
    adressen_schwaerzen: bool,
}

impl<R> IngestWorker<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Erstellt einen neuen Worker
    pub fn neu(
        verbindung: Verbindung,
        leser: R,
        events: EventSender,
        buffer_groesse: usize,
        adressen_schwaerzen: bool,
    ) -> Self {
        Self {
            verbindung,
            leser,
            events,
            buffer_groesse,
            adressen_schwaerzen,
        }
    }

    /// Startet die Leseschleife
    ///
    /// Endet bei EOF, Lesefehler, Schliess-Signal der Senke oder Shutdown.
    /// In jedem Fall wird die Verbindung geschlossen und `Getrennt` gemeldet.
    pub async fn laufen(
        mut self,
        mut geschlossen_rx: watch::Receiver<bool>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let id = self.verbindung.id;
        let peer = AdressAnzeige::neu(
            self.verbindung.sink.peer_adresse(),
            self.adressen_schwaerzen,
        );
        let mut buffer = vec![0u8; self.buffer_groesse];

        loop {
            tokio::select! {
                ergebnis = self.leser.read(&mut buffer) => {
                    match ergebnis {
                        Ok(0) => {
                            tracing::info!(id = %id, peer = %peer, "Verbindung vom Client getrennt");
                            break;
                        }
                        Ok(n) => {
                            let event = RelayEvent::Nachricht {
                                verbindung: self.verbindung.clone(),
                                text: Bytes::copy_from_slice(&buffer[..n]),
                            };
                            if self.events.send(event).is_err() {
                                tracing::debug!(id = %id, "Engine beendet – Worker stoppt");
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::info!(id = %id, peer = %peer, fehler = %e, "Lesen vom Client fehlgeschlagen");
                            break;
                        }
                    }
                }

                Ok(()) = geschlossen_rx.changed() => {
                    if *geschlossen_rx.borrow() {
                        tracing::debug!(id = %id, "Verbindung von der Engine geschlossen");
                        break;
                    }
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!(id = %id, "Shutdown-Signal – Worker stoppt");
                        break;
                    }
                }
            }
        }

        self.verbindung.sink.schliessen().await;
        let _ = self.events.send(RelayEvent::Getrennt {
            verbindung: self.verbindung,
        });
    }
}
