//! Koordinations-Engine – Einziger Besitzer des Relay-Zustands
//!
//! Die Engine konsumiert seriell alle Ereignisse aus dem Event-Kanal und ist
//! der einzige Task, der Client- und Ban-Tabelle liest oder veraendert.
//! Dadurch sind keine Locks noetig.
//!
//! ## Uebergaenge
//! ```text
//! Verbunden  -> Ban pruefen (abgelaufen: entfernen) -> Limit pruefen -> Client anlegen
//! Getrennt   -> Client entfernen (idempotent)
//! Nachricht  -> unbekannt: schliessen + verwerfen
//!               Intervall eingehalten: an alle anderen verteilen
//!               sonst: Strike, bei strike_limit Ban + Trennung
//! ```
//!
//! Das Fan-out schreibt synchron nacheinander. Ein langsamer Empfaenger
//! verzoegert damit alle folgenden Ereignisse. Schreibfehler werden nur
//! geloggt, der Empfaenger bleibt in der Tabelle bis sein eigener Worker
//! die Trennung meldet.

use bytes::Bytes;
use relay_core::{AdressAnzeige, VerbindungsId};
use relay_observability::RelayMetrics;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::RelayConfig;
use crate::event::{EventEmpfaenger, RelayEvent};
use crate::sink::Verbindung;

/// Hinweis an Verbindungen einer gebannten Herkunft
pub const BAN_NACHRICHT: &str = "You are banned!";

/// Hinweis an Verbindungen, wenn `max_clients` erreicht ist
pub const VOLL_NACHRICHT: &str = "Server is full!";

// ---------------------------------------------------------------------------
// ClientRecord
// ---------------------------------------------------------------------------

/// Zustand eines verbundenen Clients
#[derive(Debug)]
pub struct ClientRecord {
    pub verbindung: Verbindung,
    /// Zeitpunkt der letzten akzeptierten Nachricht (oder des Verbindens)
    pub letzte_nachricht: Instant,
    /// Rate-Limit-Verstoesse, sinkt nie
    pub strikes: u32,
}

/// Ergebnis eines verarbeiteten Ereignisses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Uebergang {
    /// Client-Eintrag angelegt
    Aufgenommen,
    /// Herkunft ist gebannt, Verbindung abgewiesen
    AbgewiesenGebannt,
    /// Server voll, Verbindung abgewiesen
    AbgewiesenVoll,
    /// Client-Eintrag entfernt
    Entfernt,
    /// Trennung fuer unbekannte Verbindung (No-op)
    NichtVorhanden,
    /// Nachricht verteilt
    Verteilt { zugestellt: usize, fehlgeschlagen: usize },
    /// Nachricht verworfen, Strike vergeben
    Strike { strikes: u32 },
    /// Strike-Limit erreicht, Herkunft gebannt
    Gebannt { getrennt: usize },
    /// Nachricht einer nicht (mehr) registrierten Verbindung
    UnbekannterSender,
}

// ---------------------------------------------------------------------------
// RelayEngine
// ---------------------------------------------------------------------------

/// Serielle Koordinations-Engine
pub struct RelayEngine {
    config: Arc<RelayConfig>,
    clients: HashMap<VerbindungsId, ClientRecord>,
    bans: HashMap<IpAddr, Instant>,
    metriken: RelayMetrics,
}

impl RelayEngine {
    /// Erstellt eine Engine mit leeren Tabellen
    pub fn neu(config: Arc<RelayConfig>, metriken: RelayMetrics) -> Self {
        Self {
            config,
            clients: HashMap::new(),
            bans: HashMap::new(),
            metriken,
        }
    }

    /// Konsumiert Ereignisse bis alle Produzenten den Kanal geschlossen haben
    pub async fn laufen(mut self, mut events: EventEmpfaenger) {
        tracing::info!("Koordinations-Engine gestartet");

        while let Some(event) = events.recv().await {
            self.verarbeiten(event, Instant::now()).await;
        }

        tracing::info!(
            clients = self.clients.len(),
            bans = self.bans.len(),
            "Koordinations-Engine beendet"
        );
    }

    /// Verarbeitet ein einzelnes Ereignis vollstaendig zum Zeitpunkt `jetzt`
    pub async fn verarbeiten(&mut self, event: RelayEvent, jetzt: Instant) -> Uebergang {
        let uebergang = match event {
            RelayEvent::Verbunden { verbindung } => self.verbunden(verbindung, jetzt).await,
            RelayEvent::Getrennt { verbindung } => self.getrennt(&verbindung),
            RelayEvent::Nachricht { verbindung, text } => {
                self.nachricht(verbindung, text, jetzt).await
            }
        };
        self.metriken.connected_clients.set(self.clients.len() as i64);
        uebergang
    }

    fn anzeige(&self, verbindung: &Verbindung) -> AdressAnzeige {
        AdressAnzeige::neu(
            verbindung.sink.peer_adresse(),
            self.config.adressen_schwaerzen,
        )
    }

    async fn verbunden(&mut self, verbindung: Verbindung, jetzt: Instant) -> Uebergang {
        let herkunft = verbindung.sink.herkunft();

        if let Some(&gebannt_am) = self.bans.get(&herkunft) {
            if jetzt.saturating_duration_since(gebannt_am) < self.config.ban_dauer {
                tracing::info!(
                    id = %verbindung.id,
                    peer = %self.anzeige(&verbindung),
                    "Gebannter Client abgewiesen"
                );
                self.metriken.ban_rejections_total.inc();
                self.abweisen(&verbindung, BAN_NACHRICHT).await;
                return Uebergang::AbgewiesenGebannt;
            }
            self.bans.remove(&herkunft);
            tracing::debug!(peer = %self.anzeige(&verbindung), "Abgelaufener Ban entfernt");
        }

        if self.config.max_clients > 0 && self.clients.len() >= self.config.max_clients {
            tracing::warn!(
                id = %verbindung.id,
                peer = %self.anzeige(&verbindung),
                max = self.config.max_clients,
                "Server voll – Verbindung abgewiesen"
            );
            self.abweisen(&verbindung, VOLL_NACHRICHT).await;
            return Uebergang::AbgewiesenVoll;
        }

        tracing::info!(
            id = %verbindung.id,
            peer = %self.anzeige(&verbindung),
            "Client verbunden"
        );
        self.clients.insert(
            verbindung.id,
            ClientRecord {
                verbindung,
                letzte_nachricht: jetzt,
                strikes: 0,
            },
        );
        Uebergang::Aufgenommen
    }

    async fn abweisen(&self, verbindung: &Verbindung, hinweis: &str) {
        if let Err(e) = verbindung.sink.schreiben(hinweis.as_bytes()).await {
            tracing::debug!(
                id = %verbindung.id,
                fehler = %e,
                "Hinweis konnte nicht gesendet werden"
            );
        }
        verbindung.sink.schliessen().await;
    }

    fn getrennt(&mut self, verbindung: &Verbindung) -> Uebergang {
        match self.clients.remove(&verbindung.id) {
            Some(_) => {
                tracing::info!(
                    id = %verbindung.id,
                    peer = %self.anzeige(verbindung),
                    "Client aus Verbindungsliste entfernt"
                );
                Uebergang::Entfernt
            }
            None => Uebergang::NichtVorhanden,
        }
    }

    async fn nachricht(
        &mut self,
        verbindung: Verbindung,
        text: Bytes,
        jetzt: Instant,
    ) -> Uebergang {
        let min_intervall = self.config.min_nachrichten_intervall;
        let strike_limit = self.config.strike_limit;

        let Some(record) = self.clients.get_mut(&verbindung.id) else {
            tracing::debug!(id = %verbindung.id, "Nachricht von unbekanntem Sender verworfen");
            self.metriken.messages_dropped_total.inc();
            verbindung.sink.schliessen().await;
            return Uebergang::UnbekannterSender;
        };

        if jetzt.saturating_duration_since(record.letzte_nachricht) >= min_intervall {
            record.letzte_nachricht = jetzt;
            return self.verteilen(&verbindung, &text).await;
        }

        record.strikes += 1;
        let strikes = record.strikes;
        self.metriken.strikes_total.inc();
        self.metriken.messages_dropped_total.inc();
        tracing::debug!(
            id = %verbindung.id,
            peer = %self.anzeige(&verbindung),
            strikes,
            "Rate-Limit verletzt"
        );

        if strikes >= strike_limit {
            return self.bannen(&verbindung, jetzt).await;
        }
        Uebergang::Strike { strikes }
    }

    /// Schreibt `text` an alle Clients ausser dem Absender
    async fn verteilen(&self, absender: &Verbindung, text: &Bytes) -> Uebergang {
        tracing::debug!(
            id = %absender.id,
            peer = %self.anzeige(absender),
            bytes = text.len(),
            text = %String::from_utf8_lossy(text),
            "Nachricht wird verteilt"
        );

        let mut zugestellt = 0;
        let mut fehlgeschlagen = 0;
        for (id, client) in &self.clients {
            if *id == absender.id {
                continue;
            }
            match client.verbindung.sink.schreiben(text).await {
                Ok(()) => zugestellt += 1,
                Err(e) => {
                    fehlgeschlagen += 1;
                    self.metriken.write_errors_total.inc();
                    tracing::warn!(
                        id = %id,
                        peer = %self.anzeige(&client.verbindung),
                        fehler = %e,
                        "Senden an Client fehlgeschlagen"
                    );
                }
            }
        }

        self.metriken.messages_broadcast_total.inc();
        Uebergang::Verteilt {
            zugestellt,
            fehlgeschlagen,
        }
    }

    /// Bannt die Herkunft des Absenders und trennt alle ihre Verbindungen
    async fn bannen(&mut self, verbindung: &Verbindung, jetzt: Instant) -> Uebergang {
        let herkunft = verbindung.sink.herkunft();
        self.bans.insert(herkunft, jetzt);
        self.metriken.bans_total.inc();

        let betroffen: Vec<VerbindungsId> = self
            .clients
            .iter()
            .filter(|(_, c)| c.verbindung.sink.herkunft() == herkunft)
            .map(|(id, _)| *id)
            .collect();

        for id in &betroffen {
            if let Some(client) = self.clients.remove(id) {
                client.verbindung.sink.schliessen().await;
            }
        }

        tracing::warn!(
            id = %verbindung.id,
            peer = %self.anzeige(verbindung),
            getrennt = betroffen.len(),
            dauer_sek = self.config.ban_dauer.as_secs(),
            "Client gebannt"
        );
        Uebergang::Gebannt {
            getrennt: betroffen.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    /// Anzahl verbundener Clients
    pub fn client_anzahl(&self) -> usize {
        self.clients.len()
    }

    /// Prueft ob fuer die Verbindung ein Client-Eintrag existiert
    pub fn ist_verbunden(&self, id: &VerbindungsId) -> bool {
        self.clients.contains_key(id)
    }

    /// Strikes eines verbundenen Clients
    pub fn strikes(&self, id: &VerbindungsId) -> Option<u32> {
        self.clients.get(id).map(|c| c.strikes)
    }

    /// Prueft ob die Herkunft zum Zeitpunkt `jetzt` gebannt ist
    pub fn ist_gebannt(&self, herkunft: &IpAddr, jetzt: Instant) -> bool {
        self.bans
            .get(herkunft)
            .is_some_and(|&am| jetzt.saturating_duration_since(am) < self.config.ban_dauer)
    }

    /// Anzahl gespeicherter Ban-Eintraege (inklusive abgelaufener)
    pub fn ban_anzahl(&self) -> usize {
        self.bans.len()
    }
}
