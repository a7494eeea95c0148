//! Prometheus-kompatible Metriken fuer den Relay
//!
//! Registrierte Metriken:
//! - `relay_connected_clients` – Gauge: Aktuell verbundene Clients
//! - `relay_messages_broadcast_total` – Counter: Verteilte Nachrichten
//! - `relay_messages_dropped_total` – Counter: Verworfene Nachrichten (Rate-Limit, unbekannter Sender)
//! - `relay_strikes_total` – Counter: Vergebene Strikes
//! - `relay_bans_total` – Counter: Ausgesprochene Bans
//! - `relay_ban_rejections_total` – Counter: Abgewiesene Verbindungen gebannter Herkuenfte
//! - `relay_write_errors_total` – Counter: Fehlgeschlagene Schreibvorgaenge beim Fan-out

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Alle Relay-Prometheus-Metriken
///
/// Clone teilt Registry und Zaehler.
#[derive(Clone)]
pub struct RelayMetrics {
    pub registry: Arc<Registry>,

    pub connected_clients: IntGauge,
    pub messages_broadcast_total: IntCounter,
    pub messages_dropped_total: IntCounter,
    pub strikes_total: IntCounter,
    pub bans_total: IntCounter,
    pub ban_rejections_total: IntCounter,
    pub write_errors_total: IntCounter,
}

fn zaehler(registry: &Registry, name: &str, hilfe: &str) -> Result<IntCounter> {
    let counter = IntCounter::with_opts(Opts::new(name, hilfe))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl RelayMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let connected_clients = IntGauge::with_opts(Opts::new(
            "relay_connected_clients",
            "Anzahl aktuell verbundener Clients",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let messages_broadcast_total = zaehler(
            &registry,
            "relay_messages_broadcast_total",
            "Gesamtanzahl verteilter Nachrichten",
        )?;
        let messages_dropped_total = zaehler(
            &registry,
            "relay_messages_dropped_total",
            "Gesamtanzahl verworfener Nachrichten",
        )?;
        let strikes_total = zaehler(
            &registry,
            "relay_strikes_total",
            "Gesamtanzahl vergebener Strikes",
        )?;
        let bans_total = zaehler(&registry, "relay_bans_total", "Gesamtanzahl Bans")?;
        let ban_rejections_total = zaehler(
            &registry,
            "relay_ban_rejections_total",
            "Abgewiesene Verbindungen gebannter Herkuenfte",
        )?;
        let write_errors_total = zaehler(
            &registry,
            "relay_write_errors_total",
            "Fehlgeschlagene Schreibvorgaenge beim Fan-out",
        )?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            messages_broadcast_total,
            messages_dropped_total,
            strikes_total,
            bans_total,
            ban_rejections_total,
            write_errors_total,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: RelayMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<RelayMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
