//! krtc-client – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging, tritt dem Raum bei,
//! startet den Push und laeuft bis Ctrl-C.

use std::sync::Arc;

use anyhow::{bail, Result};
use krtc_client::{ClientConfig, LoggingMediaEngine, LoggingObserver, RtcEngine};
use krtc_observability::logging_initialisieren;

fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("KRTC_CONFIG").unwrap_or_else(|_| "krtc.toml".into());

    let config = ClientConfig::laden(&config_pfad)?;
    logging_initialisieren(&config.logging.level, &config.logging.format)?;
    config.validieren()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        server = %config.signaling.server,
        "krtc-client wird initialisiert"
    );

    let raum = config.raum.clone();
    if raum.id.is_empty() || raum.uid.is_empty() {
        bail!("[raum] id und uid muessen gesetzt sein");
    }

    let engine = RtcEngine::new(config, Arc::new(LoggingMediaEngine), Arc::new(LoggingObserver));
    if !engine.join_room(&raum.id, &raum.uid) {
        bail!("Beitritt zu Raum '{}' fehlgeschlagen", raum.id);
    }
    if !engine.start_push() {
        tracing::warn!("Push konnte nicht gestartet werden, nur Empfang");
    }

    // Signalverarbeitung braucht einen Reactor; die Engine selbst blockiert
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(tokio::signal::ctrl_c())?;

    tracing::info!(pulls = engine.pull_slots().len(), "Beende krtc-client");
    engine.leave_room();
    Ok(())
}
