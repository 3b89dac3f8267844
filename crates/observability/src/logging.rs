//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable, die Vorrang vor der
//! Konfigurationsdatei hat:
//! - `KRTC_LOG_LEVEL`: Filter-Direktive (z.B. `info` oder
//!   `krtc_signaling=debug,info`), Standard: info
//! - `KRTC_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Thread-Namen werden mit ausgegeben, damit Zeilen des I/O-Threads
//! (`krtc-ws-io`) erkennbar sind.

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "KRTC_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "KRTC_LOG_FORMAT";

#[derive(Debug, Error)]
pub enum LoggingFehler {
    #[error("Unbekanntes Log-Format: {0}")]
    UngueltigesFormat(String),

    #[error("Ungueltiger Log-Filter '{filter}': {grund}")]
    UngueltigerFilter { filter: String, grund: String },

    #[error("Logging bereits initialisiert")]
    BereitsInitialisiert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            andere => Err(LoggingFehler::UngueltigesFormat(andere.to_string())),
        }
    }
}

/// Aufgeloeste Logging-Einstellungen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingEinstellungen {
    pub filter: String,
    pub format: LogFormat,
}

impl LoggingEinstellungen {
    /// Kombiniert Konfigurationswerte mit Umgebungs-Overrides. `env` liefert
    /// den Wert einer Variable oder `None`.
    pub fn aufloesen<E>(level: &str, format: &str, env: E) -> Result<Self, LoggingFehler>
    where
        E: Fn(&str) -> Option<String>,
    {
        let filter = env(ENV_LOG_LEVEL)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| level.to_string());
        let format = env(ENV_LOG_FORMAT)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format.to_string());

        Ok(Self {
            filter,
            format: format.parse()?,
        })
    }

    pub fn aus_umgebung(level: &str, format: &str) -> Result<Self, LoggingFehler> {
        Self::aufloesen(level, format, |name| std::env::var(name).ok())
    }
}

/// Initialisiert das Logging-System.
///
/// Liest `KRTC_LOG_LEVEL` und `KRTC_LOG_FORMAT` aus der Umgebung und faellt
/// auf die uebergebenen Werte zurueck.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<(), LoggingFehler> {
    let einstellungen = LoggingEinstellungen::aus_umgebung(level, format)?;
    let filter = EnvFilter::try_new(&einstellungen.filter).map_err(|e| {
        LoggingFehler::UngueltigerFilter {
            filter: einstellungen.filter.clone(),
            grund: e.to_string(),
        }
    })?;

    let ergebnis = match einstellungen.format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .try_init(),
    };
    ergebnis.map_err(|_| LoggingFehler::BereitsInitialisiert)
}

/// Validiert ob ein Log-Level bzw. eine Filter-Direktive gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    !level.trim().is_empty() && EnvFilter::try_new(level).is_ok()
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    format.parse::<LogFormat>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ohne_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn log_level_gueltige_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level));
        }
    }

    #[test]
    fn log_level_mit_direktiven() {
        assert!(log_level_gueltig("krtc_signaling=debug,info"));
        assert!(log_level_gueltig("krtc_session=trace"));
    }

    #[test]
    fn log_level_ungueltige_werte() {
        assert!(!log_level_gueltig("krtc_signaling=laut"));
        assert!(!log_level_gueltig(""));
        assert!(!log_level_gueltig("  "));
    }

    #[test]
    fn log_format_werte() {
        assert!(log_format_gueltig("text"));
        assert!(log_format_gueltig("json"));
        assert!(!log_format_gueltig("xml"));
        assert!(!log_format_gueltig("JSON"));
    }

    #[test]
    fn konfiguration_ohne_umgebung() {
        let e = LoggingEinstellungen::aufloesen("debug", "json", ohne_env).unwrap();
        assert_eq!(e.filter, "debug");
        assert_eq!(e.format, LogFormat::Json);
    }

    #[test]
    fn umgebung_hat_vorrang() {
        let env = |name: &str| match name {
            ENV_LOG_LEVEL => Some("krtc_signaling=trace,warn".to_string()),
            ENV_LOG_FORMAT => Some("text".to_string()),
            _ => None,
        };
        let e = LoggingEinstellungen::aufloesen("info", "json", env).unwrap();
        assert_eq!(e.filter, "krtc_signaling=trace,warn");
        assert_eq!(e.format, LogFormat::Text);
    }

    #[test]
    fn leere_umgebungswerte_werden_ignoriert() {
        let env = |_: &str| Some(String::new());
        let e = LoggingEinstellungen::aufloesen("warn", "text", env).unwrap();
        assert_eq!(e.filter, "warn");
    }

    #[test]
    fn unbekanntes_format_ist_fehler() {
        let e = LoggingEinstellungen::aufloesen("info", "xml", ohne_env);
        assert!(matches!(e, Err(LoggingFehler::UngueltigesFormat(f)) if f == "xml"));
    }
}
