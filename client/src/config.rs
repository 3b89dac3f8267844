//! Client-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! Standardwerte, sodass der Client ohne Konfigurationsdatei startet.

use std::time::Duration;

use anyhow::bail;
use krtc_core::DEFAULT_SIGNALING_PORT;
use krtc_observability::logging::{log_format_gueltig, log_level_gueltig};
use krtc_session::SessionConfig;
use krtc_signaling::SignalingConfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub signaling: SignalingEinstellungen,
    /// Raum fuer den Demo-Client
    pub raum: RaumEinstellungen,
    pub session: SessionEinstellungen,
    pub logging: LoggingEinstellungen,
}

/// Verbindung zum Signalisierungsserver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingEinstellungen {
    /// `host` oder `host:port`
    pub server: String,
    /// Port, falls `server` keinen angibt
    pub standard_port: u16,
    pub pfad: String,
    /// `true` = wss, `false` = ws
    pub tls: bool,
    pub verbindungs_timeout_ms: u64,
    pub bestaetigungs_timeout_ms: u64,
    pub sende_timeout_ms: u64,
    /// WebSocket-Ping-Intervall, 0 = aus
    pub keepalive_sek: u64,
}

impl Default for SignalingEinstellungen {
    fn default() -> Self {
        Self {
            server: "127.0.0.1".into(),
            standard_port: DEFAULT_SIGNALING_PORT,
            pfad: "/sig/v1/rtc".into(),
            tls: true,
            verbindungs_timeout_ms: 5000,
            bestaetigungs_timeout_ms: 5000,
            sende_timeout_ms: 3000,
            keepalive_sek: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RaumEinstellungen {
    pub id: String,
    pub uid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionEinstellungen {
    pub max_pull_slots: usize,
    pub media_port: u16,
}

impl Default for SessionEinstellungen {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            max_pull_slots: session.max_pull_slots,
            media_port: session.media_port,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ClientConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn validieren(&self) -> anyhow::Result<()> {
        if self.session.max_pull_slots == 0 {
            bail!("session.max_pull_slots muss mindestens 1 sein");
        }
        if self.signaling.standard_port == 0 {
            bail!("signaling.standard_port darf nicht 0 sein");
        }
        if !log_level_gueltig(&self.logging.level) {
            bail!("Ungueltiger Log-Filter '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!("Unbekanntes Log-Format '{}'", self.logging.format);
        }
        Ok(())
    }

    pub fn signaling_config(&self) -> SignalingConfig {
        let s = &self.signaling;
        SignalingConfig {
            default_port: s.standard_port,
            path: s.pfad.clone(),
            tls: s.tls,
            connect_timeout: Duration::from_millis(s.verbindungs_timeout_ms),
            ack_timeout: Duration::from_millis(s.bestaetigungs_timeout_ms),
            send_timeout: Duration::from_millis(s.sende_timeout_ms),
            keepalive: (s.keepalive_sek > 0).then(|| Duration::from_secs(s.keepalive_sek)),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_pull_slots: self.session.max_pull_slots,
            media_port: self.session.media_port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krtc_session::DEFAULT_MEDIA_PORT;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ClientConfig::default();
        assert!(cfg.validieren().is_ok());
        assert_eq!(cfg.signaling.standard_port, 1989);
        assert_eq!(cfg.session.max_pull_slots, 6);
        assert_eq!(cfg.session.media_port, DEFAULT_MEDIA_PORT);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [signaling]
            server = "rtc.example.org:2000"
            tls = false
            keepalive_sek = 0

            [raum]
            id = "55555"
            uid = "111"
        "#;
        let cfg: ClientConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.signaling.server, "rtc.example.org:2000");
        assert_eq!(cfg.raum.id, "55555");
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.signaling.pfad, "/sig/v1/rtc");
        assert_eq!(cfg.session.max_pull_slots, 6);

        let sig = cfg.signaling_config();
        assert!(!sig.tls);
        assert_eq!(sig.keepalive, None);
        assert_eq!(sig.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn keepalive_wird_uebernommen() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.signaling_config().keepalive, Some(Duration::from_secs(10)));
        assert_eq!(cfg.signaling_config().send_timeout, Duration::from_secs(3));
    }

    #[test]
    fn ungueltige_werte_werden_abgelehnt() {
        let mut cfg = ClientConfig::default();
        cfg.session.max_pull_slots = 0;
        assert!(cfg.validieren().is_err());

        let mut cfg = ClientConfig::default();
        cfg.logging.format = "xml".into();
        assert!(cfg.validieren().is_err());

        let mut cfg = ClientConfig::default();
        cfg.logging.level = "krtc_signaling=laut".into();
        assert!(cfg.validieren().is_err());
    }

    #[test]
    fn filter_direktiven_sind_gueltige_log_level() {
        let mut cfg = ClientConfig::default();
        cfg.logging.level = "krtc_signaling=debug,info".into();
        assert!(cfg.validieren().is_ok());
    }

    #[test]
    fn fehlende_datei_liefert_standardwerte() {
        let cfg = ClientConfig::laden("/nicht/vorhanden/krtc.toml").unwrap();
        assert_eq!(cfg.signaling.server, "127.0.0.1");
    }

    #[test]
    fn kaputte_datei_ist_fehler() {
        let pfad = std::env::temp_dir().join(format!("krtc-config-{}.toml", std::process::id()));
        std::fs::write(&pfad, "[signaling\nserver = ").unwrap();
        let ergebnis = ClientConfig::laden(pfad.to_str().unwrap());
        std::fs::remove_file(&pfad).ok();
        assert!(ergebnis.is_err());
    }
}
