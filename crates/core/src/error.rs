//! Fehlertypen fuer krtc
//!
//! `RtcError` ist die Fehlerform, die Beobachter zu sehen bekommen. Jeder
//! Fehler traegt ueber [`FailureKind`] einen stabilen Grund-String, der
//! Verbindungs-, Handshake- und Sendefehler unterscheidet. Die Crates
//! definieren eigene Fehler und konvertieren via `From`.

use thiserror::Error;

/// Globaler Result-Alias fuer krtc
pub type RtcResult<T> = std::result::Result<T, RtcError>;

/// Maschinenlesbare Fehlerkategorie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Connect,
    Handshake,
    Send,
    Malformed,
    Capacity,
    Media,
    InvalidArgument,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Handshake => "handshake",
            Self::Send => "send",
            Self::Malformed => "malformed",
            Self::Capacity => "capacity",
            Self::Media => "media",
            Self::InvalidArgument => "invalid_argument",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alle Fehler, die an Beobachter gemeldet werden koennen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RtcError {
    // --- Signalisierung ---
    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    #[error("Raumbeitritt nicht bestaetigt: {0}")]
    Handshake(String),

    #[error("Senden fehlgeschlagen: {0}")]
    Senden(String),

    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    // --- Session ---
    #[error("Keine freien Pull-Slots (Kapazitaet {kapazitaet})")]
    KapazitaetErschoepft { kapazitaet: usize },

    #[error("Medienfehler: {0}")]
    Medien(String),

    // --- Aufruf ---
    #[error("Ungueltiges Argument: {0}")]
    UngueltigesArgument(String),
}

impl RtcError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Verbindung(_) => FailureKind::Connect,
            Self::Handshake(_) => FailureKind::Handshake,
            Self::Senden(_) => FailureKind::Send,
            Self::UngueltigeNachricht(_) => FailureKind::Malformed,
            Self::KapazitaetErschoepft { .. } => FailureKind::Capacity,
            Self::Medien(_) => FailureKind::Media,
            Self::UngueltigesArgument(_) => FailureKind::InvalidArgument,
        }
    }

    /// Stabiler Grund-String, z.B. `"handshake"`
    pub fn reason(&self) -> &'static str {
        self.kind().as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gruende_unterscheiden_verbindung_handshake_senden() {
        let verbindung = RtcError::Verbindung("refused".into());
        let handshake = RtcError::Handshake("keine Antwort".into());
        let senden = RtcError::Senden("Kanal zu".into());
        assert_eq!(verbindung.reason(), "connect");
        assert_eq!(handshake.reason(), "handshake");
        assert_eq!(senden.reason(), "send");
    }

    #[test]
    fn fehler_display() {
        let e = RtcError::KapazitaetErschoepft { kapazitaet: 6 };
        assert_eq!(e.to_string(), "Keine freien Pull-Slots (Kapazitaet 6)");
        assert_eq!(e.reason(), "capacity");
    }
}
