//! Fehlertypen fuer den Signalisierungsclient

use krtc_core::{FailureKind, RtcError};
use thiserror::Error;

/// Stelle, an der ein blockierender Aufruf wartet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wartepunkt {
    Verbindung,
    JoinBestaetigung,
    Sendebestaetigung,
}

impl Wartepunkt {
    fn kind(self) -> FailureKind {
        match self {
            Self::Verbindung => FailureKind::Connect,
            Self::JoinBestaetigung => FailureKind::Handshake,
            Self::Sendebestaetigung => FailureKind::Send,
        }
    }
}

impl std::fmt::Display for Wartepunkt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Verbindung => "Verbindungsaufbau",
            Self::JoinBestaetigung => "Join-Bestaetigung",
            Self::Sendebestaetigung => "Sendebestaetigung",
        };
        f.write_str(text)
    }
}

/// Fehlertyp fuer den Signalisierungsclient
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalingError {
    /// Leere Kennung oder ungueltige Serveradresse
    #[error("Ungueltiges Argument: {0}")]
    UngueltigesArgument(String),

    /// Verbindung kam nicht zustande
    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    /// Verbunden, aber Beitritt nicht bestaetigt
    #[error("Raumbeitritt fehlgeschlagen: {0}")]
    Handshake(String),

    /// Senden waehrend der Sitzung fehlgeschlagen
    #[error("Senden fehlgeschlagen: {0}")]
    Senden(String),

    #[error("Zeitlimit ueberschritten beim Warten auf {0}")]
    Zeitlimit(Wartepunkt),

    #[error("Warten auf {0} abgebrochen")]
    Abgebrochen(Wartepunkt),

    #[error("Nicht in einem Raum")]
    NichtBeigetreten,
}

impl SignalingError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UngueltigesArgument(_) => FailureKind::InvalidArgument,
            Self::Verbindung(_) => FailureKind::Connect,
            Self::Handshake(_) => FailureKind::Handshake,
            Self::Senden(_) | Self::NichtBeigetreten => FailureKind::Send,
            Self::Zeitlimit(punkt) | Self::Abgebrochen(punkt) => punkt.kind(),
        }
    }
}

impl From<RtcError> for SignalingError {
    fn from(e: RtcError) -> Self {
        match e {
            RtcError::Verbindung(m) => Self::Verbindung(m),
            RtcError::Handshake(m) => Self::Handshake(m),
            RtcError::Senden(m) => Self::Senden(m),
            andere => Self::UngueltigesArgument(andere.to_string()),
        }
    }
}

impl From<SignalingError> for RtcError {
    fn from(e: SignalingError) -> Self {
        let text = e.to_string();
        match e.kind() {
            FailureKind::Connect => RtcError::Verbindung(text),
            FailureKind::Handshake => RtcError::Handshake(text),
            FailureKind::InvalidArgument => RtcError::UngueltigesArgument(text),
            _ => RtcError::Senden(text),
        }
    }
}

/// Result-Typ fuer den Signalisierungsclient
pub type SignalingResult<T> = Result<T, SignalingError>;
