//! Fehlertypen fuer die Session-Koordination

use krtc_core::{FailureKind, RtcError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Keine freien Pull-Slots (Kapazitaet {kapazitaet})")]
    KapazitaetErschoepft { kapazitaet: usize },

    #[error("Medienfehler: {0}")]
    Medien(String),

    /// Kein Raum gesetzt, Kanal nicht ableitbar
    #[error("Kein Raum aktiv")]
    KeinRaum,
}

impl SessionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::KapazitaetErschoepft { .. } => FailureKind::Capacity,
            Self::Medien(_) | Self::KeinRaum => FailureKind::Media,
        }
    }
}

impl From<SessionError> for RtcError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::KapazitaetErschoepft { kapazitaet } => {
                RtcError::KapazitaetErschoepft { kapazitaet }
            }
            andere => RtcError::Medien(andere.to_string()),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
