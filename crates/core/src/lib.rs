//! krtc-core – Gemeinsame Typen, Beobachter-Traits und Fehlertypen
//!
//! Dieses Crate stellt die Bausteine bereit, die von Signalisierung,
//! Session-Koordination und Client gemeinsam genutzt werden.

pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{FailureKind, RtcError, RtcResult};
pub use event::{EngineObserver, NoopObserver, ParticipantMap, ParticipantObserver};
pub use types::{Channel, RoomId, ServerAddress, Uid, DEFAULT_SIGNALING_PORT};
