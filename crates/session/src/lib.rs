//! krtc-session – Koordination der Medien-Sessions
//!
//! Ordnet publizierende Teilnehmer begrenzten Pull-Slots zu und verwaltet
//! die eine ausgehende Push-Session. Die eigentliche Medienverarbeitung
//! liegt hinter dem [`MediaEngine`]-Trait.
//!
//! ```text
//! ParticipantObserver (Dispatch-Pfad)
//!     |
//!     v
//! SharedCoordinator -> SessionCoordinator
//!                         |-- SlotPool (max. 6 PullSlots)
//!                         |-- PushSession
//!                         v
//!                    MediaEngine -> MediaHandler
//! ```

pub mod coordinator;
pub mod error;
pub mod media;
pub mod slots;

pub use coordinator::{
    RoomContext, SessionConfig, SessionCoordinator, SharedCoordinator, DEFAULT_MAX_PULL_SLOTS,
};
pub use error::{SessionError, SessionResult};
pub use media::{
    MediaDirection, MediaEndpoints, MediaEngine, MediaHandler, RenderTarget, DEFAULT_MEDIA_PORT,
};
pub use slots::{PullSlotInfo, SlotPool};
