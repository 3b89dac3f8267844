//! Zustaende von Verbindung und Raum-Handshake
//!
//! ## ConnectionState (geschrieben nur vom TransportChannel)
//! ```text
//! Idle -> Connecting -> Connected -> Closed
//!             |              |
//!             +--> Failed <--+
//! ```
//! `Closed` und `Failed` sind endgueltig.
//!
//! ## HandshakePhase (gehoert dem SignalingClient)
//! ```text
//! NotStarted -> AwaitingConnect -> AwaitingJoinAck -> Joined -> Left
//! ```
//! Ein neuer `join_room`-Aufruf setzt jede Phase auf `NotStarted` zurueck.

use krtc_core::{RoomId, Uid};

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Zustand der Transportverbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Closed,
    Failed,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    /// Wechselt nach `next`, sofern der aktuelle Zustand nicht endgueltig ist
    ///
    /// Gibt `true` zurueck wenn der Zustand geaendert wurde.
    pub fn advance(&mut self, next: ConnectionState) -> bool {
        if self.is_terminal() || *self == next {
            return false;
        }
        *self = next;
        true
    }
}

// ---------------------------------------------------------------------------
// HandshakePhase
// ---------------------------------------------------------------------------

/// Fortschritt des Raumbeitritts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakePhase {
    #[default]
    NotStarted,
    AwaitingConnect,
    AwaitingJoinAck,
    Joined,
    Left,
}

// ---------------------------------------------------------------------------
// RoomSession
// ---------------------------------------------------------------------------

/// Raum-Mitgliedschaft des Clients, hoechstens eine pro Client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSession {
    pub room_id: RoomId,
    pub local_uid: Uid,
    pub joined: bool,
}

impl RoomSession {
    pub fn neu(room_id: RoomId, local_uid: Uid) -> Self {
        Self {
            room_id,
            local_uid,
            joined: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endzustaende_bleiben_bestehen() {
        let mut zustand = ConnectionState::Idle;
        assert!(zustand.advance(ConnectionState::Connecting));
        assert!(zustand.advance(ConnectionState::Connected));
        assert!(zustand.advance(ConnectionState::Closed));
        assert!(!zustand.advance(ConnectionState::Connected));
        assert_eq!(zustand, ConnectionState::Closed);

        let mut zustand = ConnectionState::Connecting;
        assert!(zustand.advance(ConnectionState::Failed));
        assert!(!zustand.advance(ConnectionState::Closed));
        assert_eq!(zustand, ConnectionState::Failed);
    }

    #[test]
    fn gleicher_zustand_ist_keine_aenderung() {
        let mut zustand = ConnectionState::Connected;
        assert!(!zustand.advance(ConnectionState::Connected));
    }

    #[test]
    fn neue_session_ist_nicht_beigetreten() {
        let session = RoomSession::neu(RoomId::new("55555"), Uid::new("111"));
        assert!(!session.joined);
    }
}
