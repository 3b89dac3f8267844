//! EngineObserver fuer den Demo-Client

use krtc_core::{Channel, EngineObserver, RoomId, RtcError, Uid};

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl EngineObserver for LoggingObserver {
    fn on_error(&self, error: &RtcError) {
        tracing::error!(grund = error.reason(), fehler = %error, "Engine-Fehler");
    }

    fn on_room_joined(&self, room: &RoomId, uid: &Uid) {
        tracing::info!(room = %room, uid = %uid, "Raum beigetreten");
    }

    fn on_room_left(&self, room: &RoomId) {
        tracing::info!(room = %room, "Raum verlassen");
    }

    fn on_push_started(&self, channel: &Channel) {
        tracing::info!(channel = %channel, "Push laeuft");
    }
}
