//! Aufzeichnender Beobachter fuer Engine- und Teilnehmerereignisse

use std::time::{Duration, Instant};

use krtc_core::{Channel, EngineObserver, ParticipantMap, ParticipantObserver, RoomId, RtcError, Uid};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    Error { reason: String, message: String },
    RoomJoined { room: String, uid: String },
    RoomLeft { room: String },
    PushStarted { channel: String },
    ParticipantsInfo(Vec<(String, bool)>),
    ParticipantJoin { uid: String, publishing: bool },
    ParticipantLeave { uid: String, publishing: bool },
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().clone()
    }

    /// Die stabilen Gruende aller gemeldeten Fehler
    pub fn error_reasons(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::Error { reason, .. } => Some(reason),
                _ => None,
            })
            .collect()
    }

    pub fn wait_for<F>(&self, timeout: Duration, mut bedingung: F) -> bool
    where
        F: FnMut(&[ObservedEvent]) -> bool,
    {
        let frist = Instant::now() + timeout;
        loop {
            if bedingung(&self.events.lock()) {
                return true;
            }
            if Instant::now() >= frist {
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn aufzeichnen(&self, event: ObservedEvent) {
        self.events.lock().push(event);
    }
}

impl EngineObserver for RecordingObserver {
    fn on_error(&self, error: &RtcError) {
        self.aufzeichnen(ObservedEvent::Error {
            reason: error.reason().to_string(),
            message: error.to_string(),
        });
    }

    fn on_room_joined(&self, room: &RoomId, uid: &Uid) {
        self.aufzeichnen(ObservedEvent::RoomJoined {
            room: room.to_string(),
            uid: uid.to_string(),
        });
    }

    fn on_room_left(&self, room: &RoomId) {
        self.aufzeichnen(ObservedEvent::RoomLeft { room: room.to_string() });
    }

    fn on_push_started(&self, channel: &Channel) {
        self.aufzeichnen(ObservedEvent::PushStarted {
            channel: channel.to_string(),
        });
    }
}

impl ParticipantObserver for RecordingObserver {
    fn on_participants_info(&self, participants: &ParticipantMap) {
        self.aufzeichnen(ObservedEvent::ParticipantsInfo(
            participants
                .iter()
                .map(|(uid, publishing)| (uid.to_string(), *publishing))
                .collect(),
        ));
    }

    fn on_participant_join(&self, uid: &Uid, publishing: bool) {
        self.aufzeichnen(ObservedEvent::ParticipantJoin {
            uid: uid.to_string(),
            publishing,
        });
    }

    fn on_participant_leave(&self, uid: &Uid, publishing: bool) {
        self.aufzeichnen(ObservedEvent::ParticipantLeave {
            uid: uid.to_string(),
            publishing,
        });
    }
}
