//! Beobachter-Schnittstellen
//!
//! Zwei unabhaengige Registrierungen: [`ParticipantObserver`] empfaengt
//! Teilnehmerereignisse aus dem Dispatch-Pfad der Signalisierung,
//! [`EngineObserver`] empfaengt Fehler und Lebenszyklus-Meldungen der
//! Engine. Eine Komponente, die beides braucht, haelt zwei Handles.
//!
//! Alle Methoden koennen auf dem I/O-Thread der Signalisierung aufgerufen
//! werden und duerfen dort nicht blockierend auf den Client zurueckgreifen.

use std::collections::BTreeMap;

use crate::error::RtcError;
use crate::types::{Channel, RoomId, Uid};

/// UID -> Publishing-Flag
pub type ParticipantMap = BTreeMap<Uid, bool>;

/// Empfaenger fuer Teilnehmerereignisse
pub trait ParticipantObserver: Send + Sync {
    /// Initiale Teilnehmerliste nach dem Raumbeitritt (ohne den lokalen Teilnehmer)
    fn on_participants_info(&self, participants: &ParticipantMap);

    /// Ein Teilnehmer publiziert jetzt
    fn on_participant_join(&self, uid: &Uid, publishing: bool);

    /// Ein Teilnehmer hat den Raum verlassen
    fn on_participant_leave(&self, uid: &Uid, publishing: bool);
}

/// Empfaenger fuer Engine-Meldungen
pub trait EngineObserver: Send + Sync {
    /// Jeder gemeldete Fehler traegt `error.reason()` als stabilen Grund
    fn on_error(&self, error: &RtcError);

    fn on_room_joined(&self, _room: &RoomId, _uid: &Uid) {}

    fn on_room_left(&self, _room: &RoomId) {}

    fn on_push_started(&self, _channel: &Channel) {}
}

/// Beobachter, der alles verwirft
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ParticipantObserver for NoopObserver {
    fn on_participants_info(&self, _participants: &ParticipantMap) {}
    fn on_participant_join(&self, _uid: &Uid, _publishing: bool) {}
    fn on_participant_leave(&self, _uid: &Uid, _publishing: bool) {}
}

impl EngineObserver for NoopObserver {
    fn on_error(&self, _error: &RtcError) {}
}
