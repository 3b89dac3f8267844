//! Message-Dispatcher – Routet eingehende Signalisierungsnachrichten
//!
//! Dekodiert Text-Frames, aktualisiert die [`ParticipantRegistry`] und
//! reicht das Ergebnis an den [`ParticipantObserver`] weiter.
//!
//! ## Routing
//! - `join`: Teilnehmerliste ohne lokalen Teilnehmer, nur wenn nicht leer;
//!   wer laut Liste nicht mehr publiziert, wird zusaetzlich als `leave` gemeldet
//! - `notify` mit `join`/`publish`: Teilnehmer publiziert (nur `publishing=true`)
//! - `notify` mit `leave`: Teilnehmer entfernt
//!
//! Nicht dekodierbare oder unbekannte Nachrichten werden geloggt und
//! verworfen; die Verbindung bleibt bestehen.

use std::sync::Arc;

use krtc_core::{ParticipantMap, ParticipantObserver, Uid};
use krtc_protocol::{decode_event, NotifyEvent, SignalingEvent};
use parking_lot::Mutex;

use crate::presence::{ParticipantEvent, ParticipantRegistry};

/// Meldung an den ParticipantObserver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ParticipantsInfo(ParticipantMap),
    Join { uid: Uid, publishing: bool },
    Leave { uid: Uid, publishing: bool },
}

/// Uebersetzt ein Ereignis in Registry-Aenderungen und Beobachter-Meldungen
pub fn route(event: SignalingEvent, registry: &mut ParticipantRegistry) -> Vec<Notification> {
    match event {
        SignalingEvent::Join(antwort) => {
            let local = registry.local_uid().cloned();
            let teilnehmer: ParticipantMap = antwort
                .participants
                .into_iter()
                .map(|peer| (Uid::new(peer.display), peer.publishing))
                .filter(|(uid, _)| !uid.is_empty() && Some(uid) != local.as_ref())
                .collect();

            if teilnehmer.is_empty() {
                tracing::debug!(room = %antwort.room, "Join-Antwort ohne weitere Teilnehmer");
                return Vec::new();
            }

            let beendet = registry
                .apply_snapshot(teilnehmer.clone())
                .into_iter()
                .filter_map(|event| match event {
                    ParticipantEvent::Updated {
                        uid,
                        publishing: false,
                    } => Some(Notification::Leave {
                        uid,
                        publishing: false,
                    }),
                    _ => None,
                });
            std::iter::once(Notification::ParticipantsInfo(teilnehmer))
                .chain(beendet)
                .collect()
        }
        SignalingEvent::Notify(notify) => {
            let uid = Uid::new(notify.peer.display);
            let publishing = notify.peer.publishing;
            let removed = notify.event == NotifyEvent::Leave;

            match registry.apply_delta(uid, publishing, removed) {
                Some(ParticipantEvent::Removed { uid, publishing }) => {
                    vec![Notification::Leave { uid, publishing }]
                }
                Some(ParticipantEvent::Appeared { uid, publishing })
                | Some(ParticipantEvent::Updated { uid, publishing }) => {
                    if publishing {
                        vec![Notification::Join { uid, publishing }]
                    } else {
                        tracing::debug!(uid = %uid, "Teilnehmer publiziert nicht, ignoriert");
                        Vec::new()
                    }
                }
                None => Vec::new(),
            }
        }
    }
}

/// Stellt Meldungen in Reihenfolge zu
pub fn deliver(notifications: Vec<Notification>, observer: &dyn ParticipantObserver) {
    for meldung in notifications {
        match meldung {
            Notification::ParticipantsInfo(teilnehmer) => observer.on_participants_info(&teilnehmer),
            Notification::Join { uid, publishing } => observer.on_participant_join(&uid, publishing),
            Notification::Leave { uid, publishing } => {
                observer.on_participant_leave(&uid, publishing)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MessageDispatcher
// ---------------------------------------------------------------------------

pub struct MessageDispatcher {
    observer: Arc<dyn ParticipantObserver>,
}

impl MessageDispatcher {
    pub fn neu(observer: Arc<dyn ParticipantObserver>) -> Self {
        Self { observer }
    }

    pub fn observer(&self) -> &dyn ParticipantObserver {
        self.observer.as_ref()
    }

    /// Verarbeitet einen eingehenden Text-Frame
    ///
    /// Gibt `false` zurueck wenn die Nachricht verworfen wurde.
    pub fn dispatch_text(&self, text: &str, registry: &Mutex<ParticipantRegistry>) -> bool {
        let nachricht = match decode_event(text) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(fehler = %e, "Nachricht verworfen");
                return false;
            }
        };

        tracing::trace!(
            tid = nachricht.tid.as_deref().unwrap_or("-"),
            action = nachricht.event.action(),
            "Nachricht dekodiert"
        );

        // Registry-Lock nicht waehrend der Zustellung halten
        let meldungen = route(nachricht.event, &mut registry.lock());
        deliver(meldungen, self.observer());
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use krtc_protocol::{JoinReply, Notify, PeerInfo};

    fn registry() -> ParticipantRegistry {
        let mut r = ParticipantRegistry::neu();
        r.reset(Uid::new("111"));
        r
    }

    fn notify(event: NotifyEvent, display: &str, publishing: bool) -> SignalingEvent {
        SignalingEvent::Notify(Notify {
            event,
            room: "55555".into(),
            peer: PeerInfo::new(display, publishing),
            participants: Vec::new(),
        })
    }

    #[derive(Default)]
    struct Protokoll(Mutex<Vec<String>>);

    impl ParticipantObserver for Protokoll {
        fn on_participants_info(&self, participants: &ParticipantMap) {
            self.0.lock().push(format!("info:{}", participants.len()));
        }
        fn on_participant_join(&self, uid: &Uid, _publishing: bool) {
            self.0.lock().push(format!("join:{uid}"));
        }
        fn on_participant_leave(&self, uid: &Uid, _publishing: bool) {
            self.0.lock().push(format!("leave:{uid}"));
        }
    }

    #[test]
    fn join_antwort_ohne_selbst() {
        let mut r = registry();
        let event = SignalingEvent::Join(JoinReply {
            room: "55555".into(),
            self_info: Some(PeerInfo::new("111", false)),
            participants: vec![
                PeerInfo::new("8a38581", true),
                PeerInfo::new("111", false),
                PeerInfo::new("8a38581", true),
            ],
        });

        let meldungen = route(event, &mut r);
        let mut erwartet = ParticipantMap::new();
        erwartet.insert(Uid::new("8a38581"), true);
        assert_eq!(meldungen, vec![Notification::ParticipantsInfo(erwartet)]);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn erneute_liste_beendet_pull_fuer_nicht_mehr_publizierende() {
        let mut r = registry();
        r.apply_snapshot([(Uid::new("a"), true), (Uid::new("b"), true)]);

        let event = SignalingEvent::Join(JoinReply {
            room: "55555".into(),
            self_info: None,
            participants: vec![PeerInfo::new("a", false), PeerInfo::new("b", true)],
        });
        let meldungen = route(event, &mut r);

        let mut liste = ParticipantMap::new();
        liste.insert(Uid::new("a"), false);
        liste.insert(Uid::new("b"), true);
        assert_eq!(
            meldungen,
            vec![
                Notification::ParticipantsInfo(liste),
                Notification::Leave {
                    uid: Uid::new("a"),
                    publishing: false
                },
            ]
        );
        assert_eq!(r.is_publishing(&Uid::new("a")), Some(false));
    }

    #[test]
    fn join_antwort_nur_mit_selbst_meldet_nichts() {
        let mut r = registry();
        let event = SignalingEvent::Join(JoinReply {
            room: "55555".into(),
            self_info: None,
            participants: vec![PeerInfo::new("111", false)],
        });
        assert!(route(event, &mut r).is_empty());
    }

    #[test]
    fn publish_und_join_werden_gleich_behandelt() {
        let mut r = registry();
        assert_eq!(
            route(notify(NotifyEvent::Join, "a", true), &mut r),
            vec![Notification::Join {
                uid: Uid::new("a"),
                publishing: true
            }]
        );
        assert_eq!(
            route(notify(NotifyEvent::Publish, "b", true), &mut r),
            vec![Notification::Join {
                uid: Uid::new("b"),
                publishing: true
            }]
        );
    }

    #[test]
    fn nicht_publizierender_join_wird_ignoriert() {
        let mut r = registry();
        assert!(route(notify(NotifyEvent::Join, "a", false), &mut r).is_empty());
        // Registry kennt den Teilnehmer trotzdem
        assert_eq!(r.is_publishing(&Uid::new("a")), Some(false));
    }

    #[test]
    fn leave_wird_immer_gemeldet() {
        let mut r = registry();
        assert_eq!(
            route(notify(NotifyEvent::Leave, "fremd", false), &mut r),
            vec![Notification::Leave {
                uid: Uid::new("fremd"),
                publishing: false
            }]
        );
    }

    #[test]
    fn dispatch_text_verwirft_unbekanntes() {
        let protokoll = Arc::new(Protokoll::default());
        let dispatcher = MessageDispatcher::neu(protokoll.clone());
        let r = Mutex::new(registry());

        assert!(!dispatcher.dispatch_text("kein json", &r));
        assert!(!dispatcher.dispatch_text(r#"{"msg":{"action":"ping"}}"#, &r));
        assert!(protokoll.0.lock().is_empty());
    }

    #[test]
    fn dispatch_text_in_reihenfolge() {
        let protokoll = Arc::new(Protokoll::default());
        let dispatcher = MessageDispatcher::neu(protokoll.clone());
        let r = Mutex::new(registry());

        let join = r#"{"tid":"jRxAiWF","msg":{"action":"join","room":"55555","self":{"display":"111","publishing":false},"participants":[{"display":"8a38581","publishing":true},{"display":"111","publishing":false}]}}"#;
        let publish = r#"{"msg":{"action":"notify","event":"publish","room":"55555","peer":{"display":"226e9a4","publishing":true},"participants":[]}}"#;
        let leave = r#"{"msg":{"action":"notify","event":"leave","room":"55555","peer":{"display":"8a38581","publishing":true},"participants":[]}}"#;

        assert!(dispatcher.dispatch_text(join, &r));
        assert!(dispatcher.dispatch_text(publish, &r));
        assert!(dispatcher.dispatch_text(leave, &r));

        assert_eq!(
            *protokoll.0.lock(),
            vec!["info:1", "join:226e9a4", "leave:8a38581"]
        );
        assert_eq!(r.lock().len(), 1);
    }
}
