//! RtcEngine Ende-zu-Ende gegen Loopback-Server und aufzeichnende Medien

use std::sync::Arc;
use std::time::{Duration, Instant};

use krtc_client::{ClientConfig, RtcEngine};
use krtc_protocol::NotifyEvent;
use krtc_test_utils::{
    join_antwort, notify, FakeSignalingServer, JoinAntwort, MediaCall, ObservedEvent,
    RecordingMediaEngine, RecordingObserver,
};

const WARTEN: Duration = Duration::from_secs(3);

fn warten_bis(mut bedingung: impl FnMut() -> bool) -> bool {
    let frist = Instant::now() + WARTEN;
    while !bedingung() {
        if Instant::now() >= frist {
            return false;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    true
}

fn config(server: &FakeSignalingServer) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.signaling.server = server.address();
    config.signaling.tls = false;
    config.signaling.keepalive_sek = 0;
    config.signaling.verbindungs_timeout_ms = 2000;
    config.signaling.bestaetigungs_timeout_ms = 2000;
    config.signaling.sende_timeout_ms = 2000;
    config
}

struct Aufbau {
    server: FakeSignalingServer,
    engine: RtcEngine,
    media: RecordingMediaEngine,
    observer: Arc<RecordingObserver>,
}

fn aufbauen(antwort: JoinAntwort) -> Aufbau {
    let server = FakeSignalingServer::start(antwort);
    let media = RecordingMediaEngine::new();
    let observer = Arc::new(RecordingObserver::new());
    let engine = RtcEngine::new(config(&server), Arc::new(media.clone()), observer.clone());
    Aufbau {
        server,
        engine,
        media,
        observer,
    }
}

fn mit_teilnehmern(participants: &[(&str, bool)]) -> Aufbau {
    aufbauen(JoinAntwort::Antworten(join_antwort("55555", "111", participants)))
}

#[test]
fn beitritt_erzeugt_pull_und_leave_gibt_ihn_frei() {
    let a = mit_teilnehmern(&[("8a38581", true)]);

    assert!(a.engine.join_room("55555", "111"));
    assert!(warten_bis(|| a.engine.pull_slots().len() == 1));

    let slots = a.engine.pull_slots();
    assert_eq!(slots[0].index, 0);
    assert_eq!(slots[0].channel.as_str(), "55555/8a38581");
    assert_eq!(
        a.media.calls()[0],
        MediaCall::CreatePuller {
            channel: "55555/8a38581".into(),
            target: 0,
            api_url: "https://127.0.0.1:1986/rtc/v1/play/".into(),
            stream_url: "webrtc://127.0.0.1/55555/8a38581".into(),
        }
    );

    a.server.push(notify(NotifyEvent::Leave, "55555", "8a38581", false));
    assert!(warten_bis(|| a.engine.pull_slots().is_empty()));
    assert_eq!(a.media.live_handlers(), 0);
    assert!(a.observer.events().contains(&ObservedEvent::RoomJoined {
        room: "55555".into(),
        uid: "111".into(),
    }));
}

#[test]
fn nicht_publizierende_teilnehmer_bekommen_keinen_slot() {
    let a = mit_teilnehmern(&[("still", false)]);
    assert!(a.engine.join_room("55555", "111"));

    a.server.push(notify(NotifyEvent::Join, "55555", "neu", false));
    a.server.push(notify(NotifyEvent::Publish, "55555", "sender", true));
    assert!(warten_bis(|| a.engine.pull_slots().len() == 1));
    assert_eq!(a.engine.pull_slots()[0].uid.as_str(), "sender");
    assert_eq!(a.media.created_pullers().len(), 1);
}

#[test]
fn push_sendet_publish() {
    let a = mit_teilnehmern(&[]);
    assert!(a.engine.join_room("55555", "111"));

    assert!(a.engine.start_push());
    assert!(a.engine.start_push());
    assert!(a.server.wait_for_action("publish", 1, WARTEN));
    assert_eq!(a.server.received_actions(), vec!["join", "publish"]);
    assert!(a.observer.events().contains(&ObservedEvent::PushStarted {
        channel: "55555/111".into(),
    }));

    assert!(a.engine.set_push_audio(false));
    assert!(a.media.calls().contains(&MediaCall::Audio("55555/111".into(), false)));
}

#[test]
fn push_ohne_raum_scheitert() {
    let a = mit_teilnehmern(&[]);
    assert!(!a.engine.start_push());
    assert_eq!(a.observer.error_reasons(), vec!["send"]);
    assert!(a.media.calls().is_empty());
}

#[test]
fn verbindungsende_vor_publish_baut_push_ab() {
    let server = Arc::new(FakeSignalingServer::start(JoinAntwort::Antworten(join_antwort(
        "55555", "111", &[],
    ))));
    let media = RecordingMediaEngine::new();
    let observer = Arc::new(RecordingObserver::new());
    let engine = RtcEngine::new(config(&server), Arc::new(media.clone()), observer.clone());
    assert!(engine.join_room("55555", "111"));

    // Der Server trennt, waehrend der Pusher startet; publish sieht den Raum nicht mehr
    {
        let server = server.clone();
        let observer = observer.clone();
        media.on_start_of("55555/111", move || {
            server.close_connection();
            assert!(observer.wait_for(WARTEN, |events| {
                events.iter().any(|e| matches!(e, ObservedEvent::Error { .. }))
            }));
        });
    }

    assert!(!engine.start_push());
    assert_eq!(observer.error_reasons(), vec!["connect", "send"]);
    assert!(!engine.is_pushing());
    assert_eq!(media.live_handlers(), 0);
    assert!(media.destroyed().contains(&"55555/111".to_string()));
    assert!(!observer
        .events()
        .iter()
        .any(|e| matches!(e, ObservedEvent::PushStarted { .. })));
    assert_eq!(server.received_actions(), vec!["join"]);
}

#[test]
fn leave_baut_push_und_pulls_ab() {
    let a = mit_teilnehmern(&[("a", true), ("b", true)]);
    assert!(a.engine.join_room("55555", "111"));
    assert!(a.engine.start_push());
    assert!(warten_bis(|| a.engine.pull_slots().len() == 2));

    a.engine.leave_room();
    a.engine.leave_room();

    assert!(a.server.wait_for_action("leave", 1, WARTEN));
    assert!(!a.engine.is_pushing());
    assert!(a.engine.pull_slots().is_empty());
    assert_eq!(a.media.live_handlers(), 0);

    let verlassen = a
        .observer
        .events()
        .into_iter()
        .filter(|e| matches!(e, ObservedEvent::RoomLeft { .. }))
        .count();
    assert_eq!(verlassen, 1);

    // Push wird vor den Pulls abgebaut
    let calls = a.media.calls();
    let push = calls.iter().position(|c| c == &MediaCall::Stop("55555/111".into()));
    let pull = calls.iter().position(|c| c == &MediaCall::Stop("55555/a".into()));
    assert!(push.is_some() && push < pull);
}

#[test]
fn gescheiterter_beitritt_hinterlaesst_nichts() {
    let server = FakeSignalingServer::start(JoinAntwort::Schweigen);
    let media = RecordingMediaEngine::new();
    let observer = Arc::new(RecordingObserver::new());
    let mut cfg = config(&server);
    cfg.signaling.bestaetigungs_timeout_ms = 300;
    let engine = RtcEngine::new(cfg, Arc::new(media.clone()), observer.clone());

    assert!(!engine.join_room("55555", "111"));
    assert_eq!(observer.error_reasons(), vec!["handshake"]);
    assert!(engine.coordinator().lock().room().is_none());
    assert!(engine.pull_slots().is_empty());
}

#[test]
fn verbindungsabbruch_baut_pulls_ab() {
    let a = mit_teilnehmern(&[("8a38581", true)]);
    assert!(a.engine.join_room("55555", "111"));
    assert!(warten_bis(|| a.engine.pull_slots().len() == 1));

    a.server.close_connection();

    assert!(warten_bis(|| a.engine.pull_slots().is_empty()));
    assert!(warten_bis(|| a.observer.error_reasons() == vec!["connect"]));
    assert!(!a.engine.is_joined());
}

#[test]
fn vorschau_einmalig_und_beim_drop_freigegeben() {
    let a = mit_teilnehmern(&[]);
    assert!(a.engine.start_preview());
    assert!(a.engine.start_preview());

    let media = a.media.clone();
    drop(a);

    let calls = media.calls();
    assert_eq!(calls.iter().filter(|c| **c == MediaCall::CreatePreview).count(), 1);
    assert!(calls.contains(&MediaCall::Destroy("preview".into())));
}
