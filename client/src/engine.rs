//! RtcEngine – expliziter Engine-Kontext
//!
//! Haelt den SignalingClient und den SessionCoordinator. Der Koordinator ist
//! zugleich ParticipantObserver des Clients, die Teilnehmerereignisse laufen
//! also direkt vom I/O-Thread in die Slot-Verwaltung.
//!
//! Der Koordinator-Lock wird nie gehalten, waehrend der SignalingClient
//! aufgerufen wird: `leave_room` wartet auf den I/O-Thread, und der kann
//! gerade im Koordinator stecken.

use std::sync::Arc;

use krtc_core::{EngineObserver, ParticipantMap, RoomId, RtcError, ServerAddress, Uid};
use krtc_session::{
    MediaEngine, PullSlotInfo, RoomContext, SessionCoordinator, SharedCoordinator,
};
use krtc_signaling::SignalingClient;
use parking_lot::Mutex;

use crate::config::ClientConfig;

pub struct RtcEngine {
    config: ClientConfig,
    signaling: SignalingClient,
    coordinator: SharedCoordinator,
    observer: Arc<dyn EngineObserver>,
    /// Raum der aktuellen Mitgliedschaft
    raum: Mutex<Option<RoomId>>,
}

impl RtcEngine {
    pub fn new(
        config: ClientConfig,
        media: Arc<dyn MediaEngine>,
        observer: Arc<dyn EngineObserver>,
    ) -> Self {
        let coordinator = SharedCoordinator::new(SessionCoordinator::neu(config.session_config(), media));
        let signaling = SignalingClient::with_observers(
            config.signaling_config(),
            Arc::new(coordinator.clone()),
            observer.clone(),
        );
        Self {
            config,
            signaling,
            coordinator,
            observer,
            raum: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn signaling(&self) -> &SignalingClient {
        &self.signaling
    }

    pub fn coordinator(&self) -> &SharedCoordinator {
        &self.coordinator
    }

    // ------------------------------------------------------------------
    // Raum
    // ------------------------------------------------------------------

    /// Tritt ueber den konfigurierten Server einem Raum bei
    pub fn join_room(&self, room_id: &str, uid: &str) -> bool {
        let server = self.config.signaling.server.clone();
        self.join_room_at(&server, room_id, uid)
    }

    pub fn join_room_at(&self, address: &str, room_id: &str, uid: &str) -> bool {
        self.leave_room();

        // Der Raum muss vor dem Beitritt stehen, die Teilnehmerliste kommt
        // mit der Bestaetigung. Ungueltige Argumente meldet der Client.
        let host = ServerAddress::parse(address, self.config.signaling.standard_port)
            .ok()
            .map(|a| a.host().to_string());
        if let (Some(host), false, false) = (host, room_id.is_empty(), uid.is_empty()) {
            self.coordinator
                .lock()
                .set_room(RoomContext::new(host, RoomId::new(room_id), Uid::new(uid)));
        }

        if !self.signaling.join_room(address, room_id, uid) {
            self.coordinator.lock().teardown();
            return false;
        }

        let room = RoomId::new(room_id);
        *self.raum.lock() = Some(room.clone());
        self.observer.on_room_joined(&room, &Uid::new(uid));
        true
    }

    /// Verlaesst den Raum: erst Signalisierung, dann Push, dann alle Pulls
    pub fn leave_room(&self) {
        let raum = self.raum.lock().take();
        self.signaling.leave_room();
        self.coordinator.lock().teardown();
        if let Some(room) = raum {
            tracing::info!(room = %room, "Engine hat den Raum verlassen");
            self.observer.on_room_left(&room);
        }
    }

    pub fn is_joined(&self) -> bool {
        self.signaling.is_joined()
    }

    pub fn participants(&self) -> ParticipantMap {
        self.signaling.participants()
    }

    // ------------------------------------------------------------------
    // Push
    // ------------------------------------------------------------------

    /// Startet die Push-Session und kuendigt sie per `publish` an
    pub fn start_push(&self) -> bool {
        if !self.signaling.is_joined() {
            tracing::warn!("start_push ohne Raum");
            self.observer
                .on_error(&RtcError::Senden("Kein Raum beigetreten".to_string()));
            return false;
        }
        if self.coordinator.lock().is_pushing() {
            return true;
        }

        let gestartet = self.coordinator.lock().start_push();
        let channel = match gestartet {
            Ok(channel) => channel,
            Err(e) => {
                tracing::error!(fehler = %e, "Push-Session konnte nicht gestartet werden");
                self.observer.on_error(&RtcError::from(e));
                return false;
            }
        };

        match self.signaling.publish() {
            Ok(()) => {
                self.observer.on_push_started(&channel);
                true
            }
            Err(e) => {
                tracing::error!(channel = %channel, fehler = %e, "publish fehlgeschlagen, Push wird beendet");
                self.observer.on_error(&RtcError::from(e));
                self.coordinator.lock().stop_push();
                false
            }
        }
    }

    pub fn stop_push(&self) -> bool {
        self.coordinator.lock().stop_push()
    }

    pub fn set_push_audio(&self, enabled: bool) -> bool {
        self.coordinator.lock().set_push_audio(enabled)
    }

    pub fn set_push_video(&self, enabled: bool) -> bool {
        self.coordinator.lock().set_push_video(enabled)
    }

    pub fn is_pushing(&self) -> bool {
        self.coordinator.lock().is_pushing()
    }

    // ------------------------------------------------------------------
    // Vorschau und Pulls
    // ------------------------------------------------------------------

    pub fn start_preview(&self) -> bool {
        let ergebnis = self.coordinator.lock().start_preview();
        match ergebnis {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(fehler = %e, "Vorschau konnte nicht gestartet werden");
                self.observer.on_error(&RtcError::from(e));
                false
            }
        }
    }

    pub fn stop_preview(&self) -> bool {
        self.coordinator.lock().stop_preview()
    }

    /// Schnappschuss der belegten Pull-Slots
    pub fn pull_slots(&self) -> Vec<PullSlotInfo> {
        self.coordinator.pull_slots()
    }
}

impl Drop for RtcEngine {
    fn drop(&mut self) {
        self.leave_room();
        self.stop_preview();
    }
}
