//! SessionCoordinator
//!
//! Besitzt den Pull-Slot-Pool, die einzige Push-Session und die lokale
//! Vorschau. Handler werden ausschliesslich hier erzeugt, gestartet,
//! gestoppt und zerstoert.

use std::sync::Arc;

use krtc_core::{Channel, ParticipantMap, ParticipantObserver, RoomId, Uid};
use parking_lot::{Mutex, MutexGuard};

use crate::error::{SessionError, SessionResult};
use crate::media::{self, MediaEndpoints, MediaEngine, MediaHandler, RenderTarget, DEFAULT_MEDIA_PORT};
use crate::slots::{PullSlot, PullSlotInfo, SlotPool};

/// Standard-Anzahl gleichzeitiger Pull-Sessions
pub const DEFAULT_MAX_PULL_SLOTS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_pull_slots: usize,
    pub media_port: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_pull_slots: DEFAULT_MAX_PULL_SLOTS,
            media_port: DEFAULT_MEDIA_PORT,
        }
    }
}

/// Der aktive Raum aus Sicht der Medien-Sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomContext {
    /// Host des Signalisierungsservers, ohne Port
    pub server_host: String,
    pub room_id: RoomId,
    pub local_uid: Uid,
}

impl RoomContext {
    pub fn new(server_host: impl Into<String>, room_id: RoomId, local_uid: Uid) -> Self {
        Self {
            server_host: server_host.into(),
            room_id,
            local_uid,
        }
    }

    pub fn channel_for(&self, uid: &Uid) -> Channel {
        Channel::new(&self.room_id, uid)
    }

    pub fn local_channel(&self) -> Channel {
        self.channel_for(&self.local_uid)
    }
}

struct PushSession {
    channel: Channel,
    handler: Box<dyn MediaHandler>,
}

pub struct SessionCoordinator {
    config: SessionConfig,
    engine: Arc<dyn MediaEngine>,
    room: Option<RoomContext>,
    pool: SlotPool,
    push: Option<PushSession>,
    preview: Option<Box<dyn MediaHandler>>,
}

impl SessionCoordinator {
    pub fn neu(config: SessionConfig, engine: Arc<dyn MediaEngine>) -> Self {
        let pool = SlotPool::neu(config.max_pull_slots);
        Self {
            config,
            engine,
            room: None,
            pool,
            push: None,
            preview: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn room(&self) -> Option<&RoomContext> {
        self.room.as_ref()
    }

    /// Setzt den aktiven Raum. Sessions eines vorherigen Raums werden
    /// vorher abgebaut.
    pub fn set_room(&mut self, room: RoomContext) {
        if self.room.as_ref().is_some_and(|aktiv| aktiv != &room) {
            self.teardown();
        }
        tracing::debug!(room = %room.room_id, uid = %room.local_uid, "Raum fuer Sessions gesetzt");
        self.room = Some(room);
    }

    // ------------------------------------------------------------------
    // Pull-Sessions
    // ------------------------------------------------------------------

    /// Ein Teilnehmer publiziert. Liefert den Slot-Index; ein Teilnehmer
    /// mit bestehendem Slot behaelt ihn.
    pub fn participant_publishing(&mut self, uid: &Uid) -> SessionResult<usize> {
        let room = self.room.as_ref().ok_or(SessionError::KeinRaum)?;

        if let Some(index) = self.pool.index_of(uid) {
            tracing::debug!(uid = %uid, slot = index, "Teilnehmer hat bereits einen Slot");
            return Ok(index);
        }

        let index = self
            .pool
            .lowest_free()
            .ok_or(SessionError::KapazitaetErschoepft {
                kapazitaet: self.pool.capacity(),
            })?;

        let channel = room.channel_for(uid);
        let endpoints = MediaEndpoints::for_pull(&room.server_host, self.config.media_port, &channel);
        let mut handler = self
            .engine
            .create_puller(&endpoints, &channel, RenderTarget(index))?;
        if let Err(e) = handler.start() {
            handler.destroy();
            return Err(e);
        }

        let slot = PullSlot {
            uid: uid.clone(),
            channel: channel.clone(),
            handler,
        };
        if let Err(slot) = self.pool.occupy(index, slot) {
            media::shutdown(slot.handler);
            return Err(SessionError::Medien(format!("Slot {} bereits belegt", index)));
        }

        tracing::info!(uid = %uid, slot = index, channel = %channel, "Pull-Session gestartet");
        Ok(index)
    }

    /// Teilnehmer entfernt oder publiziert nicht mehr. Unbekannte UIDs
    /// sind ein No-op.
    pub fn participant_removed(&mut self, uid: &Uid) -> Option<usize> {
        let (index, slot) = self.pool.release(uid)?;
        media::shutdown(slot.handler);
        tracing::info!(uid = %uid, slot = index, "Pull-Session beendet");
        Some(index)
    }

    /// Uebernimmt eine Teilnehmerliste; Fehler einzelner Eintraege werden
    /// protokolliert und brechen die uebrigen nicht ab.
    pub fn apply_participants(&mut self, participants: &ParticipantMap) {
        for (uid, publishing) in participants {
            if *publishing {
                self.publishing_melden(uid);
            }
        }
    }

    fn publishing_melden(&mut self, uid: &Uid) {
        match self.participant_publishing(uid) {
            Ok(_) => {}
            Err(e @ SessionError::KapazitaetErschoepft { .. }) => {
                tracing::warn!(uid = %uid, fehler = %e, "Teilnehmer wird nicht angezeigt");
            }
            Err(SessionError::KeinRaum) => {
                tracing::warn!(uid = %uid, "Teilnehmerereignis ohne aktiven Raum verworfen");
            }
            Err(e) => {
                tracing::error!(uid = %uid, fehler = %e, "Pull-Session konnte nicht gestartet werden");
            }
        }
    }

    /// Stoppt alle Pull-Sessions
    pub fn stop_pulls(&mut self) -> usize {
        let slots = self.pool.drain();
        let anzahl = slots.len();
        for (index, slot) in slots {
            tracing::debug!(uid = %slot.uid, slot = index, "Pull-Session abgebaut");
            media::shutdown(slot.handler);
        }
        anzahl
    }

    pub fn pull_slots(&self) -> Vec<PullSlotInfo> {
        self.pool.snapshot()
    }

    pub fn pull_count(&self) -> usize {
        self.pool.occupied()
    }

    // ------------------------------------------------------------------
    // Push-Session
    // ------------------------------------------------------------------

    /// Startet die Push-Session fuer den lokalen Teilnehmer. Laeuft bereits
    /// eine, wird deren Kanal geliefert.
    pub fn start_push(&mut self) -> SessionResult<Channel> {
        let room = self.room.as_ref().ok_or(SessionError::KeinRaum)?;
        if let Some(push) = &self.push {
            return Ok(push.channel.clone());
        }

        let channel = room.local_channel();
        let endpoints = MediaEndpoints::for_push(&room.server_host, self.config.media_port, &channel);
        let mut handler = self.engine.create_pusher(&endpoints, &channel)?;
        if let Err(e) = handler.start() {
            handler.destroy();
            return Err(e);
        }

        tracing::info!(channel = %channel, url = %endpoints.api_url, "Push-Session gestartet");
        self.push = Some(PushSession {
            channel: channel.clone(),
            handler,
        });
        Ok(channel)
    }

    pub fn stop_push(&mut self) -> bool {
        match self.push.take() {
            Some(push) => {
                media::shutdown(push.handler);
                tracing::info!(channel = %push.channel, "Push-Session beendet");
                true
            }
            None => false,
        }
    }

    pub fn is_pushing(&self) -> bool {
        self.push.is_some()
    }

    pub fn push_channel(&self) -> Option<&Channel> {
        self.push.as_ref().map(|p| &p.channel)
    }

    pub fn set_push_audio(&mut self, enabled: bool) -> bool {
        match self.push.as_mut() {
            Some(push) => {
                push.handler.set_audio_enabled(enabled);
                true
            }
            None => false,
        }
    }

    pub fn set_push_video(&mut self, enabled: bool) -> bool {
        match self.push.as_mut() {
            Some(push) => {
                push.handler.set_video_enabled(enabled);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Vorschau
    // ------------------------------------------------------------------

    pub fn start_preview(&mut self) -> SessionResult<()> {
        if self.preview.is_some() {
            return Ok(());
        }
        let mut handler = self.engine.create_preview()?;
        if let Err(e) = handler.start() {
            handler.destroy();
            return Err(e);
        }
        self.preview = Some(handler);
        Ok(())
    }

    pub fn stop_preview(&mut self) -> bool {
        match self.preview.take() {
            Some(handler) => {
                media::shutdown(handler);
                true
            }
            None => false,
        }
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// Push und alle Pulls abbauen, Raum vergessen. Die Vorschau bleibt
    /// davon unberuehrt.
    pub fn teardown(&mut self) {
        self.stop_push();
        let pulls = self.stop_pulls();
        if let Some(room) = self.room.take() {
            tracing::debug!(room = %room.room_id, pulls, "Sessions abgebaut");
        }
    }
}

// ---------------------------------------------------------------------------
// Geteilter Zugriff
// ---------------------------------------------------------------------------

/// Zwischen Engine und Dispatch-Pfad geteilter Koordinator
#[derive(Clone)]
pub struct SharedCoordinator {
    inner: Arc<Mutex<SessionCoordinator>>,
}

impl SharedCoordinator {
    pub fn new(coordinator: SessionCoordinator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(coordinator)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, SessionCoordinator> {
        self.inner.lock()
    }

    pub fn pull_slots(&self) -> Vec<PullSlotInfo> {
        self.inner.lock().pull_slots()
    }
}

impl ParticipantObserver for SharedCoordinator {
    fn on_participants_info(&self, participants: &ParticipantMap) {
        self.inner.lock().apply_participants(participants);
    }

    fn on_participant_join(&self, uid: &Uid, publishing: bool) {
        let mut coordinator = self.inner.lock();
        if publishing {
            coordinator.publishing_melden(uid);
        } else {
            coordinator.participant_removed(uid);
        }
    }

    fn on_participant_leave(&self, uid: &Uid, _publishing: bool) {
        self.inner.lock().participant_removed(uid);
    }
}
