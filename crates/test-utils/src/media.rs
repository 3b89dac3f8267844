//! Aufzeichnende Media-Engine

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use krtc_core::Channel;
use krtc_session::{MediaEndpoints, MediaEngine, MediaHandler, RenderTarget, SessionError, SessionResult};
use parking_lot::Mutex;

/// Ein protokollierter Aufruf. Handler werden ueber ihren Kanal
/// (bzw. `"preview"`) identifiziert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCall {
    CreatePusher { channel: String, api_url: String, stream_url: String },
    CreatePuller { channel: String, target: usize, api_url: String, stream_url: String },
    CreatePreview,
    Start(String),
    Stop(String),
    Destroy(String),
    Audio(String, bool),
    Video(String, bool),
}

type StartHaken = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Protokoll {
    aufrufe: Mutex<Vec<MediaCall>>,
    start_fehler: Mutex<HashSet<String>>,
    start_haken: Mutex<HashMap<String, StartHaken>>,
}

impl Protokoll {
    fn aufzeichnen(&self, aufruf: MediaCall) {
        self.aufrufe.lock().push(aufruf);
    }
}

#[derive(Clone, Default)]
pub struct RecordingMediaEngine {
    protokoll: Arc<Protokoll>,
}

impl RecordingMediaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MediaCall> {
        self.protokoll.aufrufe.lock().clone()
    }

    pub fn clear(&self) {
        self.protokoll.aufrufe.lock().clear();
    }

    /// `start()` des Handlers fuer `name` schlaegt ab jetzt fehl
    pub fn fail_start_of(&self, name: &str) {
        self.protokoll.start_fehler.lock().insert(name.to_string());
    }

    /// `haken` laeuft in `start()` des Handlers fuer `name`, blockierend und
    /// bevor der Start aufgezeichnet wird
    pub fn on_start_of(&self, name: &str, haken: impl Fn() + Send + Sync + 'static) {
        self.protokoll
            .start_haken
            .lock()
            .insert(name.to_string(), Arc::new(haken));
    }

    /// Kanaele aller erzeugten Puller in Erzeugungsreihenfolge
    pub fn created_pullers(&self) -> Vec<(String, usize)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MediaCall::CreatePuller { channel, target, .. } => Some((channel, target)),
                _ => None,
            })
            .collect()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MediaCall::Destroy(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Erzeugte minus zerstoerte Handler
    pub fn live_handlers(&self) -> usize {
        let calls = self.calls();
        let erzeugt = calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    MediaCall::CreatePusher { .. } | MediaCall::CreatePuller { .. } | MediaCall::CreatePreview
                )
            })
            .count();
        let zerstoert = calls.iter().filter(|c| matches!(c, MediaCall::Destroy(_))).count();
        erzeugt.saturating_sub(zerstoert)
    }

    fn handler(&self, name: String) -> Box<dyn MediaHandler> {
        Box::new(RecordingHandler {
            name,
            protokoll: self.protokoll.clone(),
        })
    }
}

impl MediaEngine for RecordingMediaEngine {
    fn create_pusher(
        &self,
        endpoints: &MediaEndpoints,
        channel: &Channel,
    ) -> SessionResult<Box<dyn MediaHandler>> {
        self.protokoll.aufzeichnen(MediaCall::CreatePusher {
            channel: channel.to_string(),
            api_url: endpoints.api_url.clone(),
            stream_url: endpoints.stream_url.clone(),
        });
        Ok(self.handler(channel.to_string()))
    }

    fn create_puller(
        &self,
        endpoints: &MediaEndpoints,
        channel: &Channel,
        target: RenderTarget,
    ) -> SessionResult<Box<dyn MediaHandler>> {
        self.protokoll.aufzeichnen(MediaCall::CreatePuller {
            channel: channel.to_string(),
            target: target.0,
            api_url: endpoints.api_url.clone(),
            stream_url: endpoints.stream_url.clone(),
        });
        Ok(self.handler(channel.to_string()))
    }

    fn create_preview(&self) -> SessionResult<Box<dyn MediaHandler>> {
        self.protokoll.aufzeichnen(MediaCall::CreatePreview);
        Ok(self.handler("preview".to_string()))
    }
}

struct RecordingHandler {
    name: String,
    protokoll: Arc<Protokoll>,
}

impl MediaHandler for RecordingHandler {
    fn start(&mut self) -> SessionResult<()> {
        let haken = self.protokoll.start_haken.lock().get(&self.name).cloned();
        if let Some(haken) = haken {
            haken();
        }
        if self.protokoll.start_fehler.lock().contains(&self.name) {
            return Err(SessionError::Medien(format!("{} startet nicht", self.name)));
        }
        self.protokoll.aufzeichnen(MediaCall::Start(self.name.clone()));
        Ok(())
    }

    fn stop(&mut self) {
        self.protokoll.aufzeichnen(MediaCall::Stop(self.name.clone()));
    }

    fn destroy(self: Box<Self>) {
        self.protokoll.aufzeichnen(MediaCall::Destroy(self.name.clone()));
    }

    fn set_audio_enabled(&mut self, enabled: bool) {
        self.protokoll.aufzeichnen(MediaCall::Audio(self.name.clone(), enabled));
    }

    fn set_video_enabled(&mut self, enabled: bool) {
        self.protokoll.aufzeichnen(MediaCall::Video(self.name.clone(), enabled));
    }
}
