//! Schnittstelle zur Media-Engine
//!
//! Die Engine erzeugt Handler fuer Push, Pull und lokale Vorschau. Handler
//! gehoeren dem Koordinator; die Engine gibt nur ein `Box<dyn MediaHandler>`
//! heraus und behaelt keine Referenz.

use krtc_core::Channel;

use crate::error::SessionResult;

/// Standard-Port der Medien-API
pub const DEFAULT_MEDIA_PORT: u16 = 1986;

/// Undurchsichtige Render-Flaeche fuer einen Pull-Slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTarget(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDirection {
    Push,
    Pull,
}

impl MediaDirection {
    fn api_segment(self) -> &'static str {
        match self {
            Self::Push => "publish",
            Self::Pull => "play",
        }
    }
}

/// Aus dem Signalisierungsserver abgeleitete Medien-URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEndpoints {
    /// z.B. `https://host:1986/rtc/v1/publish/`
    pub api_url: String,
    /// z.B. `webrtc://host/55555/111`
    pub stream_url: String,
}

impl MediaEndpoints {
    pub fn new(direction: MediaDirection, host: &str, media_port: u16, channel: &Channel) -> Self {
        Self {
            api_url: format!(
                "https://{}:{}/rtc/v1/{}/",
                host,
                media_port,
                direction.api_segment()
            ),
            stream_url: format!("webrtc://{}/{}", host, channel),
        }
    }

    pub fn for_push(host: &str, media_port: u16, channel: &Channel) -> Self {
        Self::new(MediaDirection::Push, host, media_port, channel)
    }

    pub fn for_pull(host: &str, media_port: u16, channel: &Channel) -> Self {
        Self::new(MediaDirection::Pull, host, media_port, channel)
    }
}

/// Eine laufende oder startbereite Medien-Session
pub trait MediaHandler: Send {
    fn start(&mut self) -> SessionResult<()>;

    fn stop(&mut self);

    /// Gibt die Ressourcen frei; nach `stop` aufgerufen
    fn destroy(self: Box<Self>) {}

    fn set_audio_enabled(&mut self, _enabled: bool) {}

    fn set_video_enabled(&mut self, _enabled: bool) {}
}

/// Fabrik fuer Medien-Handler
pub trait MediaEngine: Send + Sync {
    fn create_pusher(
        &self,
        endpoints: &MediaEndpoints,
        channel: &Channel,
    ) -> SessionResult<Box<dyn MediaHandler>>;

    fn create_puller(
        &self,
        endpoints: &MediaEndpoints,
        channel: &Channel,
        target: RenderTarget,
    ) -> SessionResult<Box<dyn MediaHandler>>;

    fn create_preview(&self) -> SessionResult<Box<dyn MediaHandler>>;
}

/// Stoppt und zerstoert einen Handler
pub(crate) fn shutdown(mut handler: Box<dyn MediaHandler>) {
    handler.stop();
    handler.destroy();
}

#[cfg(test)]
mod tests {
    use super::*;
    use krtc_core::{RoomId, Uid};

    #[test]
    fn endpunkte_fuer_push_und_pull() {
        let channel = Channel::new(&RoomId::new("55555"), &Uid::new("111"));
        let push = MediaEndpoints::for_push("rtc.example.org", DEFAULT_MEDIA_PORT, &channel);
        assert_eq!(push.api_url, "https://rtc.example.org:1986/rtc/v1/publish/");
        assert_eq!(push.stream_url, "webrtc://rtc.example.org/55555/111");

        let pull = MediaEndpoints::for_pull("rtc.example.org", DEFAULT_MEDIA_PORT, &channel);
        assert_eq!(pull.api_url, "https://rtc.example.org:1986/rtc/v1/play/");
        assert_eq!(pull.stream_url, push.stream_url);
    }
}
