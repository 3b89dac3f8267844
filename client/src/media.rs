//! Media-Engine ohne Medien: protokolliert nur den Lebenszyklus

use krtc_core::Channel;
use krtc_session::{MediaEndpoints, MediaEngine, MediaHandler, RenderTarget, SessionResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMediaEngine;

impl MediaEngine for LoggingMediaEngine {
    fn create_pusher(
        &self,
        endpoints: &MediaEndpoints,
        channel: &Channel,
    ) -> SessionResult<Box<dyn MediaHandler>> {
        tracing::info!(channel = %channel, api = %endpoints.api_url, stream = %endpoints.stream_url, "Pusher erzeugt");
        Ok(Box::new(LoggingHandler::neu("push", channel.to_string())))
    }

    fn create_puller(
        &self,
        endpoints: &MediaEndpoints,
        channel: &Channel,
        target: RenderTarget,
    ) -> SessionResult<Box<dyn MediaHandler>> {
        tracing::info!(
            channel = %channel,
            slot = target.0,
            api = %endpoints.api_url,
            stream = %endpoints.stream_url,
            "Puller erzeugt"
        );
        Ok(Box::new(LoggingHandler::neu("pull", channel.to_string())))
    }

    fn create_preview(&self) -> SessionResult<Box<dyn MediaHandler>> {
        tracing::info!("Vorschau erzeugt");
        Ok(Box::new(LoggingHandler::neu("preview", String::new())))
    }
}

struct LoggingHandler {
    art: &'static str,
    channel: String,
}

impl LoggingHandler {
    fn neu(art: &'static str, channel: String) -> Self {
        Self { art, channel }
    }
}

impl MediaHandler for LoggingHandler {
    fn start(&mut self) -> SessionResult<()> {
        tracing::debug!(art = self.art, channel = %self.channel, "Handler gestartet");
        Ok(())
    }

    fn stop(&mut self) {
        tracing::debug!(art = self.art, channel = %self.channel, "Handler gestoppt");
    }

    fn destroy(self: Box<Self>) {
        tracing::debug!(art = self.art, channel = %self.channel, "Handler freigegeben");
    }

    fn set_audio_enabled(&mut self, enabled: bool) {
        tracing::info!(channel = %self.channel, enabled, "Audio umgeschaltet");
    }

    fn set_video_enabled(&mut self, enabled: bool) {
        tracing::info!(channel = %self.channel, enabled, "Video umgeschaltet");
    }
}
