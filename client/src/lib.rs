//! krtc-client – Engine-Kontext ueber Signalisierung und Session-Koordination

pub mod config;
pub mod engine;
pub mod media;
pub mod observer;

pub use config::ClientConfig;
pub use engine::RtcEngine;
pub use media::LoggingMediaEngine;
pub use observer::LoggingObserver;
