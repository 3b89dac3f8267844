//! # krtc-observability
//!
//! Structured Logging via tracing-subscriber, Text- oder JSON-Ausgabe.

pub mod logging;

pub use logging::{logging_initialisieren, LogFormat, LoggingEinstellungen, LoggingFehler};
