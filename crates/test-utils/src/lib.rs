//! # krtc Testwerkzeuge
//!
//! - [`FakeSignalingServer`]: WebSocket-Signalisierungsserver auf
//!   `127.0.0.1:0` mit eigenem Thread, zeichnet empfangene Nachrichten auf
//! - [`RecordingMediaEngine`]: protokolliert jeden Handler-Aufruf
//! - [`RecordingObserver`]: sammelt Fehler- und Teilnehmerereignisse
//!
//! ```rust,ignore
//! let server = FakeSignalingServer::start(JoinAntwort::Antworten(
//!     join_antwort("55555", "111", &[("8a38581", true)]),
//! ));
//! let client = SignalingClient::new(config);
//! assert!(client.join_room(&server.address(), "55555", "111"));
//! ```

pub mod media;
pub mod observer;
pub mod server;

pub use media::{MediaCall, RecordingMediaEngine};
pub use observer::{ObservedEvent, RecordingObserver};
pub use server::{join_antwort, notify, FakeSignalingServer, JoinAntwort};
