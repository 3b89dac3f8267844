//! krtc-signaling – Signalisierungsclient
//!
//! Dieser Crate implementiert den Client-Teil des Raum-Protokolls: eine
//! WebSocket-Verbindung mit eigenem I/O-Thread und darueber eine
//! blockierende API fuer Beitritt, Verlassen und Publizieren.
//!
//! ## Architektur
//!
//! ```text
//! Aufrufer-Thread                    I/O-Thread (krtc-ws-io)
//!     |                                   |
//! SignalingClient::join_room              |
//!     |-- TransportChannel::connect ----> Pumpe (tokio current_thread)
//!     |<-- Rendezvous (Connected) --------| OnStatus
//!     |-- send(join) -------------------> |
//!     |<-- Rendezvous (Join-Ack) ---------| OnMessage
//!                                         |
//!                                   MessageDispatcher
//!                                         |
//!                                 ParticipantRegistry -> ParticipantObserver
//! ```

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod presence;
pub mod rendezvous;
pub mod send_buffer;
pub mod state;
pub mod transport;

// Bequeme Re-Exporte
pub use client::{SignalingClient, SignalingConfig};
pub use dispatcher::MessageDispatcher;
pub use error::{SignalingError, SignalingResult, Wartepunkt};
pub use presence::{ParticipantEvent, ParticipantRegistry};
pub use state::{ConnectionState, HandshakePhase, RoomSession};
pub use transport::{Endpoint, TransportChannel, TransportOptions, TransportStatus};
