//! krtc-protocol – Signalisierungsprotokoll
//!
//! Dieses Crate definiert die Nachrichten, die zwischen Client und
//! Signalisierungsserver ausgetauscht werden, und ihr JSON-Wire-Format.

pub mod control;
pub mod wire;

pub use control::{Action, JoinReply, Notify, NotifyEvent, PeerInfo, Request, SignalingEvent};
pub use wire::{decode_event, encode_request, CodecError, InboundMessage};
