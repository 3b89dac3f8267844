//! Steuerungsnachrichten der Signalisierung
//!
//! ## Ausgehend
//! `join`, `publish` und `leave` tragen jeweils `room` und `display`.
//!
//! ## Eingehend
//! - `join`: Antwort des Servers auf den Beitritt mit `self` und `participants`
//! - `notify`: Teilnehmer-Delta mit `event` und `peer`
//!
//! Unbekannte Felder werden beim Dekodieren ignoriert.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ausgehende Anfragen
// ---------------------------------------------------------------------------

/// Aktion einer ausgehenden Anfrage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Join,
    Publish,
    Leave,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Publish => "publish",
            Self::Leave => "leave",
        }
    }
}

/// Inhalt von `msg` einer ausgehenden Anfrage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub action: Action,
    pub room: String,
    pub display: String,
}

impl Request {
    pub fn new(action: Action, room: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            action,
            room: room.into(),
            display: display.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Eingehende Ereignisse
// ---------------------------------------------------------------------------

/// Teilnehmer wie ihn der Server beschreibt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub publishing: bool,
}

impl PeerInfo {
    pub fn new(display: impl Into<String>, publishing: bool) -> Self {
        Self {
            display: display.into(),
            publishing,
        }
    }
}

/// Antwort des Servers auf `join`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReply {
    #[serde(default)]
    pub room: String,
    #[serde(default, rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_info: Option<PeerInfo>,
    #[serde(default)]
    pub participants: Vec<PeerInfo>,
}

/// Art eines `notify`-Ereignisses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyEvent {
    Join,
    Publish,
    Leave,
}

/// Teilnehmer-Delta vom Server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notify {
    pub event: NotifyEvent,
    #[serde(default)]
    pub room: String,
    pub peer: PeerInfo,
    #[serde(default)]
    pub participants: Vec<PeerInfo>,
}

/// Dekodierte eingehende Nachricht, unterschieden ueber `msg.action`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SignalingEvent {
    Join(JoinReply),
    Notify(Notify),
}

impl SignalingEvent {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Notify(_) => "notify",
        }
    }
}
