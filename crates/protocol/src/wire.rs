//! Wire-Format der Signalisierung
//!
//! Jede Nachricht ist ein JSON-Text-Frame mit Umschlag:
//!
//! ```text
//! {"tid":"<Korrelations-Token>","msg":{"action":"...", ...Felder}}
//! ```
//!
//! Der `tid` dient nur der Korrelation in Logs, nicht der Sicherheit.
//! Eingehende Nachrichten werden zuerst als generischer JSON-Baum gelesen,
//! damit unbekannte Aktionen von strukturellen Fehlern unterschieden
//! werden koennen.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::control::{JoinReply, Notify, Request, SignalingEvent};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Laenge des Korrelations-Tokens
pub const TID_LENGTH: usize = 7;

// ---------------------------------------------------------------------------
// Fehler
// ---------------------------------------------------------------------------

/// Fehler beim Kodieren oder Dekodieren einer Nachricht
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON-Fehler: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Umschlag ohne 'msg'-Objekt")]
    FehlenderInhalt,

    #[error("Feld 'msg.action' fehlt")]
    FehlendeAktion,

    #[error("Unbekannte Aktion: {0}")]
    UnbekannteAktion(String),

    #[error("Ungueltige '{aktion}'-Nachricht: {detail}")]
    Struktur { aktion: String, detail: String },
}

// ---------------------------------------------------------------------------
// Umschlag
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    tid: &'a str,
    msg: &'a T,
}

/// Dekodierte Nachricht samt optionalem Korrelations-Token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub tid: Option<String>,
    pub event: SignalingEvent,
}

/// Erzeugt ein zufaelliges alphanumerisches Token der Laenge [`TID_LENGTH`]
pub fn generate_tid() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TID_LENGTH)
        .map(char::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Kodieren
// ---------------------------------------------------------------------------

/// Kodiert eine Anfrage mit frischem Korrelations-Token
pub fn encode_request(request: &Request) -> Result<String, CodecError> {
    encode_request_with_tid(&generate_tid(), request)
}

pub fn encode_request_with_tid(tid: &str, request: &Request) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&Envelope { tid, msg: request })?)
}

/// Kodiert ein Server-Ereignis (Gegenrichtung, z.B. fuer Testserver)
pub fn encode_event(tid: &str, event: &SignalingEvent) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&Envelope { tid, msg: event })?)
}

// ---------------------------------------------------------------------------
// Dekodieren
// ---------------------------------------------------------------------------

/// Dekodiert einen eingehenden Text-Frame
///
/// # Fehler
/// - `Json` bei ungueltigem JSON
/// - `FehlenderInhalt` / `FehlendeAktion` wenn der Umschlag unvollstaendig ist
/// - `UnbekannteAktion` fuer Aktionen ausser `join` und `notify`
/// - `Struktur` wenn die Felder nicht zur Aktion passen
pub fn decode_event(text: &str) -> Result<InboundMessage, CodecError> {
    let root: Value = serde_json::from_str(text)?;

    let tid = root.get("tid").and_then(Value::as_str).map(str::to_owned);
    let msg = root
        .get("msg")
        .filter(|msg| msg.is_object())
        .ok_or(CodecError::FehlenderInhalt)?;
    let aktion = msg
        .get("action")
        .and_then(Value::as_str)
        .ok_or(CodecError::FehlendeAktion)?;

    let event = match aktion {
        "join" => SignalingEvent::Join(
            JoinReply::deserialize(msg).map_err(|e| struktur_fehler(aktion, e))?,
        ),
        "notify" => SignalingEvent::Notify(
            Notify::deserialize(msg).map_err(|e| struktur_fehler(aktion, e))?,
        ),
        andere => return Err(CodecError::UnbekannteAktion(andere.to_owned())),
    };

    Ok(InboundMessage { tid, event })
}

fn struktur_fehler(aktion: &str, e: serde_json::Error) -> CodecError {
    CodecError::Struktur {
        aktion: aktion.to_owned(),
        detail: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
