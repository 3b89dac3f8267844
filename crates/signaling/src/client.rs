//! SignalingClient – Blockierende Raum-API ueber dem TransportChannel
//!
//! `join_room`, `leave_room` und `publish` werden vom Aufrufer-Thread
//! aufgerufen und ueber einen internen Mutex serialisiert. Die Callbacks
//! des TransportChannel laufen auf dem I/O-Thread und loesen das
//! [`Rendezvous`] auf, auf dem der Aufrufer wartet.
//!
//! ## Ablauf `join_room`
//! ```text
//! NotStarted -> AwaitingConnect --(Connected)--> AwaitingJoinAck --(erste Nachricht)--> Joined
//!                     |                                |
//!                     +-- ConnectFailed / Zeitlimit    +-- SendFailed / Closed / Zeitlimit
//! ```
//!
//! ## Lock-Reihenfolge
//! `operation` -> `transport` -> `state`. Der I/O-Thread nimmt nur `state`
//! und `registry`, deshalb darf `disconnect` (join auf den I/O-Thread)
//! nie unter `state` aufgerufen werden.

use std::sync::Arc;
use std::time::Duration;

use krtc_core::{
    EngineObserver, NoopObserver, ParticipantMap, ParticipantObserver, RoomId, RtcError,
    ServerAddress, Uid, DEFAULT_SIGNALING_PORT,
};
use krtc_protocol::{wire, Action, Request};
use parking_lot::Mutex;

use crate::dispatcher::MessageDispatcher;
use crate::error::{SignalingError, SignalingResult, Wartepunkt};
use crate::presence::ParticipantRegistry;
use crate::rendezvous::{Rendezvous, WaitError};
use crate::state::{ConnectionState, HandshakePhase, RoomSession};
use crate::transport::{Endpoint, TransportChannel, TransportOptions, TransportStatus};

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Laufzeitkonfiguration des Signalisierungsclients
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    pub default_port: u16,
    pub path: String,
    pub tls: bool,
    pub connect_timeout: Duration,
    pub ack_timeout: Duration,
    pub send_timeout: Duration,
    pub keepalive: Option<Duration>,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_SIGNALING_PORT,
            path: "/sig/v1/rtc".to_string(),
            tls: true,
            connect_timeout: Duration::from_secs(5),
            ack_timeout: Duration::from_secs(5),
            send_timeout: Duration::from_secs(3),
            keepalive: Some(Duration::from_secs(10)),
        }
    }
}

// ---------------------------------------------------------------------------
// Interner Zustand
// ---------------------------------------------------------------------------

/// Worauf der blockierte Aufrufer gerade wartet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expectation {
    Connect,
    JoinAck,
    SendConfirm,
}

/// Terminales Ereignis fuer das Rendezvous
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitOutcome {
    Connected,
    JoinAck,
    Sent,
    Failed(TransportStatus),
    Cancelled,
}

#[derive(Debug, Default)]
struct ClientState {
    phase: HandshakePhase,
    session: Option<RoomSession>,
    expectation: Option<Expectation>,
    /// Anzahl der `leave_room`-Aufrufe, die noch auf den Operations-Mutex warten
    abbrueche_ausstehend: usize,
}

/// Vom Client und den Transport-Callbacks geteilter Zustand
struct Shared {
    state: Mutex<ClientState>,
    registry: Mutex<ParticipantRegistry>,
    rendezvous: Rendezvous<WaitOutcome>,
    dispatcher: MessageDispatcher,
    engine_observer: Arc<dyn EngineObserver>,
}

impl Shared {
    /// Callback fuer `TransportStatus` (I/O-Thread, bei `send` auch Aufrufer)
    fn handle_status(&self, status: TransportStatus) {
        let (aufloesung, unerwartet_geschlossen) = {
            let mut st = self.state.lock();
            let aufloesung = match (st.expectation, status) {
                (Some(Expectation::Connect), TransportStatus::Connected) => {
                    Some(WaitOutcome::Connected)
                }
                (
                    Some(Expectation::Connect),
                    TransportStatus::ConnectFailed | TransportStatus::Closed,
                ) => Some(WaitOutcome::Failed(status)),
                (
                    Some(Expectation::JoinAck),
                    TransportStatus::SendFailed
                    | TransportStatus::Closed
                    | TransportStatus::ConnectFailed,
                ) => Some(WaitOutcome::Failed(status)),
                (Some(Expectation::SendConfirm), TransportStatus::SendSucceeded) => {
                    Some(WaitOutcome::Sent)
                }
                (
                    Some(Expectation::SendConfirm),
                    TransportStatus::SendFailed | TransportStatus::Closed,
                ) => Some(WaitOutcome::Failed(status)),
                _ => None,
            };
            if aufloesung.is_some() {
                st.expectation = None;
            }

            let unerwartet =
                status == TransportStatus::Closed && st.phase == HandshakePhase::Joined;
            if unerwartet {
                st.phase = HandshakePhase::Left;
                st.session = None;
            }
            (aufloesung, unerwartet)
        };

        if let Some(ergebnis) = aufloesung {
            self.rendezvous.resolve(ergebnis);
        }
        if unerwartet_geschlossen {
            self.handle_unexpected_close();
        }
    }

    /// Callback fuer eingehende Text-Frames (I/O-Thread)
    fn handle_message(&self, text: &str) {
        tracing::debug!(payload = %text, "Signalisierungsnachricht empfangen");

        let ack = {
            let mut st = self.state.lock();
            if st.expectation == Some(Expectation::JoinAck) {
                st.expectation = None;
                st.phase = HandshakePhase::Joined;
                if let Some(session) = st.session.as_mut() {
                    session.joined = true;
                }
                true
            } else {
                false
            }
        };
        if ack {
            self.rendezvous.resolve(WaitOutcome::JoinAck);
        }

        self.dispatcher.dispatch_text(text, &self.registry);
    }

    fn handle_unexpected_close(&self) {
        tracing::warn!("Verbindung zum Signalisierungsserver unerwartet geschlossen");

        let letzter_stand = self.registry.lock().clear();
        for (uid, publishing) in &letzter_stand {
            self.dispatcher
                .observer()
                .on_participant_leave(uid, *publishing);
        }

        self.engine_observer.on_error(&RtcError::Verbindung(
            "Verbindung waehrend der Sitzung geschlossen".to_string(),
        ));
    }
}

// ---------------------------------------------------------------------------
// SignalingClient
// ---------------------------------------------------------------------------

/// Client fuer genau eine Raum-Mitgliedschaft
pub struct SignalingClient {
    config: SignalingConfig,
    shared: Arc<Shared>,
    transport: Mutex<Option<TransportChannel>>,
    /// Serialisiert join/leave/publish
    operation: Mutex<()>,
}

impl SignalingClient {
    pub fn new(config: SignalingConfig) -> Self {
        Self::with_observers(config, Arc::new(NoopObserver), Arc::new(NoopObserver))
    }

    pub fn with_observers(
        config: SignalingConfig,
        participants: Arc<dyn ParticipantObserver>,
        engine: Arc<dyn EngineObserver>,
    ) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(ClientState::default()),
                registry: Mutex::new(ParticipantRegistry::neu()),
                rendezvous: Rendezvous::new(),
                dispatcher: MessageDispatcher::neu(participants),
                engine_observer: engine,
            }),
            transport: Mutex::new(None),
            operation: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SignalingConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Raumbeitritt
    // -----------------------------------------------------------------------

    /// Tritt einem Raum bei und blockiert bis zur Bestaetigung
    ///
    /// Gibt `false` zurueck wenn Verbindung oder Beitritt fehlschlagen; der
    /// Grund geht an den `EngineObserver`.
    pub fn join_room(&self, address: &str, room_id: &str, uid: &str) -> bool {
        let _op = self.operation.lock();

        let ziel = match self.validate(address, room_id, uid) {
            Ok(ziel) => ziel,
            Err(e) => {
                tracing::warn!(server = %address, fehler = %e, "join_room abgelehnt");
                self.shared.engine_observer.on_error(&RtcError::from(e));
                return false;
            }
        };

        match self.join_inner(ziel) {
            Ok(()) => {
                tracing::info!(server = %address, room = %room_id, uid = %uid, "Raum beigetreten");
                true
            }
            Err(e) => {
                tracing::warn!(
                    server = %address,
                    room = %room_id,
                    uid = %uid,
                    fehler = %e,
                    "Raumbeitritt fehlgeschlagen"
                );
                self.abort_join();
                self.shared.engine_observer.on_error(&RtcError::from(e));
                false
            }
        }
    }

    /// Prueft die Argumente ohne jede I/O
    fn validate(
        &self,
        address: &str,
        room_id: &str,
        uid: &str,
    ) -> SignalingResult<(ServerAddress, RoomId, Uid)> {
        if room_id.is_empty() || uid.is_empty() {
            return Err(SignalingError::UngueltigesArgument(
                "Raum-ID und UID duerfen nicht leer sein".to_string(),
            ));
        }
        let server = ServerAddress::parse(address, self.config.default_port)?;
        Ok((server, RoomId::new(room_id), Uid::new(uid)))
    }

    fn join_inner(&self, (server, room_id, uid): (ServerAddress, RoomId, Uid)) -> SignalingResult<()> {
        // Bestehende Mitgliedschaft geordnet beenden
        self.leave_inner();
        self.take_transport();
        self.shared.registry.lock().reset(uid.clone());

        // Phase 1: Verbindung
        let waiter = self.shared.rendezvous.arm();
        {
            let mut st = self.shared.state.lock();
            if st.abbrueche_ausstehend > 0 {
                return Err(SignalingError::Abgebrochen(Wartepunkt::Verbindung));
            }
            st.phase = HandshakePhase::NotStarted;
            st.session = Some(RoomSession::neu(room_id.clone(), uid.clone()));
            st.phase = HandshakePhase::AwaitingConnect;
            st.expectation = Some(Expectation::Connect);
        }

        let endpoint = Endpoint {
            host: server.host().to_string(),
            port: server.port(),
            path: format!("{}?room={}&display={}", self.config.path, room_id, uid),
            tls: self.config.tls,
        };
        let mut kanal = TransportChannel::new(TransportOptions {
            connect_timeout: self.config.connect_timeout,
            keepalive: self.config.keepalive,
        });
        let shared = Arc::clone(&self.shared);
        kanal.on_status(move |status| shared.handle_status(status));
        let shared = Arc::clone(&self.shared);
        kanal.on_message(move |text| shared.handle_message(text));
        kanal.connect(endpoint);
        *self.transport.lock() = Some(kanal);

        match self.wait(waiter, self.config.connect_timeout, Wartepunkt::Verbindung)? {
            WaitOutcome::Connected => {}
            andere => {
                return Err(SignalingError::Verbindung(format!(
                    "{server} nicht erreichbar ({andere:?})"
                )))
            }
        }

        // Phase 2: Join-Bestaetigung
        let waiter = self.shared.rendezvous.arm();
        {
            let mut st = self.shared.state.lock();
            if st.abbrueche_ausstehend > 0 {
                return Err(SignalingError::Abgebrochen(Wartepunkt::JoinBestaetigung));
            }
            st.phase = HandshakePhase::AwaitingJoinAck;
            st.expectation = Some(Expectation::JoinAck);
        }
        self.send_action(Action::Join)
            .map_err(|e| SignalingError::Handshake(e.to_string()))?;

        match self.wait(waiter, self.config.ack_timeout, Wartepunkt::JoinBestaetigung)? {
            WaitOutcome::JoinAck => {}
            andere => {
                return Err(SignalingError::Handshake(format!(
                    "join nicht bestaetigt ({andere:?})"
                )))
            }
        }

        // Zwischen Bestaetigung und hier kann die Verbindung gefallen sein
        if self.shared.state.lock().phase != HandshakePhase::Joined {
            return Err(SignalingError::Handshake(
                "Verbindung nach der Bestaetigung geschlossen".to_string(),
            ));
        }
        Ok(())
    }

    /// Baut einen abgebrochenen Beitritt ab
    fn abort_join(&self) {
        {
            let mut st = self.shared.state.lock();
            st.expectation = None;
            st.session = None;
            st.phase = HandshakePhase::NotStarted;
        }
        self.shared.rendezvous.disarm();
        self.take_transport();
        self.shared.registry.lock().clear();
    }

    // -----------------------------------------------------------------------
    // Verlassen und Publizieren
    // -----------------------------------------------------------------------

    /// Verlaesst den Raum; ohne Mitgliedschaft ein No-op
    ///
    /// Ein laufendes `join_room` wird abgebrochen und schlaegt fehl.
    pub fn leave_room(&self) {
        // Wartenden Aufrufer wecken, bevor der Operations-Mutex genommen wird.
        // Der Zaehler bleibt erhoeht bis dieser Aufruf den Mutex haelt; ein
        // Join prueft ihn nach jedem `arm()`.
        self.shared.state.lock().abbrueche_ausstehend += 1;
        self.cancel_pending();

        let _op = self.operation.lock();
        if !self.leave_inner() {
            // z.B. nach unerwartetem Verbindungsende: Transport trotzdem freigeben
            self.take_transport();
            tracing::debug!("leave_room ohne Mitgliedschaft");
        }
        self.shared.state.lock().abbrueche_ausstehend -= 1;
    }

    /// Gibt `true` zurueck wenn eine Mitgliedschaft beendet wurde
    fn leave_inner(&self) -> bool {
        let session = {
            let st = self.shared.state.lock();
            match (st.phase, st.session.clone()) {
                (HandshakePhase::Joined, Some(session)) => session,
                _ => return false,
            }
        };

        // Best effort, das Ergebnis wird nicht abgewartet
        if let Err(e) = self.send_action(Action::Leave) {
            tracing::debug!(fehler = %e, "leave konnte nicht gesendet werden");
        }
        {
            let mut st = self.shared.state.lock();
            st.phase = HandshakePhase::Left;
            st.session = None;
            st.expectation = None;
        }
        self.take_transport();
        self.shared.registry.lock().clear();

        tracing::info!(room = %session.room_id, uid = %session.local_uid, "Raum verlassen");
        true
    }

    /// Sendet `publish` und loggt einen Fehler
    pub fn send_publish_msg(&self) {
        if let Err(e) = self.publish() {
            tracing::error!(fehler = %e, "publish fehlgeschlagen");
            self.shared.engine_observer.on_error(&RtcError::from(e));
        }
    }

    /// Sendet `publish` und blockiert bis zur Sendebestaetigung
    pub fn publish(&self) -> SignalingResult<()> {
        let _op = self.operation.lock();

        {
            let mut st = self.shared.state.lock();
            if st.phase != HandshakePhase::Joined {
                return Err(SignalingError::NichtBeigetreten);
            }
            st.expectation = Some(Expectation::SendConfirm);
        }
        let waiter = self.shared.rendezvous.arm();

        let ergebnis = self.send_action(Action::Publish).and_then(|()| {
            match self.wait(waiter, self.config.send_timeout, Wartepunkt::Sendebestaetigung)? {
                WaitOutcome::Sent => Ok(()),
                andere => Err(SignalingError::Senden(format!(
                    "publish nicht gesendet ({andere:?})"
                ))),
            }
        });

        if ergebnis.is_err() {
            self.shared.state.lock().expectation = None;
            self.shared.rendezvous.disarm();
        }
        ergebnis
    }

    /// Weckt einen blockierten Aufrufer mit einem Abbruch
    pub fn cancel_pending(&self) {
        if self.shared.rendezvous.resolve(WaitOutcome::Cancelled) {
            tracing::debug!("Wartender Aufruf abgebrochen");
        }
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> HandshakePhase {
        self.shared.state.lock().phase
    }

    pub fn is_joined(&self) -> bool {
        self.phase() == HandshakePhase::Joined
    }

    pub fn session(&self) -> Option<RoomSession> {
        self.shared.state.lock().session.clone()
    }

    /// Schnappschuss der bekannten entfernten Teilnehmer
    pub fn participants(&self) -> ParticipantMap {
        self.shared.registry.lock().snapshot()
    }

    /// Zustand des aktuellen Transports; `None` wenn keiner existiert
    pub fn transport_state(&self) -> Option<ConnectionState> {
        self.transport.lock().as_ref().map(TransportChannel::state)
    }

    // -----------------------------------------------------------------------
    // Intern
    // -----------------------------------------------------------------------

    fn send_action(&self, action: Action) -> SignalingResult<()> {
        let session = self
            .shared
            .state
            .lock()
            .session
            .clone()
            .ok_or(SignalingError::NichtBeigetreten)?;
        let request = Request::new(action, session.room_id.as_str(), session.local_uid.as_str());
        let text =
            wire::encode_request(&request).map_err(|e| SignalingError::Senden(e.to_string()))?;

        tracing::info!(action = action.as_str(), payload = %text, "Sende Signalisierungsnachricht");

        match self.transport.lock().as_ref() {
            Some(kanal) => {
                kanal.send(text);
                Ok(())
            }
            None => Err(SignalingError::Senden("keine Verbindung".to_string())),
        }
    }

    fn wait(
        &self,
        waiter: crate::rendezvous::Waiter<WaitOutcome>,
        timeout: Duration,
        punkt: Wartepunkt,
    ) -> SignalingResult<WaitOutcome> {
        match waiter.wait(timeout) {
            Ok(WaitOutcome::Cancelled) | Err(WaitError::Disarmed) => {
                Err(SignalingError::Abgebrochen(punkt))
            }
            Ok(ergebnis) => Ok(ergebnis),
            Err(WaitError::Timeout) => {
                self.shared.state.lock().expectation = None;
                self.shared.rendezvous.disarm();
                Err(SignalingError::Zeitlimit(punkt))
            }
        }
    }

    /// Entnimmt den Transport und trennt ihn ausserhalb aller Locks
    fn take_transport(&self) {
        let kanal = self.transport.lock().take();
        if let Some(mut kanal) = kanal {
            kanal.disconnect();
        }
    }
}

impl Drop for SignalingClient {
    fn drop(&mut self) {
        self.leave_room();
    }
}
