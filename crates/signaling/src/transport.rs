//! TransportChannel – WebSocket-Verbindung zum Signalisierungsserver
//!
//! Jeder TransportChannel bekommt einen eigenen OS-Thread (`krtc-ws-io`) mit
//! einer current-thread tokio-Runtime. Dort laeuft die I/O-Pumpe bis zum
//! Verbindungsende oder bis `disconnect` sie abbricht. Alle Callbacks
//! (`on_status`, `on_message`) werden auf diesem Thread ausgefuehrt.
//!
//! ## Pumpe
//! ```text
//! connect_async (mit Zeitlimit)
//!     |
//!     v
//! loop {
//!     ausstehende Payload schreiben (SendBuffer)
//!     select! { Kommandos | eingehende Frames | Keepalive-Ping | Abbruch }
//! }
//! ```
//!
//! Fehler werden nie als Rueckgabewert gemeldet, sondern als
//! [`TransportStatus`].

use std::io;
use std::sync::{Arc, Once};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, Stream, StreamExt};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

use crate::send_buffer::{FlushOutcome, SendBuffer};
use crate::state::ConnectionState;

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Name des I/O-Threads
pub const IO_THREAD_NAME: &str = "krtc-ws-io";

/// Maximale Zeit zum Leeren des Sendepuffers beim geordneten Schliessen
const SCHLIESS_KARENZ: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Status und Endpunkt
// ---------------------------------------------------------------------------

/// Statusmeldung an den Besitzer des Kanals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    Connecting,
    Connected,
    ConnectFailed,
    /// Verbindung vom Server oder durch einen Lesefehler beendet
    Closed,
    SendSucceeded,
    SendFailed,
}

impl TransportStatus {
    fn connection_state(self) -> Option<ConnectionState> {
        match self {
            Self::Connecting => Some(ConnectionState::Connecting),
            Self::Connected => Some(ConnectionState::Connected),
            Self::ConnectFailed => Some(ConnectionState::Failed),
            Self::Closed => Some(ConnectionState::Closed),
            Self::SendSucceeded | Self::SendFailed => None,
        }
    }
}

/// Ziel einer Verbindung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Pfad inklusive Query, z.B. `/sig/v1/rtc?room=55555&display=111`
    pub path: String,
    pub tls: bool,
}

impl Endpoint {
    pub fn url(&self) -> String {
        let schema = if self.tls { "wss" } else { "ws" };
        format!("{}://{}:{}{}", schema, self.host, self.port, self.path)
    }
}

/// Laufzeitoptionen des Kanals
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    /// Ping-Intervall; `None` schaltet den Keepalive ab
    pub keepalive: Option<Duration>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            keepalive: Some(Duration::from_secs(10)),
        }
    }
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

type StatusCallback = Arc<dyn Fn(TransportStatus) + Send + Sync>;
type MessageCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Zustand und Callbacks, geteilt zwischen Besitzer und I/O-Thread
#[derive(Clone)]
pub(crate) struct ChannelEvents {
    state: Arc<Mutex<ConnectionState>>,
    on_status: Option<StatusCallback>,
    on_message: Option<MessageCallback>,
}

impl ChannelEvents {
    fn status(&self, status: TransportStatus) {
        if let Some(naechster) = status.connection_state() {
            self.state.lock().advance(naechster);
        }
        tracing::trace!(?status, "Transportstatus");
        if let Some(cb) = &self.on_status {
            cb(status);
        }
    }

    fn message(&self, text: &str) {
        if let Some(cb) = &self.on_message {
            cb(text);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameWriter
// ---------------------------------------------------------------------------

/// Schreibende Seite einer Verbindung
///
/// `write_frame` darf weniger Bytes annehmen als angeboten; der Rest wird
/// beim naechsten Aufruf erneut angeboten.
#[async_trait]
pub trait FrameWriter: Send {
    async fn write_frame(&mut self, chunk: &[u8]) -> io::Result<usize>;

    async fn ping(&mut self) -> io::Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<S> FrameWriter for SplitSink<WebSocketStream<S>, Message>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_frame(&mut self, chunk: &[u8]) -> io::Result<usize> {
        // Ein Aufruf = ein Text-Frame
        let text = std::str::from_utf8(chunk)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
            .to_owned();
        self.send(Message::Text(text)).await.map_err(ws_io_fehler)?;
        Ok(chunk.len())
    }

    async fn ping(&mut self) -> io::Result<()> {
        self.send(Message::Ping(Vec::new())).await.map_err(ws_io_fehler)
    }

    async fn close(&mut self) -> io::Result<()> {
        SinkExt::close(self).await.map_err(ws_io_fehler)
    }
}

fn ws_io_fehler(e: tungstenite::Error) -> io::Error {
    match e {
        tungstenite::Error::Io(e) => e,
        andere => io::Error::new(io::ErrorKind::BrokenPipe, andere.to_string()),
    }
}

/// Ein Schreibversuch fuer die vorderste Payload des Puffers
pub(crate) async fn write_pending<W>(buffer: &mut SendBuffer, writer: &mut W) -> FlushOutcome
where
    W: FrameWriter + ?Sized,
{
    let ergebnis = writer.write_frame(buffer.pending()).await;
    buffer.record(ergebnis)
}

// ---------------------------------------------------------------------------
// TransportChannel
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) enum Command {
    Send(Bytes),
    Close,
}

struct Worker {
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    thread: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

/// Bidirektionaler Nachrichtenkanal mit eigenem I/O-Thread
///
/// Ein Kanal verbindet genau einmal; fuer eine neue Verbindung wird ein
/// neuer Kanal erzeugt.
pub struct TransportChannel {
    options: TransportOptions,
    state: Arc<Mutex<ConnectionState>>,
    on_status: Option<StatusCallback>,
    on_message: Option<MessageCallback>,
    worker: Option<Worker>,
}

impl TransportChannel {
    pub fn new(options: TransportOptions) -> Self {
        Self {
            options,
            state: Arc::new(Mutex::new(ConnectionState::Idle)),
            on_status: None,
            on_message: None,
            worker: None,
        }
    }

    pub fn on_status<F>(&mut self, callback: F)
    where
        F: Fn(TransportStatus) + Send + Sync + 'static,
    {
        self.on_status = Some(Arc::new(callback));
    }

    pub fn on_message<F>(&mut self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(callback));
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Startet den Verbindungsaufbau im I/O-Thread
    ///
    /// Das Ergebnis kommt als `Connected` oder `ConnectFailed`.
    pub fn connect(&mut self, endpoint: Endpoint) {
        let events = self.events();
        if self.worker.is_some() || self.state() != ConnectionState::Idle {
            tracing::warn!(url = %endpoint.url(), "Kanal wurde bereits verbunden");
            events.status(TransportStatus::ConnectFailed);
            return;
        }

        self.state.lock().advance(ConnectionState::Connecting);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let options = self.options.clone();
        let thread_events = events.clone();
        let thread_cancel = cancel.clone();
        let gestartet = thread::Builder::new()
            .name(IO_THREAD_NAME.to_string())
            .spawn(move || io_thread(endpoint, options, thread_events, commands_rx, thread_cancel));

        match gestartet {
            Ok(handle) => {
                self.worker = Some(Worker {
                    commands: commands_tx,
                    cancel,
                    thread_id: handle.thread().id(),
                    thread: Some(handle),
                });
            }
            Err(e) => {
                tracing::error!(fehler = %e, "I/O-Thread konnte nicht gestartet werden");
                events.status(TransportStatus::ConnectFailed);
            }
        }
    }

    /// Reiht eine Payload zum Senden ein
    ///
    /// Ist kein I/O-Thread aktiv oder die Payload leer, wird `SendFailed`
    /// sofort auf dem aufrufenden Thread gemeldet.
    pub fn send(&self, payload: impl Into<Bytes>) {
        let payload = payload.into();
        if payload.is_empty() {
            tracing::warn!("Leere Payload wird nicht gesendet");
            self.events().status(TransportStatus::SendFailed);
            return;
        }

        let angenommen = self
            .worker
            .as_ref()
            .map(|w| w.commands.send(Command::Send(payload)).is_ok())
            .unwrap_or(false);
        if !angenommen {
            tracing::warn!("Senden ohne aktive Verbindung");
            self.events().status(TransportStatus::SendFailed);
        }
    }

    /// Beendet die Verbindung und wartet auf den I/O-Thread
    ///
    /// Bereits eingereihte Payloads werden noch kurz zu senden versucht.
    /// Mehrfach aufrufbar. Meldet selbst keinen Status.
    pub fn disconnect(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            return;
        };

        let _ = worker.commands.send(Command::Close);
        worker.cancel.cancel();

        if thread::current().id() == worker.thread_id {
            // Aufruf aus einem Callback: der Thread endet nach dem Callback
            tracing::debug!("disconnect aus dem I/O-Thread, kein join");
        } else if let Some(handle) = worker.thread.take() {
            if handle.join().is_err() {
                tracing::error!("I/O-Thread ist abgestuerzt");
            }
        }

        self.state.lock().advance(ConnectionState::Closed);
        tracing::debug!("Transport getrennt");
    }

    fn events(&self) -> ChannelEvents {
        ChannelEvents {
            state: Arc::clone(&self.state),
            on_status: self.on_status.clone(),
            on_message: self.on_message.clone(),
        }
    }
}

impl Drop for TransportChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// ---------------------------------------------------------------------------
// I/O-Thread
// ---------------------------------------------------------------------------

fn io_thread(
    endpoint: Endpoint,
    options: TransportOptions,
    events: ChannelEvents,
    commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(fehler = %e, "tokio-Runtime konnte nicht erstellt werden");
            events.status(TransportStatus::ConnectFailed);
            return;
        }
    };

    runtime.block_on(verbinden_und_pumpen(endpoint, options, events, commands, cancel));
}

/// rustls braucht einen prozessweiten Crypto-Provider
fn crypto_provider_installieren() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

async fn verbinden_und_pumpen(
    endpoint: Endpoint,
    options: TransportOptions,
    events: ChannelEvents,
    commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
) {
    events.status(TransportStatus::Connecting);
    if endpoint.tls {
        crypto_provider_installieren();
    }

    let url = endpoint.url();
    tracing::info!(url = %url, "Verbinde mit Signalisierungsserver");

    let verbindung = tokio::time::timeout(
        options.connect_timeout,
        tokio_tungstenite::connect_async(url.as_str()),
    );

    let stream = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(url = %url, "Verbindungsaufbau abgebrochen");
            return;
        }
        ergebnis = verbindung => match ergebnis {
            Ok(Ok((stream, _antwort))) => stream,
            Ok(Err(e)) => {
                tracing::warn!(url = %url, fehler = %e, "Verbindungsaufbau fehlgeschlagen");
                events.status(TransportStatus::ConnectFailed);
                return;
            }
            Err(_) => {
                tracing::warn!(
                    url = %url,
                    timeout_ms = options.connect_timeout.as_millis() as u64,
                    "Zeitlimit beim Verbindungsaufbau"
                );
                events.status(TransportStatus::ConnectFailed);
                return;
            }
        },
    };

    tracing::info!(url = %url, "WebSocket-Verbindung hergestellt");
    events.status(TransportStatus::Connected);

    let (writer, reader) = stream.split();
    pump(writer, reader, options.keepalive, &events, commands, cancel).await;
}

/// I/O-Pumpe einer hergestellten Verbindung
pub(crate) async fn pump<W, R>(
    mut writer: W,
    mut reader: R,
    keepalive: Option<Duration>,
    events: &ChannelEvents,
    mut commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
) where
    W: FrameWriter,
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut puffer = SendBuffer::new();
    let mut ticker = keepalive.map(|d| interval_at(Instant::now() + d, d));

    loop {
        // Ausstehende Payloads haben Vorrang
        if !puffer.is_empty() {
            let ergebnis = tokio::select! {
                biased;
                ergebnis = write_pending(&mut puffer, &mut writer) => ergebnis,
                _ = cancel.cancelled() => break,
            };
            schreib_ergebnis_melden(ergebnis, events).await;
            continue;
        }

        tokio::select! {
            biased;
            kommando = commands.recv() => match kommando {
                Some(Command::Send(payload)) => puffer.push(payload),
                Some(Command::Close) | None => {
                    geordnet_schliessen(&mut puffer, &mut writer, events).await;
                    return;
                }
            },
            _ = cancel.cancelled() => break,
            frame = reader.next() => {
                if !frame_zustellen(frame, events) {
                    for _ in 0..puffer.clear() {
                        events.status(TransportStatus::SendFailed);
                    }
                    events.status(TransportStatus::Closed);
                    return;
                }
            }
            _ = keepalive_tick(&mut ticker) => {
                tracing::trace!("Keepalive-Ping");
                if let Err(e) = writer.ping().await {
                    tracing::warn!(fehler = %e, "Keepalive-Ping fehlgeschlagen");
                }
            }
        }
    }

    // disconnect reiht Close vor dem Abbruch ein
    if schliessen_angefordert(&mut commands, &mut puffer) {
        geordnet_schliessen(&mut puffer, &mut writer, events).await;
        return;
    }
    tracing::debug!("I/O-Pumpe abgebrochen");
    let _ = tokio::time::timeout(SCHLIESS_KARENZ, writer.close()).await;
}

/// Uebernimmt noch eingereihte Payloads; `true` wenn darunter ein Close war
fn schliessen_angefordert(
    commands: &mut mpsc::UnboundedReceiver<Command>,
    puffer: &mut SendBuffer,
) -> bool {
    while let Ok(kommando) = commands.try_recv() {
        match kommando {
            Command::Send(payload) => puffer.push(payload),
            Command::Close => return true,
        }
    }
    false
}

async fn schreib_ergebnis_melden(ergebnis: FlushOutcome, events: &ChannelEvents) {
    match ergebnis {
        FlushOutcome::Complete => events.status(TransportStatus::SendSucceeded),
        FlushOutcome::Pending { remaining } => {
            tracing::trace!(remaining, "Teil-Write, Rest folgt");
            tokio::task::yield_now().await;
        }
        FlushOutcome::Failed => {
            tracing::warn!("Payload konnte nicht geschrieben werden");
            events.status(TransportStatus::SendFailed);
        }
    }
}

async fn geordnet_schliessen<W: FrameWriter>(
    puffer: &mut SendBuffer,
    writer: &mut W,
    events: &ChannelEvents,
) {
    let leeren = async {
        while !puffer.is_empty() {
            let ergebnis = write_pending(puffer, writer).await;
            schreib_ergebnis_melden(ergebnis, events).await;
        }
        let _ = writer.close().await;
    };

    if tokio::time::timeout(SCHLIESS_KARENZ, leeren).await.is_err() {
        tracing::warn!("Sendepuffer beim Schliessen nicht vollstaendig geleert");
    }
    tracing::debug!("Verbindung geordnet geschlossen");
}

async fn keepalive_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Gibt `false` zurueck wenn die Verbindung beendet ist
fn frame_zustellen(
    frame: Option<Result<Message, tungstenite::Error>>,
    events: &ChannelEvents,
) -> bool {
    match frame {
        Some(Ok(Message::Text(text))) => {
            events.message(&text);
            true
        }
        Some(Ok(Message::Binary(daten))) => {
            match String::from_utf8(daten) {
                Ok(text) => events.message(&text),
                Err(_) => tracing::warn!("Binaer-Frame ohne UTF-8 verworfen"),
            }
            true
        }
        Some(Ok(Message::Close(frame))) => {
            tracing::info!(?frame, "Server hat die Verbindung geschlossen");
            false
        }
        Some(Ok(_)) => true,
        Some(Err(e)) => {
            tracing::warn!(fehler = %e, "WebSocket-Lesefehler");
            false
        }
        None => {
            tracing::info!("WebSocket-Stream beendet");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::protocol::Role;

    /// Nimmt hoechstens `max` Bytes pro Aufruf an
    struct StueckSchreiber {
        max: usize,
        writes: Vec<Vec<u8>>,
    }

    #[async_trait]
    impl FrameWriter for StueckSchreiber {
        async fn write_frame(&mut self, chunk: &[u8]) -> io::Result<usize> {
            let n = chunk.len().min(self.max);
            self.writes.push(chunk[..n].to_vec());
            Ok(n)
        }
    }

    fn test_events() -> (ChannelEvents, Arc<Mutex<Vec<TransportStatus>>>, Arc<Mutex<Vec<String>>>) {
        let status = Arc::new(Mutex::new(Vec::new()));
        let nachrichten = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&status);
        let n = Arc::clone(&nachrichten);
        let events = ChannelEvents {
            state: Arc::new(Mutex::new(ConnectionState::Connected)),
            on_status: Some(Arc::new(move |st| s.lock().push(st))),
            on_message: Some(Arc::new(move |text: &str| n.lock().push(text.to_string()))),
        };
        (events, status, nachrichten)
    }

    #[test]
    fn url_nach_schema() {
        let mut endpoint = Endpoint {
            host: "rtc.example.org".into(),
            port: 1989,
            path: "/sig/v1/rtc?room=55555&display=111".into(),
            tls: true,
        };
        assert_eq!(
            endpoint.url(),
            "wss://rtc.example.org:1989/sig/v1/rtc?room=55555&display=111"
        );
        endpoint.tls = false;
        assert!(endpoint.url().starts_with("ws://"));
    }

    #[tokio::test]
    async fn teil_writes_werden_fortgesetzt() {
        let original = br#"{"tid":"jRxAiWF","msg":{"action":"publish","room":"55555","display":"111"}}"#;
        let mut puffer = SendBuffer::new();
        puffer.push(Bytes::from_static(original));
        let mut schreiber = StueckSchreiber {
            max: 16,
            writes: Vec::new(),
        };

        let mut versuche = 0;
        loop {
            versuche += 1;
            match write_pending(&mut puffer, &mut schreiber).await {
                FlushOutcome::Complete => break,
                FlushOutcome::Pending { .. } => continue,
                FlushOutcome::Failed => panic!("darf nicht fehlschlagen"),
            }
        }

        assert!(versuche > 1, "Payload muss in mehreren Writes gesendet werden");
        assert_eq!(schreiber.writes.concat(), original.to_vec());
    }

    #[test]
    fn senden_ohne_verbindung_meldet_fehler() {
        let mut kanal = TransportChannel::new(TransportOptions::default());
        let status = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&status);
        kanal.on_status(move |st| s.lock().push(st));

        kanal.send("hallo");
        kanal.send("");
        assert_eq!(
            *status.lock(),
            vec![TransportStatus::SendFailed, TransportStatus::SendFailed]
        );
        assert_eq!(kanal.state(), ConnectionState::Idle);
    }

    #[test]
    fn disconnect_ohne_verbindung_ist_harmlos() {
        let mut kanal = TransportChannel::new(TransportOptions::default());
        kanal.disconnect();
        kanal.disconnect();
        assert_eq!(kanal.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn pumpe_ueber_speicher_verbindung() {
        let (client_io, server_io) = tokio::io::duplex(16 * 1024);
        let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
        let mut server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;

        let (events, status, nachrichten) = test_events();
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let (writer, reader) = client.split();
        let pumpe = tokio::spawn({
            let cancel = cancel.clone();
            async move { pump(writer, reader, None, &events, rx, cancel).await }
        });

        // Ausgehend
        tx.send(Command::Send(Bytes::from_static(b"{\"a\":1}"))).unwrap();
        let empfangen = server.next().await.unwrap().unwrap();
        assert_eq!(empfangen, Message::Text("{\"a\":1}".into()));

        // Eingehend
        server.send(Message::Text("{\"b\":2}".into())).await.unwrap();

        // Server schliesst
        server.close(None).await.unwrap();
        pumpe.await.unwrap();

        assert_eq!(*nachrichten.lock(), vec!["{\"b\":2}".to_string()]);
        assert_eq!(
            *status.lock(),
            vec![TransportStatus::SendSucceeded, TransportStatus::Closed]
        );
    }

    #[tokio::test]
    async fn abbruch_nach_close_sendet_eingereihte_payload() {
        let (client_io, server_io) = tokio::io::duplex(16 * 1024);
        let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
        let mut server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        let (events, status, _) = test_events();
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        // so wie disconnect: Payload, Close, dann Abbruch
        tx.send(Command::Send(Bytes::from_static(b"{\"leave\":1}"))).unwrap();
        tx.send(Command::Close).unwrap();
        cancel.cancel();

        let (writer, reader) = client.split();
        pump(writer, reader, None, &events, rx, cancel).await;

        let empfangen = server.next().await.unwrap().unwrap();
        assert_eq!(empfangen, Message::Text("{\"leave\":1}".into()));
        assert_eq!(*status.lock(), vec![TransportStatus::SendSucceeded]);
    }

    #[tokio::test]
    async fn pumpe_bricht_bei_cancel_ab() {
        let (client_io, _server_io) = tokio::io::duplex(1024);
        let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
        let (events, status, _) = test_events();
        let (_tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let (writer, reader) = client.split();
        let pumpe = tokio::spawn({
            let cancel = cancel.clone();
            async move { pump(writer, reader, None, &events, rx, cancel).await }
        });

        cancel.cancel();
        pumpe.await.unwrap();
        assert!(status.lock().is_empty(), "Abbruch meldet keinen Status");
    }
}
