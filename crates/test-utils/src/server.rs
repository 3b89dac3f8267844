//! Signalisierungsserver fuer Integrationstests

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use krtc_protocol::wire::encode_event;
use krtc_protocol::{JoinReply, Notify, NotifyEvent, PeerInfo, SignalingEvent};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

/// Verhalten des Servers auf eine `join`-Anfrage
#[derive(Debug, Clone)]
pub enum JoinAntwort {
    /// Sendet den Text als Bestaetigung zurueck
    Antworten(String),
    /// Bestaetigt nie
    Schweigen,
    /// Schliesst die Verbindung statt zu bestaetigen
    Trennen,
}

enum Befehl {
    Push(String),
    Trennen,
    Beenden,
}

#[derive(PartialEq)]
enum Ende {
    Verbindung,
    Server,
}

#[derive(Default)]
struct Aufzeichnung {
    nachrichten: Mutex<Vec<String>>,
    pfade: Mutex<Vec<String>>,
    verbindungen: Mutex<usize>,
}

/// Loopback-Server, bedient Verbindungen nacheinander
pub struct FakeSignalingServer {
    addr: SocketAddr,
    aufzeichnung: Arc<Aufzeichnung>,
    join_antwort: Arc<Mutex<JoinAntwort>>,
    befehle: mpsc::UnboundedSender<Befehl>,
    thread: Option<JoinHandle<()>>,
}

impl FakeSignalingServer {
    pub fn start(join_antwort: JoinAntwort) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Loopback-Bind");
        listener.set_nonblocking(true).expect("nonblocking");
        let addr = listener.local_addr().expect("lokale Adresse");

        let aufzeichnung = Arc::new(Aufzeichnung::default());
        let join_antwort = Arc::new(Mutex::new(join_antwort));
        let (befehle, rx) = mpsc::unbounded_channel();

        let thread = {
            let aufzeichnung = aufzeichnung.clone();
            let join_antwort = join_antwort.clone();
            std::thread::Builder::new()
                .name("fake-signaling".into())
                .spawn(move || {
                    let runtime = tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                        .expect("Test-Runtime");
                    runtime.block_on(async move {
                        let listener = TcpListener::from_std(listener).expect("tokio-Listener");
                        annehmen(listener, aufzeichnung, join_antwort, rx).await;
                    });
                })
                .expect("Server-Thread")
        };

        Self {
            addr,
            aufzeichnung,
            join_antwort,
            befehle,
            thread: Some(thread),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `host:port` fuer `SignalingClient::join_room`
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn set_join_antwort(&self, antwort: JoinAntwort) {
        *self.join_antwort.lock() = antwort;
    }

    /// Sendet einen Text an die aktuelle Verbindung
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.befehle.send(Befehl::Push(text.into()));
    }

    /// Schliesst die aktuelle Verbindung serverseitig
    pub fn close_connection(&self) {
        let _ = self.befehle.send(Befehl::Trennen);
    }

    pub fn received(&self) -> Vec<String> {
        self.aufzeichnung.nachrichten.lock().clone()
    }

    /// Die `msg.action`-Felder aller empfangenen Nachrichten
    pub fn received_actions(&self) -> Vec<String> {
        self.received().iter().filter_map(|t| aktion(t)).collect()
    }

    pub fn request_paths(&self) -> Vec<String> {
        self.aufzeichnung.pfade.lock().clone()
    }

    pub fn connections(&self) -> usize {
        *self.aufzeichnung.verbindungen.lock()
    }

    /// Wartet bis mindestens `count` Nachrichten mit `action` empfangen wurden
    pub fn wait_for_action(&self, action: &str, count: usize, timeout: Duration) -> bool {
        let frist = Instant::now() + timeout;
        loop {
            let n = self
                .received_actions()
                .iter()
                .filter(|a| a.as_str() == action)
                .count();
            if n >= count {
                return true;
            }
            if Instant::now() >= frist {
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Wartet bis die aktuelle Verbindung beendet wurde
    pub fn wait_for_connections(&self, count: usize, timeout: Duration) -> bool {
        let frist = Instant::now() + timeout;
        while self.connections() < count {
            if Instant::now() >= frist {
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        true
    }
}

impl Drop for FakeSignalingServer {
    fn drop(&mut self) {
        let _ = self.befehle.send(Befehl::Beenden);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn aktion(text: &str) -> Option<String> {
    let wert: serde_json::Value = serde_json::from_str(text).ok()?;
    wert.get("msg")?
        .get("action")?
        .as_str()
        .map(str::to_string)
}

async fn annehmen(
    listener: TcpListener,
    aufzeichnung: Arc<Aufzeichnung>,
    join_antwort: Arc<Mutex<JoinAntwort>>,
    mut befehle: mpsc::UnboundedReceiver<Befehl>,
) {
    loop {
        tokio::select! {
            angenommen = listener.accept() => {
                let Ok((stream, _)) = angenommen else { continue };
                let ende = bedienen(stream, &aufzeichnung, &join_antwort, &mut befehle).await;
                if ende == Ende::Server {
                    break;
                }
            }
            befehl = befehle.recv() => match befehl {
                Some(Befehl::Beenden) | None => break,
                // ohne Verbindung verworfen
                Some(_) => {}
            }
        }
    }
}

async fn bedienen(
    stream: TcpStream,
    aufzeichnung: &Aufzeichnung,
    join_antwort: &Mutex<JoinAntwort>,
    befehle: &mut mpsc::UnboundedReceiver<Befehl>,
) -> Ende {
    let pfad_merken = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        aufzeichnung.pfade.lock().push(req.uri().to_string());
        Ok(resp)
    };
    let ws = match tokio_tungstenite::accept_hdr_async(stream, pfad_merken).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(fehler = %e, "Handshake im Testserver fehlgeschlagen");
            *aufzeichnung.verbindungen.lock() += 1;
            return Ende::Verbindung;
        }
    };
    let (mut schreiber, mut leser) = ws.split();

    let ende = loop {
        tokio::select! {
            frame = leser.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let text = text.to_string();
                    aufzeichnung.nachrichten.lock().push(text.clone());
                    if aktion(&text).as_deref() != Some("join") {
                        continue;
                    }
                    let antwort = join_antwort.lock().clone();
                    match antwort {
                        JoinAntwort::Antworten(antwort) => {
                            if schreiber.send(Message::Text(antwort.into())).await.is_err() {
                                break Ende::Verbindung;
                            }
                        }
                        JoinAntwort::Schweigen => {}
                        JoinAntwort::Trennen => {
                            let _ = schreiber.close().await;
                            break Ende::Verbindung;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break Ende::Verbindung,
                Some(Ok(_)) => {}
            },
            befehl = befehle.recv() => match befehl {
                Some(Befehl::Push(text)) => {
                    if schreiber.send(Message::Text(text.into())).await.is_err() {
                        break Ende::Verbindung;
                    }
                }
                Some(Befehl::Trennen) => {
                    let _ = schreiber.close().await;
                    break Ende::Verbindung;
                }
                Some(Befehl::Beenden) | None => {
                    let _ = schreiber.close().await;
                    break Ende::Server;
                }
            }
        }
    };

    *aufzeichnung.verbindungen.lock() += 1;
    ende
}

// ---------------------------------------------------------------------------
// Nachrichtenbausteine
// ---------------------------------------------------------------------------

/// Join-Bestaetigung mit Teilnehmerliste `(uid, publishing)`
pub fn join_antwort(room: &str, self_uid: &str, participants: &[(&str, bool)]) -> String {
    let reply = JoinReply {
        room: room.to_string(),
        self_info: Some(PeerInfo::new(self_uid, false)),
        participants: participants
            .iter()
            .map(|(uid, publishing)| PeerInfo::new(*uid, *publishing))
            .collect(),
    };
    encode_event("srv0001", &SignalingEvent::Join(reply)).expect("Join-Antwort kodieren")
}

/// Teilnehmer-Benachrichtigung
pub fn notify(event: NotifyEvent, room: &str, uid: &str, publishing: bool) -> String {
    let notify = Notify {
        event,
        room: room.to_string(),
        peer: PeerInfo::new(uid, publishing),
        participants: Vec::new(),
    };
    encode_event("srv0002", &SignalingEvent::Notify(notify)).expect("Notify kodieren")
}
