//! Sendepuffer des TransportChannel
//!
//! Haelt ausgehende Payloads in Reihenfolge. Nimmt der Kanal eine Payload
//! nur teilweise an, bleibt der Rest vorne in der Warteschlange und wird
//! beim naechsten Schreibversuch fortgesetzt.
//!
//! ## Fehlerpolitik
//! - Nichts geschrieben und Kanal nicht beschreibbar: `Failed`
//! - Nach einem Teil-Write: Rest wird erneut versucht (`Pending`)
//! - Jeder andere I/O-Fehler: `Failed`

use std::collections::VecDeque;
use std::io;

use bytes::{Buf, Bytes};

/// Ergebnis eines Schreibversuchs fuer die vorderste Payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Payload vollstaendig geschrieben
    Complete,
    /// Teil geschrieben, `remaining` Bytes stehen noch aus
    Pending { remaining: usize },
    /// Payload verworfen
    Failed,
}

#[derive(Debug, Default)]
pub struct SendBuffer {
    queue: VecDeque<Bytes>,
    /// Bereits geschriebene Bytes der vordersten Payload
    written: usize,
}

impl SendBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, payload: Bytes) {
        self.queue.push_back(payload);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Anzahl wartender Payloads
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Noch nicht geschriebener Teil der vordersten Payload
    pub fn pending(&self) -> &[u8] {
        self.queue.front().map(|p| p.chunk()).unwrap_or(&[])
    }

    /// Verbucht das Ergebnis eines Schreibversuchs auf [`pending`](Self::pending)
    pub fn record(&mut self, result: io::Result<usize>) -> FlushOutcome {
        let Some(front) = self.queue.front_mut() else {
            return FlushOutcome::Complete;
        };

        match result {
            Ok(n) if n > 0 => {
                let n = n.min(front.remaining());
                front.advance(n);
                self.written += n;
                if front.has_remaining() {
                    FlushOutcome::Pending {
                        remaining: front.remaining(),
                    }
                } else {
                    self.pop_front();
                    FlushOutcome::Complete
                }
            }
            Ok(_) => self.blocked(),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => self.blocked(),
            Err(_) => {
                self.pop_front();
                FlushOutcome::Failed
            }
        }
    }

    /// Verwirft alle Payloads und gibt ihre Anzahl zurueck
    pub fn clear(&mut self) -> usize {
        let anzahl = self.queue.len();
        self.queue.clear();
        self.written = 0;
        anzahl
    }

    fn blocked(&mut self) -> FlushOutcome {
        if self.written > 0 {
            FlushOutcome::Pending {
                remaining: self.pending().len(),
            }
        } else {
            self.pop_front();
            FlushOutcome::Failed
        }
    }

    fn pop_front(&mut self) {
        self.queue.pop_front();
        self.written = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn would_block() -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::WouldBlock))
    }

    #[test]
    fn vollstaendiger_write() {
        let mut puffer = SendBuffer::new();
        puffer.push(Bytes::from_static(b"hallo"));
        assert_eq!(puffer.pending(), b"hallo");
        assert_eq!(puffer.record(Ok(5)), FlushOutcome::Complete);
        assert!(puffer.is_empty());
    }

    #[test]
    fn teil_writes_ergeben_urspruengliche_bytes() {
        let original = br#"{"tid":"abcdefg","msg":{"action":"join"}}"#;
        let mut puffer = SendBuffer::new();
        puffer.push(Bytes::from_static(original));

        let mut geschrieben = Vec::new();
        loop {
            let stueck = puffer.pending();
            let n = stueck.len().min(8);
            geschrieben.extend_from_slice(&stueck[..n]);
            match puffer.record(Ok(n)) {
                FlushOutcome::Complete => break,
                FlushOutcome::Pending { remaining } => assert!(remaining > 0),
                FlushOutcome::Failed => panic!("Teil-Write darf nicht fehlschlagen"),
            }
        }

        assert_eq!(geschrieben, original);
        assert!(puffer.is_empty());
    }

    #[test]
    fn nicht_beschreibbar_ohne_fortschritt_ist_fehler() {
        let mut puffer = SendBuffer::new();
        puffer.push(Bytes::from_static(b"abc"));
        assert_eq!(puffer.record(would_block()), FlushOutcome::Failed);
        assert!(puffer.is_empty());

        puffer.push(Bytes::from_static(b"abc"));
        assert_eq!(puffer.record(Ok(0)), FlushOutcome::Failed);
    }

    #[test]
    fn nicht_beschreibbar_nach_teil_write_wird_wiederholt() {
        let mut puffer = SendBuffer::new();
        puffer.push(Bytes::from_static(b"abcdef"));
        assert_eq!(puffer.record(Ok(2)), FlushOutcome::Pending { remaining: 4 });
        assert_eq!(puffer.record(would_block()), FlushOutcome::Pending { remaining: 4 });
        assert_eq!(puffer.pending(), b"cdef");
        assert_eq!(puffer.record(Ok(4)), FlushOutcome::Complete);
    }

    #[test]
    fn io_fehler_verwirft_nur_vorderste_payload() {
        let mut puffer = SendBuffer::new();
        puffer.push(Bytes::from_static(b"erste"));
        puffer.push(Bytes::from_static(b"zweite"));
        puffer.record(Ok(2));

        let fehler = io::Error::from(io::ErrorKind::BrokenPipe);
        assert_eq!(puffer.record(Err(fehler)), FlushOutcome::Failed);
        assert_eq!(puffer.len(), 1);
        assert_eq!(puffer.pending(), b"zweite");
    }

    #[test]
    fn payloads_bleiben_getrennt() {
        let mut puffer = SendBuffer::new();
        puffer.push(Bytes::from_static(b"a"));
        puffer.push(Bytes::from_static(b"b"));
        assert_eq!(puffer.pending(), b"a");
        puffer.record(Ok(1));
        assert_eq!(puffer.pending(), b"b");
        assert_eq!(puffer.clear(), 1);
        assert!(puffer.pending().is_empty());
    }
}
