//! Einmal-Rendezvous zwischen I/O-Thread und blockierendem Aufrufer
//!
//! Der Aufrufer schaltet das Rendezvous mit [`Rendezvous::arm`] scharf und
//! wartet auf dem zurueckgegebenen [`Waiter`]. Das erste
//! [`Rendezvous::resolve`] danach liefert den Wert aus, jedes weitere wird
//! verworfen. Das Warten ist immer durch ein Zeitlimit begrenzt.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

/// Ausgang eines begrenzten Wartens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    Timeout,
    /// Rendezvous wurde entschaerft oder neu scharf geschaltet
    Disarmed,
}

pub struct Rendezvous<T> {
    slot: Mutex<Option<Sender<T>>>,
}

impl<T> Rendezvous<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Schaltet scharf; ein zuvor wartender Waiter sieht `Disarmed`
    pub fn arm(&self) -> Waiter<T> {
        let (tx, rx) = bounded(1);
        *self.slot.lock() = Some(tx);
        Waiter { rx }
    }

    /// Loest das Rendezvous einmalig auf
    ///
    /// Gibt `false` zurueck wenn niemand wartet oder bereits aufgeloest wurde.
    pub fn resolve(&self, value: T) -> bool {
        match self.slot.lock().take() {
            Some(tx) => tx.try_send(value).is_ok(),
            None => false,
        }
    }

    pub fn disarm(&self) {
        self.slot.lock().take();
    }

    pub fn is_armed(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl<T> Default for Rendezvous<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Waiter<T> {
    rx: Receiver<T>,
}

impl<T> Waiter<T> {
    pub fn wait(self, timeout: Duration) -> Result<T, WaitError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => WaitError::Timeout,
            RecvTimeoutError::Disconnected => WaitError::Disarmed,
        })
    }
}
