//! Pull-Slot-Verwaltung
//!
//! Feste Anzahl Slots, jeder Slot haelt hoechstens eine Pull-Session.
//! Vergeben wird immer der niedrigste freie Index.

use krtc_core::{Channel, Uid};

use crate::media::MediaHandler;

pub(crate) struct PullSlot {
    pub uid: Uid,
    pub channel: Channel,
    pub handler: Box<dyn MediaHandler>,
}

/// Sicht auf einen belegten Slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullSlotInfo {
    pub index: usize,
    pub uid: Uid,
    pub channel: Channel,
}

pub struct SlotPool {
    slots: Vec<Option<PullSlot>>,
}

impl SlotPool {
    pub fn neu(kapazitaet: usize) -> Self {
        let mut slots = Vec::with_capacity(kapazitaet);
        slots.resize_with(kapazitaet, || None);
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.lowest_free().is_none()
    }

    pub fn lowest_free(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    pub fn index_of(&self, uid: &Uid) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|slot| &slot.uid == uid))
    }

    pub fn contains(&self, uid: &Uid) -> bool {
        self.index_of(uid).is_some()
    }

    /// Belegt einen freien Slot. Gibt den Slot zurueck, falls der Index
    /// ungueltig oder bereits belegt ist.
    pub(crate) fn occupy(&mut self, index: usize, slot: PullSlot) -> Result<(), PullSlot> {
        match self.slots.get_mut(index) {
            Some(eintrag @ None) => {
                *eintrag = Some(slot);
                Ok(())
            }
            _ => Err(slot),
        }
    }

    pub(crate) fn release(&mut self, uid: &Uid) -> Option<(usize, PullSlot)> {
        let index = self.index_of(uid)?;
        self.slots[index].take().map(|slot| (index, slot))
    }

    /// Leert alle Slots in aufsteigender Reihenfolge
    pub(crate) fn drain(&mut self) -> Vec<(usize, PullSlot)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, eintrag)| eintrag.take().map(|slot| (index, slot)))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<PullSlotInfo> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, eintrag)| {
                eintrag.as_ref().map(|slot| PullSlotInfo {
                    index,
                    uid: slot.uid.clone(),
                    channel: slot.channel.clone(),
                })
            })
            .collect()
    }
}
