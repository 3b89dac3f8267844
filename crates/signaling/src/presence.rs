//! Teilnehmer-Registry – Wer ist im Raum und wer publiziert?
//!
//! Haelt die UID -> Publishing-Zuordnung der entfernten Teilnehmer. Der
//! lokale Teilnehmer wird vor jedem Eintrag herausgefiltert und ist nie
//! Teil der Registry. Aenderungen werden als [`ParticipantEvent`]s
//! zurueckgegeben, damit der Dispatch-Pfad sie in Ankunftsreihenfolge
//! weiterreichen kann.

use krtc_core::{ParticipantMap, Uid};

// ---------------------------------------------------------------------------
// Registry-Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantEvent {
    /// Teilnehmer erstmals gesehen
    Appeared { uid: Uid, publishing: bool },
    /// Bekannter Teilnehmer mit neuem Publishing-Flag
    Updated { uid: Uid, publishing: bool },
    /// Teilnehmer hat den Raum verlassen
    Removed { uid: Uid, publishing: bool },
}

impl ParticipantEvent {
    pub fn uid(&self) -> &Uid {
        match self {
            Self::Appeared { uid, .. } | Self::Updated { uid, .. } | Self::Removed { uid, .. } => {
                uid
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ParticipantRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    local_uid: Option<Uid>,
    entries: ParticipantMap,
}

impl ParticipantRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Leert die Registry und setzt den lokalen Teilnehmer fuer einen neuen Raum
    pub fn reset(&mut self, local_uid: Uid) {
        self.entries.clear();
        self.local_uid = Some(local_uid);
    }

    pub fn local_uid(&self) -> Option<&Uid> {
        self.local_uid.as_ref()
    }

    /// Uebernimmt eine Teilnehmerliste
    ///
    /// Eintraege werden mit dem bestehenden Stand zusammengefuehrt. Fuer
    /// jeden Teilnehmer, der dadurch neu publizierend wird, entsteht genau
    /// ein `Appeared`-Event; doppelte Eintraege in der Liste zaehlen einmal.
    /// Wer vorher publizierte und jetzt nicht mehr, ergibt ein `Updated`
    /// mit `publishing = false`.
    pub fn apply_snapshot<I>(&mut self, entries: I) -> Vec<ParticipantEvent>
    where
        I: IntoIterator<Item = (Uid, bool)>,
    {
        let mut events = Vec::new();
        for (uid, publishing) in entries {
            if !self.is_remote(&uid) {
                continue;
            }
            let vorher = self.entries.insert(uid.clone(), publishing);
            if publishing && vorher != Some(true) {
                events.push(ParticipantEvent::Appeared { uid, publishing });
            } else if !publishing && vorher == Some(true) {
                events.push(ParticipantEvent::Updated { uid, publishing });
            }
        }

        tracing::debug!(
            teilnehmer = self.entries.len(),
            neu_publizierend = events.len(),
            "Teilnehmerliste uebernommen"
        );
        events
    }

    /// Uebernimmt eine einzelne Aenderung
    ///
    /// Gibt `None` nur fuer den lokalen Teilnehmer oder eine leere UID zurueck.
    pub fn apply_delta(
        &mut self,
        uid: Uid,
        publishing: bool,
        removed: bool,
    ) -> Option<ParticipantEvent> {
        if !self.is_remote(&uid) {
            return None;
        }

        if removed {
            let publishing = self.entries.remove(&uid).unwrap_or(publishing);
            tracing::debug!(uid = %uid, "Teilnehmer entfernt");
            return Some(ParticipantEvent::Removed { uid, publishing });
        }

        let event = match self.entries.insert(uid.clone(), publishing) {
            None => ParticipantEvent::Appeared { uid, publishing },
            Some(_) => ParticipantEvent::Updated { uid, publishing },
        };
        tracing::debug!(uid = %event.uid(), publishing, "Teilnehmer aktualisiert");
        Some(event)
    }

    /// Entfernt alle Teilnehmer und gibt den letzten Stand zurueck
    pub fn clear(&mut self) -> ParticipantMap {
        std::mem::take(&mut self.entries)
    }

    pub fn snapshot(&self) -> ParticipantMap {
        self.entries.clone()
    }

    pub fn is_publishing(&self, uid: &Uid) -> Option<bool> {
        self.entries.get(uid).copied()
    }

    pub fn contains(&self, uid: &Uid) -> bool {
        self.entries.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_remote(&self, uid: &Uid) -> bool {
        !uid.is_empty() && self.local_uid.as_ref() != Some(uid)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
