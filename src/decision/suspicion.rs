//! Suspicion of disguised and hidden hostiles
//!
//! Each observed subject is `Unknown`, `Suspected` or `Known`. Contacts are
//! recorded per whole second; a subject is unmasked once every one-second
//! slot of the trailing window holds at least one contact.

use std::collections::BTreeSet;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::config::SuspicionConfig;
use crate::core::types::{whole_second, EntityHandle, Seconds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpyStatus {
    Unknown,
    Suspected,
    Known,
}

/// Contact history for one suspected subject
#[derive(Debug, Clone, Default)]
pub struct SuspicionRecord {
    /// Whole seconds with at least one contact
    contacts: BTreeSet<i64>,
    last_contact: Seconds,
}

impl SuspicionRecord {
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn last_contact(&self) -> Seconds {
        self.last_contact
    }

    fn prune(&mut self, newest_slot: i64, window: u32) {
        let oldest = newest_slot - window as i64 + 1;
        self.contacts.retain(|slot| *slot >= oldest);
    }

    fn covers_window(&self, newest_slot: i64, window: u32) -> bool {
        let oldest = newest_slot - window as i64 + 1;
        (oldest..=newest_slot).all(|slot| self.contacts.contains(&slot))
    }
}

/// Outcome of recording a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Suspected,
    Escalated,
    AlreadyKnown,
}

/// One agent's suspicion state over every subject it has bumped into
#[derive(Debug, Clone, Default)]
pub struct SuspicionTracker {
    records: AHashMap<EntityHandle, SuspicionRecord>,
    known: AHashSet<EntityHandle>,
}

impl SuspicionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, subject: EntityHandle) -> SpyStatus {
        if self.known.contains(&subject) {
            SpyStatus::Known
        } else if self.records.contains_key(&subject) {
            SpyStatus::Suspected
        } else {
            SpyStatus::Unknown
        }
    }

    pub fn is_known(&self, subject: EntityHandle) -> bool {
        self.known.contains(&subject)
    }

    /// Subjects this agent has unmasked
    pub fn known(&self) -> &AHashSet<EntityHandle> {
        &self.known
    }

    pub fn record(&self, subject: EntityHandle) -> Option<&SuspicionRecord> {
        self.records.get(&subject)
    }

    /// Record a suspicious contact and check for escalation
    pub fn record_contact(
        &mut self,
        subject: EntityHandle,
        now: Seconds,
        config: &SuspicionConfig,
    ) -> ContactOutcome {
        if self.known.contains(&subject) {
            return ContactOutcome::AlreadyKnown;
        }

        let slot = whole_second(now);
        let record = self.records.entry(subject).or_default();
        record.contacts.insert(slot);
        record.last_contact = record.last_contact.max(now);
        record.prune(slot, config.window_seconds);

        if record.covers_window(slot, config.window_seconds) {
            self.realize(subject);
            ContactOutcome::Escalated
        } else {
            ContactOutcome::Suspected
        }
    }

    /// Move a subject into `Suspected` without a contact
    ///
    /// Returns false when the subject was already suspected or known.
    pub fn suspect(&mut self, subject: EntityHandle, now: Seconds) -> bool {
        if self.known.contains(&subject) || self.records.contains_key(&subject) {
            return false;
        }
        self.records.insert(
            subject,
            SuspicionRecord {
                contacts: BTreeSet::new(),
                last_contact: now,
            },
        );
        true
    }

    /// Unmask a subject immediately
    ///
    /// Returns true when the subject was not already known.
    pub fn realize(&mut self, subject: EntityHandle) -> bool {
        self.records.remove(&subject);
        self.known.insert(subject)
    }

    /// Drop every fact about a subject
    pub fn forget(&mut self, subject: EntityHandle) {
        self.records.remove(&subject);
        self.known.remove(&subject);
    }

    /// Expire suspected records with no recent contact
    pub fn update(&mut self, now: Seconds, config: &SuspicionConfig) -> Vec<EntityHandle> {
        let expired: Vec<EntityHandle> = self
            .records
            .iter()
            .filter(|(_, record)| now - record.last_contact > config.cooldown)
            .map(|(subject, _)| *subject)
            .collect();
        for subject in &expired {
            self.records.remove(subject);
        }
        expired
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.known.clear();
    }
}
