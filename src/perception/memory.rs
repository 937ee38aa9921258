//! Known-entity memory with recency and forgetting

use ahash::AHashMap;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{EntityHandle, Seconds};

/// A subject an agent has recognized and still remembers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownEntity {
    pub subject: EntityHandle,
    pub first_seen: Seconds,
    pub last_seen: Seconds,
    pub visible: bool,
    /// Danger score cached at the last sighting
    pub danger: f32,
    pub last_known_position: Vec3,
}

impl KnownEntity {
    pub fn time_since_seen(&self, now: Seconds) -> Seconds {
        now - self.last_seen
    }
}

/// One agent's remembered subjects, at most one record per subject
#[derive(Debug, Clone, Default)]
pub struct KnownEntityMemory {
    entries: AHashMap<EntityHandle, KnownEntity>,
}

impl KnownEntityMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or refresh the record for a sighted subject
    ///
    /// Returns true when the subject was not remembered before.
    pub fn record_sighting(
        &mut self,
        subject: EntityHandle,
        position: Vec3,
        danger: f32,
        now: Seconds,
    ) -> bool {
        match self.entries.get_mut(&subject) {
            Some(known) => {
                known.last_seen = known.last_seen.max(now);
                known.visible = true;
                known.danger = danger;
                known.last_known_position = position;
                false
            }
            None => {
                self.entries.insert(
                    subject,
                    KnownEntity {
                        subject,
                        first_seen: now,
                        last_seen: now,
                        visible: true,
                        danger,
                        last_known_position: position,
                    },
                );
                true
            }
        }
    }

    /// Line of sight lost; the record stays until it times out
    pub fn mark_unseen(&mut self, subject: EntityHandle) {
        if let Some(known) = self.entries.get_mut(&subject) {
            known.visible = false;
        }
    }

    pub fn forget(&mut self, subject: EntityHandle) -> bool {
        self.entries.remove(&subject).is_some()
    }

    /// Drop records unseen for longer than `forget_time`
    pub fn purge_stale(&mut self, now: Seconds, forget_time: Seconds) -> Vec<EntityHandle> {
        let mut stale: Vec<EntityHandle> = self
            .entries
            .values()
            .filter(|known| known.time_since_seen(now) > forget_time)
            .map(|known| known.subject)
            .collect();
        stale.sort_unstable();
        for subject in &stale {
            self.entries.remove(subject);
        }
        stale
    }

    pub fn get(&self, subject: EntityHandle) -> Option<&KnownEntity> {
        self.entries.get(&subject)
    }

    pub fn contains(&self, subject: EntityHandle) -> bool {
        self.entries.contains_key(&subject)
    }

    pub fn is_visible(&self, subject: EntityHandle) -> bool {
        self.entries.get(&subject).is_some_and(|k| k.visible)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnownEntity> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
