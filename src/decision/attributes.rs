//! Capability tags attached to an agent

use serde::{Deserialize, Serialize};

/// One independent behavior flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BotAttribute {
    /// Never treats anyone as a threat
    IgnoreEnemies,
    AlwaysCritical,
    /// Aims but never fires
    SuppressFire,
    DisableEvasion,
    RemoveOnDeath,
    BecomeSpectatorOnDeath,
    /// Structures survive the owner leaving the simulation
    RetainStructures,
    /// Holds position instead of chasing
    HoldPosition,
    /// Keeps shooting without waiting for a target in range
    AlwaysFireWeapon,
}

impl BotAttribute {
    pub const ALL: [BotAttribute; 9] = [
        BotAttribute::IgnoreEnemies,
        BotAttribute::AlwaysCritical,
        BotAttribute::SuppressFire,
        BotAttribute::DisableEvasion,
        BotAttribute::RemoveOnDeath,
        BotAttribute::BecomeSpectatorOnDeath,
        BotAttribute::RetainStructures,
        BotAttribute::HoldPosition,
        BotAttribute::AlwaysFireWeapon,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Set of [`BotAttribute`] tags, serialized as a list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<BotAttribute>", into = "Vec<BotAttribute>")]
pub struct AttributeSet {
    bits: u32,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attribute: BotAttribute) {
        self.bits |= attribute.bit();
    }

    pub fn remove(&mut self, attribute: BotAttribute) {
        self.bits &= !attribute.bit();
    }

    pub fn contains(&self, attribute: BotAttribute) -> bool {
        self.bits & attribute.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn clear(&mut self) {
        self.bits = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = BotAttribute> + '_ {
        BotAttribute::ALL.into_iter().filter(|a| self.contains(*a))
    }
}

impl FromIterator<BotAttribute> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = BotAttribute>>(iter: I) -> Self {
        let mut set = AttributeSet::new();
        for attribute in iter {
            set.insert(attribute);
        }
        set
    }
}

impl From<Vec<BotAttribute>> for AttributeSet {
    fn from(list: Vec<BotAttribute>) -> Self {
        list.into_iter().collect()
    }
}

impl From<AttributeSet> for Vec<BotAttribute> {
    fn from(set: AttributeSet) -> Self {
        set.iter().collect()
    }
}
