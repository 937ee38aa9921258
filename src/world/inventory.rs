//! Read-only weapon inventory

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponSlot {
    Primary,
    Secondary,
    Melee,
}

/// How a weapon delivers damage; keys the engagement ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponCategory {
    Melee,
    /// Short sustained stream (flamethrowers)
    SustainedArea,
    /// Scoped long-range precision
    PrecisionLong,
    /// Rockets, grenades, stickies
    ExplosiveSplash,
    /// Everything else: shotguns, pistols, miniguns
    Hitscan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub id: WeaponId,
    pub slot: WeaponSlot,
    pub category: WeaponCategory,
    /// Rounds loaded
    pub clip: u32,
    /// 0 for weapons that draw straight from reserve
    pub clip_size: u32,
    /// Rounds carried but not loaded
    pub reserve: u32,
}

impl Weapon {
    pub fn new(
        id: WeaponId,
        slot: WeaponSlot,
        category: WeaponCategory,
        clip_size: u32,
        reserve: u32,
    ) -> Self {
        Self {
            id,
            slot,
            category,
            clip: clip_size,
            clip_size,
            reserve,
        }
    }

    pub fn melee(id: WeaponId) -> Self {
        Self::new(id, WeaponSlot::Melee, WeaponCategory::Melee, 0, 0)
    }

    pub fn is_melee(&self) -> bool {
        self.category == WeaponCategory::Melee
    }

    /// Can fire right now without reloading
    pub fn is_loaded(&self) -> bool {
        if self.is_melee() {
            return true;
        }
        if self.clip_size == 0 {
            self.reserve > 0
        } else {
            self.clip > 0
        }
    }

    /// Has any ammunition at all, loaded or not
    pub fn has_ammo(&self) -> bool {
        self.is_melee() || self.clip > 0 || self.reserve > 0
    }
}

/// Weapons carried by one participant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Loadout {
    pub weapons: Vec<Weapon>,
    pub active: Option<WeaponId>,
}

impl Loadout {
    pub fn new(weapons: Vec<Weapon>) -> Self {
        let active = weapons.first().map(|w| w.id);
        Self { weapons, active }
    }

    pub fn get(&self, id: WeaponId) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn get_mut(&mut self, id: WeaponId) -> Option<&mut Weapon> {
        self.weapons.iter_mut().find(|w| w.id == id)
    }

    pub fn in_slot(&self, slot: WeaponSlot) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.slot == slot)
    }

    pub fn active_weapon(&self) -> Option<&Weapon> {
        self.active.and_then(|id| self.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_melee_always_loaded() {
        let bat = Weapon::melee(WeaponId(3));
        assert!(bat.is_loaded());
        assert!(bat.has_ammo());
    }

    #[test]
    fn test_empty_clip_with_reserve() {
        let mut shotgun =
            Weapon::new(WeaponId(1), WeaponSlot::Primary, WeaponCategory::Hitscan, 6, 32);
        shotgun.clip = 0;
        assert!(!shotgun.is_loaded());
        assert!(shotgun.has_ammo());
        shotgun.reserve = 0;
        assert!(!shotgun.has_ammo());
    }

    #[test]
    fn test_clipless_weapon_draws_reserve() {
        let flamer =
            Weapon::new(WeaponId(1), WeaponSlot::Primary, WeaponCategory::SustainedArea, 0, 200);
        assert!(flamer.is_loaded());
    }

    #[test]
    fn test_loadout_defaults_active_to_first() {
        let loadout = Loadout::new(vec![
            Weapon::new(WeaponId(1), WeaponSlot::Primary, WeaponCategory::ExplosiveSplash, 4, 20),
            Weapon::melee(WeaponId(2)),
        ]);
        assert_eq!(loadout.active, Some(WeaponId(1)));
        assert_eq!(loadout.in_slot(WeaponSlot::Melee).map(|w| w.id), Some(WeaponId(2)));
    }
}
