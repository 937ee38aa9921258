//! Weapon selection and engagement ranges
//!
//! Priority, highest first: the required-weapon override stack, the global
//! restriction, ammunition, then per-role range preferences.

use serde::{Deserialize, Serialize};

use crate::core::config::WeaponConfig;
use crate::core::types::{Role, Seconds};
use crate::world::{Loadout, WeaponCategory, WeaponId, WeaponSlot};

/// Scenario-imposed limit on usable weapons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponRestriction {
    #[default]
    Unrestricted,
    MeleeOnly,
    PrimaryOnly,
    SecondaryOnly,
}

impl WeaponRestriction {
    fn slot(&self) -> Option<WeaponSlot> {
        match self {
            WeaponRestriction::Unrestricted => None,
            WeaponRestriction::MeleeOnly => Some(WeaponSlot::Melee),
            WeaponRestriction::PrimaryOnly => Some(WeaponSlot::Primary),
            WeaponRestriction::SecondaryOnly => Some(WeaponSlot::Secondary),
        }
    }
}

/// Weapons that must be used, most recent on top
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredWeaponStack {
    stack: Vec<WeaponId>,
}

impl RequiredWeaponStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, weapon: WeaponId) {
        self.stack.push(weapon);
    }

    pub fn pop(&mut self) -> Option<WeaponId> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<WeaponId> {
        self.stack.last().copied()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Top override still present in the loadout
    ///
    /// Overrides naming weapons the agent no longer carries are popped.
    pub fn resolve(&mut self, loadout: &Loadout) -> Option<WeaponId> {
        while let Some(top) = self.top() {
            if loadout.get(top).is_some() {
                return Some(top);
            }
            tracing::debug!("Dropping required weapon {:?}, no longer carried", top);
            self.stack.pop();
        }
        None
    }
}

/// Combat situation the policy reacts to
#[derive(Debug, Clone, Copy)]
pub struct WeaponContext {
    pub role: Role,
    /// Distance to the current primary threat
    pub threat_range: Option<f32>,
    /// Seconds since any threat was last seen
    pub since_threat: Seconds,
}

impl WeaponContext {
    fn is_threat_close(&self, config: &WeaponConfig) -> bool {
        self.since_threat <= config.no_threat_reload_time
            && self.threat_range.is_some_and(|r| r < config.close_threat_range)
    }
}

/// Weapon the agent should hold this tick
pub fn select_weapon(
    loadout: &Loadout,
    restriction: WeaponRestriction,
    overrides: &mut RequiredWeaponStack,
    context: &WeaponContext,
    config: &WeaponConfig,
) -> Option<WeaponId> {
    if let Some(required) = overrides.resolve(loadout) {
        return Some(required);
    }

    if let Some(slot) = restriction.slot() {
        if let Some(weapon) = loadout.in_slot(slot) {
            return Some(weapon.id);
        }
    }

    default_weapon(loadout, context, config)
}

/// Policy choice ignoring overrides and restrictions
pub fn default_weapon(
    loadout: &Loadout,
    context: &WeaponContext,
    config: &WeaponConfig,
) -> Option<WeaponId> {
    let primary = loadout.in_slot(WeaponSlot::Primary).filter(|w| w.has_ammo());
    let backup = loadout
        .in_slot(WeaponSlot::Secondary)
        .filter(|w| w.is_loaded());
    let close = context.is_threat_close(config);

    if let Some(primary) = primary {
        if let Some(backup) = backup {
            if close && !primary.is_loaded() {
                return Some(backup.id);
            }
            // scoped rifles are useless up close
            if close
                && context.role == Role::Sniper
                && primary.category == WeaponCategory::PrecisionLong
            {
                return Some(backup.id);
            }
        }
        return Some(primary.id);
    }

    if let Some(secondary) = loadout.in_slot(WeaponSlot::Secondary).filter(|w| w.has_ammo()) {
        return Some(secondary.id);
    }

    loadout
        .in_slot(WeaponSlot::Melee)
        .or_else(|| loadout.weapons.first())
        .map(|w| w.id)
}

/// Farthest distance worth attacking from with a weapon category
pub fn max_attack_range(category: WeaponCategory, config: &WeaponConfig) -> f32 {
    match category {
        WeaponCategory::Melee => config.melee_max_range,
        WeaponCategory::SustainedArea => config.sustained_max_range,
        WeaponCategory::PrecisionLong => f32::INFINITY,
        WeaponCategory::ExplosiveSplash => config.splash_max_range,
        WeaponCategory::Hitscan => f32::INFINITY,
    }
}

/// Distance the agent tries to hold while attacking
pub fn desired_attack_range(category: WeaponCategory, config: &WeaponConfig) -> f32 {
    match category {
        WeaponCategory::Melee => config.melee_desired_range,
        WeaponCategory::SustainedArea => config.sustained_desired_range,
        WeaponCategory::PrecisionLong => f32::INFINITY,
        WeaponCategory::ExplosiveSplash => config.splash_desired_range,
        WeaponCategory::Hitscan => f32::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Weapon;

    const ROCKETS: WeaponId = WeaponId(1);
    const SHOTGUN: WeaponId = WeaponId(2);
    const SHOVEL: WeaponId = WeaponId(3);

    fn soldier_loadout() -> Loadout {
        Loadout::new(vec![
            Weapon::new(ROCKETS, WeaponSlot::Primary, WeaponCategory::ExplosiveSplash, 4, 20),
            Weapon::new(SHOTGUN, WeaponSlot::Secondary, WeaponCategory::Hitscan, 6, 32),
            Weapon::melee(SHOVEL),
        ])
    }

    fn context(role: Role, threat_range: Option<f32>) -> WeaponContext {
        WeaponContext {
            role,
            threat_range,
            since_threat: if threat_range.is_some() { 0.0 } else { 60.0 },
        }
    }

    fn pick(
        loadout: &Loadout,
        restriction: WeaponRestriction,
        stack: &mut RequiredWeaponStack,
        ctx: &WeaponContext,
    ) -> Option<WeaponId> {
        select_weapon(loadout, restriction, stack, ctx, &WeaponConfig::default())
    }

    #[test]
    fn test_primary_by_default() {
        let loadout = soldier_loadout();
        let mut stack = RequiredWeaponStack::new();
        let ctx = context(Role::Soldier, Some(800.0));
        assert_eq!(
            pick(&loadout, WeaponRestriction::Unrestricted, &mut stack, &ctx),
            Some(ROCKETS)
        );
    }

    #[test]
    fn test_empty_clip_close_threat_switches_to_backup() {
        let mut loadout = soldier_loadout();
        if let Some(rockets) = loadout.get_mut(ROCKETS) {
            rockets.clip = 0;
        }
        let mut stack = RequiredWeaponStack::new();

        let close = context(Role::Soldier, Some(200.0));
        assert_eq!(
            pick(&loadout, WeaponRestriction::Unrestricted, &mut stack, &close),
            Some(SHOTGUN)
        );

        // nothing around: go back to the primary so it reloads
        let quiet = context(Role::Soldier, None);
        assert_eq!(
            pick(&loadout, WeaponRestriction::Unrestricted, &mut stack, &quiet),
            Some(ROCKETS)
        );
    }

    #[test]
    fn test_out_of_ammo_falls_to_melee() {
        let mut loadout = soldier_loadout();
        for weapon in loadout.weapons.iter_mut() {
            weapon.clip = 0;
            weapon.reserve = 0;
        }
        let mut stack = RequiredWeaponStack::new();
        let ctx = context(Role::Soldier, Some(100.0));
        assert_eq!(pick(&loadout, WeaponRestriction::Unrestricted, &mut stack, &ctx), Some(SHOVEL));
    }

    #[test]
    fn test_restriction_applies() {
        let loadout = soldier_loadout();
        let mut stack = RequiredWeaponStack::new();
        let ctx = context(Role::Soldier, Some(800.0));
        assert_eq!(pick(&loadout, WeaponRestriction::MeleeOnly, &mut stack, &ctx), Some(SHOVEL));
        assert_eq!(
            pick(&loadout, WeaponRestriction::SecondaryOnly, &mut stack, &ctx),
            Some(SHOTGUN)
        );
    }

    #[test]
    fn test_override_beats_restriction() {
        let loadout = soldier_loadout();
        let mut stack = RequiredWeaponStack::new();
        stack.push(SHOTGUN);
        let ctx = context(Role::Soldier, Some(800.0));
        assert_eq!(pick(&loadout, WeaponRestriction::MeleeOnly, &mut stack, &ctx), Some(SHOTGUN));
    }

    #[test]
    fn test_push_pop_restores_outcome() {
        let loadout = soldier_loadout();
        let mut stack = RequiredWeaponStack::new();
        let ctx = context(Role::Soldier, Some(300.0));
        let before = pick(&loadout, WeaponRestriction::Unrestricted, &mut stack, &ctx);

        stack.push(SHOVEL);
        assert_eq!(pick(&loadout, WeaponRestriction::Unrestricted, &mut stack, &ctx), Some(SHOVEL));
        stack.pop();

        assert_eq!(pick(&loadout, WeaponRestriction::Unrestricted, &mut stack, &ctx), before);
    }

    #[test]
    fn test_missing_override_popped() {
        let loadout = soldier_loadout();
        let mut stack = RequiredWeaponStack::new();
        stack.push(SHOTGUN);
        stack.push(WeaponId(99));
        let ctx = context(Role::Soldier, None);
        assert_eq!(
            pick(&loadout, WeaponRestriction::Unrestricted, &mut stack, &ctx),
            Some(SHOTGUN)
        );
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_sniper_backs_off_scope_up_close() {
        let loadout = Loadout::new(vec![
            Weapon::new(WeaponId(10), WeaponSlot::Primary, WeaponCategory::PrecisionLong, 25, 0),
            Weapon::new(WeaponId(11), WeaponSlot::Secondary, WeaponCategory::Hitscan, 25, 75),
        ]);
        let mut stack = RequiredWeaponStack::new();
        let near = context(Role::Sniper, Some(300.0));
        let far = context(Role::Sniper, Some(3000.0));
        assert_eq!(
            pick(&loadout, WeaponRestriction::Unrestricted, &mut stack, &near),
            Some(WeaponId(11))
        );
        assert_eq!(
            pick(&loadout, WeaponRestriction::Unrestricted, &mut stack, &far),
            Some(WeaponId(10))
        );
    }

    #[test]
    fn test_attack_ranges_by_category() {
        let config = WeaponConfig::default();
        assert_eq!(max_attack_range(WeaponCategory::Melee, &config), 100.0);
        assert_eq!(max_attack_range(WeaponCategory::SustainedArea, &config), 350.0);
        assert!(max_attack_range(WeaponCategory::PrecisionLong, &config).is_infinite());
        assert_eq!(max_attack_range(WeaponCategory::ExplosiveSplash, &config), 3000.0);
        assert!(max_attack_range(WeaponCategory::Hitscan, &config).is_infinite());
        assert!(desired_attack_range(WeaponCategory::Hitscan, &config).is_infinite());
        assert_eq!(desired_attack_range(WeaponCategory::Melee, &config), 50.0);
    }
}
