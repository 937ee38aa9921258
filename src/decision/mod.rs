//! Agent decision core
//!
//! Owns everything an agent decides for itself: mission, behavior tags,
//! weapon choice, the primary threat, spy suspicion, sniper vantage spots
//! and its standing in a squad formation. Perception feeds it memory and
//! events; it hands back a [`DecisionOutput`] for locomotion and the host.

pub mod attributes;
pub mod mission;
pub mod suspicion;
pub mod threat;
pub mod vantage;
pub mod weapon;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::config::{BotConfig, MissionProfile, SuspicionConfig, WeaponConfig};
use crate::core::timer::IntervalTimer;
use crate::core::types::{Difficulty, EntityHandle, Role, Seconds, Team};
use crate::nav::NavGraph;
use crate::perception::{
    ForgetReason, IgnoreCategory, KnownEntityMemory, NoticeCause, PerceptionEvent,
};
use crate::squad::MemberFormation;
use crate::world::{Loadout, WeaponId, WorldQuery};

pub use attributes::{AttributeSet, BotAttribute};
pub use mission::{Mission, MissionState};
pub use suspicion::{ContactOutcome, SpyStatus, SuspicionTracker};
pub use threat::{select_primary_threat, Threat};
pub use vantage::{VantageFinder, VantageSpot};
pub use weapon::{
    desired_attack_range, max_attack_range, select_weapon, RequiredWeaponStack, WeaponContext,
    WeaponRestriction,
};

/// What the world looks like to the decision core this tick
pub struct DecisionInput<'a> {
    pub position: Vec3,
    pub memory: &'a KnownEntityMemory,
    pub loadout: &'a Loadout,
    /// Current objective marker, if the scenario has one
    pub objective: Option<Vec3>,
    pub defending: bool,
    /// Where a squad follower should stand; `None` when leading or solo
    pub formation_slot: Option<Vec3>,
    pub nav: &'a dyn NavGraph,
    pub world: &'a dyn WorldQuery,
}

/// Per-tick decisions handed to locomotion and the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutput {
    pub threat: Option<Threat>,
    pub weapon: Option<WeaponId>,
    pub fire: bool,
    pub critical: bool,
    pub move_goal: Option<Vec3>,
}

/// Squad-relevant movement state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FormationState {
    pub error: f32,
    pub broke_formation: bool,
    pub stuck: bool,
}

/// Per-agent decision state
#[derive(Debug, Clone)]
pub struct DecisionCore {
    handle: EntityHandle,
    team: Team,
    role: Role,
    difficulty: Difficulty,
    mission: MissionState,
    attributes: AttributeSet,
    ignored: Vec<IgnoreCategory>,
    restriction: WeaponRestriction,
    required_weapons: RequiredWeaponStack,
    suspicion: SuspicionTracker,
    vantage: VantageFinder,
    threat: Option<Threat>,
    threat_seen: IntervalTimer,
    weapon: Option<WeaponId>,
    formation: FormationState,
    weapons_config: WeaponConfig,
    suspicion_config: SuspicionConfig,
}

impl DecisionCore {
    pub fn new(
        handle: EntityHandle,
        team: Team,
        role: Role,
        difficulty: Difficulty,
        config: &BotConfig,
    ) -> Self {
        Self {
            handle,
            team,
            role,
            difficulty,
            mission: MissionState::default(),
            attributes: AttributeSet::new(),
            ignored: Vec::new(),
            restriction: WeaponRestriction::default(),
            required_weapons: RequiredWeaponStack::new(),
            suspicion: SuspicionTracker::new(),
            vantage: VantageFinder::new(
                config.vantage.clone(),
                config.seed ^ (handle.0 as u64).rotate_left(17),
            ),
            threat: None,
            threat_seen: IntervalTimer::new(),
            weapon: None,
            formation: FormationState::default(),
            weapons_config: config.weapons.clone(),
            suspicion_config: config.suspicion.clone(),
        }
    }

    /// Adopt a spawn profile's mission and behavior flags
    pub fn apply_profile(&mut self, profile: &MissionProfile) {
        self.mission.set(profile.mission, true);
        self.attributes = profile.attributes;
        self.restriction = profile.restriction;
        self.ignored = profile.ignore.clone();
    }

    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn set_team(&mut self, team: Team) {
        self.team = team;
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn mission(&self) -> Mission {
        self.mission.current()
    }

    /// Scenario-triggered mission change
    pub fn set_mission(&mut self, mission: Mission, suppress_reset: bool) {
        let previous = self.mission.set(mission, suppress_reset);
        if previous != mission {
            tracing::debug!("Agent {} mission {:?} -> {:?}", self.handle, previous, mission);
            if previous == Mission::Sniper {
                self.vantage.invalidate();
            }
        }
    }

    /// Consume the pending behavior restart after a mission change
    pub fn take_behavior_reset(&mut self) -> bool {
        self.mission.take_behavior_reset()
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeSet {
        &mut self.attributes
    }

    pub fn has_attribute(&self, attribute: BotAttribute) -> bool {
        self.attributes.contains(attribute)
    }

    pub fn ignored(&self) -> &[IgnoreCategory] {
        &self.ignored
    }

    pub fn set_ignored(&mut self, ignored: Vec<IgnoreCategory>) {
        self.ignored = ignored;
    }

    pub fn restriction(&self) -> WeaponRestriction {
        self.restriction
    }

    pub fn set_restriction(&mut self, restriction: WeaponRestriction) {
        self.restriction = restriction;
    }

    pub fn push_required_weapon(&mut self, weapon: WeaponId) {
        self.required_weapons.push(weapon);
    }

    pub fn pop_required_weapon(&mut self) -> Option<WeaponId> {
        self.required_weapons.pop()
    }

    pub fn required_weapons(&self) -> &RequiredWeaponStack {
        &self.required_weapons
    }

    pub fn suspicion(&self) -> &SuspicionTracker {
        &self.suspicion
    }

    pub fn spy_status(&self, subject: EntityHandle) -> SpyStatus {
        self.suspicion.status(subject)
    }

    pub fn vantage(&self) -> &VantageFinder {
        &self.vantage
    }

    pub fn threat(&self) -> Option<&Threat> {
        self.threat.as_ref()
    }

    pub fn weapon(&self) -> Option<WeaponId> {
        self.weapon
    }

    pub fn formation(&self) -> FormationState {
        self.formation
    }

    pub fn set_formation_error(&mut self, error: f32) {
        self.formation.error = error;
    }

    pub fn set_broke_formation(&mut self, broke: bool) {
        self.formation.broke_formation = broke;
    }

    pub fn set_stuck(&mut self, stuck: bool) {
        self.formation.stuck = stuck;
    }

    /// Formation facts the squad coordinator reads
    pub fn member_formation(&self, alive: bool) -> MemberFormation {
        MemberFormation {
            error: self.formation.error,
            broke_formation: self.formation.broke_formation,
            stuck: self.formation.stuck,
            self_managed: self.role.self_manages_formation(),
            alive,
        }
    }

    /// Physical contact with a participant
    ///
    /// Returns the subject when the contact unmasked it.
    pub fn on_contact(&mut self, subject: EntityHandle, now: Seconds) -> Option<EntityHandle> {
        match self.suspicion.record_contact(subject, now, &self.suspicion_config) {
            ContactOutcome::Escalated => {
                tracing::debug!("Agent {} unmasked {}", self.handle, subject);
                Some(subject)
            }
            ContactOutcome::Suspected | ContactOutcome::AlreadyKnown => None,
        }
    }

    /// React to a perception event
    ///
    /// Returns a subject newly unmasked by it.
    pub fn on_perception_event(
        &mut self,
        event: &PerceptionEvent,
        now: Seconds,
    ) -> Option<EntityHandle> {
        match *event {
            PerceptionEvent::ForcedNotice {
                subject,
                cause: NoticeCause::Sabotage,
            } => self.suspicion.realize(subject).then_some(subject),
            PerceptionEvent::ForcedNotice { subject, .. } => self.on_contact(subject, now),
            PerceptionEvent::Forgotten {
                subject,
                reason: ForgetReason::DisguiseChanged | ForgetReason::Concealed,
            } => {
                self.suspicion.forget(subject);
                None
            }
            PerceptionEvent::Forgotten { .. } | PerceptionEvent::Recognized { .. } => None,
        }
    }

    /// A nearby ally unmasked `subject`
    ///
    /// Nudges it into suspicion and re-evaluates at once. Returns true when
    /// this agent did not already know; propagation does not cascade further.
    pub fn on_suspicion_shared(&mut self, subject: EntityHandle, now: Seconds) -> bool {
        if self.suspicion.is_known(subject) {
            return false;
        }
        self.suspicion.suspect(subject, now);
        self.suspicion.realize(subject)
    }

    /// Run this tick's decisions
    pub fn update(&mut self, input: &DecisionInput<'_>, now: Seconds) -> DecisionOutput {
        for expired in self.suspicion.update(now, &self.suspicion_config) {
            tracing::trace!("Agent {} no longer suspects {}", self.handle, expired);
        }

        let ignoring = self.attributes.contains(BotAttribute::IgnoreEnemies);
        self.threat = if ignoring {
            None
        } else {
            select_primary_threat(input.memory, input.position)
        };
        if self.threat.is_some_and(|t| t.visible) {
            self.threat_seen.start(now);
        }

        let context = WeaponContext {
            role: self.role,
            threat_range: self.threat.filter(|t| t.visible).map(|t| t.range),
            since_threat: self.threat_seen.elapsed(now),
        };
        self.weapon = select_weapon(
            input.loadout,
            self.restriction,
            &mut self.required_weapons,
            &context,
            &self.weapons_config,
        );

        let fire = self.should_fire(input.loadout);
        let move_goal = self.choose_move_goal(input, now);

        DecisionOutput {
            threat: self.threat,
            weapon: self.weapon,
            fire,
            critical: self.attributes.contains(BotAttribute::AlwaysCritical),
            move_goal,
        }
    }

    fn should_fire(&self, loadout: &Loadout) -> bool {
        if self.attributes.contains(BotAttribute::SuppressFire)
            || self.attributes.contains(BotAttribute::IgnoreEnemies)
        {
            return false;
        }
        if self.attributes.contains(BotAttribute::AlwaysFireWeapon) {
            return true;
        }
        let Some(threat) = self.threat.filter(|t| t.visible) else {
            return false;
        };
        let Some(weapon) = self.weapon.and_then(|id| loadout.get(id)) else {
            return false;
        };
        weapon.is_loaded()
            && threat.range <= max_attack_range(weapon.category, &self.weapons_config)
    }

    fn choose_move_goal(&mut self, input: &DecisionInput<'_>, now: Seconds) -> Option<Vec3> {
        if self.attributes.contains(BotAttribute::HoldPosition) {
            return None;
        }

        if self.mission.is(Mission::Sniper) {
            self.vantage
                .update(self.team, input.objective, input.defending, input.nav, input.world, now);
            if let Some(spot) = self.vantage.best() {
                return Some(spot.vantage);
            }
        }

        if self.mission.is(Mission::DestroyFortifications) {
            if let Some(target) = self.nearest_enemy_fortification(input) {
                return Some(target);
            }
        }

        if let Some(threat) = self.threat.filter(|t| t.visible) {
            let desired = self
                .weapon
                .and_then(|id| input.loadout.get(id))
                .map_or(f32::INFINITY, |w| desired_attack_range(w.category, &self.weapons_config));
            if threat.range > desired {
                return Some(threat.position);
            }
            if self.mission.is(Mission::SeekAndDestroy) {
                return None;
            }
        }

        if self.mission.is(Mission::SeekAndDestroy) {
            if let Some(remembered) = self.threat {
                return Some(remembered.position);
            }
        }

        input.formation_slot.or(input.objective)
    }

    fn nearest_enemy_fortification(&self, input: &DecisionInput<'_>) -> Option<Vec3> {
        let enemy = self.team.opponent()?;
        input
            .world
            .fortifications(enemy)
            .into_iter()
            .map(|o| o.position)
            .min_by(|a, b| {
                a.distance_squared(input.position)
                    .total_cmp(&b.distance_squared(input.position))
            })
    }

    /// Clear per-life state on death or respawn
    pub fn reset(&mut self) {
        self.required_weapons.clear();
        self.threat = None;
        self.threat_seen.invalidate();
        self.weapon = None;
        self.formation = FormationState::default();
        self.vantage.invalidate();
    }
}
