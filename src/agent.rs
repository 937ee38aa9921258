//! Agent - one AI-controlled participant
//!
//! An agent is composition only: perception and locomotion sit behind
//! traits so a scenario can swap either, and the decision core carries the
//! agent's own state. Agents survive death and are reset on respawn.

use glam::Vec3;

use crate::core::config::BotConfig;
use crate::core::types::{EntityHandle, Role, Seconds, Team};
use crate::decision::{DecisionCore, DecisionInput, DecisionOutput};
use crate::locomotion::{ControlSignals, Locomotion, LocomotionAdapter};
use crate::nav::NavGraph;
use crate::perception::{Observer, Perception, PerceptionEvent, PerceptionSystem};
use crate::world::{Loadout, WorldQuery};

/// Per-tick context an agent needs from the simulation
pub struct TickContext<'a> {
    pub world: &'a dyn WorldQuery,
    pub nav: &'a dyn NavGraph,
    pub objective: Option<Vec3>,
    pub defending: bool,
    pub formation_slot: Option<Vec3>,
    /// Squad leader holding for stragglers
    pub hold_position: bool,
    /// Agents currently in the simulation
    pub population: usize,
}

/// Everything one agent produced this tick
#[derive(Debug, Clone, Default)]
pub struct AgentTick {
    pub perception: Vec<PerceptionEvent>,
    /// Subjects this agent unmasked this tick
    pub unmasked: Vec<EntityHandle>,
    pub decision: DecisionOutput,
    pub signals: ControlSignals,
}

pub struct Agent {
    pub handle: EntityHandle,
    pub name: String,
    pub alive: bool,
    pub position: Vec3,
    /// Last horizontal heading, used to lay out a squad behind its leader
    pub facing: Vec3,
    pub loadout: Loadout,
    perception: Box<dyn Perception>,
    locomotion: Box<dyn Locomotion>,
    brain: DecisionCore,
}

impl Agent {
    /// Agent with the default perception and locomotion strategies
    pub fn new(
        handle: EntityHandle,
        name: impl Into<String>,
        team: Team,
        role: Role,
        config: &BotConfig,
    ) -> Self {
        let seed = config.seed ^ (handle.0 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let perception = PerceptionSystem::new(config.perception.clone(), seed);
        let locomotion = LocomotionAdapter::new(team, role, config.movement.clone());
        Self::with_strategies(
            handle,
            name,
            team,
            role,
            config,
            Box::new(perception),
            Box::new(locomotion),
        )
    }

    pub fn with_strategies(
        handle: EntityHandle,
        name: impl Into<String>,
        team: Team,
        role: Role,
        config: &BotConfig,
        perception: Box<dyn Perception>,
        locomotion: Box<dyn Locomotion>,
    ) -> Self {
        let mut brain = DecisionCore::new(handle, team, role, config.population.difficulty, config);
        if let Some(profile) = config.profile_for(role) {
            brain.apply_profile(profile);
        }
        Self {
            handle,
            name: name.into(),
            alive: true,
            position: Vec3::ZERO,
            facing: Vec3::X,
            loadout: Loadout::default(),
            perception,
            locomotion,
            brain,
        }
    }

    pub fn team(&self) -> Team {
        self.brain.team()
    }

    pub fn role(&self) -> Role {
        self.brain.role()
    }

    pub fn brain(&self) -> &DecisionCore {
        &self.brain
    }

    pub fn brain_mut(&mut self) -> &mut DecisionCore {
        &mut self.brain
    }

    pub fn perception(&self) -> &dyn Perception {
        self.perception.as_ref()
    }

    pub fn locomotion(&self) -> &dyn Locomotion {
        self.locomotion.as_ref()
    }

    /// Move to another team and role, as when a pooled agent returns
    pub fn reassign(&mut self, team: Team, role: Role, config: &BotConfig) {
        let mut brain = DecisionCore::new(self.handle, team, role, self.brain.difficulty(), config);
        if let Some(profile) = config.profile_for(role) {
            brain.apply_profile(profile);
        }
        self.brain = brain;
        self.locomotion = Box::new(LocomotionAdapter::new(team, role, config.movement.clone()));
        self.perception.reset();
    }

    /// Park as a spectator
    pub fn bench(&mut self) {
        self.brain.set_team(Team::Spectator);
        self.alive = false;
        self.reset();
    }

    /// Clear per-life state
    pub fn reset(&mut self) {
        self.perception.reset();
        self.locomotion.reset();
        self.brain.reset();
    }

    /// Immediately recognize whoever just hurt this agent
    pub fn recognize_attacker(
        &mut self,
        attacker: EntityHandle,
        world: &dyn WorldQuery,
        now: Seconds,
    ) -> bool {
        let observer = observer(self.handle, self.position, &self.brain, 0);
        self.perception.recognize_now(&observer, attacker, world, now)
    }

    /// Sense, decide and steer for one tick
    pub fn think(&mut self, context: &TickContext<'_>, now: Seconds) -> AgentTick {
        let mut on_ground = true;
        if let Some(body) = context.world.participant(self.handle) {
            if body.alive && !self.alive {
                tracing::debug!("Agent {} respawned", self.handle);
                self.reset();
            }
            self.alive = body.alive;
            self.position = body.position;
            on_ground = body.on_ground;
        }

        if !self.alive || !self.brain.team().is_playing() {
            return AgentTick::default();
        }

        let observer = observer(self.handle, self.position, &self.brain, context.population);
        let perception_events = self.perception.update(&observer, context.world, now);

        let mut unmasked = Vec::new();
        for event in &perception_events {
            if let PerceptionEvent::Recognized { subject } = event {
                tracing::trace!("Agent {} recognized {}", self.handle, subject);
            }
            if let Some(subject) = self.brain.on_perception_event(event, now) {
                unmasked.push(subject);
            }
        }

        let input = DecisionInput {
            position: self.position,
            memory: self.perception.known(),
            loadout: &self.loadout,
            objective: context.objective,
            defending: context.defending,
            formation_slot: context.formation_slot,
            nav: context.nav,
            world: context.world,
        };
        let mut decision = self.brain.update(&input, now);
        if context.hold_position {
            decision.move_goal = None;
        }

        if let Some(goal) = decision.move_goal {
            self.locomotion.approach(goal, 1.0);
        }
        let signals = self.locomotion.update(self.position, on_ground, now);
        if signals.move_dir != Vec3::ZERO {
            self.facing = signals.move_dir;
        }

        AgentTick {
            perception: perception_events,
            unmasked,
            decision,
            signals,
        }
    }
}

/// Perception's view of the agent; borrows only the decision core
fn observer(
    handle: EntityHandle,
    position: Vec3,
    brain: &DecisionCore,
    population: usize,
) -> Observer<'_> {
    Observer {
        handle,
        team: brain.team(),
        position,
        difficulty: brain.difficulty(),
        ignored: brain.ignored(),
        known_hostiles: brain.suspicion().known(),
        population,
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("team", &self.brain.team())
            .field("role", &self.brain.role())
            .field("alive", &self.alive)
            .field("position", &self.position)
            .finish()
    }
}
