//! Tick system - orchestrates one simulation step
//!
//! Phases run in a fixed order:
//! formation slots -> per-agent think -> formation error -> suspicion
//! sharing -> removals -> population pass.
//!
//! Agents are visited in handle order so a run with the same seed and the
//! same world feed reproduces exactly.

use std::collections::BTreeMap;

use ahash::AHashMap;
use glam::Vec3;

use crate::agent::{Agent, AgentTick, TickContext};
use crate::core::types::{EntityHandle, Seconds};
use crate::decision::BotAttribute;
use crate::nav::NavGraph;
use crate::population::{Census, PopulationChange};
use crate::simulation::{BotEvent, BotSimulation};
use crate::squad::{formation_error, formation_slot};
use crate::world::{WorldObject, WorldQuery};

/// Where one follower should stand this tick
#[derive(Debug, Clone, Copy)]
struct SlotAssignment {
    slot: Vec3,
    size: f32,
}

/// Everything a tick produced
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    pub events: Vec<BotEvent>,
    /// Per-agent perception, decisions and control signals
    pub agents: BTreeMap<EntityHandle, AgentTick>,
}

impl BotSimulation {
    /// Advance every agent and coordinator by one tick
    pub fn run_tick(
        &mut self,
        world: &dyn WorldQuery,
        nav: &dyn NavGraph,
        now: Seconds,
    ) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        // Phase 1: formation layout from last tick's positions
        let (slots, waiting) = self.plan_formations();

        // Phase 2: sense, decide and steer
        let population = self.agents.len();
        let objectives = world.objectives();
        let mut unmasked = Vec::new();
        for (handle, agent) in self.agents.iter_mut() {
            let objective = nearest_active_objective(&objectives, agent.position);
            let context = TickContext {
                world,
                nav,
                objective: objective.map(|o| o.position),
                defending: objective.is_some_and(|o| o.team == agent.team()),
                formation_slot: slots.get(handle).map(|s| s.slot),
                hold_position: waiting.contains(handle),
                population,
            };
            let tick = agent.think(&context, now);
            unmasked.extend(tick.unmasked.iter().map(|subject| (*handle, *subject)));
            outcome.agents.insert(*handle, tick);
        }

        // Phase 3: followers report how far they strayed
        for (handle, assignment) in &slots {
            let Some(agent) = self.agents.get_mut(handle) else {
                continue;
            };
            let error = formation_error(agent.position, assignment.slot, assignment.size);
            let engaged = outcome
                .agents
                .get(handle)
                .and_then(|t| t.decision.threat)
                .is_some_and(|t| t.visible);
            agent.brain_mut().set_formation_error(error);
            agent.brain_mut().set_broke_formation(engaged);
        }

        // Phase 4: unmasked hostiles spread to nearby allies
        for (source, subject) in unmasked {
            outcome.events.extend(self.share_unmasking(source, subject, now));
        }

        // Phase 5: agents that leave the simulation on death
        let departed: Vec<EntityHandle> = self
            .agents
            .values()
            .filter(|a| !a.alive && a.brain().has_attribute(BotAttribute::RemoveOnDeath))
            .map(|a| a.handle)
            .collect();
        for handle in departed {
            tracing::debug!("Removing agent {} on death", handle);
            outcome.events.extend(self.remove_agent(handle));
        }

        // Phase 6: population control
        let census = Census::gather(world, self.summaries());
        if let Some(change) = self.population.update(&census, now) {
            outcome.events.extend(self.apply_population_change(change, world));
        }

        outcome
    }

    /// Formation slots for every follower and the leaders that must wait
    fn plan_formations(&self) -> (AHashMap<EntityHandle, SlotAssignment>, Vec<EntityHandle>) {
        let formations = self.formation_states();
        let mut slots = AHashMap::new();
        let mut waiting = Vec::new();

        for squad in self.squads.squads() {
            let Some(leader) = self.agents.get(&squad.leader()) else {
                continue;
            };
            if !leader.alive {
                continue;
            }

            let followers: Vec<EntityHandle> = squad.followers().collect();
            for (index, follower) in followers.iter().enumerate() {
                let slot = formation_slot(
                    leader.position,
                    leader.facing,
                    index,
                    followers.len(),
                    squad.formation_size,
                );
                slots.insert(
                    *follower,
                    SlotAssignment {
                        slot,
                        size: squad.formation_size,
                    },
                );
            }

            if self.squads.should_leader_wait(squad.id, &formations) {
                waiting.push(leader.handle);
            }
        }
        (slots, waiting)
    }

    fn apply_population_change(
        &mut self,
        change: PopulationChange,
        world: &dyn WorldQuery,
    ) -> Vec<BotEvent> {
        match change {
            PopulationChange::Spawn { handle, team, role, name } => {
                let mut agent = Agent::new(handle, name, team, role, &self.config);
                if let Some(body) = world.participant(handle) {
                    agent.position = body.position;
                }
                vec![self.insert_agent(agent)]
            }
            PopulationChange::Reassign { handle, team, role } => {
                let Some(agent) = self.agents.get_mut(&handle) else {
                    return Vec::new();
                };
                agent.reassign(team, role, &self.config);
                vec![BotEvent::AgentReassigned {
                    agent: handle,
                    team,
                    role,
                }]
            }
            PopulationChange::Remove { handle } => self.remove_agent(handle),
        }
    }
}

/// Closest capturable objective to a position
fn nearest_active_objective<'a>(
    objectives: &[&'a WorldObject],
    position: Vec3,
) -> Option<&'a WorldObject> {
    objectives
        .iter()
        .filter(|o| o.active && !o.disabled)
        .min_by(|a, b| {
            a.position
                .distance_squared(position)
                .total_cmp(&b.position.distance_squared(position))
        })
        .copied()
}
