//! Bot simulation driver
//!
//! [`BotSimulation`] is built once at startup from a [`BotConfig`] and
//! owns every agent plus the squad and population coordinators. The host
//! calls [`BotSimulation::run_tick`] each frame and forwards damage and
//! contact events as they happen.

pub mod events;
pub mod tick;

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::agent::Agent;
use crate::core::config::BotConfig;
use crate::core::error::{BotError, Result};
use crate::core::types::{EntityHandle, Role, Seconds, Team};
use crate::decision::Mission;
use crate::nav::{NavGraph, PathCostContext, PathCostEvaluator, RouteType};
use crate::population::{AgentSummary, PopulationManager};
use crate::squad::{FormationSource, MemberFormation, SquadCoordinator, SquadEvent, SquadId};
use crate::world::{ContactEvent, DamageEvent, WorldQuery};

pub use events::{BotEvent, TimedEvent};

/// Formation facts read straight from the agent table
struct AgentFormations<'a>(&'a BTreeMap<EntityHandle, Agent>);

impl FormationSource for AgentFormations<'_> {
    fn formation(&self, member: EntityHandle) -> Option<MemberFormation> {
        self.0
            .get(&member)
            .map(|agent| agent.brain().member_formation(agent.alive))
    }
}

/// Owns the agents and coordinators of one simulation
#[derive(Debug)]
pub struct BotSimulation {
    config: BotConfig,
    /// Ordered so every pass visits agents deterministically
    agents: BTreeMap<EntityHandle, Agent>,
    squads: SquadCoordinator,
    population: PopulationManager,
}

impl BotSimulation {
    pub fn new(config: BotConfig) -> Self {
        let squads = SquadCoordinator::new(config.squad.clone());
        let population = PopulationManager::new(config.population.clone(), config.seed);
        Self {
            config,
            agents: BTreeMap::new(),
            squads,
            population,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn agent(&self, handle: EntityHandle) -> Option<&Agent> {
        self.agents.get(&handle)
    }

    pub fn agent_mut(&mut self, handle: EntityHandle) -> Option<&mut Agent> {
        self.agents.get_mut(&handle)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn squads(&self) -> &SquadCoordinator {
        &self.squads
    }

    pub fn population(&self) -> &PopulationManager {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut PopulationManager {
        &mut self.population
    }

    /// Add an agent directly, bypassing the population loop
    pub fn insert_agent(&mut self, agent: Agent) -> BotEvent {
        let event = BotEvent::AgentSpawned {
            agent: agent.handle,
            name: agent.name.clone(),
            team: agent.team(),
            role: agent.role(),
        };
        self.agents.insert(agent.handle, agent);
        event
    }

    /// Convenience for hosts and tests: spawn a default agent
    pub fn spawn_agent(
        &mut self,
        handle: EntityHandle,
        name: &str,
        team: Team,
        role: Role,
    ) -> BotEvent {
        let agent = Agent::new(handle, name, team, role, &self.config);
        self.insert_agent(agent)
    }

    /// Drop an agent entirely, leaving its squad first
    pub fn remove_agent(&mut self, handle: EntityHandle) -> Vec<BotEvent> {
        let mut events = self.leave_squad(handle);
        if self.agents.remove(&handle).is_some() {
            self.population.release(handle);
            events.push(BotEvent::AgentRemoved { agent: handle });
        }
        events
    }

    pub fn set_mission(
        &mut self,
        handle: EntityHandle,
        mission: Mission,
        suppress_reset: bool,
    ) -> Result<BotEvent> {
        let agent = self.agents.get_mut(&handle).ok_or(BotError::UnknownAgent(handle))?;
        agent.brain_mut().set_mission(mission, suppress_reset);
        Ok(BotEvent::MissionChanged { agent: handle, mission })
    }

    /// Agents on solo missions stay out of squads
    fn check_squad_eligible(&self, handle: EntityHandle) -> Result<()> {
        let agent = self.agents.get(&handle).ok_or(BotError::UnknownAgent(handle))?;
        if agent.brain().mission().is_solo() {
            return Err(BotError::SoloMission(handle));
        }
        Ok(())
    }

    /// Start a squad led by `leader`
    pub fn form_squad(&mut self, leader: EntityHandle) -> Result<(SquadId, BotEvent)> {
        self.check_squad_eligible(leader)?;
        let squad = self.squads.create(leader)?;
        Ok((squad, BotEvent::SquadFormed { squad, leader }))
    }

    pub fn join_squad(&mut self, squad: SquadId, member: EntityHandle) -> Result<()> {
        self.check_squad_eligible(member)?;
        self.squads.join(squad, member)
    }

    pub fn leave_squad(&mut self, member: EntityHandle) -> Vec<BotEvent> {
        let source = AgentFormations(&self.agents);
        let events = self.squads.leave(member, &source);
        events.into_iter().map(squad_event).collect()
    }

    pub fn disband_squad(&mut self, squad: SquadId) -> Result<BotEvent> {
        if self.squads.squad(squad).is_none() {
            return Err(BotError::UnknownSquad(squad));
        }
        let members = self.squads.disband_and_delete(squad);
        Ok(BotEvent::SquadDisbanded { squad, members })
    }

    /// Living members of a squad, leader included
    pub fn squad_member_count(&self, squad: SquadId) -> usize {
        self.squads.member_count(squad, &AgentFormations(&self.agents))
    }

    pub fn max_squad_formation_error(&self, squad: SquadId) -> f32 {
        self.squads.max_formation_error(squad, &AgentFormations(&self.agents))
    }

    pub fn should_squad_leader_wait(&self, squad: SquadId) -> bool {
        self.squads.should_leader_wait(squad, &AgentFormations(&self.agents))
    }

    pub fn is_squad_in_formation(&self, squad: SquadId) -> bool {
        self.squads.is_in_formation(squad, &AgentFormations(&self.agents))
    }

    /// Damage feed: attackers are recognized at once; deaths update squads
    pub fn on_damage(&mut self, event: &DamageEvent, world: &dyn WorldQuery) -> Vec<BotEvent> {
        let mut events = Vec::new();
        let Some(agent) = self.agents.get_mut(&event.victim) else {
            return events;
        };

        if let Some(attacker) = event.attacker {
            if attacker != event.victim && agent.alive {
                agent.recognize_attacker(attacker, world, event.time);
            }
        }

        if !event.fatal || !agent.alive {
            return events;
        }

        agent.alive = false;
        agent.reset();
        let bench = agent
            .brain()
            .has_attribute(crate::decision::BotAttribute::BecomeSpectatorOnDeath);
        events.push(BotEvent::AgentDied {
            agent: event.victim,
            attacker: event.attacker,
        });
        tracing::debug!("Agent {} died", event.victim);

        events.extend(self.leave_squad(event.victim));

        if bench {
            if let Some(agent) = self.agents.get_mut(&event.victim) {
                agent.bench();
                events.push(BotEvent::AgentBenched { agent: event.victim });
            }
        }
        events
    }

    /// Contact feed: bumping into someone feeds the suspicion window
    pub fn on_contact(&mut self, event: &ContactEvent) -> Vec<BotEvent> {
        let unmasked = match self.agents.get_mut(&event.agent) {
            Some(agent) if agent.alive => agent.brain_mut().on_contact(event.subject, event.time),
            _ => None,
        };
        match unmasked {
            Some(subject) => self.share_unmasking(event.agent, subject, event.time),
            None => Vec::new(),
        }
    }

    /// Tell allies near `source` that `subject` is hostile
    ///
    /// Allies are nudged and re-evaluated once; they do not pass it on.
    pub fn share_unmasking(
        &mut self,
        source: EntityHandle,
        subject: EntityHandle,
        now: Seconds,
    ) -> Vec<BotEvent> {
        let mut events = vec![BotEvent::SuspicionEscalated { agent: source, subject }];
        let Some((team, origin)) = self.agents.get(&source).map(|a| (a.team(), a.position)) else {
            return events;
        };
        tracing::info!("Agent {} unmasked {}", source, subject);

        let radius = self.config.suspicion.propagation_radius;
        for (handle, ally) in self.agents.iter_mut() {
            if *handle == source || !ally.alive || ally.team() != team {
                continue;
            }
            if ally.position.distance(origin) > radius {
                continue;
            }
            if ally.brain_mut().on_suspicion_shared(subject, now) {
                events.push(BotEvent::SuspicionShared { agent: *handle, subject });
            }
        }
        events
    }

    /// Area facts for one agent's route query
    pub fn path_context(
        &self,
        handle: EntityHandle,
        world: &dyn WorldQuery,
        nav: &dyn NavGraph,
    ) -> Result<PathCostContext> {
        let agent = self.agents.get(&handle).ok_or(BotError::UnknownAgent(handle))?;
        let team = agent.team();
        let mut context = PathCostContext::default();

        for participant in world.participants() {
            if participant.handle == handle || !participant.alive || participant.team != team {
                continue;
            }
            if let Some(area) = nav.area_at(participant.position) {
                *context.teammates_per_area.entry(area.id).or_insert(0) += 1;
            }
        }

        if let Some(enemy) = team.opponent() {
            let known = agent.perception().known();
            context.enemy_structures = world
                .fortifications(enemy)
                .into_iter()
                .filter(|o| known.contains(o.handle))
                .map(|o| o.position)
                .collect();
        }
        Ok(context)
    }

    /// Cost function for one agent's route query
    pub fn path_evaluator<'a>(
        &'a self,
        handle: EntityHandle,
        route: RouteType,
        context: &'a PathCostContext,
        world: &dyn WorldQuery,
        now: Seconds,
    ) -> Result<PathCostEvaluator<'a>> {
        let agent = self.agents.get(&handle).ok_or(BotError::UnknownAgent(handle))?;
        Ok(PathCostEvaluator::new(
            handle,
            agent.team(),
            agent.role(),
            route,
            now,
            &self.config.movement,
            &self.config.path,
            context,
        )
        .with_round_winner(world.round_winner()))
    }

    fn summaries(&self) -> Vec<AgentSummary> {
        self.agents
            .values()
            .map(|agent| AgentSummary {
                handle: agent.handle,
                team: agent.team(),
                role: agent.role(),
                alive: agent.alive,
            })
            .collect()
    }

    fn formation_states(&self) -> AHashMap<EntityHandle, MemberFormation> {
        self.agents
            .iter()
            .map(|(handle, agent)| (*handle, agent.brain().member_formation(agent.alive)))
            .collect()
    }
}

fn squad_event(event: SquadEvent) -> BotEvent {
    match event {
        SquadEvent::LeaderChanged { squad, leader } => {
            BotEvent::SquadLeaderChanged { squad, leader }
        }
        SquadEvent::Disbanded { squad, members } => BotEvent::SquadDisbanded { squad, members },
    }
}
