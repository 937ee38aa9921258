//! Population control loop
//!
//! On a coarse interval the manager compares the agent head count to the
//! configured target and asks for at most one spawn or removal. It never
//! touches agents itself: the simulation applies the returned
//! [`PopulationChange`] in its own phase, after per-agent updates.

pub mod names;
pub mod quota;
pub mod roster;

use ahash::AHashMap;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::PopulationConfig;
use crate::core::timer::CountdownTimer;
use crate::core::types::{EntityHandle, PerTeam, Role, Seconds, Team};
use crate::world::WorldQuery;

pub use names::NamePool;
pub use quota::{PopulationTarget, QuotaMode};
pub use roster::{RoleRule, RoleTable, RosterQuery};

/// One managed agent as the population pass sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub handle: EntityHandle,
    pub team: Team,
    pub role: Role,
    pub alive: bool,
}

/// Head counts gathered before a population pass
#[derive(Debug, Clone, Default)]
pub struct Census {
    /// Connected humans on each playing team
    pub humans: PerTeam<usize>,
    /// Role of each human on a playing team
    pub human_roles: Vec<(Team, Role)>,
    pub human_spectators: usize,
    pub agents: Vec<AgentSummary>,
    pub round_winner: Option<Team>,
    /// Each team has a working fortification
    pub fortified: PerTeam<bool>,
}

impl Census {
    /// Count humans from the world; agents come from the caller
    pub fn gather(world: &dyn WorldQuery, agents: Vec<AgentSummary>) -> Self {
        let mut census = Census {
            agents,
            round_winner: world.round_winner(),
            ..Census::default()
        };

        for participant in world.participants().iter().filter(|p| p.is_human()) {
            census.add_human(participant.team, participant.role);
        }
        for team in Team::PLAYING {
            census.fortified.set(team, !world.fortifications(team).is_empty());
        }
        census
    }

    /// Count a connected human; playing humans also count toward role rules
    pub fn add_human(&mut self, team: Team, role: Role) {
        match team {
            Team::Red => self.humans.red += 1,
            Team::Blue => self.humans.blue += 1,
            Team::Spectator | Team::Unassigned => {
                self.human_spectators += 1;
                return;
            }
        }
        self.human_roles.push((team, role));
    }

    /// Roles on a team, humans included, leaving out one agent
    pub fn roles_on(&self, team: Team, exclude: Option<EntityHandle>) -> Vec<Role> {
        let humans = self.human_roles.iter().filter(|(t, _)| *t == team).map(|(_, role)| *role);
        let agents = self
            .agents
            .iter()
            .filter(|a| a.team == team && Some(a.handle) != exclude)
            .map(|a| a.role);
        humans.chain(agents).collect()
    }

    pub fn humans_playing(&self) -> usize {
        self.humans.red + self.humans.blue
    }

    pub fn humans_connected(&self) -> usize {
        self.humans_playing() + self.human_spectators
    }

    /// Agents on playing teams
    pub fn active_agents(&self) -> impl Iterator<Item = &AgentSummary> {
        self.agents.iter().filter(|a| a.team.is_playing())
    }

    pub fn agents_on(&self, team: Team) -> usize {
        self.agents.iter().filter(|a| a.team == team).count()
    }

    /// Humans plus agents on a team
    pub fn team_size(&self, team: Team) -> usize {
        self.humans.get(team).unwrap_or(0) + self.agents_on(team)
    }

    /// Everyone holding a slot
    pub fn occupied(&self) -> usize {
        self.humans_connected() + self.agents.len()
    }
}

/// What the simulation should do with its agent roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopulationChange {
    Spawn {
        handle: EntityHandle,
        team: Team,
        role: Role,
        name: String,
    },
    /// Bring a pooled spectator agent back into play
    Reassign {
        handle: EntityHandle,
        team: Team,
        role: Role,
    },
    Remove {
        handle: EntityHandle,
    },
}

/// Keeps the agent head count on target
#[derive(Debug, Clone)]
pub struct PopulationManager {
    config: PopulationConfig,
    timer: CountdownTimer,
    rng: ChaCha8Rng,
    names: NamePool,
    assigned: AHashMap<EntityHandle, String>,
    next_handle: u32,
}

impl PopulationManager {
    pub fn new(config: PopulationConfig, seed: u64) -> Self {
        let names = NamePool::new(&config.names);
        let next_handle = config.handle_base;
        Self {
            config,
            timer: CountdownTimer::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            names,
            assigned: AHashMap::new(),
            next_handle,
        }
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn target(&self) -> &PopulationTarget {
        &self.config.target
    }

    pub fn set_target(&mut self, target: PopulationTarget) {
        self.config.target = target;
    }

    pub fn name_of(&self, handle: EntityHandle) -> Option<&str> {
        self.assigned.get(&handle).map(String::as_str)
    }

    /// Agents the target asks for given the census
    pub fn desired_count(&self, census: &Census) -> usize {
        self.config
            .target
            .desired_count(census.humans_playing(), census.humans_connected(), self.config.capacity)
    }

    /// Run the control loop if its interval has elapsed
    pub fn update(&mut self, census: &Census, now: Seconds) -> Option<PopulationChange> {
        if !self.config.enabled || !self.timer.is_elapsed(now) {
            return None;
        }
        self.timer.start(now, self.config.update_interval);

        let desired = self.desired_count(census);
        let current = census.active_agents().count();

        if desired > current {
            self.plan_addition(census)
        } else if desired < current {
            self.plan_removal(census)
        } else {
            None
        }
    }

    /// Role pick for an agent joining (or reselecting on) a team
    pub fn select_role(
        &mut self,
        census: &Census,
        team: Team,
        exclude: Option<EntityHandle>,
    ) -> Role {
        let teammates = census.roles_on(team, exclude);
        let enemy_fortified = team
            .opponent()
            .and_then(|enemy| census.fortified.get(enemy))
            .unwrap_or(false);
        let query = RosterQuery {
            teammates: &teammates,
            difficulty: self.config.difficulty,
            enemy_fortified,
        };
        self.config.roster.select_role(&query, &mut self.rng).unwrap_or_else(|| {
            tracing::debug!("No open role on {:?}, defaulting to Soldier", team);
            Role::Soldier
        })
    }

    fn plan_addition(&mut self, census: &Census) -> Option<PopulationChange> {
        let pooled = census.agents.iter().find(|a| !a.team.is_playing()).copied();

        // a pooled agent already holds its slot
        if pooled.is_none() && census.occupied() >= self.config.capacity {
            tracing::debug!("Population at capacity ({}), not adding", self.config.capacity);
            return None;
        }

        let red = census.team_size(Team::Red);
        let blue = census.team_size(Team::Blue);
        let team = match red.cmp(&blue) {
            std::cmp::Ordering::Less => Team::Red,
            std::cmp::Ordering::Greater => Team::Blue,
            std::cmp::Ordering::Equal => {
                if self.rng.gen_bool(0.5) {
                    Team::Red
                } else {
                    Team::Blue
                }
            }
        };

        // joining may not put the team more than the limit ahead
        if let Some(limit) = self.config.team_imbalance_limit {
            let (joined, other) = if team == Team::Red {
                (red + 1, blue)
            } else {
                (blue + 1, red)
            };
            if joined > other + limit {
                tracing::debug!("Adding to {:?} would unbalance teams, deferring", team);
                return None;
            }
        }

        let role = self.select_role(census, team, pooled.map(|p| p.handle));

        if let Some(pooled) = pooled {
            tracing::info!("Returning pooled agent {} to {:?} as {:?}", pooled.handle, team, role);
            return Some(PopulationChange::Reassign {
                handle: pooled.handle,
                team,
                role,
            });
        }

        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        let name = self.names.acquire(&mut self.rng);
        self.assigned.insert(handle, name.clone());
        tracing::info!("Spawning agent {} '{}' on {:?} as {:?}", handle, name, team, role);

        Some(PopulationChange::Spawn { handle, team, role, name })
    }

    fn plan_removal(&mut self, census: &Census) -> Option<PopulationChange> {
        let dead: Vec<EntityHandle> = census
            .active_agents()
            .filter(|a| !a.alive)
            .map(|a| a.handle)
            .collect();

        let victim = match dead.choose(&mut self.rng) {
            Some(handle) => Some(*handle),
            None => {
                let team = self.team_to_shrink(census);
                let on_team: Vec<EntityHandle> = census
                    .active_agents()
                    .filter(|a| a.team == team)
                    .map(|a| a.handle)
                    .collect();
                let pool = if on_team.is_empty() {
                    census.active_agents().map(|a| a.handle).collect()
                } else {
                    on_team
                };
                pool.choose(&mut self.rng).copied()
            }
        }?;

        self.release(victim);
        tracing::info!("Removing agent {}", victim);
        Some(PopulationChange::Remove { handle: victim })
    }

    /// Larger team first, then the winning team, then a coin flip
    fn team_to_shrink(&mut self, census: &Census) -> Team {
        let red = census.team_size(Team::Red);
        let blue = census.team_size(Team::Blue);
        match red.cmp(&blue) {
            std::cmp::Ordering::Greater => Team::Red,
            std::cmp::Ordering::Less => Team::Blue,
            std::cmp::Ordering::Equal => match census.round_winner {
                Some(winner) if winner.is_playing() => winner,
                _ => {
                    if self.rng.gen_bool(0.5) {
                        Team::Red
                    } else {
                        Team::Blue
                    }
                }
            },
        }
    }

    /// Free an agent's name once it leaves the simulation
    pub fn release(&mut self, handle: EntityHandle) {
        if let Some(name) = self.assigned.remove(&handle) {
            self.names.release(&name);
        }
    }
}
