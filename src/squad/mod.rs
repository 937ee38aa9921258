//! Squad coordination
//!
//! One [`SquadCoordinator`] owns every squad in the simulation. Membership
//! lives here only: an agent's squad reference is whatever `squad_of`
//! answers, so disbanding clears every member's reference at once.

pub mod formation;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::SquadConfig;
use crate::core::error::{BotError, Result};
use crate::core::types::EntityHandle;

pub use formation::{formation_error, formation_slot};

/// Unique identifier for squads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SquadId(pub Uuid);

impl SquadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SquadId {
    fn default() -> Self {
        Self::new()
    }
}

/// A leader and its followers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Squad {
    pub id: SquadId,
    /// Always a member of `members`
    leader: EntityHandle,
    /// In join order
    members: Vec<EntityHandle>,
    pub formation_size: f32,
    /// Re-elect instead of disbanding when the leader leaves
    pub preserve_on_leader_loss: bool,
}

impl Squad {
    fn new(founder: EntityHandle, config: &SquadConfig) -> Self {
        Self {
            id: SquadId::new(),
            leader: founder,
            members: vec![founder],
            formation_size: config.formation_size,
            preserve_on_leader_loss: config.preserve_on_leader_loss,
        }
    }

    pub fn leader(&self) -> EntityHandle {
        self.leader
    }

    pub fn members(&self) -> &[EntityHandle] {
        &self.members
    }

    /// Followers, excluding the leader
    pub fn followers(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.members.iter().copied().filter(move |m| *m != self.leader)
    }

    pub fn contains(&self, member: EntityHandle) -> bool {
        self.members.contains(&member)
    }
}

/// A member's standing relative to its formation slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberFormation {
    /// Normalized distance from the ideal slot
    pub error: f32,
    pub broke_formation: bool,
    pub stuck: bool,
    /// Roles that position themselves (healers glued to a patient)
    pub self_managed: bool,
    pub alive: bool,
}

impl MemberFormation {
    /// Counts toward formation checks
    fn is_eligible(&self) -> bool {
        self.alive && !self.broke_formation && !self.stuck && !self.self_managed
    }
}

/// Where the coordinator reads each member's formation state
pub trait FormationSource {
    fn formation(&self, member: EntityHandle) -> Option<MemberFormation>;
}

impl FormationSource for AHashMap<EntityHandle, MemberFormation> {
    fn formation(&self, member: EntityHandle) -> Option<MemberFormation> {
        self.get(&member).copied()
    }
}

/// Roster changes reported back to the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SquadEvent {
    LeaderChanged {
        squad: SquadId,
        leader: EntityHandle,
    },
    Disbanded {
        squad: SquadId,
        members: Vec<EntityHandle>,
    },
}

/// Registry of all squads
#[derive(Debug, Clone, Default)]
pub struct SquadCoordinator {
    config: SquadConfig,
    squads: AHashMap<SquadId, Squad>,
    membership: AHashMap<EntityHandle, SquadId>,
}

impl SquadCoordinator {
    pub fn new(config: SquadConfig) -> Self {
        Self {
            config,
            squads: AHashMap::new(),
            membership: AHashMap::new(),
        }
    }

    pub fn config(&self) -> &SquadConfig {
        &self.config
    }

    /// Start a squad led by its first joiner
    pub fn create(&mut self, founder: EntityHandle) -> Result<SquadId> {
        if self.membership.contains_key(&founder) {
            return Err(BotError::AlreadyInSquad(founder));
        }
        let squad = Squad::new(founder, &self.config);
        let id = squad.id;
        self.squads.insert(id, squad);
        self.membership.insert(founder, id);
        tracing::debug!("Squad {:?} formed, led by {}", id, founder);
        Ok(id)
    }

    /// Add a follower
    pub fn join(&mut self, id: SquadId, member: EntityHandle) -> Result<()> {
        if self.membership.contains_key(&member) {
            return Err(BotError::AlreadyInSquad(member));
        }
        let squad = self.squads.get_mut(&id).ok_or(BotError::UnknownSquad(id))?;
        squad.members.push(member);
        self.membership.insert(member, id);
        Ok(())
    }

    /// Remove a member, handling leader loss and empty rosters
    ///
    /// Members not in any squad are ignored.
    pub fn leave(&mut self, member: EntityHandle, source: &dyn FormationSource) -> Vec<SquadEvent> {
        let mut events = Vec::new();
        let Some(id) = self.membership.remove(&member) else {
            return events;
        };
        let Some(squad) = self.squads.get_mut(&id) else {
            return events;
        };

        squad.members.retain(|m| *m != member);

        if squad.members.is_empty() {
            self.squads.remove(&id);
            events.push(SquadEvent::Disbanded {
                squad: id,
                members: Vec::new(),
            });
            return events;
        }

        if squad.leader == member {
            // a squad with nobody alive to lead it disbands either way
            let successor = squad
                .members
                .iter()
                .copied()
                .find(|m| source.formation(*m).is_some_and(|f| f.alive))
                .filter(|_| squad.preserve_on_leader_loss);
            match successor {
                Some(leader) => {
                    squad.leader = leader;
                    tracing::debug!("Squad {:?} re-elected leader {}", id, leader);
                    events.push(SquadEvent::LeaderChanged { squad: id, leader });
                }
                None => {
                    let members = self.disband_and_delete(id);
                    events.push(SquadEvent::Disbanded { squad: id, members });
                }
            }
        }

        events
    }

    /// Clear every member's reference and drop the squad
    pub fn disband_and_delete(&mut self, id: SquadId) -> Vec<EntityHandle> {
        let Some(squad) = self.squads.remove(&id) else {
            return Vec::new();
        };
        for member in &squad.members {
            self.membership.remove(member);
        }
        tracing::debug!("Squad {:?} disbanded ({} members)", id, squad.members.len());
        squad.members
    }

    pub fn squad(&self, id: SquadId) -> Option<&Squad> {
        self.squads.get(&id)
    }

    pub fn squad_mut(&mut self, id: SquadId) -> Option<&mut Squad> {
        self.squads.get_mut(&id)
    }

    pub fn squad_of(&self, member: EntityHandle) -> Option<SquadId> {
        self.membership.get(&member).copied()
    }

    pub fn is_leader(&self, member: EntityHandle) -> bool {
        self.squad_of(member)
            .and_then(|id| self.squads.get(&id))
            .is_some_and(|s| s.leader == member)
    }

    pub fn leader_of(&self, member: EntityHandle) -> Option<EntityHandle> {
        self.squad_of(member)
            .and_then(|id| self.squads.get(&id))
            .map(|s| s.leader)
    }

    pub fn len(&self) -> usize {
        self.squads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squads.is_empty()
    }

    pub fn squads(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values()
    }

    /// Living members, leader included
    pub fn member_count(&self, id: SquadId, source: &dyn FormationSource) -> usize {
        self.squads.get(&id).map_or(0, |squad| {
            squad
                .members
                .iter()
                .filter(|m| source.formation(**m).is_some_and(|f| f.alive))
                .count()
        })
    }

    /// Largest formation error among living followers
    pub fn max_formation_error(&self, id: SquadId, source: &dyn FormationSource) -> f32 {
        let Some(squad) = self.squads.get(&id) else {
            return 0.0;
        };
        squad
            .followers()
            .filter_map(|m| source.formation(m))
            .filter(|f| f.alive)
            .map(|f| f.error)
            .fold(0.0, f32::max)
    }

    /// Should the leader hold still so stragglers can catch up?
    pub fn should_leader_wait(&self, id: SquadId, source: &dyn FormationSource) -> bool {
        let Some(squad) = self.squads.get(&id) else {
            return false;
        };
        squad
            .followers()
            .filter_map(|m| source.formation(m))
            .any(|f| f.is_eligible() && f.error >= self.config.wait_error)
    }

    pub fn is_in_formation(&self, id: SquadId, source: &dyn FormationSource) -> bool {
        let Some(squad) = self.squads.get(&id) else {
            return false;
        };
        squad
            .followers()
            .filter_map(|m| source.formation(m))
            .filter(|f| f.is_eligible())
            .all(|f| f.error <= self.config.in_formation_error)
    }
}
