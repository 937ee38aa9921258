//! Weighted role selection
//!
//! A scenario supplies an ordered table of role rules. Roles a team is
//! missing (below an absolute minimum or below their share of the team)
//! are hard requirements and win outright; otherwise any role still under
//! its cap may be picked.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{Difficulty, Role};

/// Cap value meaning "no limit"
pub const UNLIMITED: i32 = -1;

/// Limits for one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRule {
    pub role: Role,
    /// Team size (including the joining agent) needed before the role unlocks
    #[serde(default)]
    pub min_team_size: usize,
    /// Wanted once per this many teammates
    #[serde(default)]
    pub ratio: Option<usize>,
    /// Always wanted at least this many
    #[serde(default)]
    pub minimum: usize,
    /// Cap by difficulty (Easy, Normal, Hard, Expert); [`UNLIMITED`] for none
    #[serde(default = "unlimited")]
    pub maximum: [i32; 4],
}

fn unlimited() -> [i32; 4] {
    [UNLIMITED; 4]
}

impl RoleRule {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            min_team_size: 0,
            ratio: None,
            minimum: 0,
            maximum: unlimited(),
        }
    }

    pub fn unlocked_at(mut self, team_size: usize) -> Self {
        self.min_team_size = team_size;
        self
    }

    pub fn one_per(mut self, teammates: usize) -> Self {
        self.ratio = Some(teammates);
        self
    }

    pub fn at_least(mut self, minimum: usize) -> Self {
        self.minimum = minimum;
        self
    }

    pub fn capped(mut self, maximum: [i32; 4]) -> Self {
        self.maximum = maximum;
        self
    }

    fn is_unlocked(&self, team_size: usize) -> bool {
        team_size >= self.min_team_size
    }

    fn is_required(&self, count: usize, team_size: usize) -> bool {
        if count < self.minimum {
            return true;
        }
        match self.ratio {
            Some(per) if per > 0 => count < team_size / per,
            _ => false,
        }
    }

    fn has_room(&self, count: usize, difficulty: Difficulty) -> bool {
        let cap = self.maximum[difficulty.index()];
        cap < 0 || (count as i64) < cap as i64
    }
}

/// Team composition a role choice is made against
#[derive(Debug, Clone, Copy)]
pub struct RosterQuery<'a> {
    /// Roles of current teammates, excluding the agent choosing
    pub teammates: &'a [Role],
    pub difficulty: Difficulty,
    /// The enemy has a working fortification that needs taking out
    pub enemy_fortified: bool,
}

impl RosterQuery<'_> {
    fn count(&self, role: Role) -> usize {
        self.teammates.iter().filter(|r| **r == role).count()
    }

    fn team_size(&self) -> usize {
        self.teammates.len() + 1
    }
}

/// Ordered role rules for a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleTable {
    rules: Vec<RoleRule>,
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::new(vec![
            RoleRule::new(Role::Soldier).at_least(1),
            RoleRule::new(Role::Scout).capped([2, 2, 2, 2]),
            RoleRule::new(Role::Pyro).capped([3, 3, 2, 2]),
            RoleRule::new(Role::Demolitions).capped([2, 2, 3, 3]),
            RoleRule::new(Role::Heavy).capped([2, 2, 2, 2]),
            RoleRule::new(Role::Engineer).unlocked_at(4).capped([1, 1, 2, 2]),
            RoleRule::new(Role::Medic).unlocked_at(4).one_per(4).capped([1, 1, 2, 2]),
            RoleRule::new(Role::Sniper).unlocked_at(5).capped([0, 1, 1, 2]),
            RoleRule::new(Role::Spy).unlocked_at(5).capped([0, 1, 1, 2]),
        ])
    }
}

impl RoleTable {
    pub fn new(rules: Vec<RoleRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RoleRule] {
        &self.rules
    }

    /// Roles the team is missing, restricted to the least represented
    pub fn hard_requirements(&self, query: &RosterQuery<'_>) -> Vec<Role> {
        let team_size = query.team_size();
        let required: Vec<(Role, usize)> = self
            .rules
            .iter()
            .filter(|rule| rule.is_unlocked(team_size))
            .map(|rule| (rule, query.count(rule.role)))
            .filter(|(rule, count)| rule.is_required(*count, team_size))
            .map(|(rule, count)| (rule.role, count))
            .collect();

        let Some(fewest) = required.iter().map(|(_, count)| *count).min() else {
            return Vec::new();
        };
        required
            .into_iter()
            .filter(|(_, count)| *count == fewest)
            .map(|(role, _)| role)
            .collect()
    }

    /// Unlocked roles still under their cap
    pub fn open_roles(&self, query: &RosterQuery<'_>) -> Vec<Role> {
        let team_size = query.team_size();
        self.rules
            .iter()
            .filter(|rule| rule.is_unlocked(team_size))
            .filter(|rule| rule.has_room(query.count(rule.role), query.difficulty))
            .map(|rule| rule.role)
            .collect()
    }

    /// Pick a role for a joining agent
    pub fn select_role<R: Rng + ?Sized>(
        &self,
        query: &RosterQuery<'_>,
        rng: &mut R,
    ) -> Option<Role> {
        let required = self.hard_requirements(query);
        if !required.is_empty() {
            return required.choose(rng).copied();
        }

        let open = self.open_roles(query);
        if query.enemy_fortified {
            let counters: Vec<Role> = open
                .iter()
                .copied()
                .filter(|role| role.counters_fortifications())
                .collect();
            if let Some(role) = counters.choose(rng) {
                return Some(*role);
            }
        }
        open.choose(rng).copied()
    }
}
