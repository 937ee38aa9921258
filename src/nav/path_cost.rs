//! Path cost function handed to the host's route search
//!
//! `cost` never mutates anything: the search may probe the same area many
//! times in one query. Impassable steps come back as `None` and must be
//! dropped by the search, never summed.

use ahash::AHashMap;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::config::{MovementConfig, PathConfig};
use crate::core::random::transient_random;
use crate::core::types::{AreaId, EntityHandle, Role, Seconds, Team};
use crate::nav::NavArea;

/// What a route optimizes for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RouteType {
    #[default]
    Fastest,
    /// Detours around fighting and covered ground
    Safest,
}

/// Facts about other participants gathered once before a search
#[derive(Debug, Clone, Default)]
pub struct PathCostContext {
    /// Teammates (excluding the querying agent) standing in each area
    pub teammates_per_area: AHashMap<AreaId, u32>,
    /// Positions of known enemy stationary structures
    pub enemy_structures: Vec<Vec3>,
}

/// The area a step comes from and the route cost accumulated to reach it
#[derive(Debug, Clone, Copy)]
pub struct FromArea<'a> {
    pub area: &'a NavArea,
    pub accumulated: f32,
}

/// True when the enemy has already lost the round, opening its spawn
pub fn enemy_spawn_open(team: Team, round_winner: Option<Team>) -> bool {
    round_winner == Some(team)
}

/// Cost function for one agent's route query
#[derive(Debug, Clone)]
pub struct PathCostEvaluator<'a> {
    agent: EntityHandle,
    team: Team,
    role: Role,
    route: RouteType,
    round_winner: Option<Team>,
    now: Seconds,
    movement: &'a MovementConfig,
    weights: &'a PathConfig,
    context: &'a PathCostContext,
}

impl<'a> PathCostEvaluator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        agent: EntityHandle,
        team: Team,
        role: Role,
        route: RouteType,
        now: Seconds,
        movement: &'a MovementConfig,
        weights: &'a PathConfig,
        context: &'a PathCostContext,
    ) -> Self {
        Self {
            agent,
            team,
            role,
            route,
            round_winner: None,
            now,
            movement,
            weights,
            context,
        }
    }

    pub fn with_round_winner(mut self, winner: Option<Team>) -> Self {
        self.round_winner = winner;
        self
    }

    pub fn route(&self) -> RouteType {
        self.route
    }

    /// Areas this agent must never route through
    pub fn is_excluded(&self, area: &NavArea) -> bool {
        if area.is_blocked_for(self.team) {
            return true;
        }

        if let Some(owner) = area.spawn_room {
            if owner != self.team && !enemy_spawn_open(self.team, self.round_winner) {
                return true;
            }
        }

        self.weights.avoid_inactive_objectives && area.inactive_objective
    }

    /// Accumulated cost of entering `area` from `from`
    ///
    /// `special_length` overrides the center-to-center distance for ladders
    /// and similar edges. Returns `None` when the step is impassable.
    pub fn cost(
        &self,
        area: &NavArea,
        from: Option<FromArea<'_>>,
        special_length: Option<f32>,
    ) -> Option<f32> {
        let Some(from) = from else {
            // first area in the path
            return Some(0.0);
        };

        if self.is_excluded(area) {
            return None;
        }

        let mut cost = special_length.unwrap_or_else(|| from.area.center.distance(area.center));

        let delta_z = area.center.z - from.area.center.z;
        if delta_z >= self.movement.step_height {
            if delta_z > self.movement.max_jump_height {
                return None;
            }
            cost *= self.weights.jump_penalty;
        } else if delta_z < -self.movement.death_drop_height {
            return None;
        }

        if self.route == RouteType::Safest {
            if area.is_in_combat() {
                cost *= 1.0 + self.weights.combat_intensity_factor * area.combat_intensity;
            }
            if area.is_in_danger_for(self.team) {
                cost *= self.weights.emplacement_danger_factor;
            }
        }

        if self.role.is_stealthy() {
            let teammates = self
                .context
                .teammates_per_area
                .get(&area.id)
                .copied()
                .unwrap_or(0);
            if teammates > 0 {
                cost *= 1.0 + self.weights.teammate_penalty * teammates as f32;
            }

            let radius = self.weights.enemy_structure_radius;
            let radius_sq = radius * radius;
            let near_structure = self
                .context
                .enemy_structures
                .iter()
                .any(|pos| pos.distance_squared(area.center) <= radius_sq);
            if near_structure {
                cost *= self.weights.enemy_structure_penalty;
            }
        }

        cost *= self.route_preference(area);

        Some(cost + from.accumulated)
    }

    /// Per-agent, per-area multiplier that holds steady for a jitter period
    pub fn route_preference(&self, area: &NavArea) -> f32 {
        let roll = transient_random(
            self.agent.0,
            area.id.0,
            self.now,
            self.weights.route_jitter_period,
        );
        1.0 + self.weights.route_jitter * roll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PerTeam;

    fn flat_weights() -> PathConfig {
        PathConfig {
            route_jitter: 0.0,
            ..PathConfig::default()
        }
    }

    fn area(id: u32, center: Vec3) -> NavArea {
        NavArea::new(AreaId(id), center)
    }

    #[test]
    fn test_first_area_is_free() {
        let movement = MovementConfig::default();
        let weights = flat_weights();
        let context = PathCostContext::default();
        let eval = PathCostEvaluator::new(
            EntityHandle(1),
            Team::Red,
            Role::Soldier,
            RouteType::Fastest,
            0.0,
            &movement,
            &weights,
            &context,
        );
        assert_eq!(eval.cost(&area(1, Vec3::ZERO), None, None), Some(0.0));
    }

    #[test]
    fn test_flat_step_costs_distance_plus_accumulated() {
        let movement = MovementConfig::default();
        let weights = flat_weights();
        let context = PathCostContext::default();
        let eval = PathCostEvaluator::new(
            EntityHandle(1),
            Team::Red,
            Role::Soldier,
            RouteType::Fastest,
            0.0,
            &movement,
            &weights,
            &context,
        );
        let a = area(1, Vec3::ZERO);
        let b = area(2, Vec3::new(100.0, 0.0, 0.0));
        let from = FromArea { area: &a, accumulated: 40.0 };
        assert_eq!(eval.cost(&b, Some(from), None), Some(140.0));
        // ladders use their own length
        assert_eq!(eval.cost(&b, Some(from), Some(300.0)), Some(340.0));
    }

    #[test]
    fn test_jump_penalty_and_limits() {
        let movement = MovementConfig::default();
        let weights = flat_weights();
        let context = PathCostContext::default();
        let eval = PathCostEvaluator::new(
            EntityHandle(1),
            Team::Red,
            Role::Soldier,
            RouteType::Fastest,
            0.0,
            &movement,
            &weights,
            &context,
        );
        let low = area(1, Vec3::ZERO);
        let ledge = area(2, Vec3::new(100.0, 0.0, 50.0));
        let cliff = area(3, Vec3::new(100.0, 0.0, 100.0));
        let pit = area(4, Vec3::new(100.0, 0.0, -250.0));
        let from = FromArea { area: &low, accumulated: 0.0 };

        let expected = low.center.distance(ledge.center) * weights.jump_penalty;
        assert_eq!(eval.cost(&ledge, Some(from), None), Some(expected));
        assert_eq!(eval.cost(&cliff, Some(from), None), None);
        assert_eq!(eval.cost(&pit, Some(from), None), None);
    }

    #[test]
    fn test_blocked_and_enemy_spawn_excluded() {
        let movement = MovementConfig::default();
        let weights = flat_weights();
        let context = PathCostContext::default();
        let eval = PathCostEvaluator::new(
            EntityHandle(1),
            Team::Red,
            Role::Soldier,
            RouteType::Fastest,
            0.0,
            &movement,
            &weights,
            &context,
        );
        let start = area(1, Vec3::ZERO);
        let mut gate = area(2, Vec3::X * 50.0);
        gate.blocked = PerTeam { red: true, blue: false };
        let mut spawn = area(3, Vec3::X * 50.0);
        spawn.spawn_room = Some(Team::Blue);
        let mut own_spawn = area(4, Vec3::X * 50.0);
        own_spawn.spawn_room = Some(Team::Red);
        let from = FromArea { area: &start, accumulated: 0.0 };

        assert_eq!(eval.cost(&gate, Some(from), None), None);
        assert_eq!(eval.cost(&spawn, Some(from), None), None);
        assert!(eval.cost(&own_spawn, Some(from), None).is_some());

        let decided = eval.clone().with_round_winner(Some(Team::Red));
        assert!(decided.cost(&spawn, Some(from), None).is_some());
    }

    #[test]
    fn test_safest_route_penalizes_danger() {
        let movement = MovementConfig::default();
        let weights = flat_weights();
        let context = PathCostContext::default();
        let fastest = PathCostEvaluator::new(
            EntityHandle(1),
            Team::Red,
            Role::Soldier,
            RouteType::Fastest,
            0.0,
            &movement,
            &weights,
            &context,
        );
        let safest = PathCostEvaluator::new(
            EntityHandle(1),
            Team::Red,
            Role::Soldier,
            RouteType::Safest,
            0.0,
            &movement,
            &weights,
            &context,
        );
        let start = area(1, Vec3::ZERO);
        let mut hot = area(2, Vec3::X * 100.0);
        hot.combat_intensity = 0.5;
        let mut covered = area(3, Vec3::X * 100.0);
        covered.emplacement_danger.set(Team::Red, true);
        let from = FromArea { area: &start, accumulated: 0.0 };

        assert_eq!(fastest.cost(&hot, Some(from), None), Some(100.0));
        assert_eq!(safest.cost(&hot, Some(from), None), Some(300.0));
        assert_eq!(safest.cost(&covered, Some(from), None), Some(1000.0));
    }

    #[test]
    fn test_stealth_role_avoids_teammates_and_structures() {
        let movement = MovementConfig::default();
        let weights = flat_weights();
        let mut context = PathCostContext::default();
        context.teammates_per_area.insert(AreaId(2), 2);
        context.enemy_structures.push(Vec3::new(0.0, 400.0, 0.0));

        let spy = PathCostEvaluator::new(
            EntityHandle(1),
            Team::Red,
            Role::Spy,
            RouteType::Fastest,
            0.0,
            &movement,
            &weights,
            &context,
        );
        let soldier = PathCostEvaluator::new(
            EntityHandle(1),
            Team::Red,
            Role::Soldier,
            RouteType::Fastest,
            0.0,
            &movement,
            &weights,
            &context,
        );
        let start = area(1, Vec3::new(-100.0, 0.0, 0.0));
        let crowded = area(2, Vec3::ZERO);
        let from = FromArea { area: &start, accumulated: 0.0 };

        assert_eq!(soldier.cost(&crowded, Some(from), None), Some(100.0));
        // (1 + 10 * 2) for teammates, then 5x for the nearby structure
        assert_eq!(spy.cost(&crowded, Some(from), None), Some(100.0 * 21.0 * 5.0));
    }

    #[test]
    fn test_route_preference_is_stable_and_bounded() {
        let movement = MovementConfig::default();
        let weights = PathConfig::default();
        let context = PathCostContext::default();
        let eval_at = |now: f32| {
            PathCostEvaluator::new(
                EntityHandle(7),
                Team::Blue,
                Role::Scout,
                RouteType::Fastest,
                now,
                &movement,
                &weights,
                &context,
            )
            .route_preference(&area(4, Vec3::ZERO))
        };
        let early = eval_at(1.0);
        assert_eq!(early, eval_at(9.0));
        assert!((1.0..1.0 + weights.route_jitter).contains(&early));
    }

    #[test]
    fn test_inactive_objective_policy() {
        let movement = MovementConfig::default();
        let mut weights = flat_weights();
        let context = PathCostContext::default();
        let start = area(1, Vec3::ZERO);
        let mut locked = area(2, Vec3::X * 10.0);
        locked.inactive_objective = true;
        let from = FromArea { area: &start, accumulated: 0.0 };

        let eval = PathCostEvaluator::new(
            EntityHandle(1),
            Team::Red,
            Role::Soldier,
            RouteType::Fastest,
            0.0,
            &movement,
            &weights,
            &context,
        );
        assert_eq!(eval.cost(&locked, Some(from), None), None);

        weights.avoid_inactive_objectives = false;
        let relaxed = PathCostEvaluator::new(
            EntityHandle(1),
            Team::Red,
            Role::Soldier,
            RouteType::Fastest,
            0.0,
            &movement,
            &weights,
            &context,
        );
        assert_eq!(relaxed.cost(&locked, Some(from), None), Some(10.0));
    }
}
