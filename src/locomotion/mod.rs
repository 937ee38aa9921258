//! Locomotion - turning movement intent into control signals
//!
//! Steering requests accumulate during a tick and resolve into one
//! [`ControlSignals`] in `update`. The adapter also answers the traversability
//! questions the host's route search and obstacle avoidance ask.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::config::MovementConfig;
use crate::core::timer::IntervalTimer;
use crate::core::types::{Role, Seconds, Team};
use crate::nav::path_cost::enemy_spawn_open;
use crate::nav::NavArea;

/// Something in the way of a moving agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Obstacle {
    Participant { alive: bool },
    Structure { team: Team },
    Prop { breakable: bool },
}

/// Per-tick output handed to the host's movement integration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSignals {
    /// Unit horizontal direction, zero when standing still
    pub move_dir: Vec3,
    pub crouch: bool,
    pub jump: bool,
}

/// Swappable movement strategy attached to an agent
pub trait Locomotion {
    /// Steer toward `point`; heavier weights dominate the blend
    fn approach(&mut self, point: Vec3, weight: f32);

    fn jump(&mut self);

    fn is_area_traversable(&self, area: &NavArea, round_winner: Option<Team>) -> bool;

    fn is_entity_traversable(&self, obstacle: &Obstacle) -> bool;

    /// Resolve this tick's requests into control signals
    fn update(&mut self, position: Vec3, on_ground: bool, now: Seconds) -> ControlSignals;

    fn reset(&mut self);
}

/// Default locomotion for ground agents
#[derive(Debug, Clone)]
pub struct LocomotionAdapter {
    team: Team,
    must_remain_standing: bool,
    limits: MovementConfig,
    goal_sum: Vec3,
    goal_weight: f32,
    jump_requested: bool,
    on_ground: bool,
    airborne: IntervalTimer,
    crouching: bool,
}

impl LocomotionAdapter {
    pub fn new(team: Team, role: Role, limits: MovementConfig) -> Self {
        Self {
            team,
            must_remain_standing: role.remains_standing(),
            limits,
            goal_sum: Vec3::ZERO,
            goal_weight: 0.0,
            jump_requested: false,
            on_ground: true,
            airborne: IntervalTimer::new(),
            crouching: false,
        }
    }

    pub fn set_team(&mut self, team: Team) {
        self.team = team;
    }

    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn is_crouching(&self) -> bool {
        self.crouching
    }

    /// Weighted blend of this tick's approach points
    pub fn pending_goal(&self) -> Option<Vec3> {
        (self.goal_weight > 0.0).then(|| self.goal_sum / self.goal_weight)
    }

    fn steering_allowed(&self) -> bool {
        self.on_ground || self.limits.allow_air_control
    }
}

impl Locomotion for LocomotionAdapter {
    fn approach(&mut self, point: Vec3, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        self.goal_sum += point * weight;
        self.goal_weight += weight;
    }

    fn jump(&mut self) {
        self.jump_requested = true;
    }

    fn is_area_traversable(&self, area: &NavArea, round_winner: Option<Team>) -> bool {
        if area.is_blocked_for(self.team) {
            return false;
        }
        match area.spawn_room {
            Some(owner) if owner != self.team => enemy_spawn_open(self.team, round_winner),
            _ => true,
        }
    }

    fn is_entity_traversable(&self, obstacle: &Obstacle) -> bool {
        match obstacle {
            // they will move, or can be shot
            Obstacle::Participant { alive } => *alive,
            Obstacle::Structure { .. } => false,
            Obstacle::Prop { breakable } => *breakable,
        }
    }

    fn update(&mut self, position: Vec3, on_ground: bool, now: Seconds) -> ControlSignals {
        let was_on_ground = self.on_ground;
        self.on_ground = on_ground;

        if was_on_ground && !on_ground {
            self.airborne.start(now);
        } else if on_ground {
            self.airborne.invalidate();
        }

        self.crouching = !self.must_remain_standing
            && !on_ground
            && self.airborne.is_less_than(now, self.limits.airborne_crouch_time);

        // ground state is this tick's, not the one from the last update
        let steering = self.pending_goal().filter(|_| self.steering_allowed());
        let move_dir = match steering {
            Some(goal) => {
                let mut delta = goal - position;
                delta.z = 0.0;
                delta.normalize_or_zero()
            }
            None => Vec3::ZERO,
        };

        let signals = ControlSignals {
            move_dir,
            crouch: self.crouching,
            jump: self.jump_requested && on_ground,
        };

        self.goal_sum = Vec3::ZERO;
        self.goal_weight = 0.0;
        self.jump_requested = false;

        signals
    }

    fn reset(&mut self) {
        self.goal_sum = Vec3::ZERO;
        self.goal_weight = 0.0;
        self.jump_requested = false;
        self.on_ground = true;
        self.airborne.invalidate();
        self.crouching = false;
    }
}
