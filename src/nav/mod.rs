//! Navigation graph interface
//!
//! The route search itself belongs to the host. This module describes the
//! per-area facts the bot core reads and provides the cost function the
//! search calls (see [`path_cost`]).

pub mod path_cost;

use ahash::AHashMap;
use glam::{Vec2, Vec3};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::core::types::{AreaId, PerTeam, Team};

pub use path_cost::{FromArea, PathCostContext, PathCostEvaluator, RouteType};

/// Directed link to a neighboring area
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NavConnection {
    pub to: AreaId,
    /// Set for ladders and other special edges whose length is not the
    /// distance between area centers
    pub special_length: Option<f32>,
}

/// One walkable region of the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavArea {
    pub id: AreaId,
    pub center: Vec3,
    /// Half size on the ground plane, used for random point queries
    pub half_extent: Vec2,
    pub connections: Vec<NavConnection>,
    /// Closed to a team (gates, respawn doors)
    pub blocked: PerTeam<bool>,
    /// Spawn room owned by this team
    pub spawn_room: Option<Team>,
    /// Covered by an emplacement hostile to this team
    pub emplacement_danger: PerTeam<bool>,
    /// Travel distance from each team's spawn; negative when unreachable
    pub incursion: PerTeam<f32>,
    /// 0.0 = quiet, 1.0 = heavy fighting right now; decays over time
    pub combat_intensity: f32,
    /// Part of an objective that cannot currently be captured
    pub inactive_objective: bool,
}

impl NavArea {
    pub fn new(id: AreaId, center: Vec3) -> Self {
        Self {
            id,
            center,
            half_extent: Vec2::splat(25.0),
            connections: Vec::new(),
            blocked: PerTeam::splat(false),
            spawn_room: None,
            emplacement_danger: PerTeam::splat(false),
            incursion: PerTeam::splat(-1.0),
            combat_intensity: 0.0,
            inactive_objective: false,
        }
    }

    pub fn is_blocked_for(&self, team: Team) -> bool {
        self.blocked.get(team).unwrap_or(false)
    }

    /// Incursion distance for a team, `None` if unreachable or not a playing team
    pub fn incursion_for(&self, team: Team) -> Option<f32> {
        self.incursion.get(team).filter(|d| *d >= 0.0)
    }

    pub fn is_in_danger_for(&self, team: Team) -> bool {
        self.emplacement_danger.get(team).unwrap_or(false)
    }

    pub fn is_in_combat(&self) -> bool {
        self.combat_intensity > 0.0
    }

    /// Does a point lie over this area (ignoring height)?
    pub fn contains_xy(&self, point: Vec3) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent.x
            && (point.y - self.center.y).abs() <= self.half_extent.y
    }
}

/// Navigation facts consumed by the bot core
pub trait NavGraph {
    fn area(&self, id: AreaId) -> Option<&NavArea>;

    fn areas(&self) -> &[NavArea];

    /// Uniform random point on an area's floor
    fn random_point(&self, area: &NavArea, rng: &mut dyn RngCore) -> Vec3 {
        let offset_x = if area.half_extent.x > 0.0 {
            rng.gen_range(-area.half_extent.x..=area.half_extent.x)
        } else {
            0.0
        };
        let offset_y = if area.half_extent.y > 0.0 {
            rng.gen_range(-area.half_extent.y..=area.half_extent.y)
        } else {
            0.0
        };
        area.center + Vec3::new(offset_x, offset_y, 0.0)
    }

    /// Area under a point, or the one with the nearest center
    fn area_at(&self, point: Vec3) -> Option<&NavArea> {
        self.areas()
            .iter()
            .find(|a| a.contains_xy(point))
            .or_else(|| {
                self.areas().iter().min_by(|a, b| {
                    a.center
                        .distance_squared(point)
                        .total_cmp(&b.center.distance_squared(point))
                })
            })
    }
}

/// In-memory navigation graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavMesh {
    areas: Vec<NavArea>,
    index: AHashMap<AreaId, usize>,
}

impl NavMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_area(&mut self, area: NavArea) {
        match self.index.get(&area.id) {
            Some(&idx) => self.areas[idx] = area,
            None => {
                self.index.insert(area.id, self.areas.len());
                self.areas.push(area);
            }
        }
    }

    pub fn area_mut(&mut self, id: AreaId) -> Option<&mut NavArea> {
        let idx = *self.index.get(&id)?;
        self.areas.get_mut(idx)
    }

    /// Link two areas both ways
    pub fn connect(&mut self, a: AreaId, b: AreaId) {
        self.connect_one_way(a, b, None);
        self.connect_one_way(b, a, None);
    }

    pub fn connect_one_way(&mut self, from: AreaId, to: AreaId, special_length: Option<f32>) {
        if let Some(area) = self.area_mut(from) {
            if !area.connections.iter().any(|c| c.to == to) {
                area.connections.push(NavConnection { to, special_length });
            }
        }
    }

    /// Raise fighting intensity in an area (clamped to 1.0)
    pub fn record_combat(&mut self, id: AreaId, amount: f32) {
        if let Some(area) = self.area_mut(id) {
            area.combat_intensity = (area.combat_intensity + amount).min(1.0);
        }
    }

    /// Let fighting intensity fade everywhere
    pub fn decay_combat(&mut self, amount: f32) {
        for area in &mut self.areas {
            area.combat_intensity = (area.combat_intensity - amount).max(0.0);
        }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

impl NavGraph for NavMesh {
    fn area(&self, id: AreaId) -> Option<&NavArea> {
        self.index.get(&id).and_then(|&idx| self.areas.get(idx))
    }

    fn areas(&self) -> &[NavArea] {
        &self.areas
    }
}
