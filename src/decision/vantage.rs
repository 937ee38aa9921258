//! Sniper vantage spot search
//!
//! Areas around the current objective split into a vantage set (ground this
//! agent's team holds) and a theater set (ground the enemy must cross).
//! Each step samples random point pairs across the two and keeps the best
//! few by advantage: how much farther the enemy must travel to reach the
//! vantage point than to reach the theater point it covers.

use glam::Vec3;
use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::VantageConfig;
use crate::core::timer::CountdownTimer;
use crate::core::types::{AreaId, Seconds, Team};
use crate::nav::NavGraph;
use crate::world::WorldQuery;

/// Sight line height above the floor
const EYE_HEIGHT: f32 = 64.0;

/// A sniping position and the point it watches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VantageSpot {
    pub vantage_area: AreaId,
    pub vantage: Vec3,
    pub theater_area: AreaId,
    pub theater: Vec3,
    pub advantage: f32,
}

/// What a search step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStep {
    /// Throttled or waiting out a retry
    Idle,
    /// No objective or no qualifying areas; retry scheduled
    NoAreas,
    Sampled { kept: usize },
}

/// Incrementally accumulated top-K vantage spots
#[derive(Debug, Clone)]
pub struct VantageFinder {
    config: VantageConfig,
    rng: ChaCha8Rng,
    spots: Vec<VantageSpot>,
    vantage_areas: Vec<AreaId>,
    theater_areas: Vec<AreaId>,
    /// Objective position the area sets were built for
    anchor: Option<Vec3>,
    search_timer: CountdownTimer,
    retry_timer: CountdownTimer,
}

impl VantageFinder {
    pub fn new(config: VantageConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            spots: Vec::new(),
            vantage_areas: Vec::new(),
            theater_areas: Vec::new(),
            anchor: None,
            search_timer: CountdownTimer::new(),
            retry_timer: CountdownTimer::new(),
        }
    }

    /// Spots found so far, best first
    pub fn spots(&self) -> &[VantageSpot] {
        &self.spots
    }

    pub fn best(&self) -> Option<&VantageSpot> {
        self.spots.first()
    }

    pub fn vantage_areas(&self) -> &[AreaId] {
        &self.vantage_areas
    }

    pub fn theater_areas(&self) -> &[AreaId] {
        &self.theater_areas
    }

    /// Forget everything, forcing a rebuild on the next step
    pub fn invalidate(&mut self) {
        self.spots.clear();
        self.vantage_areas.clear();
        self.theater_areas.clear();
        self.anchor = None;
        self.search_timer.invalidate();
        self.retry_timer.invalidate();
    }

    /// Split the nav areas around the objective
    ///
    /// Returns false when either set is empty.
    fn rebuild(
        &mut self,
        team: Team,
        objective: Vec3,
        defending: bool,
        nav: &dyn NavGraph,
    ) -> bool {
        self.spots.clear();
        self.vantage_areas.clear();
        self.theater_areas.clear();
        self.anchor = Some(objective);

        let Some(enemy) = team.opponent() else {
            return false;
        };
        let Some(goal) = nav.area_at(objective) else {
            return false;
        };
        let (Some(mine_at_goal), Some(enemy_at_goal)) =
            (goal.incursion_for(team), goal.incursion_for(enemy))
        else {
            return false;
        };

        let tolerance = if defending {
            self.config.point_tolerance
        } else {
            self.config.point_tolerance * self.config.attacking_tolerance_scale
        };

        for area in nav.areas() {
            if area.is_blocked_for(team) {
                continue;
            }
            if area.incursion_for(team).is_some_and(|d| d <= mine_at_goal + tolerance) {
                self.vantage_areas.push(area.id);
            }
            if area.incursion_for(enemy).is_some_and(|d| d <= enemy_at_goal) {
                self.theater_areas.push(area.id);
            }
        }

        !self.vantage_areas.is_empty() && !self.theater_areas.is_empty()
    }

    fn needs_rebuild(&self, objective: Vec3, now: Seconds) -> bool {
        match self.anchor {
            None => true,
            Some(anchor) if anchor.distance(objective) > self.config.relocate_tolerance => true,
            Some(_) => {
                let empty = self.vantage_areas.is_empty() || self.theater_areas.is_empty();
                empty && self.retry_timer.is_elapsed(now)
            }
        }
    }

    /// Run one throttled search step
    pub fn update(
        &mut self,
        team: Team,
        objective: Option<Vec3>,
        defending: bool,
        nav: &dyn NavGraph,
        world: &dyn WorldQuery,
        now: Seconds,
    ) -> SearchStep {
        let Some(objective) = objective else {
            if !self.spots.is_empty() {
                self.invalidate();
            }
            return SearchStep::NoAreas;
        };

        if self.needs_rebuild(objective, now) && !self.rebuild(team, objective, defending, nav) {
            tracing::debug!(
                "No vantage areas around objective at {:?}, retrying in {}s",
                objective,
                self.config.retry_interval
            );
            self.retry_timer.start(now, self.config.retry_interval);
            return SearchStep::NoAreas;
        }

        if self.vantage_areas.is_empty() || self.theater_areas.is_empty() {
            return SearchStep::Idle;
        }

        if !self.search_timer.is_elapsed(now) {
            return SearchStep::Idle;
        }
        let interval = self
            .rng
            .gen_range(self.config.search_interval_min..=self.config.search_interval_max);
        self.search_timer.start(now, interval);

        let kept = self.sample(team, nav, world);
        SearchStep::Sampled { kept }
    }

    fn sample(&mut self, team: Team, nav: &dyn NavGraph, world: &dyn WorldQuery) -> usize {
        let Some(enemy) = team.opponent() else {
            return 0;
        };
        let mut kept = 0;

        for _ in 0..self.config.samples_per_update {
            let vantage_id = self.vantage_areas[self.rng.gen_range(0..self.vantage_areas.len())];
            let theater_id = self.theater_areas[self.rng.gen_range(0..self.theater_areas.len())];
            let (Some(vantage_area), Some(theater_area)) =
                (nav.area(vantage_id), nav.area(theater_id))
            else {
                continue;
            };

            let vantage = nav.random_point(vantage_area, &mut self.rng) + Vec3::Z * EYE_HEIGHT;
            let theater = nav.random_point(theater_area, &mut self.rng) + Vec3::Z * EYE_HEIGHT;

            if vantage.distance(theater) < self.config.min_separation {
                continue;
            }
            if !world.is_line_of_sight_clear(vantage, theater) {
                continue;
            }

            let (Some(reach_vantage), Some(reach_theater)) =
                (vantage_area.incursion_for(enemy), theater_area.incursion_for(enemy))
            else {
                continue;
            };

            let spot = VantageSpot {
                vantage_area: vantage_id,
                vantage,
                theater_area: theater_id,
                theater,
                advantage: reach_vantage - reach_theater,
            };
            if self.offer(spot) {
                kept += 1;
            }
        }

        kept
    }

    /// Insert a spot if it ranks within the top K
    fn offer(&mut self, spot: VantageSpot) -> bool {
        if self.config.max_spots == 0 {
            return false;
        }
        if self.spots.len() >= self.config.max_spots {
            let worst = self.spots.last().map(|s| OrderedFloat(s.advantage));
            if worst.is_some_and(|w| OrderedFloat(spot.advantage) <= w) {
                return false;
            }
        }

        let position = self
            .spots
            .partition_point(|s| OrderedFloat(s.advantage) >= OrderedFloat(spot.advantage));
        self.spots.insert(position, spot);
        self.spots.truncate(self.config.max_spots);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{NavArea, NavMesh};
    use crate::world::{Occluder, WorldSnapshot};

    /// A corridor of areas along +x; red spawns at x=0, blue at the far end
    fn corridor() -> NavMesh {
        let mut mesh = NavMesh::new();
        for i in 0..10u32 {
            let mut area = NavArea::new(AreaId(i), Vec3::new(i as f32 * 500.0, 0.0, 0.0));
            area.incursion.red = i as f32 * 500.0;
            area.incursion.blue = (9 - i) as f32 * 500.0;
            mesh.add_area(area);
        }
        mesh
    }

    fn finder() -> VantageFinder {
        VantageFinder::new(VantageConfig::default(), 11)
    }

    #[test]
    fn test_partitions_around_objective() {
        let mesh = corridor();
        let world = WorldSnapshot::new();
        let mut finder = finder();
        // objective in area 5: red incursion 2500, blue incursion 2000
        finder.update(Team::Red, Some(Vec3::new(2500.0, 0.0, 0.0)), true, &mesh, &world, 0.0);

        // red areas within 2500 + 750
        assert_eq!(
            finder.vantage_areas(),
            &[AreaId(0), AreaId(1), AreaId(2), AreaId(3), AreaId(4), AreaId(5), AreaId(6)]
        );
        // blue reaches within 2000
        assert_eq!(
            finder.theater_areas(),
            &[AreaId(5), AreaId(6), AreaId(7), AreaId(8), AreaId(9)]
        );
    }

    #[test]
    fn test_spots_bounded_and_sorted() {
        let mesh = corridor();
        let world = WorldSnapshot::new();
        let mut finder = finder();
        let objective = Some(Vec3::new(2500.0, 0.0, 0.0));

        let mut now = 0.0;
        for _ in 0..50 {
            finder.update(Team::Red, objective, false, &mesh, &world, now);
            now += 0.5;
        }

        let spots = finder.spots();
        assert!(!spots.is_empty());
        assert!(spots.len() <= VantageConfig::default().max_spots);
        assert!(spots.windows(2).all(|w| w[0].advantage >= w[1].advantage));
        for spot in spots {
            assert!(spot.vantage.distance(spot.theater) >= VantageConfig::default().min_separation);
        }
    }

    #[test]
    fn test_blocked_sight_rejected() {
        let mesh = corridor();
        let mut world = WorldSnapshot::new();
        world.occluders.push(Occluder {
            center: Vec3::new(0.0, 0.0, 0.0),
            radius: 100_000.0,
        });
        let mut finder = finder();
        for step in 0..10 {
            finder.update(
                Team::Red,
                Some(Vec3::new(2500.0, 0.0, 0.0)),
                true,
                &mesh,
                &world,
                step as f32,
            );
        }
        assert!(finder.spots().is_empty());
    }

    #[test]
    fn test_no_objective_area_retries_later() {
        let mesh = NavMesh::new();
        let world = WorldSnapshot::new();
        let mut finder = finder();
        let objective = Some(Vec3::ZERO);
        assert_eq!(
            finder.update(Team::Red, objective, true, &mesh, &world, 0.0),
            SearchStep::NoAreas
        );
        assert_eq!(finder.update(Team::Red, objective, true, &mesh, &world, 1.0), SearchStep::Idle);
        assert_eq!(
            finder.update(Team::Red, objective, true, &mesh, &world, 5.5),
            SearchStep::NoAreas
        );
    }

    #[test]
    fn test_objective_move_resets_spots() {
        let mesh = corridor();
        let world = WorldSnapshot::new();
        let mut finder = finder();
        let mut now = 0.0;
        for _ in 0..20 {
            finder.update(Team::Red, Some(Vec3::new(2500.0, 0.0, 0.0)), true, &mesh, &world, now);
            now += 0.5;
        }
        assert!(!finder.spots().is_empty());

        finder.update(Team::Red, Some(Vec3::new(1000.0, 0.0, 0.0)), true, &mesh, &world, now);
        // theater now only holds ground blue reaches within 3500
        assert!(finder.theater_areas().iter().all(|id| id.0 >= 2));
        assert!(finder.spots().iter().all(|s| s.theater_area.0 >= 2));
    }
}
