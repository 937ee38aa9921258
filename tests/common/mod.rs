//! Shared fixtures for integration tests
//!
//! Includes a small A* that routes over a `NavGraph` using the bot path cost
//! function, the way a host's route search would.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::AHashMap;
use glam::{Vec2, Vec3};

use skirmish_bots::core::types::{AreaId, EntityHandle, PerTeam, Role, Team};
use skirmish_bots::nav::{FromArea, NavArea, NavGraph, NavMesh, PathCostEvaluator};
use skirmish_bots::world::{Participant, WorldSnapshot};

pub const SPACING: f32 = 400.0;

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    area: AreaId,
    f_cost: f32,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.area == other.area
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other.f_cost.total_cmp(&self.f_cost)
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Route from `start` to `goal`, or `None` when every route is impassable
pub fn find_route(
    nav: &dyn NavGraph,
    evaluator: &PathCostEvaluator<'_>,
    start: AreaId,
    goal: AreaId,
) -> Option<(Vec<AreaId>, f32)> {
    let start_area = nav.area(start)?;
    let goal_center = nav.area(goal)?.center;

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<AreaId, AreaId> = AHashMap::new();
    let mut g_scores: AHashMap<AreaId, f32> = AHashMap::new();

    g_scores.insert(start, evaluator.cost(start_area, None, None)?);
    open_set.push(PathNode {
        area: start,
        f_cost: start_area.center.distance(goal_center),
    });

    while let Some(current) = open_set.pop() {
        let current_g = *g_scores.get(&current.area).unwrap_or(&f32::INFINITY);
        if current.area == goal {
            return Some((reconstruct(&came_from, goal), current_g));
        }
        let Some(area) = nav.area(current.area) else {
            continue;
        };

        for link in &area.connections {
            let Some(next) = nav.area(link.to) else {
                continue;
            };
            let from = FromArea {
                area,
                accumulated: current_g,
            };
            let Some(tentative_g) = evaluator.cost(next, Some(from), link.special_length) else {
                continue;
            };
            if tentative_g < *g_scores.get(&link.to).unwrap_or(&f32::INFINITY) {
                came_from.insert(link.to, current.area);
                g_scores.insert(link.to, tentative_g);
                open_set.push(PathNode {
                    area: link.to,
                    f_cost: tentative_g + next.center.distance(goal_center),
                });
            }
        }
    }

    None
}

fn reconstruct(came_from: &AHashMap<AreaId, AreaId>, mut current: AreaId) -> Vec<AreaId> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Straight line of `count` areas along +X, red spawn at 0, blue at the end
pub fn corridor(count: u32) -> NavMesh {
    let mut nav = NavMesh::new();
    let last = count.saturating_sub(1);
    for i in 0..count {
        let mut area = NavArea::new(AreaId(i), Vec3::new(i as f32 * SPACING, 0.0, 0.0));
        area.half_extent = Vec2::splat(SPACING / 2.0);
        area.incursion = PerTeam {
            red: i as f32 * SPACING,
            blue: (last - i) as f32 * SPACING,
        };
        if i == 0 {
            area.spawn_room = Some(Team::Red);
        } else if i == last {
            area.spawn_room = Some(Team::Blue);
        }
        nav.add_area(area);
    }
    for i in 1..count {
        nav.connect(AreaId(i - 1), AreaId(i));
    }
    nav
}

pub fn body(handle: u32, team: Team, role: Role, position: Vec3) -> Participant {
    Participant::new(EntityHandle(handle), team, role, position)
}

pub fn world_of(bodies: Vec<Participant>) -> WorldSnapshot {
    let mut world = WorldSnapshot::new();
    for participant in bodies {
        world.upsert(participant);
    }
    world
}
