//! Route search driven by the bot path cost function
//!
//! Runs the reference A* in `common` against small graphs to check that the
//! cost function steers routes the way bots expect.

mod common;

use glam::Vec3;
use proptest::prelude::*;

use skirmish_bots::core::config::{MovementConfig, PathConfig};
use skirmish_bots::core::types::{AreaId, EntityHandle, Role, Team};
use skirmish_bots::nav::{FromArea, NavArea, NavMesh, PathCostContext, PathCostEvaluator, RouteType};

use common::{corridor, find_route};

fn flat() -> PathConfig {
    PathConfig {
        route_jitter: 0.0,
        ..PathConfig::default()
    }
}

/// Two routes from 0 to 3: north through 1, south through 2
fn diamond() -> NavMesh {
    let mut nav = NavMesh::new();
    nav.add_area(NavArea::new(AreaId(0), Vec3::ZERO));
    nav.add_area(NavArea::new(AreaId(1), Vec3::new(400.0, 300.0, 0.0)));
    nav.add_area(NavArea::new(AreaId(2), Vec3::new(400.0, -300.0, 0.0)));
    nav.add_area(NavArea::new(AreaId(3), Vec3::new(800.0, 0.0, 0.0)));
    nav.connect(AreaId(0), AreaId(1));
    nav.connect(AreaId(0), AreaId(2));
    nav.connect(AreaId(1), AreaId(3));
    nav.connect(AreaId(2), AreaId(3));
    nav
}

#[test]
fn test_straight_corridor_costs_its_length() {
    let nav = corridor(5);
    let movement = MovementConfig::default();
    let weights = flat();
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

    let (route, cost) = find_route(&nav, &eval, AreaId(0), AreaId(3)).expect("route");
    assert_eq!(route, vec![AreaId(0), AreaId(1), AreaId(2), AreaId(3)]);
    assert!((cost - 3.0 * common::SPACING).abs() < 1e-3);
}

#[test]
fn test_enemy_spawn_unreachable_until_round_won() {
    let nav = corridor(5);
    let movement = MovementConfig::default();
    let weights = flat();
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

    assert!(find_route(&nav, &eval, AreaId(0), AreaId(4)).is_none());
    let winner = eval.clone().with_round_winner(Some(Team::Red));
    assert!(find_route(&nav, &winner, AreaId(0), AreaId(4)).is_some());
}

#[test]
fn test_safest_route_detours_around_fighting() {
    let mut nav = diamond();
    nav.record_combat(AreaId(1), 1.0);
    let movement = MovementConfig::default();
    let weights = flat();
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

    let (fast_route, _) = find_route(&nav, &fastest, AreaId(0), AreaId(3)).expect("route");
    let (safe_route, _) = find_route(&nav, &safest, AreaId(0), AreaId(3)).expect("route");
    assert_eq!(fast_route.len(), 3);
    assert_eq!(safe_route, vec![AreaId(0), AreaId(2), AreaId(3)]);
}

#[test]
fn test_blocked_gate_forces_detour() {
    let mut nav = diamond();
    if let Some(gate) = nav.area_mut(AreaId(2)) {
        gate.blocked.set(Team::Blue, true);
    }
    let movement = MovementConfig::default();
    let weights = flat();
    let context = PathCostContext::default();

    for team in Team::PLAYING {
        let eval = PathCostEvaluator::new(
            EntityHandle(1),
            team,
            Role::Scout,
            RouteType::Fastest,
            0.0,
            &movement,
            &weights,
            &context,
        );
        let (route, _) = find_route(&nav, &eval, AreaId(0), AreaId(3)).expect("route");
        if team == Team::Blue {
            assert_eq!(route[1], AreaId(1));
        }
    }
}

#[test]
fn test_spy_avoids_crowded_teammates() {
    let nav = diamond();
    let movement = MovementConfig::default();
    let weights = flat();
    let mut context = PathCostContext::default();
    context.teammates_per_area.insert(AreaId(1), 3);

    let spy = PathCostEvaluator::new(
        EntityHandle(1),
        Team::Blue,
        Role::Spy,
        RouteType::Fastest,
        0.0,
        &movement,
        &weights,
        &context,
    );
    let (route, _) = find_route(&nav, &spy, AreaId(0), AreaId(3)).expect("route");
    assert_eq!(route[1], AreaId(2));
}

#[test]
fn test_unclimbable_ledge_cuts_the_route() {
    let mut nav = NavMesh::new();
    nav.add_area(NavArea::new(AreaId(0), Vec3::ZERO));
    nav.add_area(NavArea::new(AreaId(1), Vec3::new(200.0, 0.0, 150.0)));
    nav.connect(AreaId(0), AreaId(1));
    let movement = MovementConfig::default();
    let weights = flat();
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

    assert!(find_route(&nav, &eval, AreaId(0), AreaId(1)).is_none());
    // dropping back down is survivable
    let (route, _) = find_route(&nav, &eval, AreaId(1), AreaId(0)).expect("route");
    assert_eq!(route.len(), 2);
}

proptest! {
    #[test]
    fn prop_step_cost_never_below_accumulated(
        dx in -2000.0f32..2000.0,
        dy in -2000.0f32..2000.0,
        dz in -400.0f32..400.0,
        accumulated in 0.0f32..10_000.0,
        intensity in 0.0f32..1.0,
        safest in any::<bool>(),
        agent in 1u32..500,
        now in 0.0f32..100.0,
    ) {
        let movement = MovementConfig::default();
        let weights = PathConfig::default();
        let context = PathCostContext::default();
        let route = if safest { RouteType::Safest } else { RouteType::Fastest };
        let eval = PathCostEvaluator::new(
            EntityHandle(agent),
            Team::Red,
            Role::Soldier,
            route,
            now,
            &movement,
            &weights,
            &context,
        );
        let from_area = NavArea::new(AreaId(0), Vec3::ZERO);
        let mut to_area = NavArea::new(AreaId(1), Vec3::new(dx, dy, dz));
        to_area.combat_intensity = intensity;
        let from = FromArea { area: &from_area, accumulated };

        match eval.cost(&to_area, Some(from), None) {
            Some(cost) => {
                prop_assert!(cost >= accumulated);
                prop_assert!(dz <= movement.max_jump_height);
                prop_assert!(dz >= -movement.death_drop_height);
            }
            None => {
                prop_assert!(dz > movement.max_jump_height || dz < -movement.death_drop_height);
            }
        }
    }
}
