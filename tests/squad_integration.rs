//! Squad membership, leadership and formation checks

use ahash::AHashMap;
use proptest::prelude::*;

use skirmish_bots::core::config::SquadConfig;
use skirmish_bots::core::types::EntityHandle;
use skirmish_bots::squad::{MemberFormation, SquadCoordinator, SquadEvent};

fn member(error: f32) -> MemberFormation {
    MemberFormation {
        error,
        broke_formation: false,
        stuck: false,
        self_managed: false,
        alive: true,
    }
}

fn roster(handles: &[u32]) -> AHashMap<EntityHandle, MemberFormation> {
    handles.iter().map(|h| (EntityHandle(*h), member(0.0))).collect()
}

const L: EntityHandle = EntityHandle(1);
const A: EntityHandle = EntityHandle(2);
const B: EntityHandle = EntityHandle(3);

#[test]
fn test_leave_then_leader_loss_disbands() {
    let mut squads = SquadCoordinator::new(SquadConfig::default());
    let states = roster(&[1, 2, 3]);
    let id = squads.create(L).expect("create");
    squads.join(id, A).expect("join");
    squads.join(id, B).expect("join");

    assert!(squads.leave(B, &states).is_empty());
    assert_eq!(squads.member_count(id, &states), 2);
    assert_eq!(squads.leader_of(A), Some(L));

    let events = squads.leave(L, &states);
    assert_eq!(
        events,
        vec![SquadEvent::Disbanded {
            squad: id,
            members: vec![A],
        }]
    );
    assert!(squads.squad_of(A).is_none());
    assert!(squads.squad(id).is_none());
}

#[test]
fn test_preserving_squad_skips_dead_candidates() {
    let config = SquadConfig {
        preserve_on_leader_loss: true,
        ..SquadConfig::default()
    };
    let mut squads = SquadCoordinator::new(config);
    let mut states = roster(&[1, 2, 3]);
    if let Some(a) = states.get_mut(&A) {
        a.alive = false;
    }
    let id = squads.create(L).expect("create");
    squads.join(id, A).expect("join");
    squads.join(id, B).expect("join");

    let events = squads.leave(L, &states);
    assert_eq!(
        events,
        vec![SquadEvent::LeaderChanged {
            squad: id,
            leader: B,
        }]
    );
    assert_eq!(squads.member_count(id, &states), 1);
    assert!(squads.is_leader(B));
}

#[test]
fn test_preserving_squad_with_nobody_alive_disbands() {
    let config = SquadConfig {
        preserve_on_leader_loss: true,
        ..SquadConfig::default()
    };
    let mut squads = SquadCoordinator::new(config);
    let mut states = roster(&[1, 2, 3]);
    for handle in [A, B] {
        if let Some(state) = states.get_mut(&handle) {
            state.alive = false;
        }
    }
    let id = squads.create(L).expect("create");
    squads.join(id, A).expect("join");
    squads.join(id, B).expect("join");

    let events = squads.leave(L, &states);
    assert_eq!(
        events,
        vec![SquadEvent::Disbanded {
            squad: id,
            members: vec![A, B],
        }]
    );
    assert!(squads.squad(id).is_none());
    assert!(squads.squad_of(A).is_none());
    assert!(squads.squad_of(B).is_none());
}

#[test]
fn test_double_membership_rejected() {
    let mut squads = SquadCoordinator::new(SquadConfig::default());
    let first = squads.create(L).expect("create");
    let second = squads.create(A).expect("create");
    assert!(squads.join(second, L).is_err());
    assert!(squads.create(A).is_err());
    assert_eq!(squads.squad_of(L), Some(first));
}

#[test]
fn test_formation_checks_ignore_self_managed_and_stuck() {
    let mut squads = SquadCoordinator::new(SquadConfig::default());
    let id = squads.create(L).expect("create");
    for handle in [2, 3, 4] {
        squads.join(id, EntityHandle(handle)).expect("join");
    }
    let mut states = roster(&[1]);
    states.insert(A, member(0.5));
    states.insert(
        B,
        MemberFormation {
            self_managed: true,
            ..member(3.0)
        },
    );
    states.insert(
        EntityHandle(4),
        MemberFormation {
            stuck: true,
            ..member(5.0)
        },
    );

    assert!(squads.is_in_formation(id, &states));
    assert!(!squads.should_leader_wait(id, &states));
    assert_eq!(squads.max_formation_error(id, &states), 5.0);

    states.insert(A, member(1.2));
    assert!(!squads.is_in_formation(id, &states));
    assert!(squads.should_leader_wait(id, &states));
}

#[derive(Debug, Clone)]
enum Op {
    Join,
    Leave(usize),
    Kill(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Join),
        (0usize..16).prop_map(Op::Leave),
        (0usize..16).prop_map(Op::Kill),
    ]
}

proptest! {
    #[test]
    fn prop_member_count_matches_living_roster(
        ops in prop::collection::vec(op(), 1..40),
        preserve in any::<bool>(),
    ) {
        let config = SquadConfig {
            preserve_on_leader_loss: preserve,
            ..SquadConfig::default()
        };
        let mut squads = SquadCoordinator::new(config);
        let mut states = roster(&[1]);
        let id = squads.create(L).expect("create");
        let mut expected: Vec<EntityHandle> = vec![L];
        let mut next = 2u32;

        for op in ops {
            if squads.squad(id).is_none() {
                break;
            }
            match op {
                Op::Join => {
                    let handle = EntityHandle(next);
                    next += 1;
                    states.insert(handle, member(0.0));
                    squads.join(id, handle).expect("join");
                    expected.push(handle);
                }
                Op::Leave(index) => {
                    let Some(&handle) = expected.get(index % expected.len()) else { continue };
                    squads.leave(handle, &states);
                    expected.retain(|m| *m != handle);
                }
                Op::Kill(index) => {
                    let Some(&handle) = expected.get(index % expected.len()) else { continue };
                    if let Some(state) = states.get_mut(&handle) {
                        state.alive = false;
                    }
                }
            }

            let Some(squad) = squads.squad(id) else {
                // disbanding clears every reference
                for handle in &expected {
                    prop_assert!(squads.squad_of(*handle).is_none());
                }
                break;
            };
            let living = expected
                .iter()
                .filter(|m| states.get(*m).is_some_and(|s| s.alive))
                .count();
            prop_assert_eq!(squads.member_count(id, &states), living);
            prop_assert_eq!(squad.members(), expected.as_slice());
            prop_assert!(squad.contains(squad.leader()));
        }
    }
}
