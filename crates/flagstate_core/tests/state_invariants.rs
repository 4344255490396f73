//! Integration tests for the state container's structural guarantees.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use flagstate_core::ecs::accept_all;
use flagstate_core::{
    result_code, AngularVelocity, CollisionGeometry, ComponentKind, ComponentMask, ControlStyle,
    EcsError, EcsResult, EntityId, ListenerId, MouseControls, Orientation, Physics, Position,
    ResultCode, ScalarMultFunc, Scale, State, StateConfig, Vec3, Velocity, WasdControls,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn grow(base: Vec3, time_ms: u32) -> Vec3 {
    base * (1.0 + time_ms as f32 / 1000.0)
}

fn add_kind(state: &mut State, id: EntityId, kind: ComponentKind) -> EcsResult<()> {
    match kind {
        ComponentKind::Position => state.add(id, Position::default()),
        ComponentKind::Velocity => state.add(id, Velocity::default()),
        ComponentKind::Orientation => state.add(id, Orientation::default()),
        ComponentKind::AngularVelocity => state.add(id, AngularVelocity::default()),
        ComponentKind::Scale => state.add(id, Scale::default()),
        ComponentKind::ScalarMultFunc => state.add(id, ScalarMultFunc::new(grow)),
        ComponentKind::Physics => {
            state.add(id, Physics::new(1.0, CollisionGeometry::Sphere { radius: 0.5 }))
        }
        ComponentKind::WasdControls => state.add(id, WasdControls::new(id, ControlStyle::Free)),
        ComponentKind::MouseControls => state.add(id, MouseControls::default()),
    }
}

fn remove_kind(state: &mut State, id: EntityId, kind: ComponentKind) -> EcsResult<()> {
    match kind {
        ComponentKind::Position => state.remove::<Position>(id).map(drop),
        ComponentKind::Velocity => state.remove::<Velocity>(id).map(drop),
        ComponentKind::Orientation => state.remove::<Orientation>(id).map(drop),
        ComponentKind::AngularVelocity => state.remove::<AngularVelocity>(id).map(drop),
        ComponentKind::Scale => state.remove::<Scale>(id).map(drop),
        ComponentKind::ScalarMultFunc => state.remove::<ScalarMultFunc>(id).map(drop),
        ComponentKind::Physics => state.remove::<Physics>(id).map(drop),
        ComponentKind::WasdControls => state.remove::<WasdControls>(id).map(drop),
        ComponentKind::MouseControls => state.remove::<MouseControls>(id).map(drop),
    }
}

/// Every mask bit must match a table row, and every table row a mask bit.
fn assert_masks_match_tables(state: &State) {
    for (id, existence) in state.entities() {
        assert_eq!(existence.components_present, state.tables().probe_mask(id), "{id}");
    }
    for kind in ComponentKind::ALL {
        let with_bit = state.entities().filter(|(_, e)| e.has(kind)).count();
        assert_eq!(state.tables().len_of(kind), with_bit, "{kind}");
    }
}

/// The list holds exactly the alive matching ids its discover handler admits.
fn assert_list_exact(state: &State, listener: ListenerId, admits: fn(EntityId) -> bool) {
    let likeness = state.fabric().likeness(listener).unwrap();
    let expected: BTreeSet<EntityId> = state
        .entities()
        .filter(|(id, e)| e.components_present.contains_all(likeness) && admits(*id))
        .map(|(id, _)| id)
        .collect();
    let listed: Vec<EntityId> = state.matching_snapshot(listener);
    let actual: BTreeSet<EntityId> = listed.iter().copied().collect();
    assert_eq!(listed.len(), actual.len(), "duplicate ids for {likeness}");
    assert_eq!(actual, expected, "list drifted for {likeness}");
}

fn assert_lists_exact(state: &State, listeners: &[ListenerId]) {
    for &listener in listeners {
        assert_list_exact(state, listener, |_| true);
    }
}

fn even(id: EntityId) -> bool {
    id.raw() % 2 == 0
}

#[test]
fn test_random_operations_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut state = State::new();
    let likenesses = [
        ComponentMask::EMPTY,
        ComponentKind::Position | ComponentKind::Velocity,
        ComponentKind::Physics.into(),
        ComponentKind::Velocity | ComponentKind::Orientation | ComponentKind::Scale,
    ];
    let listeners: Vec<ListenerId> = likenesses
        .iter()
        .map(|&m| state.listen_for_like_entities(m, accept_all(), accept_all()))
        .collect();
    let mut alive: Vec<EntityId> = Vec::new();

    for _ in 0..4_000 {
        let roll = rng.gen_range(0..100);
        if alive.is_empty() || roll < 10 {
            let id = state.create_entity().unwrap();
            assert!(!alive.contains(&id), "{id} issued twice");
            alive.push(id);
        } else {
            let id = alive[rng.gen_range(0..alive.len())];
            let kind = ComponentKind::ALL[rng.gen_range(0..ComponentKind::COUNT)];
            match roll {
                10..=14 => {
                    state.delete_entity(id).unwrap();
                    alive.retain(|&a| a != id);
                    assert!(!state.is_alive(id));
                }
                15..=17 => state.clear_entity(id).unwrap(),
                18..=59 => {
                    let before = state.tables().len_of(kind);
                    match add_kind(&mut state, id, kind) {
                        Ok(()) => assert_eq!(state.tables().len_of(kind), before + 1),
                        Err(EcsError::PrerequisiteFailed { .. } | EcsError::Redundant { .. }) => {
                            assert_eq!(state.tables().len_of(kind), before);
                        }
                        Err(other) => panic!("unexpected {other}"),
                    }
                }
                _ => {
                    let before = state.tables().len_of(kind);
                    match remove_kind(&mut state, id, kind) {
                        Ok(()) => assert_eq!(state.tables().len_of(kind), before - 1),
                        Err(
                            EcsError::DependencyFailed { .. }
                            | EcsError::NonexistentComponent { .. },
                        ) => {
                            assert_eq!(state.tables().len_of(kind), before);
                        }
                        Err(other) => panic!("unexpected {other}"),
                    }
                }
            }
        }
        assert_eq!(state.alive_count(), alive.len());
        assert_masks_match_tables(&state);
        assert_lists_exact(&state, &listeners);
    }
}

/// Subscriptions whose handlers mutate the state they are notified from.
struct Busy {
    everyone: ListenerId,
    positioned: ListenerId,
    movers: ListenerId,
    scaled: ListenerId,
    even_velocity: ListenerId,
}

impl Busy {
    fn register(state: &mut State) -> Self {
        let everyone =
            state.listen_for_like_entities(ComponentMask::EMPTY, accept_all(), accept_all());

        // Anything that gains Position gains Velocity too.
        let positioned = state.listen_for_like_entities(
            ComponentKind::Position.into(),
            Box::new(|state: &mut State, id: EntityId| {
                let bare = state.has(id, ComponentKind::Position)
                    && !state.has(id, ComponentKind::Velocity);
                if bare {
                    state.add(id, Velocity::default()).unwrap();
                }
                true
            }),
            accept_all(),
        );

        // A mover that stops drops its loose Scale.
        let movers = state.listen_for_like_entities(
            ComponentKind::Position | ComponentKind::Velocity,
            accept_all(),
            Box::new(|state: &mut State, id: EntityId| {
                let loose = state.has(id, ComponentKind::Scale)
                    && !state.has(id, ComponentKind::ScalarMultFunc);
                if loose {
                    state.remove::<Scale>(id).unwrap();
                }
                true
            }),
        );

        // Every third id is recycled the moment it gains Scale.
        let scaled = state.listen_for_like_entities(
            ComponentKind::Scale.into(),
            Box::new(|state: &mut State, id: EntityId| {
                if id.raw() % 3 == 0 {
                    state.delete_entity(id).unwrap();
                    assert_eq!(state.create_entity().unwrap(), id);
                }
                true
            }),
            accept_all(),
        );

        let even_velocity = state.listen_for_like_entities(
            ComponentKind::Velocity.into(),
            Box::new(|_: &mut State, id: EntityId| even(id)),
            accept_all(),
        );

        Self {
            everyone,
            positioned,
            movers,
            scaled,
            even_velocity,
        }
    }

    fn check(&self, state: &State) {
        assert_lists_exact(state, &[self.everyone, self.positioned, self.movers, self.scaled]);
        assert_list_exact(state, self.even_velocity, even);
    }
}

#[test]
fn test_reentrant_handlers_keep_lists_exact() {
    for seed in 0..32 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = State::new();
        let busy = Busy::register(&mut state);
        let mut alive: Vec<EntityId> = Vec::new();

        for _ in 0..400 {
            let roll = rng.gen_range(0..100);
            if alive.is_empty() || roll < 10 {
                alive.push(state.create_entity().unwrap());
            } else {
                let id = alive[rng.gen_range(0..alive.len())];
                let kind = ComponentKind::ALL[rng.gen_range(0..ComponentKind::COUNT)];
                match roll {
                    10..=14 => {
                        state.delete_entity(id).unwrap();
                        alive.retain(|&a| a != id);
                    }
                    15..=17 => state.clear_entity(id).unwrap(),
                    18..=64 => match add_kind(&mut state, id, kind) {
                        Ok(())
                        | Err(
                            EcsError::PrerequisiteFailed { .. } | EcsError::Redundant { .. },
                        ) => {}
                        Err(other) => panic!("seed {seed}: unexpected {other}"),
                    },
                    _ => match remove_kind(&mut state, id, kind) {
                        Ok(())
                        | Err(
                            EcsError::DependencyFailed { .. }
                            | EcsError::NonexistentComponent { .. },
                        ) => {}
                        Err(other) => panic!("seed {seed}: unexpected {other}"),
                    },
                }
            }
            // Recycling inside handlers hands the same id straight back.
            assert_eq!(state.alive_count(), alive.len(), "seed {seed}");
            assert_masks_match_tables(&state);
            busy.check(&state);
        }
    }
}

#[test]
fn test_rejected_mutations_leave_tables_unchanged() {
    let mut state = State::new();
    let id = state.create_entity().unwrap();

    for kind in ComponentKind::ALL.into_iter().filter(|k| !k.required().is_empty()) {
        let err = add_kind(&mut state, id, kind).unwrap_err();
        assert_eq!(err.code(), ResultCode::PrereqFail, "{kind}");
        assert_eq!(state.tables().len_of(kind), 0);
    }
    assert_eq!(state.mask_of(id).unwrap(), ComponentMask::EMPTY);

    state.add(id, Orientation::default()).unwrap();
    state.add(id, MouseControls::new(true, false)).unwrap();
    let err = state.remove::<Orientation>(id).unwrap_err();
    assert_eq!(
        err,
        EcsError::DependencyFailed {
            id,
            kind: ComponentKind::Orientation,
            blocking: ComponentMask::of(ComponentKind::MouseControls),
        }
    );
    assert_eq!(state.tables().len_of(ComponentKind::Orientation), 1);
    assert_eq!(state.get::<MouseControls>(id).unwrap().invert_x, true);
}

#[test]
fn test_position_velocity_walkthrough() {
    let mut state = State::new();
    let a = state.create_entity().unwrap();
    assert_eq!(a.raw(), 1);

    assert_eq!(result_code(&state.add(a, Position::new(0.0, 0.0, 0.0))), ResultCode::Success);
    assert!(state.has(a, ComponentKind::Position));
    assert_eq!(result_code(&state.add(a, Velocity::new(1.0, 0.0, 0.0))), ResultCode::Success);
    assert_eq!(result_code(&state.remove::<Position>(a)), ResultCode::DependFail);
    assert_eq!(result_code(&state.remove::<Velocity>(a)), ResultCode::Success);
    assert_eq!(result_code(&state.remove::<Position>(a)), ResultCode::Success);
    assert_eq!(state.mask_of(a).unwrap(), ComponentMask::EMPTY);
}

#[derive(Default)]
struct Calls {
    discovered: Vec<EntityId>,
    forgotten: Vec<EntityId>,
}

fn recording(state: &mut State, likeness: ComponentMask) -> (ListenerId, Rc<RefCell<Calls>>) {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let on_discover = Rc::clone(&calls);
    let on_forget = Rc::clone(&calls);
    let listener = state.listen_for_like_entities(
        likeness,
        Box::new(move |_: &mut State, id: EntityId| {
            on_discover.borrow_mut().discovered.push(id);
            true
        }),
        Box::new(move |_: &mut State, id: EntityId| {
            on_forget.borrow_mut().forgotten.push(id);
            true
        }),
    );
    (listener, calls)
}

#[test]
fn test_subscription_discovers_and_forgets_once() {
    let mut state = State::new();
    let (movers, calls) = recording(&mut state, ComponentKind::Position | ComponentKind::Velocity);

    let id = state.create_entity().unwrap();
    state.add(id, Position::default()).unwrap();
    assert!(calls.borrow().discovered.is_empty());

    state.add(id, Velocity::default()).unwrap();
    assert_eq!(calls.borrow().discovered, vec![id]);
    assert_eq!(state.matching(movers), &[id]);

    // Position cannot leave while Velocity depends on it.
    assert!(state.remove::<Position>(id).is_err());
    assert!(calls.borrow().forgotten.is_empty());

    state.remove::<Velocity>(id).unwrap();
    assert_eq!(calls.borrow().forgotten, vec![id]);
    assert!(state.matching(movers).is_empty());

    // Re-crossing discovers again.
    state.add(id, Velocity::default()).unwrap();
    assert_eq!(calls.borrow().discovered, vec![id, id]);
}

#[test]
fn test_removing_either_side_of_unlinked_mask_forgets() {
    let mut state = State::new();
    let (listener, calls) = recording(&mut state, ComponentKind::Position | ComponentKind::Scale);

    let id = state.create_entity().unwrap();
    state.add(id, Position::default()).unwrap();
    state.add(id, Scale::default()).unwrap();
    assert_eq!(state.matching(listener), &[id]);

    state.remove::<Position>(id).unwrap();
    assert_eq!(calls.borrow().forgotten, vec![id]);
    assert!(state.matching(listener).is_empty());
}

#[test]
fn test_delete_forgets_every_subscription() {
    let mut state = State::new();
    let (everyone, everyone_calls) = recording(&mut state, ComponentMask::EMPTY);
    let (movers, mover_calls) =
        recording(&mut state, ComponentKind::Position | ComponentKind::Velocity);

    let id = state.create_entity().unwrap();
    state.add(id, Position::default()).unwrap();
    state.add(id, Velocity::default()).unwrap();
    assert_eq!(state.matching(everyone), &[id]);

    state.delete_entity(id).unwrap();
    assert_eq!(everyone_calls.borrow().forgotten, vec![id]);
    assert_eq!(mover_calls.borrow().forgotten, vec![id]);
    assert!(state.matching(everyone).is_empty());
    assert!(state.matching(movers).is_empty());
    assert_eq!(state.delete_entity(id), Err(EcsError::NonexistentEntity(id)));
}

#[test]
fn test_clear_twice_is_idempotent() {
    let mut state = State::new();
    let (_, calls) = recording(&mut state, ComponentMask::of(ComponentKind::Scale));

    let id = state.create_entity().unwrap();
    state.add(id, Scale::default()).unwrap();
    state.add(id, ScalarMultFunc::new(grow)).unwrap();

    state.clear_entity(id).unwrap();
    assert_eq!(calls.borrow().forgotten, vec![id]);
    assert!(state.is_alive(id));
    assert_eq!(state.tables().len_of(ComponentKind::Scale), 0);
    assert_eq!(state.tables().len_of(ComponentKind::ScalarMultFunc), 0);

    state.clear_entity(id).unwrap();
    assert_eq!(calls.borrow().forgotten.len(), 1);
    assert_eq!(state.mask_of(id).unwrap(), ComponentMask::EMPTY);
}

#[test]
fn test_lifo_reuse() {
    let mut state = State::new();
    let a = state.create_entity().unwrap();
    let b = state.create_entity().unwrap();
    state.delete_entity(a).unwrap();
    state.delete_entity(b).unwrap();

    assert_eq!(state.create_entity().unwrap(), b);
    assert_eq!(state.create_entity().unwrap(), a);
    assert_eq!(state.create_entity().unwrap().raw(), 3);
}

#[test]
fn test_exhaustion_is_repeatable_and_recoverable() {
    let config = StateConfig::from_toml_str("id_limit = 4\ninitial_capacity = 4").unwrap();
    let mut state = State::with_config(&config);
    let ids: Vec<EntityId> = (0..3).map(|_| state.create_entity().unwrap()).collect();
    assert_eq!(ids.iter().map(|id| id.raw()).collect::<Vec<_>>(), vec![1, 2, 3]);

    for _ in 0..3 {
        let exhausted = state.create_entity();
        assert_eq!(exhausted, Err(EcsError::MaxIdReached { limit: 4 }));
        assert_eq!(result_code(&exhausted), ResultCode::MaxIdReached);
        assert_eq!(state.alive_count(), 3);
    }

    state.delete_entity(ids[1]).unwrap();
    assert_eq!(state.create_entity().unwrap(), ids[1]);
    assert!(state.create_entity().is_err());
}
