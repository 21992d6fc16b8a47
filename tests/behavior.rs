use capman::behavior::{
    approach_order, Behavior, DecisionContext, EnergeticRandom, GuardPhase, GuardSignal, MethodicalHunt, Npc, NpcState,
    PlayerView, RelentlessChase, SecurityChase, Wander,
};
use capman::entity::Archetype;
use capman::map::direction::Direction;
use capman::map::GridMap;
use glam::IVec2;
use pretty_assertions::assert_eq;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use speculoos::prelude::*;

mod common;

fn player_at(cell: IVec2) -> PlayerView {
    PlayerView {
        cell,
        direction: None,
        moving: false,
    }
}

fn context(map: &GridMap, cell: IVec2, player: PlayerView) -> DecisionContext<'_> {
    DecisionContext {
        map,
        cell,
        facing: None,
        state: NpcState::Normal,
        home: cell,
        player,
    }
}

#[test]
fn test_archetype_strategies() {
    let mut rng = SmallRng::seed_from_u64(common::SEED);
    assert_that(&Behavior::for_archetype(Archetype::Player, &mut rng)).is_none();
    assert!(matches!(
        Behavior::for_archetype(Archetype::Wife, &mut rng),
        Some(Behavior::Wander(_))
    ));
    assert!(matches!(
        Behavior::for_archetype(Archetype::Child, &mut rng),
        Some(Behavior::EnergeticRandom(_))
    ));
    assert!(matches!(
        Behavior::for_archetype(Archetype::YelpDownvote, &mut rng),
        Some(Behavior::RelentlessChase(_))
    ));
    assert!(matches!(
        Behavior::for_archetype(Archetype::GoogleDownvote, &mut rng),
        Some(Behavior::MethodicalHunt(_))
    ));
    assert!(matches!(
        Behavior::for_archetype(Archetype::SecurityGuard, &mut rng),
        Some(Behavior::SecurityChase(_))
    ));
}

#[test]
fn test_equal_gaps_are_shuffled_when_asked() {
    let mut rng = SmallRng::seed_from_u64(common::SEED);
    let mut horizontal_first = 0;
    for _ in 0..200 {
        let order = approach_order(IVec2::new(3, -3), true, &mut rng);
        assert_eq!(order.len(), 2);
        if order[0] == Direction::Right {
            horizontal_first += 1;
        }
    }
    assert_that(&horizontal_first).is_greater_than(50);
    assert_that(&horizontal_first).is_less_than(150);
}

#[test]
fn test_relentless_chase_mostly_closes_in() {
    let map = common::standard_map();
    let ctx = context(&map, IVec2::new(4, 15), player_at(IVec2::new(8, 15)));
    let mut yelp = RelentlessChase::default();
    let mut rng = SmallRng::seed_from_u64(common::SEED);

    let toward = (0..500)
        .filter(|_| yelp.decide(&ctx, &mut rng) == Some(Direction::Right))
        .count();
    // 80% greedy, plus a third of the random steps.
    assert_that(&toward).is_greater_than(350);
    assert_that(&toward).is_less_than(500);
}

#[test]
fn test_menace_and_calculation_ramp_and_cap() {
    let mut yelp = RelentlessChase::default();
    let mut google = MethodicalHunt::default();
    for _ in 0..10 {
        yelp.tick();
        google.tick();
    }
    assert!((yelp.menace_level - 2.0).abs() < 1e-4);
    assert!((google.calculation_level - 1.5).abs() < 1e-4);

    for _ in 0..1000 {
        yelp.tick();
        google.tick();
    }
    assert_that(&yelp.menace_level).is_equal_to(100.0);
    assert_that(&google.calculation_level).is_equal_to(100.0);
}

#[test]
fn test_methodical_prediction_depth_and_walls() {
    let map = common::standard_map();
    let moving_left = |cell| PlayerView {
        cell,
        direction: Some(Direction::Left),
        moving: true,
    };

    let mut google = MethodicalHunt::default();
    assert_that(&google.prediction_steps()).is_equal_to(2);
    assert_eq!(google.predict(moving_left(IVec2::new(9, 15)), &map), IVec2::new(7, 15));
    assert_eq!(google.predict(moving_left(IVec2::new(5, 15)), &map), IVec2::new(4, 15));
    assert_eq!(google.predict(player_at(IVec2::new(9, 15)), &map), IVec2::new(9, 15));

    google.calculation_level = 100.0;
    assert_that(&google.prediction_steps()).is_equal_to(4);
    assert_eq!(google.predict(moving_left(IVec2::new(9, 15)), &map), IVec2::new(5, 15));
}

#[test]
fn test_methodical_hunt_records_its_prediction() {
    let map = common::standard_map();
    let player = PlayerView {
        cell: IVec2::new(9, 15),
        direction: Some(Direction::Left),
        moving: true,
    };
    let ctx = context(&map, IVec2::new(4, 15), player);
    let mut google = MethodicalHunt::default();
    let mut rng = SmallRng::seed_from_u64(common::SEED);

    for _ in 0..20 {
        google.decide(&ctx, &mut rng);
    }
    assert_that(&google.last_prediction).is_equal_to(Some(IVec2::new(7, 15)));
}

#[test]
fn test_methodical_hunt_is_reproducible_under_a_seed() {
    let map = common::standard_map();
    let run = || {
        let mut google = MethodicalHunt::default();
        let mut rng = SmallRng::seed_from_u64(common::SEED);
        let mut seen = Vec::new();
        for x in (2..=17).rev() {
            let player = PlayerView {
                cell: IVec2::new(x, 15),
                direction: Some(Direction::Left),
                moving: true,
            };
            let ctx = context(&map, IVec2::new(4, 15), player);
            for _ in 0..40 {
                google.tick();
            }
            let choice = google.decide(&ctx, &mut rng);
            seen.push((choice, google.last_prediction));
        }
        seen
    };

    let first = run();
    assert_eq!(first, run());
    assert!(first.iter().any(|(_, prediction)| prediction.is_some()));
}

#[test]
fn test_child_runs_for_its_target() {
    let map = common::standard_map();
    let ctx = context(&map, IVec2::new(4, 15), player_at(IVec2::new(9, 15)));
    let mut child = EnergeticRandom::new(0.5);
    let mut rng = SmallRng::seed_from_u64(common::SEED);

    child.set_target(IVec2::new(8, 15));
    assert_that(&child.decide(&ctx, &mut rng)).is_equal_to(Some(Direction::Right));

    child.set_target(IVec2::new(5, 16));
    assert_that(&child.decide(&ctx, &mut rng)).is_none();
    assert_that(&child.target).is_none();
}

#[test]
fn test_paused_wife_stands_still() {
    let map = common::standard_map();
    let ctx = context(&map, IVec2::new(4, 15), player_at(IVec2::new(9, 15)));
    let mut wife = Wander { pause_ticks: 10.0 };
    let mut rng = SmallRng::seed_from_u64(common::SEED);
    assert_that(&wife.decide(&ctx, &mut rng)).is_none();

    wife.on_state_change(NpcState::Frightened);
    assert_that(&wife.pause_ticks).is_equal_to(0.0);
}

#[test]
fn test_guard_enters_inward_and_leaves_toward_the_tunnel() {
    let map = common::standard_map();
    let mut rng = SmallRng::seed_from_u64(common::SEED);
    let mut guard = SecurityChase::default();

    guard.activate(IVec2::new(-1, 9));
    let entering = context(&map, IVec2::new(-1, 9), player_at(IVec2::new(9, 15)));
    assert_that(&guard.decide(&entering, &mut rng)).is_equal_to(Some(Direction::Right));
    let entering_right = context(&map, IVec2::new(19, 9), player_at(IVec2::new(9, 15)));
    assert_that(&guard.decide(&entering_right, &mut rng)).is_equal_to(Some(Direction::Left));

    assert_that(&guard.observe(&map, IVec2::new(0, 9), 16.0)).is_equal_to(Some(GuardSignal::Arrived));
    assert_that(&guard.phase).is_equal_to(GuardPhase::Chasing);

    let chasing = context(&map, IVec2::new(4, 15), player_at(IVec2::new(8, 15)));
    assert_that(&guard.decide(&chasing, &mut rng)).is_equal_to(Some(Direction::Right));
    assert_that(&guard.alert_level).is_equal_to(50.5);

    guard.deactivate();
    let leaving = context(&map, IVec2::new(4, 9), player_at(IVec2::new(9, 15)));
    assert_that(&guard.decide(&leaving, &mut rng)).is_equal_to(Some(Direction::Left));
}

#[test]
fn test_leaving_guard_exits_or_times_out() {
    let map = common::standard_map();

    let mut exiting = SecurityChase::default();
    exiting.activate(IVec2::new(-1, 9));
    exiting.deactivate();
    assert_that(&exiting.observe(&map, IVec2::new(1, 9), 16.0)).is_none();
    assert_that(&exiting.observe(&map, IVec2::new(0, 9), 16.0)).is_equal_to(Some(GuardSignal::Left));
    assert_that(&exiting.phase).is_equal_to(GuardPhase::Inactive);

    let mut stuck = SecurityChase::default();
    stuck.activate(IVec2::new(-1, 9));
    stuck.deactivate();
    assert_that(&stuck.observe(&map, IVec2::new(4, 3), 19_999.0)).is_none();
    assert_that(&stuck.observe(&map, IVec2::new(4, 3), 1.0)).is_equal_to(Some(GuardSignal::TimedOut));
    assert_that(&stuck.is_visible()).is_false();
}

#[test]
fn test_downvotes_ignore_power_pellets() {
    let mut yelp = Npc::new(Behavior::RelentlessChase(RelentlessChase::default()));
    let mut google = Npc::new(Behavior::MethodicalHunt(MethodicalHunt::default()));
    let mut wife = Npc::new(Behavior::Wander(Wander::default()));

    assert_that(&yelp.set_state(NpcState::Frightened, Some(10_000))).is_false();
    assert_that(&google.set_state(NpcState::Frightened, Some(10_000))).is_false();
    assert_that(&wife.set_state(NpcState::Frightened, Some(10_000))).is_true();
    assert_that(&yelp.state).is_equal_to(NpcState::Normal);
    assert_that(&wife.state).is_equal_to(NpcState::Frightened);
}

#[test]
fn test_active_guards_ignore_power_pellets() {
    let mut guard = Npc::new(Behavior::SecurityChase(SecurityChase::default()));
    assert_that(&guard.set_state(NpcState::Frightened, Some(100))).is_true();

    guard.reset();
    guard.as_guard_mut().unwrap().activate(IVec2::new(-1, 9));
    assert_that(&guard.set_state(NpcState::Frightened, Some(100))).is_false();
}

#[test]
fn test_timed_states_fall_back_to_normal() {
    let mut rng = SmallRng::seed_from_u64(common::SEED);
    let mut wife = Npc::new(Behavior::Wander(Wander::default()));
    wife.set_state(NpcState::Frightened, Some(100));

    for _ in 0..6 {
        wife.tick(16.0, &mut rng);
    }
    assert_that(&wife.state).is_equal_to(NpcState::Frightened);

    wife.tick(16.0, &mut rng);
    assert_that(&wife.state).is_equal_to(NpcState::Normal);
    assert_that(&wife.state_timer_ms).is_none();
}

#[test]
fn test_returning_npc_heads_home() {
    let map = common::standard_map();
    let mut rng = SmallRng::seed_from_u64(common::SEED);
    let mut wife = Npc::new(Behavior::Wander(Wander::default()));
    wife.set_state(NpcState::Returning, None);

    let away = DecisionContext {
        home: IVec2::new(8, 15),
        ..context(&map, IVec2::new(4, 15), player_at(IVec2::new(9, 15)))
    };
    wife.decide(&away, &mut rng);
    assert_that(&wife.pending).is_equal_to(Some(Direction::Right));
    assert_that(&wife.state).is_equal_to(NpcState::Returning);

    let home = context(&map, IVec2::new(8, 15), player_at(IVec2::new(9, 15)));
    wife.decide(&home, &mut rng);
    assert_that(&wife.state).is_equal_to(NpcState::Normal);
}

#[test]
fn test_only_children_collect_hats() {
    let mut rng = SmallRng::seed_from_u64(common::SEED);
    for archetype in [
        Archetype::Wife,
        Archetype::Child,
        Archetype::SecurityGuard,
        Archetype::YelpDownvote,
        Archetype::GoogleDownvote,
    ] {
        let npc = Npc::new(Behavior::for_archetype(archetype, &mut rng).unwrap());
        assert_eq!(npc.can_collect_hats(), archetype == Archetype::Child, "{archetype}");
    }
}
