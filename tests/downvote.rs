use bevy_ecs::system::RunSystemOnce;
use capman::entity::Archetype;
use capman::events::{DeathCause, GameEvent};
use capman::map::direction::Direction;
use capman::movement::RailMovement;
use capman::systems::downvote::{activate_downvote, downvote_kill_system};
use capman::systems::{DownvoteSlot, PlayerKilled};
use glam::IVec2;
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

mod common;

#[test]
fn test_activation_places_and_aims_the_downvote() {
    let mut world = common::create_test_world(common::standard_map());
    common::spawn_player(&mut world, IVec2::new(9, 15));
    let yelp = common::spawn_downvote(&mut world, 0, Archetype::YelpDownvote, false, IVec2::new(9, 15));

    activate_downvote(&mut world, yelp, IVec2::new(1, 1));

    assert_that(&world.get::<DownvoteSlot>(yelp).unwrap().active).is_true();
    let rail = world.get::<RailMovement>(yelp).unwrap();
    assert_that(&rail.grid).is_equal_to(IVec2::new(1, 1));
    assert_that(&rail.direction).is_equal_to(Some(Direction::Down));
    assert_eq!(
        common::drain_events(&mut world),
        vec![
            GameEvent::DownvoteSpawned { downvote: yelp, active: 1 },
            GameEvent::Announcement {
                text: "DOWNVOTE APPEARED!",
                duration_ms: 2_000
            },
        ]
    );
}

#[test]
fn test_announcements_escalate_with_the_active_count() {
    let mut world = common::create_test_world(common::standard_map());
    common::spawn_player(&mut world, IVec2::new(9, 15));
    common::spawn_downvote(&mut world, 0, Archetype::YelpDownvote, true, IVec2::new(1, 1));
    let google = common::spawn_downvote(&mut world, 1, Archetype::GoogleDownvote, false, IVec2::new(9, 15));

    activate_downvote(&mut world, google, IVec2::new(17, 1));

    let events = common::drain_events(&mut world);
    assert_that(&events[0]).is_equal_to(GameEvent::DownvoteSpawned {
        downvote: google,
        active: 2,
    });
    assert_that(&events[1]).is_equal_to(GameEvent::Announcement {
        text: "MULTIPLE DOWNVOTES! DANGER INCREASING!",
        duration_ms: 2_000,
    });
}

#[test]
fn test_active_downvote_is_not_respawned() {
    let mut world = common::create_test_world(common::standard_map());
    common::spawn_player(&mut world, IVec2::new(9, 15));
    let yelp = common::spawn_downvote(&mut world, 0, Archetype::YelpDownvote, true, IVec2::new(4, 15));

    activate_downvote(&mut world, yelp, IVec2::new(1, 1));

    assert_that(&world.get::<RailMovement>(yelp).unwrap().grid).is_equal_to(IVec2::new(4, 15));
    assert_that(&common::drain_events(&mut world)).is_empty();
}

#[test]
fn test_despawned_downvote_is_skipped() {
    let mut world = common::create_test_world(common::standard_map());
    let yelp = common::spawn_downvote(&mut world, 0, Archetype::YelpDownvote, false, IVec2::new(9, 15));
    assert!(world.despawn(yelp));

    activate_downvote(&mut world, yelp, IVec2::new(1, 1));

    assert_that(&common::drain_events(&mut world)).is_empty();
}

#[test]
fn test_touching_an_active_downvote_kills() {
    let mut world = common::create_test_world(common::standard_map());
    common::spawn_player(&mut world, IVec2::new(9, 15));
    common::spawn_downvote(&mut world, 0, Archetype::GoogleDownvote, true, IVec2::new(10, 14));

    world.run_system_once(downvote_kill_system).unwrap();

    assert_eq!(common::drain_kills(&mut world), vec![PlayerKilled(DeathCause::Downvoted)]);
}

#[test]
fn test_pooled_downvotes_are_harmless() {
    let mut world = common::create_test_world(common::standard_map());
    common::spawn_player(&mut world, IVec2::new(9, 15));
    common::spawn_downvote(&mut world, 0, Archetype::YelpDownvote, false, IVec2::new(9, 15));
    common::spawn_downvote(&mut world, 1, Archetype::GoogleDownvote, true, IVec2::new(4, 15));

    world.run_system_once(downvote_kill_system).unwrap();

    assert_that(&common::drain_kills(&mut world)).is_empty();
}
