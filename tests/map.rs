use capman::constants::{MapTile, BOARD_CELL_SIZE, RAW_BOARD};
use capman::error::{GameError, MapError, ParseError};
use capman::map::direction::Direction;
use capman::map::GridMap;
use glam::{IVec2, Vec2};
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

mod common;

#[test]
fn test_standard_board_dimensions() {
    let map = common::standard_map();
    assert_that(&map.width()).is_equal_to(BOARD_CELL_SIZE.x as i32);
    assert_that(&map.height()).is_equal_to(BOARD_CELL_SIZE.y as i32);
    assert_that(&map.player_start()).is_equal_to(IVec2::new(9, 15));
    assert_eq!(map.wrap_rows(), &[9]);
}

#[test]
fn test_vertical_bounds_are_walls_horizontal_bounds_open_only_on_tunnel_rows() {
    let map = common::small_map();
    assert_that(&map.is_wall(IVec2::new(3, -1))).is_true();
    assert_that(&map.is_wall(IVec2::new(3, 7))).is_true();
    assert_that(&map.is_valid_move(IVec2::new(3, -1))).is_false();
    assert_that(&map.is_valid_move(IVec2::new(3, 7))).is_false();

    assert_that(&map.is_valid_move(IVec2::new(-1, 3))).is_true();
    assert_that(&map.is_valid_move(IVec2::new(10, 3))).is_true();
    assert_that(&map.is_valid_move(IVec2::new(-1, 1))).is_false();
    assert_that(&map.is_valid_move(IVec2::new(10, 5))).is_false();
    assert_that(&map.is_wall(IVec2::new(-1, 3))).is_false();
    assert_that(&map.is_wall(IVec2::new(-1, 1))).is_true();
}

#[test]
fn test_world_and_grid_conversions_are_inverse() {
    let map = common::standard_map();
    for cell in [IVec2::new(0, 0), IVec2::new(9, 15), IVec2::new(18, 20), IVec2::new(-1, 9)] {
        assert_eq!(map.world_to_grid(map.grid_to_world(cell)), cell);
    }
    assert_eq!(map.grid_to_world(IVec2::ZERO), Vec2::new(12.0, 72.0));
    assert_eq!(map.world_to_grid(Vec2::new(23.9, 83.9)), IVec2::ZERO);
    assert_eq!(map.world_to_grid(Vec2::new(24.0, 84.0)), IVec2::ONE);
}

#[test]
fn test_eating_is_idempotent() {
    let mut map = common::small_map();
    let before = map.remaining_count();
    assert_that(&before).is_equal_to(29);

    assert_that(&map.remove_dot(IVec2::new(1, 1))).is_true();
    assert_that(&map.remove_dot(IVec2::new(1, 1))).is_false();
    assert_that(&map.remove_dot(IVec2::new(0, 0))).is_false();
    assert_that(&map.remove_power_pellet(IVec2::new(1, 1))).is_false();
    assert_that(&map.remove_power_pellet(IVec2::new(1, 5))).is_true();
    assert_that(&map.remove_power_pellet(IVec2::new(1, 5))).is_false();
    assert_that(&map.tile_at(IVec2::new(1, 5))).is_equal_to(Some(MapTile::Empty));
    assert_that(&map.remaining_count()).is_equal_to(before - 2);
}

#[test]
fn test_out_of_range_lookups_return_sentinels() {
    let mut map = common::small_map();
    assert_that(&map.tile_at(IVec2::new(-5, -5))).is_none();
    assert_that(&map.remove_dot(IVec2::new(100, 100))).is_false();
    assert_that(&map.is_reachable(IVec2::new(-1, 3))).is_false();
}

#[test]
fn test_available_directions() {
    let map = common::small_map();
    assert_eq!(
        map.available_directions(IVec2::new(4, 3)).as_slice(),
        &[Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    );
    assert_eq!(
        map.available_directions(IVec2::new(1, 1)).as_slice(),
        &[Direction::Down, Direction::Right]
    );
}

#[test]
fn test_landing_tiles_exclude_court_walls_and_pockets() {
    let map = common::standard_map();
    assert_that(&map.is_landing_tile(IVec2::new(1, 1))).is_true();
    assert_that(&map.is_landing_tile(IVec2::new(1, 3))).is_true();
    assert_that(&map.is_landing_tile(IVec2::new(0, 0))).is_false();
    assert_that(&map.is_landing_tile(IVec2::new(8, 9))).is_false();
    // Side pockets on the rows next to the tunnel are walled in.
    assert_that(&map.is_landing_tile(IVec2::new(1, 7))).is_false();
    assert_that(&map.is_landing_tile(IVec2::new(17, 11))).is_false();
}

#[test]
fn test_special_zone_covers_the_court() {
    let map = common::standard_map();
    let court = map.special_zone_bounds().unwrap();
    assert_eq!(court.min, map.grid_to_world(IVec2::new(6, 7)) - Vec2::splat(12.0));
    assert_eq!(court.max, map.grid_to_world(IVec2::new(12, 11)) + Vec2::splat(12.0));

    let courtless = GridMap::new(&["#####", "#.X.#", "#####"]).unwrap();
    assert_that(&courtless.special_zone_bounds()).is_none();
}

#[test]
fn test_nearest_wrap_row_prefers_upper_on_ties() {
    let map = GridMap::new(&[" X ", "###", "   ", "###", "   "]).unwrap();
    assert_eq!(map.wrap_rows(), &[0]);
    assert_eq!(map.nearest_wrap_row(4), Some(0));

    let open = GridMap::new(&["   ", " X ", "   "]).unwrap();
    assert_eq!(open.wrap_rows(), &[0, 1, 2]);
    assert_eq!(open.nearest_wrap_row(1), Some(1));
    assert_eq!(GridMap::new(&["###", "#X#", "###"]).unwrap().nearest_wrap_row(1), None);
}

#[test]
fn test_bad_boards_are_rejected() {
    assert!(matches!(
        GridMap::new(&["#?#"]),
        Err(GameError::MapParse(ParseError::UnknownCharacter('?')))
    ));
    assert!(matches!(GridMap::new(&["###", "###"]), Err(GameError::Map(MapError::NoWalkableCells))));
    assert_that(&GridMap::new(&RAW_BOARD).is_ok()).is_true();
}
