//! The tile grid the whole game runs on.

use bevy_ecs::resource::Resource;
use glam::{IVec2, Vec2};
use pathfinding::prelude::bfs_reach;
use smallvec::SmallVec;
use tracing::debug;

use crate::constants::{MapTile, BOARD_PIXEL_OFFSET_Y, TILE_SIZE};
use crate::error::{GameResult, MapError};
use crate::map::direction::Direction;
use crate::map::parser::MapTileParser;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl PixelRect {
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// The mutable per-level copy of the board.
///
/// Cells outside `[0,width)` horizontally are tunnel space: moves into them are legal and
/// [`crate::movement::RailMovement`] wraps entities to the opposite edge. Cells outside the
/// board vertically are always walls.
#[derive(Resource, Debug, Clone)]
pub struct GridMap {
    width: i32,
    height: i32,
    tiles: Vec<MapTile>,
    tile_size: f32,
    offset_y: f32,
    player_start: IVec2,
    /// Cells connected to the player start, tunnels included.
    reachable: Vec<bool>,
    /// Rows whose two edge cells are open and reachable, usable as exits.
    wrap_rows: SmallVec<[i32; 4]>,
    dots: usize,
    power_pellets: usize,
}

impl GridMap {
    /// Builds a map from a raw layout using the standard tile size and board offset.
    pub fn new(raw_board: &[&str]) -> GameResult<GridMap> {
        Self::with_geometry(raw_board, TILE_SIZE, BOARD_PIXEL_OFFSET_Y)
    }

    /// Builds a map from a raw layout with explicit pixel geometry.
    ///
    /// # Errors
    ///
    /// Fails if the layout does not parse or contains no walkable cell.
    pub fn with_geometry(raw_board: &[&str], tile_size: f32, offset_y: f32) -> GameResult<GridMap> {
        let parsed = MapTileParser::parse_board(raw_board)?;

        let player_start = match parsed.player_start {
            Some(start) => start,
            None => {
                let index = parsed
                    .tiles
                    .iter()
                    .position(|tile| tile.is_walkable())
                    .ok_or(MapError::NoWalkableCells)?;
                IVec2::new(index as i32 % parsed.width, index as i32 / parsed.width)
            }
        };

        let dots = parsed.tiles.iter().filter(|t| **t == MapTile::Dot).count();
        let power_pellets = parsed.tiles.iter().filter(|t| **t == MapTile::PowerPellet).count();

        let mut map = GridMap {
            width: parsed.width,
            height: parsed.height,
            tiles: parsed.tiles,
            tile_size,
            offset_y,
            player_start,
            reachable: Vec::new(),
            wrap_rows: SmallVec::new(),
            dots,
            power_pellets,
        };
        map.reachable = map.flood_from_start();
        map.wrap_rows = map.find_wrap_rows();

        debug!(
            width = map.width,
            height = map.height,
            dots,
            power_pellets,
            wrap_rows = ?map.wrap_rows,
            "Grid map built"
        );
        Ok(map)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn player_start(&self) -> IVec2 {
        self.player_start
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        let in_bounds = (0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.y);
        in_bounds.then(|| (cell.y * self.width + cell.x) as usize)
    }

    /// Returns the tile at `cell`, or `None` outside the board.
    pub fn tile_at(&self, cell: IVec2) -> Option<MapTile> {
        self.index(cell).map(|i| self.tiles[i])
    }

    /// True if `cell` is a wall. Out-of-bounds rows are walls; out-of-bounds columns are
    /// walls unless the row is open at both edges.
    pub fn is_wall(&self, cell: IVec2) -> bool {
        if !(0..self.height).contains(&cell.y) {
            return true;
        }
        if !(0..self.width).contains(&cell.x) {
            return !self.is_tunnel_row(cell.y);
        }
        self.tile_at(cell) == Some(MapTile::Wall)
    }

    /// True if an entity may step into `cell`.
    ///
    /// Horizontal out-of-bounds cells are legal only on tunnel rows, so that wrap can happen.
    pub fn is_valid_move(&self, cell: IVec2) -> bool {
        if !(0..self.height).contains(&cell.y) {
            return false;
        }
        if !(0..self.width).contains(&cell.x) {
            return self.is_tunnel_row(cell.y);
        }
        self.tile_at(cell).is_some_and(MapTile::is_walkable)
    }

    fn is_tunnel_row(&self, y: i32) -> bool {
        let left = self.tile_at(IVec2::new(0, y));
        let right = self.tile_at(IVec2::new(self.width - 1, y));
        left.is_some_and(MapTile::is_walkable) && right.is_some_and(MapTile::is_walkable)
    }

    /// The cell containing pixel position `p`.
    pub fn world_to_grid(&self, p: Vec2) -> IVec2 {
        IVec2::new(
            (p.x / self.tile_size).floor() as i32,
            ((p.y - self.offset_y) / self.tile_size).floor() as i32,
        )
    }

    /// The pixel position of the center of `cell`.
    pub fn grid_to_world(&self, cell: IVec2) -> Vec2 {
        let half = self.tile_size / 2.0;
        Vec2::new(
            cell.x as f32 * self.tile_size + half,
            cell.y as f32 * self.tile_size + half + self.offset_y,
        )
    }

    /// Eats the dot at `cell`. Returns false if there was none.
    pub fn remove_dot(&mut self, cell: IVec2) -> bool {
        match self.index(cell) {
            Some(i) if self.tiles[i] == MapTile::Dot => {
                self.tiles[i] = MapTile::Empty;
                self.dots -= 1;
                true
            }
            _ => false,
        }
    }

    /// Eats the power pellet at `cell`. Returns false if there was none.
    pub fn remove_power_pellet(&mut self, cell: IVec2) -> bool {
        match self.index(cell) {
            Some(i) if self.tiles[i] == MapTile::PowerPellet => {
                self.tiles[i] = MapTile::Empty;
                self.power_pellets -= 1;
                true
            }
            _ => false,
        }
    }

    /// Dots and power pellets still on the board.
    pub fn remaining_count(&self) -> usize {
        self.dots + self.power_pellets
    }

    /// Directions leading out of `cell` into a legal neighbour, in `Direction::DIRECTIONS` order.
    pub fn available_directions(&self, cell: IVec2) -> SmallVec<[Direction; 4]> {
        Direction::DIRECTIONS
            .into_iter()
            .filter(|dir| self.is_valid_move(cell + dir.as_ivec2()))
            .collect()
    }

    /// True if `cell` can be walked to from the player start.
    pub fn is_reachable(&self, cell: IVec2) -> bool {
        self.index(cell).is_some_and(|i| self.reachable[i])
    }

    /// True if `cell` may receive a thrown hat: open floor the player can get to.
    pub fn is_landing_tile(&self, cell: IVec2) -> bool {
        self.is_reachable(cell)
            && matches!(
                self.tile_at(cell),
                Some(MapTile::Empty | MapTile::Dot | MapTile::PowerPellet)
            )
    }

    pub fn wrap_rows(&self) -> &[i32] {
        &self.wrap_rows
    }

    /// The exit row closest to `y`, preferring the upper one on ties.
    pub fn nearest_wrap_row(&self, y: i32) -> Option<i32> {
        self.wrap_rows.iter().copied().min_by_key(|row| ((row - y).abs(), *row))
    }

    /// Pixel bounds of the special zone, if the level has one.
    pub fn special_zone_bounds(&self) -> Option<PixelRect> {
        let mut cells = self
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile == MapTile::SpecialZone)
            .map(|(i, _)| IVec2::new(i as i32 % self.width, i as i32 / self.width));

        let first = cells.next()?;
        let (low, high) = cells.fold((first, first), |(low, high), cell| (low.min(cell), high.max(cell)));
        let half = Vec2::splat(self.tile_size / 2.0);
        Some(PixelRect {
            min: self.grid_to_world(low) - half,
            max: self.grid_to_world(high) + half,
        })
    }

    /// Breadth-first flood from the player start, wrapping through tunnels.
    fn flood_from_start(&self) -> Vec<bool> {
        let mut reachable = vec![false; self.tiles.len()];
        if self.index(self.player_start).is_none() {
            return reachable;
        }

        for cell in bfs_reach(self.player_start, |&cell| self.open_neighbours(cell)) {
            if let Some(i) = self.index(cell) {
                reachable[i] = true;
            }
        }
        reachable
    }

    /// Walkable neighbours of `cell`, stepping across tunnel edges.
    fn open_neighbours(&self, cell: IVec2) -> SmallVec<[IVec2; 4]> {
        Direction::DIRECTIONS
            .iter()
            .map(|dir| {
                let next = cell + dir.as_ivec2();
                IVec2::new(next.x.rem_euclid(self.width), next.y)
            })
            .filter(|next| self.tile_at(*next).is_some_and(MapTile::is_walkable))
            .collect()
    }

    /// Tunnel rows whose edges can actually be reached from the player start.
    fn find_wrap_rows(&self) -> SmallVec<[i32; 4]> {
        (0..self.height)
            .filter(|&y| self.is_tunnel_row(y))
            .filter(|&y| self.is_reachable(IVec2::new(0, y)) && self.is_reachable(IVec2::new(self.width - 1, y)))
            .collect()
    }
}
