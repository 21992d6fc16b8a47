//! Rail-constrained movement shared by the player and every NPC.

use bevy_ecs::component::Component;
use glam::{IVec2, Vec2};
use tracing::trace;

use crate::map::direction::Direction;
use crate::map::GridMap;

/// How close (per axis, in pixels) an entity must be to a cell center to turn.
pub const CENTER_EPSILON: f32 = 2.0;
/// Remaining distance below which an entity counts as having reached its target cell.
pub const ARRIVAL_EPSILON: f32 = 1.0;

/// Converts a grid cell plus a requested direction into smooth motion along the maze rails.
///
/// While moving, the entity travels from the center of `grid` to the center of `target`
/// along a single axis. The other axis is pinned to the rail, so there is never diagonal
/// drift. When stationary, `direction` is `None` and the entity sits on its cell center.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct RailMovement {
    /// The cell the entity is leaving, or resting on.
    pub grid: IVec2,
    /// The cell being approached. Equal to `grid` when stationary.
    pub target: IVec2,
    /// Continuous position in pixels.
    pub pixel: Vec2,
    pub direction: Option<Direction>,
    /// Last direction travelled, kept after stopping.
    pub facing: Option<Direction>,
    /// A requested turn waiting for the next grid center.
    pub queued: Option<Direction>,
    /// Pixels per tick.
    pub speed: f32,
    pub moving: bool,
    pub frozen: bool,
}

impl RailMovement {
    /// Creates a stationary rail resting on `cell`.
    pub fn new(map: &GridMap, cell: IVec2, speed: f32) -> Self {
        Self {
            grid: cell,
            target: cell,
            pixel: map.grid_to_world(cell),
            direction: None,
            facing: None,
            queued: None,
            speed,
            moving: false,
            frozen: false,
        }
    }

    /// Teleports to `cell` and clears all motion. Speed is kept.
    pub fn place(&mut self, map: &GridMap, cell: IVec2) {
        self.grid = cell;
        self.target = cell;
        self.pixel = map.grid_to_world(cell);
        self.direction = None;
        self.queued = None;
        self.moving = false;
        self.frozen = false;
    }

    /// Requests a new heading.
    ///
    /// Reversing the current direction always takes effect immediately. Any other
    /// direction is queued and applied once the entity is centered on a cell whose
    /// neighbour in that direction is legal. Returns true if the heading changed now.
    pub fn request_direction(&mut self, map: &GridMap, direction: Direction) -> bool {
        if self.direction == Some(direction.opposite()) {
            self.reverse();
            return true;
        }

        self.queued = Some(direction);
        self.is_at_grid_center(map) && self.apply_queued(map)
    }

    /// Starts moving from rest. Equivalent to a request made while centered.
    pub fn start_moving(&mut self, map: &GridMap, direction: Direction) -> bool {
        self.queued = Some(direction);
        self.apply_queued(map)
    }

    fn reverse(&mut self) {
        let Some(direction) = self.direction else { return };
        std::mem::swap(&mut self.grid, &mut self.target);
        let reversed = direction.opposite();
        self.direction = Some(reversed);
        self.facing = Some(reversed);
        self.queued = None;
        self.moving = true;
    }

    fn apply_queued(&mut self, map: &GridMap) -> bool {
        let Some(direction) = self.queued else {
            return false;
        };
        let next = self.grid + direction.as_ivec2();
        if !map.is_valid_move(next) {
            return false;
        }

        self.pixel = map.grid_to_world(self.grid);
        self.target = next;
        self.direction = Some(direction);
        self.facing = Some(direction);
        self.queued = None;
        self.moving = true;
        true
    }

    /// Advances one tick. Does nothing while frozen.
    pub fn advance(&mut self, map: &GridMap) {
        if self.frozen {
            return;
        }

        if self.queued.is_some() && self.is_at_grid_center(map) {
            self.apply_queued(map);
        }

        if self.moving {
            self.step_toward_target(map);
        }

        self.wrap_tunnel(map);
    }

    fn step_toward_target(&mut self, map: &GridMap) {
        let Some(direction) = self.direction else {
            self.moving = false;
            return;
        };

        let goal = map.grid_to_world(self.target);
        if direction.is_horizontal() {
            self.pixel.y = goal.y;
        } else {
            self.pixel.x = goal.x;
        }

        let delta = goal - self.pixel;
        let distance = delta.length();
        if distance > 0.0 {
            self.pixel += delta / distance * self.speed.min(distance);
        }

        if goal.distance(self.pixel) < ARRIVAL_EPSILON {
            self.pixel = goal;
            self.grid = self.target;
            self.on_arrival(map, direction);
        }
    }

    fn on_arrival(&mut self, map: &GridMap, direction: Direction) {
        let next = self.grid + direction.as_ivec2();
        if map.is_valid_move(next) {
            self.target = next;
        } else {
            trace!(cell = ?self.grid, ?direction, "Rail blocked, stopping");
            self.stop(map);
        }
    }

    /// Halts on the current cell center.
    pub fn stop(&mut self, map: &GridMap) {
        self.target = self.grid;
        self.pixel = map.grid_to_world(self.grid);
        self.direction = None;
        self.moving = false;
    }

    /// Wraps an entity heading out past a horizontal edge to the opposite side.
    ///
    /// Entities heading back inward from outside the board (guards entering) are left alone.
    fn wrap_tunnel(&mut self, map: &GridMap) {
        let width = map.width();
        let (wrapped, inward) = if self.grid.x < 0 && self.direction != Some(Direction::Right) {
            (width - 1, width - 2)
        } else if self.grid.x >= width && self.direction != Some(Direction::Left) {
            (0, 1)
        } else {
            return;
        };

        trace!(from = self.grid.x, to = wrapped, row = self.grid.y, "Tunnel wrap");
        self.grid.x = wrapped;
        self.pixel = map.grid_to_world(self.grid);

        let next = IVec2::new(inward, self.grid.y);
        if self.moving && map.is_valid_move(next) {
            self.target = next;
        } else {
            self.stop(map);
        }
    }

    /// True when within [`CENTER_EPSILON`] of the current cell center on both axes.
    pub fn is_at_grid_center(&self, map: &GridMap) -> bool {
        let offset = (self.pixel - map.grid_to_world(self.grid)).abs();
        offset.x < CENTER_EPSILON && offset.y < CENTER_EPSILON
    }

    /// True when centered on a branch point with more than two legal exits.
    pub fn is_at_intersection(&self, map: &GridMap) -> bool {
        self.is_at_grid_center(map) && map.available_directions(self.grid).len() > 2
    }

    /// The cell where a turn requested now would be taken: the current cell when centered,
    /// otherwise the one being approached.
    pub fn next_turn_cell(&self, map: &GridMap) -> IVec2 {
        if self.is_at_grid_center(map) {
            self.grid
        } else {
            self.target
        }
    }

    /// The cell containing the entity's pixel position, used for adjacency checks.
    pub fn current_cell(&self, map: &GridMap) -> IVec2 {
        map.world_to_grid(self.pixel)
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }
}
