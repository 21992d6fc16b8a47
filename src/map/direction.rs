use glam::IVec2;
use strum_macros::{AsRefStr, EnumIter};

/// The four cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The four cardinal directions, in the order neighbours are probed.
    pub const DIRECTIONS: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Returns the opposite direction. Constant time.
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Returns the grid step for this direction. Screen coordinates, so `Up` is negative y.
    pub fn as_ivec2(self) -> IVec2 {
        self.into()
    }

    pub const fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// True if `other` runs along the other axis.
    pub const fn is_perpendicular(self, other: Direction) -> bool {
        self.is_horizontal() != other.is_horizontal()
    }

    /// The horizontal direction pointing along `dx`, if any.
    pub fn horizontal_toward(dx: i32) -> Option<Direction> {
        match dx.signum() {
            1 => Some(Direction::Right),
            -1 => Some(Direction::Left),
            _ => None,
        }
    }

    /// The vertical direction pointing along `dy`, if any.
    pub fn vertical_toward(dy: i32) -> Option<Direction> {
        match dy.signum() {
            1 => Some(Direction::Down),
            -1 => Some(Direction::Up),
            _ => None,
        }
    }
}

impl From<Direction> for IVec2 {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Up => -IVec2::Y,
            Direction::Down => IVec2::Y,
            Direction::Left => -IVec2::X,
            Direction::Right => IVec2::X,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_opposite_is_an_involution() {
        for dir in Direction::iter() {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.as_ivec2() + dir.opposite().as_ivec2(), IVec2::ZERO);
        }
    }

    #[test]
    fn test_toward_helpers() {
        assert_eq!(Direction::horizontal_toward(-3), Some(Direction::Left));
        assert_eq!(Direction::horizontal_toward(0), None);
        assert_eq!(Direction::vertical_toward(7), Some(Direction::Down));
        assert!(Direction::Up.is_perpendicular(Direction::Left));
        assert!(!Direction::Up.is_perpendicular(Direction::Down));
    }
}
