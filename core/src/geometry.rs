use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }

    /// Rotates by `turns` quarter turns, clockwise on a y-down surface.
    pub fn rotate_quarter_turns(self, turns: u8) -> Point {
        match turns % 4 {
            0 => self,
            1 => Point::new(-self.y, self.x),
            2 => Point::new(-self.x, -self.y),
            _ => Point::new(self.y, -self.x),
        }
    }
}

impl From<(f32, f32)> for Point {
    fn from(v: (f32, f32)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Edge direction of a piece in the unrotated grid frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Direction {
        Direction::ALL[index % 4]
    }

    pub fn opposite(self) -> Direction {
        Direction::from_index(self.index() + 2)
    }

    /// Unit step in grid (and unrotated screen) coordinates.
    pub fn grid_offset(self) -> (i64, i64) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    /// Where this logical edge faces on screen for a piece turned
    /// `orientation` quarter turns clockwise.
    pub fn to_screen(self, orientation: u8) -> Direction {
        Direction::from_index(self.index() + orientation as usize)
    }

    /// Logical edge that faces `screen` for the given orientation.
    pub fn from_screen(screen: Direction, orientation: u8) -> Direction {
        Direction::from_index(screen.index() + 4 - (orientation as usize % 4))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: usize,
    pub y: usize,
}

impl GridPos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn neighbor(self, dir: Direction, count_x: usize, count_y: usize) -> Option<GridPos> {
        match dir {
            Direction::North if self.y > 0 => Some(GridPos::new(self.x, self.y - 1)),
            Direction::East if self.x + 1 < count_x => Some(GridPos::new(self.x + 1, self.y)),
            Direction::South if self.y + 1 < count_y => Some(GridPos::new(self.x, self.y + 1)),
            Direction::West if self.x > 0 => Some(GridPos::new(self.x - 1, self.y)),
            _ => None,
        }
    }

    pub fn is_neighbor(self, other: GridPos, dir: Direction) -> bool {
        let (dx, dy) = dir.grid_offset();
        self.x as i64 + dx == other.x as i64 && self.y as i64 + dy == other.y as i64
    }
}
