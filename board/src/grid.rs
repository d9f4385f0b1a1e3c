use crate::symbol::Fact;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// A board cell, 0-indexed from the north-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts the 1-indexed coordinates used by solver facts.
    pub const fn from_fact(x: i32, y: i32) -> Self {
        Self { x: x - 1, y: y - 1 }
    }

    pub const fn to_fact(self) -> (i32, i32) {
        (self.x + 1, self.y + 1)
    }

    pub fn step(self, direction: Direction) -> Cell {
        let (dx, dy) = direction.delta();
        Cell::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub const fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        match (dx, dy) {
            (0, -1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, 1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Robot(String);

impl Robot {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Robot {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Robot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wall segment kept for rendering. Simulation only reads the block set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Barrier {
    /// Wall on the west side of `column`.
    West { column: i32, row: i32 },
    /// Wall on the north side of `row`.
    North { column: i32, row: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TargetColor {
    /// Any robot may claim the target.
    Any,
    Robot(Robot),
}

impl TargetColor {
    fn from_label(label: &str) -> Self {
        if label.is_empty() || label == "any" {
            TargetColor::Any
        } else {
            TargetColor::Robot(Robot::new(label))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Target {
    pub color: TargetColor,
    pub symbol: String,
    pub cell: Cell,
}

/// Static board facts: walls, targets and where the robots start.
#[derive(Debug, Clone)]
pub struct Grid {
    size: i32,
    blocked: HashSet<(i32, i32, i32, i32)>,
    barriers: BTreeSet<Barrier>,
    targets: BTreeSet<Target>,
    start: BTreeMap<Robot, Cell>,
}

impl Grid {
    pub fn from_facts<'a, I>(facts: I) -> Self
    where
        I: IntoIterator<Item = &'a Fact>,
    {
        let mut grid = Grid {
            size: 1,
            blocked: HashSet::new(),
            barriers: BTreeSet::new(),
            targets: BTreeSet::new(),
            start: BTreeMap::new(),
        };

        for fact in facts {
            match fact {
                Fact::Dim(n) => grid.size = grid.size.max(*n),
                Fact::Barrier { x, y, dx, dy } => grid.add_barrier(*x, *y, *dx, *dy),
                Fact::AvailableTarget {
                    color,
                    symbol,
                    x,
                    y,
                } => {
                    grid.targets.insert(Target {
                        color: TargetColor::from_label(color),
                        symbol: symbol.clone(),
                        cell: Cell::from_fact(*x, *y),
                    });
                }
                Fact::InitialPos { robot, x, y } => {
                    grid.start.insert(Robot::new(robot.as_str()), Cell::from_fact(*x, *y));
                }
                _ => {}
            }
        }

        let last = grid.size - 1;
        for d in 0..grid.size {
            grid.blocked.insert((d, 0, 0, -1));
            grid.blocked.insert((d, last, 0, 1));
            grid.blocked.insert((0, d, -1, 0));
            grid.blocked.insert((last, d, 1, 0));
        }
        grid
    }

    /// Expands a barrier at an intersection into the four cells around it,
    /// each blocked in the direction pointing away from the intersection.
    fn add_barrier(&mut self, x: i32, y: i32, dx: i32, dy: i32) {
        let (x, y) = (x - 1, y - 1);
        self.blocked.insert((x, y, dx, dy));
        self.blocked.insert((x + dx, y, -dx, dy));
        self.blocked.insert((x, y + dy, dx, -dy));
        self.blocked.insert((x + dx, y + dy, -dx, -dy));

        let barrier = if dy == 0 {
            Barrier::West {
                column: if dx == 1 { x + 1 } else { x },
                row: y,
            }
        } else {
            Barrier::North {
                column: x,
                row: if dy == 1 { y + 1 } else { y },
            }
        };
        self.barriers.insert(barrier);
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.size).contains(&cell.x) && (0..self.size).contains(&cell.y)
    }

    pub fn is_blocked(&self, cell: Cell, direction: Direction) -> bool {
        let (dx, dy) = direction.delta();
        self.blocked.contains(&(cell.x, cell.y, dx, dy))
    }

    pub fn barriers(&self) -> &BTreeSet<Barrier> {
        &self.barriers
    }

    pub fn targets(&self) -> &BTreeSet<Target> {
        &self.targets
    }

    pub fn robots(&self) -> impl Iterator<Item = &Robot> {
        self.start.keys()
    }

    pub fn start_positions(&self) -> &BTreeMap<Robot, Cell> {
        &self.start
    }
}
