use crate::grid::{Direction, Robot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One full slide of `robot` in `direction` at solver step `time`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub robot: Robot,
    pub direction: Direction,
    pub time: i32,
}

impl Move {
    pub fn new(robot: impl Into<Robot>, direction: Direction, time: i32) -> Self {
        Self {
            robot: robot.into(),
            direction,
            time,
        }
    }

    pub fn dx(&self) -> i32 {
        self.direction.delta().0
    }

    pub fn dy(&self) -> i32 {
        self.direction.delta().1
    }

    /// Same robot sliding the same way, regardless of time.
    pub fn same_action(&self, other: &Move) -> bool {
        self.robot == other.robot && self.direction == other.direction
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={} {} {}", self.time, self.robot, self.direction)
    }
}

/// Time-ordered moves leading a robot onto its target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan(Vec<Move>);

impl Plan {
    pub fn new(moves: Vec<Move>) -> Self {
        Self(moves)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Move] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Move> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Move>> for Plan {
    fn from(moves: Vec<Move>) -> Self {
        Self(moves)
    }
}
