//! Board model for the sliding-robot puzzle: static walls and targets, robot
//! positions, and the slide rule shared with the search backend.

pub mod grid;
pub mod moves;
pub mod simulate;
pub mod symbol;

pub use grid::{Barrier, Cell, Direction, Grid, Robot, Target, TargetColor};
pub use moves::{Move, Plan};
pub use simulate::{Board, BoardError, Goal, RobotPositions};
pub use symbol::{Fact, FactError, Symbol, Term};
