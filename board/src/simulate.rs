use crate::grid::{Cell, Direction, Grid, Robot};
use crate::moves::{Move, Plan};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::debug;

pub type RobotPositions = BTreeMap<Robot, Cell>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("unknown robot '{0}'")]
    UnknownRobot(Robot),
    #[error("robots share cell {cell}")]
    Overlap { cell: Cell },
}

/// The win condition of one search: `robot` must end on `cell`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Goal {
    pub robot: Robot,
    pub cell: Cell,
}

impl Goal {
    pub fn new(robot: impl Into<Robot>, cell: Cell) -> Self {
        Self {
            robot: robot.into(),
            cell,
        }
    }
}

pub fn occupant(positions: &RobotPositions, cell: Cell) -> Option<&Robot> {
    positions
        .iter()
        .find_map(|(robot, &at)| (at == cell).then_some(robot))
}

/// The slide rule. Starting at `start`, keep stepping in `direction` until
/// the edge is blocked or `occupied` reports the next cell taken.
///
/// The search backend calls this directly on its packed states, so plans it
/// finds replay exactly through [`Board::apply_move`].
pub fn slide_from<F>(grid: &Grid, start: Cell, direction: Direction, occupied: F) -> Cell
where
    F: Fn(Cell) -> bool,
{
    let mut cell = start;
    loop {
        let next = cell.step(direction);
        if grid.is_blocked(cell, direction) || !grid.contains(next) || occupied(next) {
            return cell;
        }
        cell = next;
    }
}

pub fn slide(
    grid: &Grid,
    positions: &RobotPositions,
    robot: &Robot,
    direction: Direction,
) -> Result<Cell, BoardError> {
    let start = *positions
        .get(robot)
        .ok_or_else(|| BoardError::UnknownRobot(robot.clone()))?;
    Ok(slide_from(grid, start, direction, |cell| {
        occupant(positions, cell).is_some()
    }))
}

fn check_no_overlap(positions: &RobotPositions) -> Result<(), BoardError> {
    let mut seen = HashSet::new();
    for &cell in positions.values() {
        if !seen.insert(cell) {
            return Err(BoardError::Overlap { cell });
        }
    }
    Ok(())
}

/// Live board: static grid, current robot positions, the goal being
/// played and the plan the player is following, if any.
#[derive(Debug, Clone)]
pub struct Board {
    grid: Grid,
    positions: RobotPositions,
    goal: Option<Goal>,
    plan: Option<VecDeque<Move>>,
}

impl Board {
    pub fn new(grid: Grid) -> Self {
        let positions = grid.start_positions().clone();
        Self {
            grid,
            positions,
            goal: None,
            plan: None,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn positions(&self) -> &RobotPositions {
        &self.positions
    }

    pub fn position_of(&self, robot: &Robot) -> Result<Cell, BoardError> {
        self.positions
            .get(robot)
            .copied()
            .ok_or_else(|| BoardError::UnknownRobot(robot.clone()))
    }

    pub fn occupied(&self, cell: Cell) -> Option<&Robot> {
        occupant(&self.positions, cell)
    }

    pub fn goal(&self) -> Option<&Goal> {
        self.goal.as_ref()
    }

    pub fn set_goal(&mut self, goal: Option<Goal>) {
        self.goal = goal;
        self.plan = None;
    }

    /// Installs the plan the next `apply_move` calls are checked against.
    pub fn set_plan(&mut self, plan: Plan) {
        self.plan = if plan.is_empty() {
            None
        } else {
            Some(plan.into_vec().into())
        };
    }

    pub fn active_plan(&self) -> Option<&VecDeque<Move>> {
        self.plan.as_ref()
    }

    pub fn slide(&self, robot: &Robot, direction: Direction) -> Result<Cell, BoardError> {
        slide(&self.grid, &self.positions, robot, direction)
    }

    /// Moves a robot, then reconciles the active plan: a matching head is
    /// consumed, anything else invalidates the plan.
    pub fn apply_move(&mut self, robot: &Robot, direction: Direction) -> Result<Cell, BoardError> {
        let cell = self.slide(robot, direction)?;
        self.positions.insert(robot.clone(), cell);

        if let Some(plan) = self.plan.as_mut() {
            let matches = plan
                .front()
                .is_some_and(|head| &head.robot == robot && head.direction == direction);
            if matches {
                plan.pop_front();
                if plan.is_empty() {
                    self.plan = None;
                }
            } else {
                debug!("{} {} diverges from the active plan, dropping it", robot, direction);
                self.plan = None;
            }
        }
        Ok(cell)
    }

    /// Applies every move of `plan` in order, checking after each step that
    /// no two robots share a cell.
    pub fn apply_plan(&mut self, plan: &Plan) -> Result<(), BoardError> {
        for mv in plan {
            self.apply_move(&mv.robot, mv.direction)?;
            check_no_overlap(&self.positions)?;
        }
        Ok(())
    }

    pub fn won(&self) -> bool {
        match &self.goal {
            Some(goal) => self.positions.get(&goal.robot) == Some(&goal.cell),
            None => false,
        }
    }

    /// Puts every robot back on its starting cell.
    pub fn reset(&mut self) {
        self.positions = self.grid.start_positions().clone();
        self.plan = None;
    }
}
