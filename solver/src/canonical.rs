use crate::backend::MoveEncoding;
use ricochet_board::{Cell, Direction, Fact, FactError, Move, Plan, Robot, RobotPositions, Symbol};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Fact(#[from] FactError),
    #[error("move for robot '{0}' which has no start position")]
    UnknownRobot(Robot),
}

/// Orders moves by time and cuts the plan at the first action that repeats
/// the one right before it, dropping it and everything after.
///
/// Solvers grounded for more steps than a plan needs keep "moving" the robot
/// into the wall it already rests against; the plan ends where that starts.
pub fn canonicalize(mut moves: Vec<Move>) -> Plan {
    moves.sort_by_key(|m| m.time);
    let end = moves
        .windows(2)
        .position(|pair| pair[1].same_action(&pair[0]))
        .map_or(moves.len(), |i| i + 1);
    moves.truncate(end);
    Plan::new(moves)
}

/// Pulls the `move` atoms out of a model and turns them into time-ordered
/// moves, starting from `start`.
pub fn decode_moves(
    model: &[Symbol],
    start: &RobotPositions,
    encoding: MoveEncoding,
) -> Result<Vec<Move>, DecodeError> {
    let mut raw = Vec::new();
    for fact in Fact::decode_all(model)? {
        if let Fact::Move { robot, a, b, t } = fact {
            raw.push((Robot::new(robot), a, b, t));
        }
    }
    raw.sort_by_key(|&(_, _, _, t)| t);

    let mut moves: Vec<Move> = Vec::with_capacity(raw.len());
    match encoding {
        MoveEncoding::Delta => {
            for (robot, dx, dy, t) in raw {
                match Direction::from_delta(dx, dy) {
                    Some(direction) => moves.push(Move::new(robot, direction, t)),
                    None => warn!("Dropping move of {} with step ({}, {}) at t={}", robot, dx, dy, t),
                }
            }
        }
        MoveEncoding::Absolute => {
            let mut positions = start.clone();
            for (robot, x, y, t) in raw {
                let to = Cell::from_fact(x, y);
                let from = *positions
                    .get(&robot)
                    .ok_or_else(|| DecodeError::UnknownRobot(robot.clone()))?;
                let step = ((to.x - from.x).signum(), (to.y - from.y).signum());
                match Direction::from_delta(step.0, step.1) {
                    Some(direction) => {
                        positions.insert(robot.clone(), to);
                        moves.push(Move::new(robot, direction, t));
                    }
                    None if to == from => {
                        // sliding again into the wall it just hit
                        let repeat = moves
                            .last()
                            .filter(|last| last.robot == robot)
                            .map(|last| last.direction);
                        match repeat {
                            Some(direction) => moves.push(Move::new(robot, direction, t)),
                            None => debug!("Dropping no-op move of {} at t={}", robot, t),
                        }
                    }
                    None => warn!("Dropping diagonal move of {} to {} at t={}", robot, to, t),
                }
            }
        }
    }
    Ok(moves)
}
