use crate::backend::{Part, ProgramSource, SolverBackend};
use crate::canonical::DecodeError;
use crate::engine::{EngineConfig, SearchEngine};
use crate::orchestrator::{Orchestrator, SearchError, SearchStatus};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use ricochet_board::{
    Board, BoardError, Cell, Fact, Goal, Grid, Plan, Robot, RobotPositions, Target, TargetColor,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    /// Give up on a single target after this long.
    pub time_limit: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            time_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "plan", rename_all = "snake_case")]
pub enum Outcome {
    Solved(Plan),
    Exhausted,
    Cancelled,
}

/// Shared flag another task can raise to stop the running search.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Sequences start / poll / take_plan for one goal at a time.
pub struct Session<B: SolverBackend> {
    orchestrator: Orchestrator<B>,
    config: SessionConfig,
    cancel: CancellationFlag,
}

impl<B: SolverBackend> Session<B> {
    pub fn new(orchestrator: Orchestrator<B>, config: SessionConfig) -> Self {
        Self {
            orchestrator,
            config,
            cancel: CancellationFlag::default(),
        }
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn orchestrator(&self) -> &Orchestrator<B> {
        &self.orchestrator
    }

    /// Searches until a plan is found, the horizon cap is reached or the
    /// search is cancelled, polling every `poll_interval`.
    pub async fn solve(
        &mut self,
        goal: &Goal,
        positions: &RobotPositions,
    ) -> Result<Outcome, SearchError> {
        self.orchestrator.start(goal, positions)?;
        let started = Instant::now();

        loop {
            let timed_out = self
                .config
                .time_limit
                .is_some_and(|limit| started.elapsed() >= limit);
            if self.cancel.is_requested() || timed_out {
                if timed_out {
                    warn!("Search for {} timed out", goal.robot);
                }
                self.orchestrator.cancel().await?;
                return Ok(Outcome::Cancelled);
            }

            match self.orchestrator.poll().await? {
                SearchStatus::Pending => tokio::time::sleep(self.config.poll_interval).await,
                SearchStatus::Found | SearchStatus::Exhausted => {
                    return Ok(match self.orchestrator.take_plan()? {
                        Some(plan) => Outcome::Solved(plan),
                        None => Outcome::Exhausted,
                    });
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub target: Target,
    pub goal: Goal,
    pub outcome: Outcome,
    pub won: bool,
    pub horizon: u32,
    /// Where the robots stand after the plan was applied.
    pub positions: RobotPositions,
}

/// Plays a sequence of targets on one board. Each solved plan is replayed
/// through the board's slide rule, so the next search starts where the
/// robots actually ended up.
pub struct Campaign<B: SolverBackend> {
    session: Session<B>,
    board: Board,
    rng: StdRng,
}

impl<B: SolverBackend> Campaign<B> {
    pub fn new(session: Session<B>, board: Board, seed: u64) -> Self {
        Self {
            session,
            board,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The board's available targets in a seeded random order.
    pub fn shuffled_targets(&mut self) -> Vec<Target> {
        let mut targets: Vec<Target> = self.board.grid().targets().iter().cloned().collect();
        targets.shuffle(&mut self.rng);
        targets
    }

    fn resolve_goal(&mut self, target: &Target) -> Result<Goal, SearchError> {
        let robot = match &target.color {
            TargetColor::Robot(robot) => robot.clone(),
            TargetColor::Any => {
                let robots: Vec<&Robot> = self.board.positions().keys().collect();
                let robot = robots.choose(&mut self.rng).ok_or(SearchError::NoRobots)?;
                (*robot).clone()
            }
        };
        Ok(Goal::new(robot, target.cell))
    }

    pub async fn play(&mut self, target: &Target) -> Result<TargetReport, SearchError> {
        let goal = self.resolve_goal(target)?;
        self.board.position_of(&goal.robot)?;
        self.board.set_goal(Some(goal.clone()));

        let positions = self.board.positions().clone();
        let outcome = self.session.solve(&goal, &positions).await?;
        if let Outcome::Solved(plan) = &outcome {
            self.board.set_plan(plan.clone());
            self.board.apply_plan(plan)?;
            if !self.board.won() {
                warn!(
                    "Plan for {} -> {} does not reach the target on this board",
                    goal.robot, goal.cell
                );
            }
        }
        let won = self.board.won();
        info!(
            "Target {} for {}: {}",
            target.cell,
            goal.robot,
            match &outcome {
                Outcome::Solved(plan) => format!("{} moves", plan.len()),
                Outcome::Exhausted => "exhausted".to_string(),
                Outcome::Cancelled => "cancelled".to_string(),
            }
        );
        Ok(TargetReport {
            target: target.clone(),
            goal,
            outcome,
            won,
            horizon: self.session.orchestrator().horizon(),
            positions: self.board.positions().clone(),
        })
    }

    /// Plays targets in order until they run out or cancellation is requested.
    /// A target that only timed out does not stop the run.
    pub async fn run(&mut self, targets: &[Target]) -> Result<Vec<TargetReport>, SearchError> {
        let mut reports = Vec::new();
        for target in targets {
            reports.push(self.play(target).await?);
            if self.session.cancel.is_requested() {
                break;
            }
        }
        Ok(reports)
    }
}

/// Reads a board by solving just the `base` part of a fresh engine and
/// decoding the facts of the model.
pub async fn load_board(path: &Path, config: EngineConfig) -> Result<Board, SearchError> {
    let mut engine = SearchEngine::new(config);
    engine
        .load_program(&[ProgramSource::File(path.to_path_buf())])
        .map_err(SearchError::BackendUnavailable)?;
    engine.ground(&[Part::base()])?;
    let result = engine.solve_async()?.wait().await?;
    let model = result.model.unwrap_or_default();
    let facts = Fact::decode_all(&model).map_err(DecodeError::from)?;
    let grid = Grid::from_facts(&facts);
    check_start(&grid)?;
    Ok(Board::new(grid))
}

fn check_start(grid: &Grid) -> Result<(), BoardError> {
    let mut seen: Vec<Cell> = Vec::new();
    for &cell in grid.start_positions().values() {
        if seen.contains(&cell) {
            return Err(BoardError::Overlap { cell });
        }
        seen.push(cell);
    }
    Ok(())
}
