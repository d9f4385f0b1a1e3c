use crate::backend::{BackendError, MoveEncoding, Part, ProgramSource, SolveFuture, SolverBackend};
use crate::canonical::{DecodeError, canonicalize, decode_moves};
use ricochet_board::{BoardError, Fact, Goal, Plan, RobotPositions, Symbol};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// No search ever grounds more time steps than this.
pub const HARD_HORIZON_CAP: u32 = 30;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Horizon grounded when the session is created.
    pub initial_horizon: u32,
    /// A search that fails at this horizon is exhausted. Clamped to
    /// [`HARD_HORIZON_CAP`].
    pub max_horizon: u32,
    pub move_encoding: MoveEncoding,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            initial_horizon: 0,
            max_horizon: HARD_HORIZON_CAP,
            move_encoding: MoveEncoding::Absolute,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Pending,
    Found,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Searching,
    Found,
    Exhausted,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("solver backend unavailable: {0}")]
    BackendUnavailable(#[source] BackendError),
    #[error("a search is already active; cancel it or take its plan first")]
    InvalidStartState,
    #[error("no search is active")]
    NoActiveSearch,
    #[error("the solve attempt was interrupted")]
    Interrupted,
    #[error("the board has no robots")]
    NoRobots,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Board(#[from] BoardError),
}

fn horizon_marker(horizon: u32) -> Symbol {
    Fact::Horizon(horizon as i32).to_symbol()
}

/// Drives one long-lived solving session through incremental horizon
/// search: every failed attempt grounds one more time step and tries again,
/// until a plan turns up or the horizon cap is hit.
///
/// Grounding is cumulative across targets, so the horizon only ever grows.
pub struct Orchestrator<B: SolverBackend> {
    backend: B,
    config: SearchConfig,
    horizon: u32,
    grounded: BTreeSet<Part>,
    asserted: BTreeSet<Symbol>,
    start: RobotPositions,
    future: Option<Box<dyn SolveFuture>>,
    model: Option<Vec<Symbol>>,
    phase: Phase,
    attempts: Vec<u32>,
}

impl<B: SolverBackend> Orchestrator<B> {
    pub fn new(
        mut backend: B,
        program: &[ProgramSource],
        mut config: SearchConfig,
    ) -> Result<Self, SearchError> {
        if config.max_horizon > HARD_HORIZON_CAP {
            warn!(
                "max horizon {} is above the cap, using {}",
                config.max_horizon, HARD_HORIZON_CAP
            );
            config.max_horizon = HARD_HORIZON_CAP;
        }
        if config.initial_horizon > config.max_horizon {
            warn!(
                "initial horizon {} is above the max horizon, using {}",
                config.initial_horizon, config.max_horizon
            );
            config.initial_horizon = config.max_horizon;
        }
        backend
            .load_program(program)
            .map_err(SearchError::BackendUnavailable)?;

        let horizon = config.initial_horizon;
        let mut orchestrator = Self {
            backend,
            config,
            horizon,
            grounded: BTreeSet::new(),
            asserted: BTreeSet::new(),
            start: RobotPositions::new(),
            future: None,
            model: None,
            phase: Phase::Idle,
            attempts: Vec::new(),
        };

        let mut parts = vec![Part::base(), Part::check(0), Part::state(0)];
        for t in 1..=horizon {
            parts.extend(Part::layer(t));
        }
        orchestrator
            .ground(parts)
            .map_err(SearchError::BackendUnavailable)?;
        orchestrator
            .backend
            .set_external(&horizon_marker(horizon), true)
            .map_err(SearchError::BackendUnavailable)?;
        info!("Solver session ready at horizon {}", horizon);
        Ok(orchestrator)
    }

    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    pub fn max_horizon(&self) -> u32 {
        self.config.max_horizon
    }

    /// Horizons attempted since the last `start`, in order.
    pub fn attempted_horizons(&self) -> &[u32] {
        &self.attempts
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn has_pending_attempt(&self) -> bool {
        self.future.is_some()
    }

    /// Externals asserted for the current search, excluding the horizon marker.
    pub fn asserted_externals(&self) -> &BTreeSet<Symbol> {
        &self.asserted
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Grounds the parts not grounded yet.
    fn ground(&mut self, parts: Vec<Part>) -> Result<(), BackendError> {
        let fresh: Vec<Part> = parts
            .into_iter()
            .filter(|part| !self.grounded.contains(part))
            .collect();
        if fresh.is_empty() {
            return Ok(());
        }
        self.backend.ground(&fresh)?;
        self.grounded.extend(fresh);
        Ok(())
    }

    fn launch(&mut self) -> Result<(), SearchError> {
        debug!("Launching attempt at horizon {}", self.horizon);
        self.attempts.push(self.horizon);
        self.future = Some(self.backend.solve_async()?);
        Ok(())
    }

    /// Grounds and activates the next time step. Prior layers stay as they
    /// are. The horizon only moves once the new layer is grounded and its
    /// marker is the one asserted.
    fn widen(&mut self) -> Result<(), SearchError> {
        assert!(
            self.horizon < HARD_HORIZON_CAP,
            "horizon {} cannot grow past the cap of {}",
            self.horizon,
            HARD_HORIZON_CAP
        );
        let next = self.horizon + 1;
        self.ground(Part::layer(next).to_vec())?;
        self.backend
            .set_external(&horizon_marker(self.horizon), false)?;
        if let Err(e) = self.backend.set_external(&horizon_marker(next), true) {
            self.backend
                .set_external(&horizon_marker(self.horizon), true)?;
            return Err(e.into());
        }
        self.horizon = next;
        debug!("Widened to horizon {}", self.horizon);
        Ok(())
    }

    fn release(&mut self) -> Result<(), SearchError> {
        for atom in std::mem::take(&mut self.asserted) {
            self.backend.set_external(&atom, false)?;
        }
        Ok(())
    }

    /// Ends the current search after a failed step and hands back `error`.
    /// The session is idle afterwards.
    fn abandon(&mut self, error: SearchError) -> SearchError {
        warn!("Abandoning search at horizon {}: {}", self.horizon, error);
        self.future = None;
        self.model = None;
        self.phase = Phase::Idle;
        if let Err(e) = self.release() {
            warn!("Failed to retract externals: {}", e);
        }
        error
    }

    /// Asserts the robots' positions and the goal, then launches the first
    /// attempt at the current horizon.
    pub fn start(&mut self, goal: &Goal, positions: &RobotPositions) -> Result<(), SearchError> {
        if self.phase != Phase::Idle {
            return Err(SearchError::InvalidStartState);
        }
        if !positions.contains_key(&goal.robot) {
            return Err(BoardError::UnknownRobot(goal.robot.clone()).into());
        }

        let mut externals = BTreeSet::new();
        for (robot, cell) in positions {
            let (x, y) = cell.to_fact();
            externals.insert(
                Fact::Position {
                    robot: robot.name().to_string(),
                    x,
                    y,
                    t: 0,
                }
                .to_symbol(),
            );
        }
        let (x, y) = goal.cell.to_fact();
        externals.insert(
            Fact::Goal {
                robot: goal.robot.name().to_string(),
                x,
                y,
            }
            .to_symbol(),
        );

        for atom in &externals {
            if let Err(e) = self.backend.set_external(atom, true) {
                self.asserted.extend(externals.iter().take_while(|a| *a != atom).cloned());
                self.release()?;
                return Err(e.into());
            }
        }
        self.asserted = externals;
        self.start = positions.clone();
        self.model = None;
        self.attempts.clear();
        info!(
            "Searching for {} -> {} from horizon {}",
            goal.robot, goal.cell, self.horizon
        );

        if let Err(e) = self.launch() {
            self.release()?;
            return Err(e);
        }
        self.phase = Phase::Searching;
        Ok(())
    }

    /// Checks on the in-flight attempt without waiting for it. A failed
    /// attempt below the cap is followed by a wider one and reports `Pending`.
    pub async fn poll(&mut self) -> Result<SearchStatus, SearchError> {
        match self.phase {
            Phase::Idle => return Err(SearchError::NoActiveSearch),
            Phase::Found => return Ok(SearchStatus::Found),
            Phase::Exhausted => return Ok(SearchStatus::Exhausted),
            Phase::Searching => {}
        }
        let Some(future) = self.future.as_mut() else {
            return Err(SearchError::NoActiveSearch);
        };
        if !future.is_done() {
            return Ok(SearchStatus::Pending);
        }
        let result = future.wait().await;
        self.future = None;
        let result = match result {
            Ok(result) => result,
            Err(e) => return Err(self.abandon(e.into())),
        };

        if let Some(model) = result.model {
            info!("Plan found at horizon {}", self.horizon);
            self.model = Some(model);
            self.phase = Phase::Found;
            return Ok(SearchStatus::Found);
        }
        if result.interrupted {
            return Err(self.abandon(SearchError::Interrupted));
        }
        if self.horizon >= self.config.max_horizon {
            info!("No plan within horizon {}", self.horizon);
            self.phase = Phase::Exhausted;
            return Ok(SearchStatus::Exhausted);
        }

        if let Err(e) = self.widen().and_then(|()| self.launch()) {
            return Err(self.abandon(e));
        }
        Ok(SearchStatus::Pending)
    }

    /// Stops the in-flight attempt, waits for the backend to acknowledge,
    /// then retracts this search's externals. Safe to call when idle.
    pub async fn cancel(&mut self) -> Result<(), SearchError> {
        if let Some(mut future) = self.future.take() {
            future.cancel();
            let result = future.wait().await?;
            debug!(
                "Attempt at horizon {} stopped (interrupted: {})",
                self.horizon, result.interrupted
            );
        }
        self.release()?;
        self.model = None;
        self.phase = Phase::Idle;
        Ok(())
    }

    /// Hands over the canonical plan of a finished search and retracts its
    /// externals so the session is ready for the next goal. `None` when no
    /// plan is held; a search still running is left untouched.
    pub fn take_plan(&mut self) -> Result<Option<Plan>, SearchError> {
        match self.phase {
            Phase::Idle | Phase::Searching => return Ok(None),
            Phase::Found | Phase::Exhausted => {}
        }
        let model = self.model.take();
        self.release()?;
        self.phase = Phase::Idle;

        let Some(model) = model else {
            return Ok(None);
        };
        let moves = decode_moves(&model, &self.start, self.config.move_encoding)?;
        let plan = canonicalize(moves);
        debug!("Canonical plan has {} moves", plan.len());
        Ok(Some(plan))
    }
}

impl<B: SolverBackend> Drop for Orchestrator<B> {
    fn drop(&mut self) {
        if let Some(future) = self.future.as_ref() {
            future.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SolveResult;
    use async_trait::async_trait;
    use ricochet_board::{Cell, Direction, Move, Robot};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Ground(Vec<Part>),
        External(Symbol, bool),
        Solve,
    }

    /// Records every call and answers solves from a script, one entry per
    /// attempt; `None` means unsatisfiable.
    struct ScriptedBackend {
        calls: Arc<Mutex<Vec<Call>>>,
        script: VecDeque<Option<Vec<Symbol>>>,
        /// Grounding this part fails.
        broken_part: Option<Part>,
        /// The attempt with this index crashes.
        crash_on: Option<usize>,
        solves: usize,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Option<Vec<Symbol>>>) -> (Self, Arc<Mutex<Vec<Call>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let backend = Self {
                calls: calls.clone(),
                script: script.into(),
                broken_part: None,
                crash_on: None,
                solves: 0,
            };
            (backend, calls)
        }
    }

    struct ReadyFuture(Result<SolveResult, String>);

    #[async_trait]
    impl SolveFuture for ReadyFuture {
        fn is_done(&self) -> bool {
            true
        }

        async fn wait(&mut self) -> Result<SolveResult, BackendError> {
            self.0.clone().map_err(BackendError::Attempt)
        }

        fn cancel(&self) {}
    }

    impl SolverBackend for ScriptedBackend {
        fn load_program(&mut self, _sources: &[ProgramSource]) -> Result<(), BackendError> {
            Ok(())
        }

        fn ground(&mut self, parts: &[Part]) -> Result<(), BackendError> {
            if let Some(part) = self.broken_part.as_ref().filter(|p| parts.contains(p)) {
                return Err(BackendError::UnknownPart(part.clone()));
            }
            self.calls.lock().unwrap().push(Call::Ground(parts.to_vec()));
            Ok(())
        }

        fn set_external(&mut self, atom: &Symbol, value: bool) -> Result<(), BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::External(atom.clone(), value));
            Ok(())
        }

        fn solve_async(&mut self) -> Result<Box<dyn SolveFuture>, BackendError> {
            self.calls.lock().unwrap().push(Call::Solve);
            let index = self.solves;
            self.solves += 1;
            let model = self.script.pop_front().flatten();
            if self.crash_on == Some(index) {
                return Ok(Box::new(ReadyFuture(Err("worker panicked".to_string()))));
            }
            Ok(Box::new(ReadyFuture(Ok(SolveResult {
                model,
                interrupted: false,
            }))))
        }
    }

    struct FailingBackend;

    impl SolverBackend for FailingBackend {
        fn load_program(&mut self, _sources: &[ProgramSource]) -> Result<(), BackendError> {
            Err(BackendError::Load {
                origin: "board.json".to_string(),
                reason: "missing".to_string(),
            })
        }

        fn ground(&mut self, _parts: &[Part]) -> Result<(), BackendError> {
            Ok(())
        }

        fn set_external(&mut self, _atom: &Symbol, _value: bool) -> Result<(), BackendError> {
            Ok(())
        }

        fn solve_async(&mut self) -> Result<Box<dyn SolveFuture>, BackendError> {
            Err(BackendError::NotLoaded)
        }
    }

    fn positions() -> RobotPositions {
        let mut positions = RobotPositions::new();
        positions.insert(Robot::new("red"), Cell::new(0, 0));
        positions.insert(Robot::new("yellow"), Cell::new(15, 15));
        positions
    }

    fn goal() -> Goal {
        Goal::new("yellow", Cell::new(14, 12))
    }

    fn delta_config(initial_horizon: u32, max_horizon: u32) -> SearchConfig {
        SearchConfig {
            initial_horizon,
            max_horizon,
            move_encoding: MoveEncoding::Delta,
        }
    }

    fn yellow_model() -> Vec<Symbol> {
        [(0, -1, 1), (-1, 0, 2), (-1, 0, 3)]
            .into_iter()
            .map(|(a, b, t)| {
                Fact::Move {
                    robot: "yellow".to_string(),
                    a,
                    b,
                    t,
                }
                .to_symbol()
            })
            .collect()
    }

    #[test]
    fn test_initial_grounding() {
        let (backend, calls) = ScriptedBackend::new(vec![]);
        let orchestrator = Orchestrator::new(backend, &[], delta_config(2, 30)).unwrap();
        assert_eq!(orchestrator.horizon(), 2);
        let calls = calls.lock().unwrap();
        let mut expected = vec![Part::base(), Part::check(0), Part::state(0)];
        expected.extend(Part::layer(1));
        expected.extend(Part::layer(2));
        assert_eq!(calls[0], Call::Ground(expected));
        assert_eq!(calls[1], Call::External(horizon_marker(2), true));
    }

    #[test]
    fn test_backend_unavailable() {
        let err = Orchestrator::new(FailingBackend, &[], SearchConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, SearchError::BackendUnavailable(_)));
    }

    #[test]
    fn test_caps_are_clamped() {
        let (backend, _) = ScriptedBackend::new(vec![]);
        let orchestrator = Orchestrator::new(backend, &[], delta_config(50, 40)).unwrap();
        assert_eq!(orchestrator.max_horizon(), HARD_HORIZON_CAP);
        assert_eq!(orchestrator.horizon(), HARD_HORIZON_CAP);
    }

    #[tokio::test]
    async fn test_widens_one_step_at_a_time() {
        let (backend, calls) = ScriptedBackend::new(vec![None, None, Some(yellow_model())]);
        let mut orchestrator = Orchestrator::new(backend, &[], delta_config(0, 30)).unwrap();
        orchestrator.start(&goal(), &positions()).unwrap();

        assert_eq!(orchestrator.poll().await.unwrap(), SearchStatus::Pending);
        assert_eq!(orchestrator.horizon(), 1);
        assert_eq!(orchestrator.poll().await.unwrap(), SearchStatus::Pending);
        assert_eq!(orchestrator.horizon(), 2);
        assert_eq!(orchestrator.poll().await.unwrap(), SearchStatus::Found);
        assert_eq!(orchestrator.poll().await.unwrap(), SearchStatus::Found);
        assert_eq!(orchestrator.attempted_horizons(), &[0, 1, 2]);

        // each widening: ground the new layer, retract the old marker, assert the new one
        let calls = calls.lock().unwrap();
        let widen: Vec<&Call> = calls
            .iter()
            .skip_while(|c| **c != Call::Solve)
            .skip(1)
            .take(4)
            .collect();
        assert_eq!(
            widen,
            vec![
                &Call::Ground(Part::layer(1).to_vec()),
                &Call::External(horizon_marker(0), false),
                &Call::External(horizon_marker(1), true),
                &Call::Solve,
            ]
        );
        let grounds: Vec<&Call> = calls
            .iter()
            .filter(|c| matches!(c, Call::Ground(_)))
            .collect();
        assert_eq!(grounds.len(), 3);
    }

    #[tokio::test]
    async fn test_take_plan_canonicalizes_and_releases() {
        let (backend, calls) = ScriptedBackend::new(vec![Some(yellow_model())]);
        let mut orchestrator = Orchestrator::new(backend, &[], delta_config(3, 30)).unwrap();
        orchestrator.start(&goal(), &positions()).unwrap();
        assert_eq!(orchestrator.asserted_externals().len(), 3);
        assert_eq!(orchestrator.poll().await.unwrap(), SearchStatus::Found);

        let plan = orchestrator.take_plan().unwrap().unwrap();
        assert_eq!(
            plan.as_slice(),
            &[
                Move::new("yellow", Direction::North, 1),
                Move::new("yellow", Direction::West, 2)
            ]
        );
        assert!(orchestrator.is_idle());
        assert!(orchestrator.asserted_externals().is_empty());
        assert!(orchestrator.take_plan().unwrap().is_none());

        let calls = calls.lock().unwrap();
        let retracted = calls
            .iter()
            .filter(|c| matches!(c, Call::External(atom, false) if atom.name != "horizon"))
            .count();
        assert_eq!(retracted, 3);
    }

    #[tokio::test]
    async fn test_exhausted_at_max_horizon() {
        let (backend, _) = ScriptedBackend::new(vec![None, None, None]);
        let mut orchestrator = Orchestrator::new(backend, &[], delta_config(0, 2)).unwrap();
        orchestrator.start(&goal(), &positions()).unwrap();
        assert_eq!(orchestrator.poll().await.unwrap(), SearchStatus::Pending);
        assert_eq!(orchestrator.poll().await.unwrap(), SearchStatus::Pending);
        assert_eq!(orchestrator.poll().await.unwrap(), SearchStatus::Exhausted);
        assert_eq!(orchestrator.poll().await.unwrap(), SearchStatus::Exhausted);
        assert_eq!(orchestrator.horizon(), 2);
        assert_eq!(orchestrator.attempted_horizons(), &[0, 1, 2]);
        assert!(orchestrator.take_plan().unwrap().is_none());
        assert!(orchestrator.is_idle());
    }

    #[tokio::test]
    async fn test_start_while_active_is_rejected() {
        let (backend, _) = ScriptedBackend::new(vec![None]);
        let mut orchestrator = Orchestrator::new(backend, &[], delta_config(0, 30)).unwrap();
        orchestrator.start(&goal(), &positions()).unwrap();
        let err = orchestrator.start(&goal(), &positions()).unwrap_err();
        assert!(matches!(err, SearchError::InvalidStartState));
    }

    #[tokio::test]
    async fn test_poll_when_idle() {
        let (backend, _) = ScriptedBackend::new(vec![]);
        let mut orchestrator = Orchestrator::new(backend, &[], delta_config(0, 30)).unwrap();
        let err = orchestrator.poll().await.unwrap_err();
        assert!(matches!(err, SearchError::NoActiveSearch));
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle() {
        let (backend, _) = ScriptedBackend::new(vec![None]);
        let mut orchestrator = Orchestrator::new(backend, &[], delta_config(0, 30)).unwrap();
        orchestrator.cancel().await.unwrap();
        orchestrator.start(&goal(), &positions()).unwrap();
        orchestrator.cancel().await.unwrap();
        assert!(orchestrator.is_idle());
        assert!(!orchestrator.has_pending_attempt());
        assert!(orchestrator.asserted_externals().is_empty());
    }

    #[tokio::test]
    async fn test_crashed_attempt_ends_search() {
        let (mut backend, calls) = ScriptedBackend::new(vec![None, None, Some(yellow_model())]);
        backend.crash_on = Some(0);
        let mut orchestrator = Orchestrator::new(backend, &[], delta_config(0, 30)).unwrap();
        orchestrator.start(&goal(), &positions()).unwrap();

        let err = orchestrator.poll().await.unwrap_err();
        assert!(matches!(err, SearchError::Backend(BackendError::Attempt(_))));
        assert_eq!(orchestrator.horizon(), 0);
        assert!(orchestrator.is_idle());
        assert!(!orchestrator.has_pending_attempt());
        assert!(orchestrator.asserted_externals().is_empty());
        assert!(matches!(
            orchestrator.poll().await.unwrap_err(),
            SearchError::NoActiveSearch
        ));
        let widened = calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| matches!(c, Call::Ground(parts) if parts.contains(&Part::trans(1))));
        assert!(!widened);

        // the session is usable again
        orchestrator.start(&goal(), &positions()).unwrap();
        assert_eq!(orchestrator.poll().await.unwrap(), SearchStatus::Pending);
        assert_eq!(orchestrator.horizon(), 1);
    }

    #[tokio::test]
    async fn test_failed_widening_keeps_horizon() {
        let (mut backend, calls) = ScriptedBackend::new(vec![None, None]);
        backend.broken_part = Some(Part::trans(1));
        let mut orchestrator = Orchestrator::new(backend, &[], delta_config(0, 30)).unwrap();
        orchestrator.start(&goal(), &positions()).unwrap();

        let err = orchestrator.poll().await.unwrap_err();
        assert!(matches!(err, SearchError::Backend(BackendError::UnknownPart(_))));
        assert_eq!(orchestrator.horizon(), 0);
        assert!(orchestrator.is_idle());
        assert!(!orchestrator.has_pending_attempt());
        assert!(orchestrator.asserted_externals().is_empty());

        // horizon(0) was never retracted
        let calls = calls.lock().unwrap();
        assert!(!calls.contains(&Call::External(horizon_marker(0), false)));
        assert!(!calls.contains(&Call::External(horizon_marker(1), true)));
        drop(calls);

        orchestrator.start(&goal(), &positions()).unwrap();
        assert!(orchestrator.has_pending_attempt());
    }

    #[tokio::test]
    async fn test_widening_retries_a_layer_that_failed() {
        let (mut backend, calls) = ScriptedBackend::new(vec![None, None, None]);
        backend.broken_part = Some(Part::trans(1));
        let mut orchestrator = Orchestrator::new(backend, &[], delta_config(0, 30)).unwrap();
        orchestrator.start(&goal(), &positions()).unwrap();
        assert!(orchestrator.poll().await.is_err());

        orchestrator.backend.broken_part = None;
        orchestrator.start(&goal(), &positions()).unwrap();
        assert_eq!(orchestrator.poll().await.unwrap(), SearchStatus::Pending);
        assert_eq!(orchestrator.horizon(), 1);
        assert!(
            calls
                .lock()
                .unwrap()
                .contains(&Call::Ground(Part::layer(1).to_vec()))
        );
    }

    #[test]
    fn test_unknown_goal_robot() {
        let (backend, _) = ScriptedBackend::new(vec![]);
        let mut orchestrator = Orchestrator::new(backend, &[], delta_config(0, 30)).unwrap();
        let goal = Goal::new("silver", Cell::new(1, 1));
        let err = orchestrator.start(&goal, &positions()).unwrap_err();
        assert!(matches!(err, SearchError::Board(BoardError::UnknownRobot(_))));
        assert!(orchestrator.is_idle());
    }
}
