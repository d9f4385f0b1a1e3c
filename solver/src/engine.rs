use crate::backend::{
    BackendError, MoveEncoding, Part, ProgramSource, SolveFuture, SolveResult, SolverBackend,
};
use async_trait::async_trait;
use ricochet_board::simulate::slide_from;
use ricochet_board::{Cell, Direction, Fact, Grid, Robot, Symbol};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub move_encoding: MoveEncoding,
    /// Repeat the final action up to the horizon, the way a plan grounded
    /// for more steps than it needs comes back from the solver.
    pub pad_to_horizon: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            move_encoding: MoveEncoding::Absolute,
            pad_to_horizon: true,
        }
    }
}

#[derive(Debug)]
struct Program {
    facts: Vec<Symbol>,
    grid: Grid,
}

/// What one attempt is asked to solve, read from the active externals.
#[derive(Debug, Clone)]
struct Query {
    positions: BTreeMap<Robot, Cell>,
    goal: Option<(Robot, Cell)>,
    limit: Option<u32>,
}

/// Built-in backend: keeps the board facts as its program and answers each
/// solve with a breadth-first search bounded by the grounded horizon.
pub struct SearchEngine {
    config: EngineConfig,
    program: Option<Arc<Program>>,
    grounded: BTreeSet<Part>,
    externals: BTreeSet<Symbol>,
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            program: None,
            grounded: BTreeSet::new(),
            externals: BTreeSet::new(),
        }
    }

    pub fn grounded_parts(&self) -> &BTreeSet<Part> {
        &self.grounded
    }

    pub fn active_externals(&self) -> &BTreeSet<Symbol> {
        &self.externals
    }

    /// Deepest step `t` such that every layer up to it is grounded.
    fn grounded_depth(&self) -> Option<u32> {
        let has = |part: Part| self.grounded.contains(&part);
        if !(has(Part::base()) && has(Part::check(0)) && has(Part::state(0))) {
            return None;
        }
        let mut depth = 0;
        while Part::layer(depth + 1).into_iter().all(has) {
            depth += 1;
        }
        Some(depth)
    }

    fn query(&self) -> Query {
        let mut positions = BTreeMap::new();
        let mut goal = None;
        let mut horizon: Option<u32> = None;
        for atom in &self.externals {
            // set_external only lets decodable atoms in
            match Fact::decode(atom) {
                Ok(Some(Fact::Position { robot, x, y, t: 0 })) => {
                    positions.insert(Robot::new(robot), Cell::from_fact(x, y));
                }
                Ok(Some(Fact::Goal { robot, x, y })) => {
                    goal = Some((Robot::new(robot), Cell::from_fact(x, y)));
                }
                Ok(Some(Fact::Horizon(h))) => {
                    let h = h.max(0) as u32;
                    horizon = Some(horizon.map_or(h, |current| current.min(h)));
                }
                _ => {}
            }
        }
        let limit = match (self.grounded_depth(), horizon) {
            (None, _) => None,
            (Some(depth), Some(h)) => Some(depth.min(h)),
            (Some(depth), None) => Some(depth),
        };
        Query {
            positions,
            goal,
            limit,
        }
    }
}

fn read_source(source: &ProgramSource) -> Result<Vec<Symbol>, BackendError> {
    match source {
        ProgramSource::Facts(symbols) => Ok(symbols.clone()),
        ProgramSource::File(path) => {
            let origin = path.display().to_string();
            let text = std::fs::read_to_string(path).map_err(|e| BackendError::Load {
                origin: origin.clone(),
                reason: e.to_string(),
            })?;
            serde_json::from_str(&text).map_err(|e| BackendError::Load {
                origin,
                reason: e.to_string(),
            })
        }
    }
}

impl SolverBackend for SearchEngine {
    fn load_program(&mut self, sources: &[ProgramSource]) -> Result<(), BackendError> {
        let mut facts = self
            .program
            .as_ref()
            .map(|p| p.facts.clone())
            .unwrap_or_default();
        for source in sources {
            facts.extend(read_source(source)?);
        }
        let decoded = Fact::decode_all(&facts).map_err(|e| BackendError::Load {
            origin: "program".to_string(),
            reason: e.to_string(),
        })?;
        let grid = Grid::from_facts(&decoded);
        info!(
            "Loaded program: {} facts, {}x{} board, {} robots",
            facts.len(),
            grid.size(),
            grid.size(),
            grid.robots().count()
        );
        self.program = Some(Arc::new(Program { facts, grid }));
        Ok(())
    }

    fn ground(&mut self, parts: &[Part]) -> Result<(), BackendError> {
        for part in parts {
            let known = match (part.name.as_str(), part.params.as_slice()) {
                ("base", []) => true,
                ("check" | "state" | "trans", [t]) => *t >= 0,
                _ => false,
            };
            if !known {
                return Err(BackendError::UnknownPart(part.clone()));
            }
            if !self.grounded.insert(part.clone()) {
                debug!("{} already grounded", part);
            }
        }
        Ok(())
    }

    fn set_external(&mut self, atom: &Symbol, value: bool) -> Result<(), BackendError> {
        match Fact::decode(atom) {
            Ok(Some(Fact::Position { .. } | Fact::Goal { .. } | Fact::Horizon(_))) => {}
            _ => return Err(BackendError::InvalidExternal(atom.clone())),
        }
        if value {
            self.externals.insert(atom.clone());
        } else {
            self.externals.remove(atom);
        }
        Ok(())
    }

    fn solve_async(&mut self) -> Result<Box<dyn SolveFuture>, BackendError> {
        let program = self.program.clone().ok_or(BackendError::NotLoaded)?;
        let with_facts = self.grounded.contains(&Part::base());
        let query = self.query();
        let config = self.config;
        debug!(
            "Solving: goal {:?}, limit {:?}, {} robots placed",
            query.goal,
            query.limit,
            query.positions.len()
        );

        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            run_attempt(&program, with_facts, &query, config, &flag)
        });
        Ok(Box::new(EngineFuture {
            task: Some(task),
            outcome: None,
            cancel,
        }))
    }
}

struct EngineFuture {
    task: Option<JoinHandle<SolveResult>>,
    /// Settled once the task has been joined; a failed join keeps its reason.
    outcome: Option<Result<SolveResult, String>>,
    cancel: Arc<AtomicBool>,
}

#[async_trait]
impl SolveFuture for EngineFuture {
    fn is_done(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    async fn wait(&mut self) -> Result<SolveResult, BackendError> {
        if let Some(task) = self.task.take() {
            self.outcome = Some(task.await.map_err(|e| e.to_string()));
        }
        match &self.outcome {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(reason)) => Err(BackendError::Attempt(reason.clone())),
            None => Ok(SolveResult::default()),
        }
    }

    fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    robot: usize,
    direction: Direction,
    to: Cell,
}

#[derive(Debug, PartialEq, Eq)]
enum Search {
    Found(Vec<Step>),
    Exhausted,
    Interrupted,
}

fn run_attempt(
    program: &Program,
    with_facts: bool,
    query: &Query,
    config: EngineConfig,
    cancel: &AtomicBool,
) -> SolveResult {
    let mut model = if with_facts {
        program.facts.clone()
    } else {
        Vec::new()
    };
    let Some((goal_robot, goal_cell)) = &query.goal else {
        return SolveResult {
            model: Some(model),
            interrupted: false,
        };
    };
    let unsatisfiable = SolveResult::default();
    let Some(limit) = query.limit else {
        return unsatisfiable;
    };
    let robots: Vec<Robot> = query.positions.keys().cloned().collect();
    let Some(goal_index) = robots.iter().position(|r| r == goal_robot) else {
        return unsatisfiable;
    };
    let start: Vec<Cell> = query.positions.values().copied().collect();

    match search(&program.grid, start, goal_index, *goal_cell, limit, cancel) {
        Search::Found(steps) => {
            model.extend(move_atoms(&robots, &steps, limit, config));
            SolveResult {
                model: Some(model),
                interrupted: false,
            }
        }
        Search::Exhausted => unsatisfiable,
        Search::Interrupted => SolveResult {
            model: None,
            interrupted: true,
        },
    }
}

struct Node {
    cells: Vec<Cell>,
    parent: Option<usize>,
    step: Option<Step>,
    depth: u32,
}

/// Shortest sequence of at most `limit` slides putting robot `goal_robot` on
/// `goal_cell`. States are robot cells in robot order.
fn search(
    grid: &Grid,
    start: Vec<Cell>,
    goal_robot: usize,
    goal_cell: Cell,
    limit: u32,
    cancel: &AtomicBool,
) -> Search {
    if start[goal_robot] == goal_cell {
        return Search::Found(Vec::new());
    }

    let mut seen = HashSet::from([start.clone()]);
    let mut nodes = vec![Node {
        cells: start,
        parent: None,
        step: None,
        depth: 0,
    }];
    let mut queue = VecDeque::from([0]);

    while let Some(index) = queue.pop_front() {
        if cancel.load(Ordering::Relaxed) {
            return Search::Interrupted;
        }
        let depth = nodes[index].depth;
        if depth >= limit {
            break;
        }
        let cells = nodes[index].cells.clone();
        for robot in 0..cells.len() {
            for direction in Direction::ALL {
                let from = cells[robot];
                let to = slide_from(grid, from, direction, |cell| cells.contains(&cell));
                if to == from {
                    continue;
                }
                let mut next = cells.clone();
                next[robot] = to;
                if !seen.insert(next.clone()) {
                    continue;
                }
                nodes.push(Node {
                    cells: next,
                    parent: Some(index),
                    step: Some(Step {
                        robot,
                        direction,
                        to,
                    }),
                    depth: depth + 1,
                });
                let child = nodes.len() - 1;
                if robot == goal_robot && to == goal_cell {
                    return Search::Found(trace(&nodes, child));
                }
                queue.push_back(child);
            }
        }
    }
    Search::Exhausted
}

fn trace(nodes: &[Node], mut index: usize) -> Vec<Step> {
    let mut steps = Vec::new();
    while let Some(step) = nodes[index].step {
        steps.push(step);
        match nodes[index].parent {
            Some(parent) => index = parent,
            None => break,
        }
    }
    steps.reverse();
    steps
}

fn move_atom(robots: &[Robot], step: &Step, t: u32, encoding: MoveEncoding) -> Symbol {
    let (a, b) = match encoding {
        MoveEncoding::Absolute => step.to.to_fact(),
        MoveEncoding::Delta => step.direction.delta(),
    };
    Fact::Move {
        robot: robots[step.robot].name().to_string(),
        a,
        b,
        t: t as i32,
    }
    .to_symbol()
}

fn move_atoms(robots: &[Robot], steps: &[Step], limit: u32, config: EngineConfig) -> Vec<Symbol> {
    let mut atoms: Vec<Symbol> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| move_atom(robots, step, i as u32 + 1, config.move_encoding))
        .collect();
    if config.pad_to_horizon {
        if let Some(last) = steps.last() {
            for t in steps.len() as u32 + 1..=limit {
                atoms.push(move_atom(robots, last, t, config.move_encoding));
            }
        }
    }
    atoms
}
