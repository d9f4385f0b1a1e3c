use async_trait::async_trait;
use ricochet_board::Symbol;
use std::fmt;
use std::path::PathBuf;

/// A named, parameterised block of the solver program. Grounding a part adds
/// its rules on top of everything grounded before.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Part {
    pub name: String,
    pub params: Vec<i32>,
}

impl Part {
    pub fn new(name: impl Into<String>, params: Vec<i32>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn base() -> Self {
        Self::new("base", vec![])
    }

    pub fn check(t: u32) -> Self {
        Self::new("check", vec![t as i32])
    }

    pub fn state(t: u32) -> Self {
        Self::new("state", vec![t as i32])
    }

    pub fn trans(t: u32) -> Self {
        Self::new("trans", vec![t as i32])
    }

    /// Everything needed to search one more step at time `t`.
    pub fn layer(t: u32) -> [Part; 3] {
        [Part::trans(t), Part::check(t), Part::state(t)]
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        write!(f, "{}({})", self.name, params.join(","))
    }
}

#[derive(Debug, Clone)]
pub enum ProgramSource {
    Facts(Vec<Symbol>),
    File(PathBuf),
}

/// What a `move` atom carries besides the robot and the time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MoveEncoding {
    /// 1-indexed destination cell.
    #[default]
    Absolute,
    /// Unit step (dx, dy).
    Delta,
}

#[derive(Debug, Clone, Default)]
pub struct SolveResult {
    /// The model found, if the program was satisfiable.
    pub model: Option<Vec<Symbol>>,
    /// The attempt stopped because it was asked to.
    pub interrupted: bool,
}

impl SolveResult {
    pub fn is_satisfiable(&self) -> bool {
        self.model.is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to load program from {origin}: {reason}")]
    Load { origin: String, reason: String },
    #[error("no program loaded")]
    NotLoaded,
    #[error("unknown program part {0}")]
    UnknownPart(Part),
    #[error("{0} is not an external")]
    InvalidExternal(Symbol),
    #[error("solve attempt failed: {0}")]
    Attempt(String),
}

/// Incremental solving session: grounding is cumulative and externals toggle
/// facts on and off without grounding anything again.
pub trait SolverBackend: Send {
    fn load_program(&mut self, sources: &[ProgramSource]) -> Result<(), BackendError>;

    /// Adds `parts` to the grounded program. Callers never pass a part twice.
    fn ground(&mut self, parts: &[Part]) -> Result<(), BackendError>;

    fn set_external(&mut self, atom: &Symbol, value: bool) -> Result<(), BackendError>;

    /// Starts one solve attempt that runs independently of the caller.
    fn solve_async(&mut self) -> Result<Box<dyn SolveFuture>, BackendError>;
}

/// Handle to an in-flight solve attempt.
#[async_trait]
pub trait SolveFuture: Send {
    /// Non-blocking completion check.
    fn is_done(&self) -> bool;

    /// Waits for the attempt to finish. Calling it again returns the same result.
    async fn wait(&mut self) -> Result<SolveResult, BackendError>;

    /// Asks the attempt to stop. Follow with `wait` for the acknowledgment.
    fn cancel(&self);
}
