//! Incremental horizon search for the sliding-robot puzzle: a solving session
//! that widens its search one time step at a time, the built-in backend it
//! drives, and the canonicalization of the plans that come back.

pub mod backend;
pub mod canonical;
pub mod config;
pub mod engine;
pub mod orchestrator;
pub mod session;

pub use backend::{MoveEncoding, Part, ProgramSource, SolveFuture, SolveResult, SolverBackend};
pub use engine::{EngineConfig, SearchEngine};
pub use orchestrator::{HARD_HORIZON_CAP, Orchestrator, SearchConfig, SearchError, SearchStatus};
pub use session::{Campaign, CancellationFlag, Outcome, Session, SessionConfig, TargetReport};
