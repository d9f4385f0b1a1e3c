use crate::backend::MoveEncoding;
use crate::engine::EngineConfig;
use crate::orchestrator::{HARD_HORIZON_CAP, SearchConfig};
use crate::session::SessionConfig;
use clap::Parser;
use ricochet_board::{Cell, Robot, Target, TargetColor};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ricochet-solver")]
#[command(about = "Plans shortest move sequences for the sliding-robot puzzle", long_about = None)]
pub struct Args {
    /// Board description: a JSON list of facts
    #[arg(short, long, env = "RICOCHET_BOARD", default_value = "boards/standard.json")]
    pub board: PathBuf,

    /// Single target as robot:x,y (1-indexed). Without it every available target is played
    #[arg(short, long)]
    pub target: Option<TargetArg>,

    /// Seed for the target order and for picking robots on "any" targets
    #[arg(long)]
    pub seed: Option<u64>,

    /// Horizon grounded up front
    #[arg(long, env = "RICOCHET_INITIAL_HORIZON", default_value_t = 0)]
    pub initial_horizon: u32,

    /// Give up on a target once this horizon fails
    #[arg(long, env = "RICOCHET_MAX_HORIZON", default_value_t = HARD_HORIZON_CAP)]
    pub max_horizon: u32,

    #[arg(long, default_value_t = 100)]
    pub poll_interval_ms: u64,

    /// Cancel a single target's search after this many seconds
    #[arg(long)]
    pub time_limit_secs: Option<u64>,

    #[arg(long, value_enum, default_value_t = MoveEncoding::Absolute)]
    pub move_encoding: MoveEncoding,

    /// Return plans exactly as long as they need to be
    #[arg(long)]
    pub no_padding: bool,

    /// Print reports as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            move_encoding: self.move_encoding,
            pad_to_horizon: !self.no_padding,
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            initial_horizon: self.initial_horizon,
            max_horizon: self.max_horizon,
            move_encoding: self.move_encoding,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            time_limit: self.time_limit_secs.map(Duration::from_secs),
        }
    }

    /// `RUST_LOG` wins; otherwise `-v` raises the level from info.
    pub fn env_filter(&self) -> EnvFilter {
        let level = match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    }
}

/// `robot:x,y` with 1-indexed coordinates, e.g. `yellow:15,13`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetArg {
    pub robot: Robot,
    pub cell: Cell,
}

impl TargetArg {
    pub fn to_target(&self) -> Target {
        Target {
            color: TargetColor::Robot(self.robot.clone()),
            symbol: String::new(),
            cell: self.cell,
        }
    }
}

impl FromStr for TargetArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (robot, coords) = s
            .split_once(':')
            .ok_or_else(|| format!("expected robot:x,y, got '{}'", s))?;
        let (x, y) = coords
            .split_once(',')
            .ok_or_else(|| format!("expected x,y after the robot, got '{}'", coords))?;
        let x: i32 = x.trim().parse().map_err(|_| format!("bad x '{}'", x))?;
        let y: i32 = y.trim().parse().map_err(|_| format!("bad y '{}'", y))?;
        if robot.is_empty() || x < 1 || y < 1 {
            return Err(format!("invalid target '{}'", s));
        }
        Ok(Self {
            robot: Robot::new(robot),
            cell: Cell::from_fact(x, y),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        let target: TargetArg = "yellow:15,13".parse().unwrap();
        assert_eq!(target.robot, Robot::new("yellow"));
        assert_eq!(target.cell, Cell::new(14, 12));
        assert!("yellow".parse::<TargetArg>().is_err());
        assert!("yellow:0,3".parse::<TargetArg>().is_err());
        assert!("yellow:a,3".parse::<TargetArg>().is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["ricochet-solver", "--target", "red:2,3"]).unwrap();
        assert_eq!(args.max_horizon, HARD_HORIZON_CAP);
        assert_eq!(args.move_encoding, MoveEncoding::Absolute);
        assert!(args.engine_config().pad_to_horizon);
        assert_eq!(args.session_config().poll_interval, Duration::from_millis(100));
        assert_eq!(args.target.unwrap().cell, Cell::new(1, 2));
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from([
            "ricochet-solver",
            "--move-encoding",
            "delta",
            "--no-padding",
            "--max-horizon",
            "12",
            "--time-limit-secs",
            "5",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.search_config().move_encoding, MoveEncoding::Delta);
        assert_eq!(args.search_config().max_horizon, 12);
        assert!(!args.engine_config().pad_to_horizon);
        assert_eq!(args.session_config().time_limit, Some(Duration::from_secs(5)));
        assert_eq!(args.verbose, 2);
    }
}
