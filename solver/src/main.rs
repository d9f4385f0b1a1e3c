use anyhow::{Context, Result};
use clap::Parser;
use ricochet_solver::config::Args;
use ricochet_solver::session::load_board;
use ricochet_solver::{
    Campaign, Orchestrator, Outcome, ProgramSource, SearchEngine, Session, TargetReport,
};
use tokio::signal;
use tracing::info;

fn print_report(report: &TargetReport) {
    let (x, y) = report.goal.cell.to_fact();
    println!("Target {} at ({}, {}):", report.goal.robot, x, y);
    match &report.outcome {
        Outcome::Solved(plan) if plan.is_empty() => println!("  already there"),
        Outcome::Solved(plan) => {
            for mv in plan {
                println!("  {}. {} {}", mv.time, mv.robot, mv.direction);
            }
            println!("  {} moves, reached: {}", plan.len(), report.won);
        }
        Outcome::Exhausted => println!("  no plan within horizon {}", report.horizon),
        Outcome::Cancelled => println!("  cancelled"),
    }
    let positions: Vec<String> = report
        .positions
        .iter()
        .map(|(robot, cell)| {
            let (x, y) = cell.to_fact();
            format!("{}=({}, {})", robot, x, y)
        })
        .collect();
    println!("  robots: {}", positions.join(" "));
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(args.env_filter())
        .init();

    let board = load_board(&args.board, args.engine_config())
        .await
        .with_context(|| format!("Failed to load board from {}", args.board.display()))?;

    let engine = SearchEngine::new(args.engine_config());
    let orchestrator = Orchestrator::new(
        engine,
        &[ProgramSource::File(args.board.clone())],
        args.search_config(),
    )
    .context("Failed to set up the solver session")?;
    let session = Session::new(orchestrator, args.session_config());

    let interrupted = session.cancellation();
    let cancel = interrupted.clone();
    tokio::spawn(async move {
        if let Ok(()) = signal::ctrl_c().await {
            info!("Received Ctrl+C, cancelling search");
            cancel.request();
        }
    });

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Using seed {}", seed);
    let mut campaign = Campaign::new(session, board, seed);
    let targets = match &args.target {
        Some(target) => vec![target.to_target()],
        None => campaign.shuffled_targets(),
    };
    if targets.is_empty() {
        anyhow::bail!("Board {} has no available targets", args.board.display());
    }

    let reports = campaign.run(&targets).await.context("Search failed")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    if interrupted.is_requested() {
        std::process::exit(130); // Exit with SIGINT status
    }
    Ok(())
}
