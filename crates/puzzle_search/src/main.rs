//! Puzzle search CLI
//!
//! Walk back from a position with a UCI engine as referee and print the
//! puzzles found along the way.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use puzzle_core::{Motif, Position, ShakmatyRules, TacticalHeuristics};
use puzzle_search::{PuzzleCollection, PuzzleConfig, PuzzleSearchEngine, UciOracleFactory};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "puzzle_search", about = "Generate chess puzzles by retrograde search")]
struct Cli {
    /// TOML config file; defaults apply to anything it leaves out
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search backwards from a position for puzzles
    Search {
        /// Starting position (FEN)
        fen: String,
        /// Stop once this depth is reached
        #[arg(long, short)]
        depth: Option<usize>,
        /// UCI engine used as oracle
        #[arg(long)]
        engine: Option<String>,
        /// Oracle search depth in plies
        #[arg(long)]
        oracle_depth: Option<u32>,
        /// Parallel oracle sessions
        #[arg(long)]
        threads: Option<usize>,
        /// Seed for headline sampling
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t = Output::Report)]
        output: Output,
        /// Also save the collection as JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Score the tactical motifs of a single position
    Heuristics {
        /// Position (FEN)
        fen: String,
    },
    /// Print the report of a saved collection
    Report {
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    Report,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PuzzleConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => PuzzleConfig::default(),
    };

    match cli.command {
        Command::Search {
            fen,
            depth,
            engine,
            oracle_depth,
            threads,
            seed,
            output,
            save,
        } => {
            if let Some(depth) = depth {
                config.search.max_depth = depth;
            }
            if let Some(engine) = engine {
                config.oracle.program = engine;
            }
            if let Some(d) = oracle_depth {
                config.oracle.depth = d;
            }
            if let Some(t) = threads {
                config.search.concurrency = t;
            }
            if seed.is_some() {
                config.search.seed = seed;
            }
            config.validate()?;
            run_search(&fen, &config, output, save)
        }
        Command::Heuristics { fen } => {
            let position = Position::from_fen(&fen).context("parsing FEN")?;
            let heuristics = TacticalHeuristics::new(ShakmatyRules::new(), config.heuristics.clone());
            let result = heuristics.evaluate_position(&position);

            println!("=== Heuristics: {} ===", position);
            for motif in Motif::ALL {
                let score = result.get(motif);
                println!(
                    "{:<10} {:<5} {:.4}",
                    format!("{motif:?}"),
                    if score.triggered { "yes" } else { "no" },
                    score.magnitude
                );
            }
            println!("Total: {:.4}", result.total);
            Ok(())
        }
        Command::Report { path } => {
            let collection = PuzzleCollection::load(&path)?;
            collection.print_report();
            Ok(())
        }
    }
}

fn run_search(fen: &str, config: &PuzzleConfig, output: Output, save: Option<PathBuf>) -> Result<()> {
    let root = Position::from_fen(fen).context("parsing FEN")?;
    info!(
        fen = %root,
        depth = config.search.max_depth,
        engine = %config.oracle.program,
        "starting search"
    );

    let engine = PuzzleSearchEngine::new(UciOracleFactory::new(config.oracle.clone()), config);
    let collection = engine.search(&root, config.search.max_depth)?;

    if let Some(path) = save {
        collection.save(&path)?;
        info!(path = %path.display(), "collection saved");
    }

    match output {
        Output::Report => collection.print_report(),
        Output::Json => println!("{}", serde_json::to_string_pretty(&collection)?),
    }
    Ok(())
}
