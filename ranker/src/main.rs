use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use primer_ranker::helper_functions::write_csv;
use primer_ranker::primer_table::{load_primer_table, ranked_frame};
use primer_ranker::{Ranker, ScoringConfig};

/// Primer quality ranking
#[derive(Parser)]
#[command(name = "primer-ranker")]
#[command(version)]
#[command(about = "Score and rank parsed Primer3 primer pairs", long_about = None)]
struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a parsed primer CSV and write it back sorted by quality
    Rank {
        /// Parsed primer CSV
        input: PathBuf,
        /// Ranked output CSV
        output: PathBuf,
        /// JSON file overriding the default scoring configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write summary statistics to this JSON file
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Scoring threads (0 = all cores)
        #[arg(long, default_value_t = 0)]
        threads: usize,
        /// Number of top pairs to log
        #[arg(long, default_value_t = 5)]
        top: usize,
    },

    /// Print the default scoring configuration as JSON
    Config,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_rank(
    input: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    summary: Option<PathBuf>,
    threads: usize,
    top: usize,
) -> Result<()> {
    let config = match config {
        Some(path) => ScoringConfig::from_json_file(&path)
            .with_context(|| format!("loading scoring config {}", path.display()))?,
        None => ScoringConfig::default(),
    };
    let ranker = Ranker::new(config)?.with_threads(threads);

    let (df, records) = load_primer_table(&input, ranker.config())
        .with_context(|| format!("reading primer table {}", input.display()))?;
    let ranking = ranker.rank(&records)?;

    let mut out = ranked_frame(&df, &ranking)?;
    write_csv(&mut out, &output)
        .with_context(|| format!("writing ranked table {}", output.display()))?;
    info!("Results saved to {}", output.display());

    for pair in ranking.top(top) {
        info!(
            "#{:<3} {:<30} {:>6.2} {:<2} product {} bp",
            pair.global_rank,
            pair.record.pair_id,
            pair.composite,
            pair.grade,
            pair.record.product_size.map_or_else(|| "NA".to_string(), |s| format!("{s:.0}")),
        );
    }

    let stats = ranking.summary();
    stats.log();
    if let Some(path) = summary {
        stats
            .write_json(&path)
            .with_context(|| format!("writing summary {}", path.display()))?;
        info!("Summary saved to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Rank { input, output, config, summary, threads, top } => {
            info!("Starting primer quality ranking");
            cmd_rank(input, output, config, summary, threads, top)
        }
        Commands::Config => {
            println!("{}", ScoringConfig::default().to_json_pretty()?);
            Ok(())
        }
    }
}
