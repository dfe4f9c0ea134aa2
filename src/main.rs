use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use biseriation::{Biseriation, BiseriationConfig, DistanceKind, Heuristic};

/// Seriate the rows and columns of a sparse matrix, then fold in batches of new rows
#[derive(Parser, Debug)]
#[command(name = "biseriate")]
#[command(version)]
#[command(about = "Two-way incremental seriation of sparse matrices")]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Distance model: euclidean, manhattan, correlation or mutualinformation
    #[arg(short, long, default_value = "euclidean")]
    distance: DistanceKind,

    /// Construction heuristic: left-right or insert
    #[arg(short = 'H', long, default_value = "left-right")]
    heuristic: Heuristic,

    /// Continue from the checkpoint logs of an interrupted run
    #[arg(long)]
    resume: bool,

    /// Quantization bins for mutual information
    #[arg(long, default_value_t = 100)]
    bins: usize,

    /// Also write the cumulative scale of each axis
    #[arg(long)]
    scale: bool,

    /// Path stem of the input, with or without `.dat`: reads `<COLLECTION>.dat`
    collection: PathBuf,

    /// Batch files of new rows, applied in order
    updates: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let config = BiseriationConfig::new(cli.collection)
        .with_distance(cli.distance)
        .with_heuristic(cli.heuristic)
        .with_updates(cli.updates)
        .with_resume(cli.resume)
        .with_bins(cli.bins)
        .with_scale(cli.scale);
    config.validate().context("invalid configuration")?;

    let run = Biseriation::run(config).context("biseriation failed")?;
    info!(
        "Done: {} rows, {} columns, {} rows folded in, metadata in {:?}",
        run.rows().n_instances(),
        run.columns().n_instances(),
        run.update_counter(),
        run.config().metadata_path()
    );
    Ok(())
}
