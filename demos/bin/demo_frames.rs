//! Picture Frames Featurization Demo
//!
//! Generates two concentric square frames, featurizes them with the local
//! simulator and reports how differently the two classes light up the
//! features. The frames cannot be separated by a line in the input plane.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use qks_adapter_sim::SimulatorExecutor;
use qks_core::datasets::picture_frames;
use qks_core::{Ansatz, Featurizer, FeaturizerConfig, RetryPolicy, RetryingExecutor};
use qks_demos::stats::{mean_activation, nearest_centroid_accuracy};
use qks_demos::{
    create_progress_bar, print_header, print_info, print_result, print_section, print_success,
};

#[derive(Parser, Debug)]
#[command(name = "demo-frames")]
#[command(about = "Featurize the picture-frames dataset with Quantum Kitchen Sinks")]
struct Args {
    /// Points per frame (rounded down to a multiple of 4)
    #[arg(short, long, default_value = "200")]
    points: usize,

    /// Number of episodes (overrides the config file)
    #[arg(short, long)]
    episodes: Option<usize>,

    /// Seed for the dataset, episode parameters and sampling
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Maximum in-flight executions (overrides the config file)
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// YAML featurizer configuration
    #[arg(long, env = "QKS_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    print_header("Quantum Kitchen Sinks: Picture Frames");

    let mut config = match &args.config {
        Some(path) => FeaturizerConfig::from_file(path)?,
        None => FeaturizerConfig::from_env()?,
    };
    if let Some(episodes) = args.episodes {
        config.num_episodes = episodes;
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    config.seed = Some(config.seed.unwrap_or(args.seed));

    let mut rng = StdRng::seed_from_u64(args.seed);
    let data = picture_frames(args.points, &mut rng)?;

    let pb = create_progress_bar(data.points.nrows() as u64, "points");
    let bar = pb.clone();
    let featurizer = Featurizer::new(Ansatz::reference(), config)?
        .with_progress(move |p| bar.set_position(p.completed_points as u64));

    print_section("Problem Setup");
    let ansatz = featurizer.ansatz();
    let config = featurizer.config();
    print_result("Points", data.points.nrows());
    print_result("Qubits", ansatz.num_qubits());
    print_result("Rotation", format!("{:?}", ansatz.rotation()));
    print_result("Episodes", config.num_episodes);
    print_result("Shots per execution", config.shots);
    print_result("Max concurrency", config.max_concurrency);
    if let Some(path) = &args.config {
        print_info(&format!("Configuration loaded from {}", path.display()));
    }

    let executor = RetryingExecutor::new(
        SimulatorExecutor::with_seed(args.seed),
        RetryPolicy::default(),
    )?;

    print_section("Featurization");
    info!("Featurizing {} points", data.points.nrows());
    let run = featurizer.run(&executor, data.points.view()).await?;
    pb.finish_with_message("done");

    print_result("Executions", run.executions);
    print_result("Feature width", run.features.ncols());
    print_result("Parameter seed", run.parameters.seed());
    print_result("Elapsed", format!("{:.2?}", run.elapsed));

    print_section("Summary");
    let activation = mean_activation(run.features.view(), data.labels.view())?;
    for (label, mean) in &activation {
        let name = if *label == 0 { "inner" } else { "outer" };
        print_result(&format!("Mean activation ({name})"), format!("{mean:.4}"));
    }
    let accuracy = nearest_centroid_accuracy(run.features.view(), data.labels.view())?;
    print_result("Nearest-centroid accuracy", format!("{:.1}%", accuracy * 100.0));

    print_success("Featurization complete");
    Ok(())
}
