use clap::builder::RangedU64ValueParser;
use clap::Parser;
use feedforward::architecture::{build_network, load_architecture, ArchitectureConfig};
use feedforward::config::{load_config, TrainingConfig};
use feedforward::data::{read_csv_data, read_csv_labels, Dataset};
use feedforward::training::{evaluate, train};
use feedforward::utils::SimpleRng;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format;

/// Train a dense MNIST classifier from CSV exports (one image per line, pixels in [0, 1]).
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file with one flattened image per line.
    #[arg(default_value = "data/data.csv")]
    data: PathBuf,

    /// CSV file with one class label per line.
    #[arg(default_value = "data/labels.csv")]
    labels: PathBuf,

    /// Number of samples to read from the data and label files.
    #[arg(
        long,
        default_value_t = 60000,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    samples: usize,

    /// Training configuration (JSON). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Layer architecture (JSON). The 784-16-16-10 network is used when omitted.
    #[arg(long)]
    architecture: Option<PathBuf>,

    /// Directory trained models are written to.
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,
}

/// Path a model with the given test accuracy is saved under.
fn model_path(dir: &Path, accuracy: f32) -> PathBuf {
    dir.join(format!("mnist_model_{:.1}.bin", accuracy))
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let program_start = Instant::now();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => TrainingConfig::default(),
    };
    let architecture = match &args.architecture {
        Some(path) => load_architecture(path)?,
        None => ArchitectureConfig::mnist_default(),
    };

    let mut rng = SimpleRng::new(config.seed.unwrap_or(0));
    if config.seed.is_none() {
        rng.reseed_from_time();
    }
    let mut net = build_network(&architecture, &mut rng)?;
    let input_size = net.input_size().ok_or("network has no layers")?;
    let num_classes = net.output_size().ok_or("network has no layers")?;

    info!("Preparing data...");
    let load_start = Instant::now();
    let inputs = read_csv_data(&args.data, args.samples, input_size)?;
    let labels = read_csv_labels(&args.labels, args.samples, num_classes)?;
    let (train_set, test_set) = Dataset::new(inputs, labels)?.split(config.test_fraction)?;
    info!(
        "Data preparation complete: {} training, {} test samples ({:.2}s)",
        train_set.len(),
        test_set.len(),
        load_start.elapsed().as_secs_f64()
    );

    net.setup_loss(config.loss);
    net.setup_optimizer(config.optimizer_config())?;
    info!(
        "Training {} layers, {} parameters, {} loss, {} optimizer (lr {})",
        net.len(),
        net.parameter_count(),
        config.loss,
        config.optimizer,
        config.learning_rate
    );

    let train_start = Instant::now();
    train(
        &mut net,
        &train_set,
        config.batch_size,
        config.epochs,
        config.log_every,
    )?;
    info!(
        "Total training time: {:.2} seconds",
        train_start.elapsed().as_secs_f64()
    );

    if test_set.is_empty() {
        info!("No test samples held out; skipping evaluation");
        return Ok(());
    }

    let accuracy = evaluate(&mut net, &test_set)?;
    println!("Accuracy: {:.1}%", accuracy);

    if accuracy >= config.save_threshold {
        std::fs::create_dir_all(&args.model_dir)?;
        let path = model_path(&args.model_dir, accuracy);
        net.save(&path)?;
        info!("Successfully saved to {}", path.display());
    } else {
        info!(
            "Accuracy below {:.1}%; model not saved",
            config.save_threshold
        );
    }

    info!(
        "Total program time: {:.2} seconds",
        program_start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .event_format(format().with_target(false))
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}
