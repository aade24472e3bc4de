use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
// For the hold-out shuffle
use rand::{rngs::SmallRng, SeedableRng};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ink_count_mnist::evaluate::{accuracy, split_holdout};
use ink_count_mnist::mnist::{load_mnist, save_predictions, write_predictions, RowKind};
use ink_count_mnist::{classify_all, ClassProfiles, ImageRecord};

#[derive(Parser)]
#[command(name = "ink-count-mnist")]
#[command(about = "Classify handwritten digits by nearest mean ink-pixel count", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads (defaults to one per core)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print per-digit ink-count statistics of a labeled training file
    Stats {
        /// Labeled training csv (label first)
        #[arg(long)]
        train: PathBuf,
    },
    /// Classify an unlabeled test file and write `ImageId,Label` rows
    Predict {
        /// Labeled training csv (label first)
        #[arg(long)]
        train: PathBuf,
        /// Unlabeled test csv
        #[arg(long)]
        test: PathBuf,
        /// Output csv, stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Measure accuracy on a shuffled hold-out part of the labeled file
    Evaluate {
        /// Labeled training csv (label first)
        #[arg(long)]
        train: PathBuf,
        /// Fraction of examples held out for testing
        #[arg(long, default_value = "0.1")]
        holdout: f64,
        /// Seed for the shuffle
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        // stdout carries the predictions
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn load(path: &Path, kind: RowKind) -> Result<Vec<ImageRecord>> {
    let now = Instant::now();
    let records = load_mnist(path, kind).with_context(|| format!("failed to load {}", path.display()))?;
    info!(
        "Loaded {} examples from {} [{}ms]",
        records.len(),
        path.display(),
        now.elapsed().as_millis()
    );
    Ok(records)
}

fn build_profiles(training: &[ImageRecord]) -> Result<ClassProfiles> {
    let now = Instant::now();
    let profiles = ClassProfiles::build(training).context("failed to build class profiles")?;
    info!("Built class profiles [{}ms]", now.elapsed().as_millis());
    Ok(profiles)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to start worker threads")?;
    }

    match cli.command {
        Commands::Stats { train } => {
            let training = load(&train, RowKind::Labeled)?;
            let profiles = build_profiles(&training)?;
            print!("{}", profiles);
        }
        Commands::Predict {
            train,
            test,
            output,
        } => {
            let training = load(&train, RowKind::Labeled)?;
            let profiles = build_profiles(&training)?;
            let test_images = load(&test, RowKind::Unlabeled)?;

            let now = Instant::now();
            let predictions =
                classify_all(&test_images, &profiles).context("failed to classify test data")?;
            info!(
                "Classified {} images [{}ms]",
                predictions.len(),
                now.elapsed().as_millis()
            );

            match output {
                Some(path) => {
                    save_predictions(&path, &predictions)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Wrote predictions to {}", path.display());
                }
                None => write_predictions(io::stdout().lock(), &predictions)
                    .context("failed to write predictions")?,
            }
        }
        Commands::Evaluate {
            train,
            holdout,
            seed,
        } => {
            let mut rng = SmallRng::seed_from_u64(seed);
            let labeled = load(&train, RowKind::Labeled)?;
            let (training, holdout) = split_holdout(labeled, holdout, &mut rng)?;
            info!(
                "Split into {} training and {} hold-out examples",
                training.len(),
                holdout.len()
            );

            let profiles = build_profiles(&training)?;
            let now = Instant::now();
            let predictions =
                classify_all(&holdout, &profiles).context("failed to classify hold-out data")?;
            let acc = accuracy(&predictions, &holdout);
            info!(
                "Done - Accuracy = {} [{}ms]",
                acc,
                now.elapsed().as_millis()
            );
            println!("{}", acc);
        }
    }

    Ok(())
}
