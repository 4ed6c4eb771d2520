//! Command-line front end: train XOR, run saved networks, perturb them.

use backprop::{Logging, Network, StopCondition, Trainer, TransferFunction};
use clap::{Parser, Subcommand};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "backprop")]
#[command(version)]
#[command(about = "Feedforward neural networks trained by back-propagation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a 2-2-1 sigmoid network on the XOR truth table
    Xor {
        /// Number of passes over the truth table
        #[arg(short, long, default_value = "2000")]
        epochs: usize,

        #[arg(short, long, default_value = "0.9")]
        learning_rate: f64,

        #[arg(short, long, default_value = "0.3")]
        momentum: f64,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Save the trained network to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate a saved network on one input vector
    Run {
        /// Saved network (XML)
        #[arg(short, long)]
        network: PathBuf,

        /// Comma-separated input values
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        input: Vec<f64>,
    },

    /// Perturb a saved network's weights with proportional Gaussian noise
    Nudge {
        /// Saved network (XML)
        #[arg(short, long)]
        network: PathBuf,

        /// Noise standard deviation, relative to each parameter's magnitude
        #[arg(short, long, default_value = "0.1")]
        scalar: f64,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Where to write the perturbed network
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn open(path: &Path) -> Result<Network, Box<dyn Error>> {
    match Network::open(path)? {
        Some(network) => Ok(network),
        None => Err(format!("{} is not a back-propagation network", path.display()).into()),
    }
}

fn xor(
    epochs: usize,
    learning_rate: f64,
    momentum: f64,
    seed: Option<u64>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let examples = [
        ([0.0, 0.0], [0.0]),
        ([0.0, 1.0], [1.0]),
        ([1.0, 0.0], [1.0]),
        ([1.0, 1.0], [0.0]),
    ];
    let functions = [
        TransferFunction::None,
        TransferFunction::Sigmoid,
        TransferFunction::Sigmoid,
    ];
    let mut network = Network::with_rng(&[2, 2, 1], &functions, &mut rng(seed))?;
    network.set_name("xor");

    Trainer::new(&mut network)
        .learning_rate(learning_rate)
        .momentum(momentum)
        .logging(Logging::Iterations((epochs / 10).max(1)))
        .stop_condition(StopCondition::Iterations(epochs))
        .train(&examples[..])?;

    println!();
    for (input, expected) in &examples {
        let output = network.evaluate(input)?;
        println!(
            "{} XOR {} = {:.4} (expected {})",
            input[0], input[1], output[0], expected[0]
        );
    }

    if let Some(path) = output {
        network.save(&path)?;
        info!("saved network to {}", path.display());
    }
    Ok(())
}

fn run(path: &Path, input: &[f64]) -> Result<(), Box<dyn Error>> {
    let mut network = open(path)?;
    let output = network.evaluate(input)?;
    let values: Vec<String> = output.iter().map(|y| y.to_string()).collect();
    println!("{}", values.join(","));
    Ok(())
}

fn nudge(
    path: &Path,
    scalar: f64,
    seed: Option<u64>,
    output: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut network = open(path)?;
    if scalar < 0.0 {
        warn!("negative scalar {} behaves like {}", scalar, -scalar);
    }
    network.nudge_with_rng(scalar, &mut rng(seed));
    network.save(output)?;
    info!(
        "nudged {} parameters of {:?} into {}",
        network.parameter_count(),
        network.name(),
        output.display()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Xor {
            epochs,
            learning_rate,
            momentum,
            seed,
            output,
        } => xor(epochs, learning_rate, momentum, seed, output),
        Commands::Run { network, input } => run(&network, &input),
        Commands::Nudge {
            network,
            scalar,
            seed,
            output,
        } => nudge(&network, scalar, seed, &output),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
