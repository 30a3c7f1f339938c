mod training;

use std::error::Error;
use std::path::PathBuf;

use blackjack_drivers::{
    parse_config_from_file, resolve_config_path, Config, DEFAULT_CONFIG_PATH,
};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the config file
    #[arg(short, long, default_value_t = String::from(DEFAULT_CONFIG_PATH))]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Trains a policy with the configured method and saves it with its
    /// action values
    Train,
    /// Plays a saved policy, or basic strategy, and prints the results
    Evaluate {
        #[arg(short, long)]
        policy: Option<PathBuf>,
    },
    /// Prints a saved policy, or basic strategy, as charts
    Chart {
        #[arg(short, long)]
        policy: Option<PathBuf>,
    },
}

fn load_config(config: &str) -> Result<Config, Box<dyn Error>> {
    let path = resolve_config_path(config)?;
    let config = parse_config_from_file(&path)?;
    log::debug!("{:#?}", config);
    Ok(config)
}

fn run(args: CommandLineArgs) -> Result<(), Box<dyn Error>> {
    match args.command {
        Command::Train => training::train_from_config(&load_config(&args.config)?),
        Command::Evaluate { policy } => {
            training::evaluate_from_config(&load_config(&args.config)?, policy.as_deref())
        }
        Command::Chart { policy } => training::print_charts(policy.as_deref()),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandLineArgs::parse();
    if let Err(error) = run(args) {
        log::error!("{}", error);
        std::process::exit(1);
    }
}
