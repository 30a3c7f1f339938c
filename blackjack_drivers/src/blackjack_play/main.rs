use std::error::Error;
use std::io::{self, BufRead, Write};

use blackjack_drivers::{parse_config_from_file, resolve_config_path, DEFAULT_CONFIG_PATH};
use blackjack_rl::table::{Table, TablePhase};
use blackjack_rl::{Action, Rule};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, about = "Plays blackjack rounds from the terminal", long_about = None)]
struct CommandLineArgs {
    /// The path of the config file
    #[arg(short, long, default_value_t = String::from(DEFAULT_CONFIG_PATH))]
    config: String,

    /// Starting bank, in chips
    #[arg(short, long, default_value_t = 100.0)]
    bank: f64,

    /// Stake of every round
    #[arg(long, default_value_t = 1.0)]
    bet: f64,

    /// Seed of the shoe. A random shoe is used when absent.
    #[arg(short, long)]
    seed: Option<u64>,
}

fn prompt(input: &mut impl BufRead, message: &str) -> Result<Option<String>, Box<dyn Error>> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn show_table(table: &Table) {
    println!("Dealer: {}", table.dealer());
    for (i, hand) in table.player().all_hands().enumerate() {
        let marker = if table.phase() == TablePhase::PlayerTurn && i == table.current_index() {
            ">"
        } else {
            " "
        };
        println!("{} Hand {}: {} bet {}", marker, i + 1, hand.hand(), hand.bet());
    }
}

/// Plays one round. Returns `false` when the input is closed or the user quits.
fn play_round(
    table: &mut Table,
    bet: f64,
    input: &mut impl BufRead,
) -> Result<bool, Box<dyn Error>> {
    table.deal(bet)?;

    while table.phase() == TablePhase::PlayerTurn {
        show_table(table);
        let actions = table.possible_actions();
        let choices: Vec<String> = actions.iter().map(|action| action.to_string()).collect();
        let line = match prompt(input, &format!("Action ({}): ", choices.join("/")))? {
            Some(line) => line,
            None => return Ok(false),
        };
        if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
            return Ok(false);
        }
        match line.parse::<Action>() {
            Ok(action) if actions.contains(&action) => table.step(action)?,
            _ => println!("Cannot {} now", line),
        }
    }

    let rewards = table.finish()?;
    println!("Dealer: {}", table.dealer());
    let hands = table.player().completed_hands();
    for (i, (hand, reward)) in hands.iter().zip(&rewards).enumerate() {
        println!("  Hand {}: {} reward {:+}", i + 1, hand.hand(), reward);
    }
    if table.insurance_reward() != 0.0 {
        println!("  Insurance reward {:+}", table.insurance_reward());
    }
    println!("Bank: {}", table.bank());
    table.new_round()?;
    Ok(true)
}

fn run(args: CommandLineArgs) -> Result<(), Box<dyn Error>> {
    let config = parse_config_from_file(&resolve_config_path(&args.config)?)?;
    let rule: Rule = config.rule.try_into()?;
    let mut table = match args.seed {
        Some(seed) => Table::with_seed(&rule, args.bank, seed),
        None => Table::new(&rule, args.bank),
    };
    log::debug!("{:#?}", rule);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        if table.bank() < args.bet {
            println!("Out of chips");
            return Ok(());
        }
        if !play_round(&mut table, args.bet, &mut input)? {
            return Ok(());
        }
        match prompt(&mut input, "Press enter for the next round, q to quit: ")? {
            Some(line) if !line.eq_ignore_ascii_case("q") => {}
            _ => return Ok(()),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(error) = run(CommandLineArgs::parse()) {
        log::error!("{}", error);
        std::process::exit(1);
    }
}
