//! Line-oriented interpreter around the equity engine.
//!
//! Reads commands from stdin (or runs the command line arguments as one
//! command and exits):
//!
//! ```text
//! eval As Ks Qs Js Ts            score one exact hand
//! go [trials] 2p AcAd - 7h 8h 9h Monte Carlo equity (default 1,000,000)
//! enum 2p AcAd KhKs - 2c 7h Th   exhaustive equity
//! threads 4                      resize the worker pool
//! bench                          sampling throughput check
//! quit
//! ```

use std::io::{self, BufRead};
use std::time::Instant;

use equity_rs::cards::parse_cards;
use equity_rs::deal::Deal;
use equity_rs::engine::{Counters, Engine};
use equity_rs::hand::evaluate;

const DEFAULT_TRIALS: u64 = 1_000_000;
const BENCH_TRIALS: u64 = 500_000;

fn main() -> io::Result<()> {
    env_logger::init();

    let mut engine = match Engine::new(1) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        // Command line arguments are a one-shot command.
        dispatch(&mut engine, &args.join(" "));
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command == "quit" || command == "exit" {
            break;
        }
        dispatch(&mut engine, command);
    }
    Ok(())
}

fn dispatch(engine: &mut Engine, line: &str) {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "eval" => cmd_eval(rest),
        "go" => cmd_go(engine, rest),
        "enum" => cmd_enum(engine, rest),
        "threads" => cmd_threads(engine, rest),
        "bench" => cmd_bench(engine),
        _ => eprintln!("unknown command: {line}"),
    }
}

fn cmd_eval(rest: &str) {
    let cards = match parse_cards(rest) {
        Ok(cards) => cards,
        Err(err) => return eprintln!("error: {err}"),
    };
    match evaluate(&cards) {
        Ok(eval) => {
            println!("score {:#018x}  {}", eval.score().raw(), eval.category());
        }
        Err(err) => eprintln!("error: {err}"),
    }
}

fn cmd_go(engine: &Engine, rest: &str) {
    // Optional leading trial count before the deal.
    let (trials, spot) = match rest.split_once(char::is_whitespace) {
        Some((first, tail)) => match first.parse::<u64>() {
            Ok(trials) => (trials, tail.trim()),
            Err(_) => (DEFAULT_TRIALS, rest),
        },
        None => (DEFAULT_TRIALS, rest),
    };

    let deal: Deal = match spot.parse() {
        Ok(deal) => deal,
        Err(err) => return eprintln!("error in '{spot}': {err}"),
    };
    let counters = engine.sample(&deal, trials);
    print_results(&counters, deal.players());
}

fn cmd_enum(engine: &Engine, rest: &str) {
    let deal: Deal = match rest.parse() {
        Ok(deal) => deal,
        Err(err) => return eprintln!("error in '{rest}': {err}"),
    };
    let counters = engine.enumerate(&deal);
    print_results(&counters, deal.players());
}

fn cmd_threads(engine: &mut Engine, rest: &str) {
    match rest.parse::<usize>() {
        Ok(threads) => {
            if let Err(err) = engine.set_threads(threads) {
                eprintln!("error: {err}");
            } else {
                println!("threads set to {}", engine.threads());
            }
        }
        Err(_) => eprintln!("error: expected a thread count, got '{rest}'"),
    }
}

fn cmd_bench(engine: &Engine) {
    let deal: Deal = "2p AcAh 7s2d".parse().expect("benchmark deal");
    let started = Instant::now();
    let counters = engine.sample(&deal, BENCH_TRIALS);
    let elapsed = started.elapsed();
    let rate = counters.trials() as f64 / elapsed.as_secs_f64();
    println!(
        "{} trials in {:.3}s ({:.0} trials/s, {} threads)",
        counters.trials(),
        elapsed.as_secs_f64(),
        rate,
        engine.threads()
    );
}

fn print_results(counters: &Counters, players: usize) {
    let trials = counters.trials();
    if trials == 0 {
        println!("no completions to evaluate (0 trials)");
        return;
    }

    println!("trials: {trials}");
    for player in 0..players {
        let win = 100.0 * counters.wins(player) as f64 / trials as f64;
        let tie = 100.0 * counters.ties(player) as f64 / trials as f64;
        let equity = win + tie / 2.0;
        println!("player {}: win {win:6.2}%  tie {tie:6.2}%  equity {equity:6.2}%", player + 1);
    }
}
