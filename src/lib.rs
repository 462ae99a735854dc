//! equity-rs: Texas Hold'em hand strength and equity calculation
//!
//! Goals:
//! - Fast bit-plane hand evaluation with a single comparable score
//! - Multi-way win/tie equity by Monte Carlo sampling or exhaustive
//!   enumeration, fanned out over a fixed worker pool
//! - No panics for invalid input; use `Result` for recoverable errors
//!
//! ## Quick start: equity for an all-in on the turn
//! ```
//! use equity_rs::{deal::Deal, engine::Engine};
//!
//! // Heads-up, both hands known, one board card to come: 44 rivers.
//! let deal: Deal = "2p AcAd KhKs - 2c 7h Th 9d".parse().unwrap();
//! let engine = Engine::new(2).unwrap();
//! let counters = engine.enumerate(&deal);
//!
//! assert_eq!(counters.trials(), 44);
//! assert_eq!(counters.wins(0) + counters.wins(1) + counters.ties(0), 44);
//! ```
//!
//! ## Scoring a single hand
//! ```
//! use equity_rs::cards::parse_cards;
//! use equity_rs::hand::{evaluate, Category};
//!
//! let cards = parse_cards("Ah Kh Qh Jh Th 2c 2d").unwrap();
//! let eval = evaluate(&cards).unwrap();
//! assert_eq!(eval.category(), Category::StraightFlush);
//! ```
//!
//! ## Interpreter
//! The `equity` binary wraps the library in a line-oriented interpreter:
//! ```sh
//! echo "enum 2p AcAd KhKs - 2c 7h Th 9d" | cargo run
//! ```

pub mod cards;
pub mod deal;
pub mod engine;
pub mod hand;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
