//! Discrete-time Markov chains over string-labelled states.
//!
//! This crate simulates first-order chains (the next state depends on the
//! current state) and K-th order chains (the next state depends on the last
//! K states), and computes exact n-step distributions by matrix
//! exponentiation.
//!
//! # Layout
//!
//! ```text
//!  ┌──────────┐   ┌───────────┐   ┌──────────────┐
//!  │ state    │──▶│ matrix    │──▶│ higher_order │
//!  │ history  │   │ (algebra) │   │ (lift/power) │
//!  └──────────┘   └───────────┘   └──────────────┘
//!        │              │                │
//!        ▼              ▼                ▼
//!  ┌─────────────────────────────────────────────┐
//!  │ engine (sample, streaks) ◀── chain          │
//!  └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use chainsim_markov::{ChainConfig, MarkovChain, TransitionMatrix};
//!
//! let matrix = TransitionMatrix::from_entries([
//!     ("Heads", [("Heads", 0.5), ("Tails", 0.5)]),
//!     ("Tails", [("Heads", 0.5), ("Tails", 0.5)]),
//! ]);
//! let config = ChainConfig::new().with_seed(42);
//! let mut chain = MarkovChain::new(matrix, "fair coin", None, &config).unwrap();
//!
//! let counts = chain.run(1_000).unwrap();
//! assert_eq!(counts.values().sum::<usize>(), 1_000);
//! assert!(chain.entropy() > 0.9);
//! ```

pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod higher_order;
pub mod history;
pub mod matrix;
pub mod result;
pub mod state;

pub use chain::{HigherOrderChain, MarkovChain};
pub use config::ChainConfig;
pub use engine::{Cursor, Engine};
pub use error::MarkovError;
pub use higher_order::HigherOrderMatrix;
pub use history::{DEFAULT_SEPARATOR, History, HistoryCodec, enumerate};
pub use matrix::{Matrix, TransitionMatrix, evolve, identity, multiply, power};
pub use result::RunSummary;
pub use state::{State, StateAlphabet};
