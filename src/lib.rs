//! Chess rules engine.
//!
//! Decodes and encodes positions, generates pseudo-legal and legal moves,
//! detects check, checkmate, stalemate and the draw rules, and translates
//! between moves and SAN or PGN text.
//!
//! ```
//! use chess_rules::engine::{Game, GameStatus};
//!
//! let mut game = Game::new();
//! for token in ["f3", "e5", "g4", "Qh4"] {
//!     game.play_san(token).unwrap();
//! }
//! assert_eq!(*game.status(), GameStatus::Checkmate);
//! ```

pub mod config;
pub mod engine;
