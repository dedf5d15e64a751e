//! Stateful game controller wrapping Position.
//!
//! `Game` validates moves before applying them, keeps the move history, an
//! undo stack of position snapshots and the repetition counter, and tracks
//! the game status (checkmate, stalemate, draws). It is the type a session
//! or transport layer interacts with.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::RulesConfig;
use crate::engine::board::Position;
use crate::engine::legal;
use crate::engine::outcome::{self, RepetitionCounter};
use crate::engine::san;
use crate::engine::types::{ChessError, Color, GameStatus, Move, PieceKind, Square};

// =========================================================================
// MoveRecord
// =========================================================================

/// A recorded move in the game history.
#[derive(Clone, Debug, Serialize)]
pub struct MoveRecord {
    /// The move that was played.
    pub mv: Move,
    /// SAN of the move, with check or mate suffix.
    pub san: String,
    /// What game status resulted from this move.
    pub status_after: GameStatus,
}

// =========================================================================
// Game
// =========================================================================

/// A complete chess game with history, undo, and status tracking.
#[derive(Clone, Debug)]
pub struct Game {
    // Core state
    position: Position,
    move_history: Vec<MoveRecord>,
    /// Position before each move in `move_history`.
    snapshots: Vec<Position>,
    repetitions: RepetitionCounter,
    config: RulesConfig,

    // Status
    status: GameStatus,

    // Metadata
    pub white_player: String,
    pub black_player: String,
    pub created_at: DateTime<Utc>,

    // FEN tracking
    started_from_fen: bool,
    starting_fen: String,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// Create a new game from the standard starting position.
    pub fn new() -> Self {
        Self::with_config(RulesConfig::default())
    }

    /// Create a new game from the starting position with custom draw rules.
    pub fn with_config(config: RulesConfig) -> Self {
        let mut game = Self::from_position(Position::starting(), config);
        game.started_from_fen = false;
        game
    }

    /// Create a game from a position string.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let pos = Position::from_fen(fen)?;
        Ok(Self::from_position(pos, RulesConfig::default()))
    }

    fn from_position(position: Position, config: RulesConfig) -> Self {
        let starting_fen = position.to_fen();
        let mut repetitions = RepetitionCounter::new();
        repetitions.record(&position);
        let status = outcome::status(&position, &repetitions, &config);
        Self {
            position,
            move_history: Vec::new(),
            snapshots: Vec::new(),
            repetitions,
            config,
            status,
            white_player: "Player".into(),
            black_player: "Player".into(),
            created_at: Utc::now(),
            started_from_fen: true,
            starting_fen,
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Current board position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Current game status.
    pub fn status(&self) -> &GameStatus {
        &self.status
    }

    /// Side to move.
    pub fn side_to_move(&self) -> Color {
        self.position.active_color
    }

    /// Completed move history.
    pub fn move_history(&self) -> &[MoveRecord] {
        &self.move_history
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// All legal moves in the current position.
    pub fn legal_moves(&self) -> Vec<Move> {
        legal::legal_moves(&self.position)
    }

    /// Legal destinations for the piece on `sq`; castles appear as the
    /// rook's square.
    pub fn available_moves(&self, sq: Square) -> Vec<Square> {
        legal::get_available_moves(sq, &self.position)
    }

    /// Whether the game is over.
    pub fn is_game_over(&self) -> bool {
        self.status.is_game_over()
    }

    /// Current position as text.
    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    /// Whether the game was started from a custom position.
    pub fn started_from_fen(&self) -> bool {
        self.started_from_fen
    }

    /// The starting position text.
    pub fn starting_fen(&self) -> &str {
        &self.starting_fen
    }

    /// Fullmove number.
    pub fn fullmove_number(&self) -> u32 {
        self.position.fullmove_number
    }

    /// Halfmove clock (for 50-move rule).
    pub fn halfmove_clock(&self) -> u16 {
        self.position.halfmove_clock
    }

    /// Occurrences of the current position so far, this one included.
    pub fn repetition_count(&self) -> u32 {
        self.repetitions.count(&self.position)
    }

    // -----------------------------------------------------------------
    // Make move
    // -----------------------------------------------------------------

    /// Play a move. Returns its SAN, with check or mate suffix.
    ///
    /// Returns `ChessError::GameOver` if the game is already finished,
    /// `ChessError::InvalidMove` if the move is not legal and
    /// `ChessError::InvalidPromotion` if the placed piece is wrong.
    pub fn make_move(&mut self, mv: Move) -> Result<String, ChessError> {
        if self.status.is_game_over() {
            return Err(ChessError::GameOver(self.status.to_string()));
        }

        if !legal::is_move_valid(mv.from, mv.to, &self.position) {
            return Err(ChessError::InvalidMove {
                from: mv.from.to_algebraic(),
                to: mv.to.to_algebraic(),
                reason: "not a legal move".into(),
            });
        }
        self.check_placed_piece(mv)?;

        // SAN needs the position before the move.
        let legal = self.legal_moves();
        let san = san::move_to_san(&self.position, mv, &legal);

        self.snapshots.push(self.position.clone());
        self.position.make_move(mv);
        self.repetitions.record(&self.position);
        self.status = outcome::status(&self.position, &self.repetitions, &self.config);

        debug!(from = %mv.from, to = %mv.to, san = %san, "move played");
        if self.status.is_game_over() {
            info!(status = %self.status, plies = self.move_history.len() + 1, "game over");
        }

        self.move_history.push(MoveRecord {
            mv,
            san: san.clone(),
            status_after: self.status.clone(),
        });

        Ok(san)
    }

    /// Parse a SAN token against the current position and play it.
    pub fn play_san(&mut self, token: &str) -> Result<String, ChessError> {
        let mv = san::parse_san(&self.position, token)?;
        self.make_move(mv)
    }

    /// The placed piece must be the mover, except that a pawn reaching the
    /// last rank must become a queen, rook, bishop or knight of its colour.
    fn check_placed_piece(&self, mv: Move) -> Result<(), ChessError> {
        let Some(mover) = self.position.piece_at(mv.from) else {
            return Err(ChessError::InvalidMove {
                from: mv.from.to_algebraic(),
                to: mv.to.to_algebraic(),
                reason: "no piece on source square".into(),
            });
        };
        let ok = if legal::is_promotion(mv.from, mv.to, &self.position) {
            mv.piece.color == mover.color && PieceKind::PROMOTIONS.contains(&mv.piece.kind)
        } else {
            mv.piece == mover
        };
        if ok {
            Ok(())
        } else {
            Err(ChessError::InvalidPromotion(format!(
                "{} cannot become '{}' on {}",
                mover.symbol(),
                mv.piece.symbol(),
                mv.to
            )))
        }
    }

    // -----------------------------------------------------------------
    // Undo move
    // -----------------------------------------------------------------

    /// Undo the last move. Returns the move that was undone.
    pub fn undo_move(&mut self) -> Result<Move, ChessError> {
        let record = self.move_history.pop().ok_or(ChessError::NothingToUndo)?;
        let previous = self.snapshots.pop().ok_or_else(|| {
            ChessError::InvariantViolation("undo stack shorter than move history".into())
        })?;

        self.repetitions.unrecord(&self.position);
        self.position = previous;
        self.status = outcome::status(&self.position, &self.repetitions, &self.config);

        Ok(record.mv)
    }

    // -----------------------------------------------------------------
    // Load a new position into an existing game (reset).
    // -----------------------------------------------------------------

    /// Load a position, resetting all history.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), ChessError> {
        let pos = Position::from_fen(fen)?;
        debug!(fen, "position loaded");
        self.move_history.clear();
        self.snapshots.clear();
        self.repetitions.clear();
        self.repetitions.record(&pos);
        self.position = pos;
        self.started_from_fen = true;
        self.starting_fen = self.position.to_fen();
        self.status = outcome::status(&self.position, &self.repetitions, &self.config);
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
