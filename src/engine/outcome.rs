//! Game-ending conditions: check, checkmate, stalemate and the draw rules.

use std::collections::HashMap;

use crate::config::RulesConfig;
use crate::engine::attacks::get_possible_threats;
use crate::engine::board::Position;
use crate::engine::legal::has_legal_move;
use crate::engine::types::{Color, DrawReason, GameStatus, PieceKind};

/// Half-move clock at which the fifty-move rule applies.
pub const FIFTY_MOVE_PLIES: u16 = 100;

// =========================================================================
// Check, mate, stalemate
// =========================================================================

/// Is `color`'s king attacked? A side without a king is never in check.
pub fn is_check(pos: &Position, color: Color) -> bool {
    pos.king_square(color)
        .is_some_and(|king| !get_possible_threats(king, pos, color).is_empty())
}

/// `color` is in check and has no legal move.
pub fn is_checkmate(pos: &Position, color: Color) -> bool {
    is_check(pos, color) && !has_legal_move(pos, color)
}

/// The side to move is not in check and has no legal move.
pub fn is_stalemate(pos: &Position) -> bool {
    let color = pos.active_color;
    !is_check(pos, color) && !has_legal_move(pos, color)
}

// =========================================================================
// Draw rules
// =========================================================================

/// Neither side can possibly mate: bare kings, a single minor piece, or two
/// minor pieces that are split between the sides or are both knights.
pub fn is_insufficient_material(pos: &Position) -> bool {
    let info = pos.insufficient_material_info();
    if info.white_has_pawn || info.black_has_pawn {
        return false;
    }
    let minors = &info.minor_pieces;
    match info.piece_count {
        2 => true,
        3 => minors.len() == 1,
        4 => {
            minors.len() == 2
                && (minors[0].color != minors[1].color
                    || minors.iter().all(|p| p.kind == PieceKind::Knight))
        }
        _ => false,
    }
}

pub fn is_fifty_move_draw(pos: &Position) -> bool {
    pos.halfmove_clock >= FIFTY_MOVE_PLIES
}

// =========================================================================
// Repetition counter
// =========================================================================

/// Occurrence counts of positions reached during one game, keyed on
/// placement, castling rights and en-passant target.
#[derive(Clone, Debug, Default)]
pub struct RepetitionCounter {
    counts: HashMap<String, u32>,
}

impl RepetitionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `pos` and return its new count.
    pub fn record(&mut self, pos: &Position) -> u32 {
        let count = self.counts.entry(pos.repetition_key()).or_insert(0);
        *count += 1;
        *count
    }

    /// Take back one occurrence of `pos`, as when a move is undone.
    pub fn unrecord(&mut self, pos: &Position) {
        let key = pos.repetition_key();
        if let Some(count) = self.counts.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&key);
            }
        }
    }

    pub fn count(&self, pos: &Position) -> u32 {
        self.counts.get(&pos.repetition_key()).copied().unwrap_or(0)
    }

    /// Has `pos` been seen at least `limit` times?
    pub fn is_repetition(&self, pos: &Position, limit: u32) -> bool {
        self.count(pos) >= limit
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

// =========================================================================
// Status
// =========================================================================

/// Classify `pos` for the side to move.
///
/// Precedence: checkmate, stalemate, fifty-move rule, repetition,
/// insufficient material, check.
pub fn status(pos: &Position, repetitions: &RepetitionCounter, config: &RulesConfig) -> GameStatus {
    let color = pos.active_color;
    let in_check = is_check(pos, color);

    if !has_legal_move(pos, color) {
        return if in_check {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        };
    }
    if pos.halfmove_clock >= config.fifty_move_plies {
        return GameStatus::Draw(DrawReason::FiftyMoveRule);
    }
    if repetitions.is_repetition(pos, config.repetition_limit) {
        return GameStatus::Draw(DrawReason::ThreefoldRepetition);
    }
    if is_insufficient_material(pos) {
        return GameStatus::Draw(DrawReason::InsufficientMaterial);
    }
    if in_check {
        GameStatus::Check
    } else {
        GameStatus::Active
    }
}

// =========================================================================
// Tests
// =========================================================================
