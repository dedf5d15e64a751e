//! Legal move filtering.
//!
//! Every pseudo-legal candidate is tried on a throwaway clone of the
//! position and kept only if the mover's king is not attacked afterwards.
//! Castling additionally requires the king's home, transit and landing
//! squares to be unattacked.

use tracing::error;

use crate::engine::attacks::get_possible_threats;
use crate::engine::board::{CastleGeometry, Position};
use crate::engine::movegen::pseudo_legal_moves;
use crate::engine::types::{Color, Move, Piece, PieceKind, Square};

// =========================================================================
// Public API
// =========================================================================

/// Legal destinations for the piece on `sq`.
///
/// Castles are reported as the rook's square. Returns an empty list for an
/// empty square.
///
/// # Panics
///
/// In debug builds, if the side to move could capture the enemy king. Such
/// a position is never reached through legal play; release builds log the
/// breach and drop the candidate.
pub fn get_available_moves(sq: Square, pos: &Position) -> Vec<Square> {
    let Some(piece) = pos.piece_at(sq) else {
        return Vec::new();
    };
    let enemy_king = pos.king_square(!piece.color);

    pseudo_legal_moves(sq, pos, None)
        .into_iter()
        .filter(|&to| {
            if piece.color == pos.active_color && Some(to) == enemy_king {
                error!(
                    from = %sq,
                    to = %to,
                    "side to move can capture the enemy king"
                );
                if cfg!(debug_assertions) {
                    panic!("enemy king capturable from {sq} to {to}");
                }
                return false;
            }
            if piece.kind == PieceKind::King && pos.is_castle_move(sq, to) {
                castle_is_safe(sq, to, pos)
            } else {
                is_king_safe(sq, to, pos)
            }
        })
        .collect()
}

/// Would the mover's king be safe after playing `from` -> `to`?
///
/// A position without a king for the mover is always safe.
pub fn is_king_safe(from: Square, to: Square, pos: &Position) -> bool {
    let Some(mover) = pos.piece_at(from) else {
        return true;
    };
    let mut copy = pos.clone();
    copy.make_move(Move::new(from, to, mover));
    match copy.king_square(mover.color) {
        Some(king) => get_possible_threats(king, &copy, mover.color).is_empty(),
        None => true,
    }
}

/// Full move check for the side to move.
pub fn is_move_valid(from: Square, to: Square, pos: &Position) -> bool {
    let Some(piece) = pos.piece_at(from) else {
        return false;
    };
    if piece.color != pos.active_color {
        return false;
    }
    if !pos.is_castle_move(from, to)
        && matches!(pos.piece_at(to), Some(target) if target.color == piece.color)
    {
        return false;
    }
    get_available_moves(from, pos).contains(&to)
}

/// Does `from` -> `to` capture? A castle lands on a friendly rook and is
/// never a take; en passant lands on an empty square and always is.
pub fn is_take(from: Square, to: Square, pos: &Position) -> bool {
    if pos.is_castle_move(from, to) {
        return false;
    }
    pos.piece_at(to).is_some() || pos.is_en_passant_move(from, to)
}

/// Does a pawn moving to `to` reach its last rank?
pub fn is_promotion(from: Square, to: Square, pos: &Position) -> bool {
    match pos.piece_at(from) {
        Some(Piece {
            kind: PieceKind::Pawn,
            color: Color::White,
        }) => to.row() == 0,
        Some(Piece {
            kind: PieceKind::Pawn,
            color: Color::Black,
        }) => to.row() == 7,
        _ => false,
    }
}

/// Does `color` have at least one legal move?
pub fn has_legal_move(pos: &Position, color: Color) -> bool {
    pieces_of(pos, color).any(|sq| !get_available_moves(sq, pos).is_empty())
}

/// Every legal move for the side to move, with promotions expanded into
/// one move per promotion piece.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut moves = Vec::with_capacity(48);
    for from in pieces_of(pos, pos.active_color) {
        let Some(piece) = pos.piece_at(from) else {
            continue;
        };
        for to in get_available_moves(from, pos) {
            if is_promotion(from, to, pos) {
                for kind in PieceKind::PROMOTIONS {
                    moves.push(Move::new(from, to, Piece::new(piece.color, kind)));
                }
            } else {
                moves.push(Move::new(from, to, piece));
            }
        }
    }
    moves
}

// =========================================================================
// Internals
// =========================================================================

fn pieces_of(pos: &Position, color: Color) -> impl Iterator<Item = Square> + '_ {
    pos.cells()
        .iter()
        .enumerate()
        .filter(move |(_, cell)| matches!(cell, Some(p) if p.color == color))
        .map(|(i, _)| Square(i as u8))
}

/// The king may not castle out of, through, or into check. Each square of
/// its path is probed with a plain king step so attacks on empty squares
/// count, then the full castle is simulated.
fn castle_is_safe(king_from: Square, rook_sq: Square, pos: &Position) -> bool {
    let Some(king) = pos.piece_at(king_from) else {
        return false;
    };
    if !get_possible_threats(king_from, pos, king.color).is_empty() {
        return false;
    }
    let geometry = CastleGeometry::new(king.color, rook_sq.col() > king_from.col());
    geometry
        .king_path()
        .into_iter()
        .filter(|&step| step != king_from)
        .all(|step| is_king_safe(king_from, step, pos))
        && is_king_safe(king_from, rook_sq, pos)
}

// =========================================================================
// Tests
// =========================================================================
