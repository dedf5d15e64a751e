//! Threat detection by walking outward from the target square.
//!
//! Instead of generating every enemy move, the scan starts at the square in
//! question: a knight jump from the square can only land on a knight that
//! attacks it, and every other attacker must be the first piece met along
//! one of the eight queen rays. Each piece found on a ray is asked whether
//! its own movement reaches back to the square.

use crate::engine::board::Position;
use crate::engine::movegen::{knight_moves, pseudo_legal_moves, queen_moves};
use crate::engine::types::{Color, Piece, PieceKind, Square};

// =========================================================================
// Public API
// =========================================================================

/// Squares of the pieces hostile to `color` that attack `square`.
///
/// `color` is the side the square is being defended for, normally the
/// colour of the king standing on it. The square itself may be empty, which
/// is how castling transit squares are probed.
pub fn get_possible_threats(square: Square, pos: &Position, color: Color) -> Vec<Square> {
    let mut threats = Vec::new();

    // Knight attacks are symmetric: jump from the target as a knight would.
    for from in knight_moves(square, pos, Some(color)) {
        if pos.piece_at(from) == Some(Piece::new(!color, PieceKind::Knight)) {
            threats.push(from);
        }
    }

    // Everything else is the first piece on some queen ray.
    for from in queen_moves(square, pos, Some(color)) {
        let Some(piece) = pos.piece_at(from) else {
            continue;
        };
        if piece.color == color || piece.kind == PieceKind::Knight {
            continue;
        }
        if attacks_square(from, piece, square, pos) {
            threats.push(from);
        }
    }

    threats
}

/// Is `square` attacked by any piece of colour `by`?
pub fn is_square_attacked(square: Square, pos: &Position, by: Color) -> bool {
    !get_possible_threats(square, pos, !by).is_empty()
}

/// Does the `piece` on `from` attack `target`?
///
/// Pawns and kings are answered from geometry: a pawn push is not an
/// attack, and a king's castling candidates are not either.
fn attacks_square(from: Square, piece: Piece, target: Square, pos: &Position) -> bool {
    match piece.kind {
        PieceKind::Pawn => {
            (target.col() - from.col()).abs() == 1
                && target.row() - from.row() == piece.color.forward()
        }
        PieceKind::King => {
            let (d_row, d_col) = (target.row() - from.row(), target.col() - from.col());
            d_row.abs() <= 1 && d_col.abs() <= 1 && (d_row, d_col) != (0, 0)
        }
        _ => pseudo_legal_moves(from, pos, Some(piece.color)).contains(&target),
    }
}

// =========================================================================
// Tests
// =========================================================================
