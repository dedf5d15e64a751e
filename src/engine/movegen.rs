//! Pseudo-legal movement rules.
//!
//! One function per piece kind, all with the same signature: the square the
//! piece stands on, the position, and an optional colour to move as. They
//! return destination squares that obey the piece's movement shape without
//! asking whether the mover's king ends up attacked; `legal` filters that.
//!
//! Castling appears here as a king move onto its own rook's square.

use crate::engine::board::{CastleGeometry, Position};
use crate::engine::types::{Color, Piece, PieceKind, Square};

/// Signature shared by all movement rules.
pub type MoveRule = fn(Square, &Position, Option<Color>) -> Vec<Square>;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, -1),
    (2, 1),
    (1, -2),
    (1, 2),
    (-1, -2),
    (-1, 2),
    (-2, -1),
    (-2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const ORTHOGONAL: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

// =========================================================================
// Public API
// =========================================================================

/// The movement rule for a piece kind.
pub fn rule_for(kind: PieceKind) -> MoveRule {
    match kind {
        PieceKind::Pawn => pawn_moves,
        PieceKind::Knight => knight_moves,
        PieceKind::Bishop => bishop_moves,
        PieceKind::Rook => rook_moves,
        PieceKind::Queen => queen_moves,
        PieceKind::King => king_moves,
    }
}

/// Pseudo-legal destinations of whatever stands on `sq`; empty for an
/// empty square.
pub fn pseudo_legal_moves(sq: Square, pos: &Position, turn: Option<Color>) -> Vec<Square> {
    match pos.piece_at(sq) {
        Some(piece) => rule_for(piece.kind)(sq, pos, turn),
        None => Vec::new(),
    }
}

/// Colour the rules move as: the forced colour, else the piece's own colour,
/// else the side to move.
fn mover_color(sq: Square, pos: &Position, turn: Option<Color>) -> Color {
    turn.or_else(|| pos.piece_at(sq).map(|p| p.color))
        .unwrap_or(pos.active_color)
}

#[inline]
fn is_enemy(pos: &Position, sq: Square, us: Color) -> bool {
    matches!(pos.piece_at(sq), Some(p) if p.color != us)
}

#[inline]
fn is_empty_or_enemy(pos: &Position, sq: Square, us: Color) -> bool {
    match pos.piece_at(sq) {
        None => true,
        Some(p) => p.color != us,
    }
}

// =========================================================================
// Pawn
// =========================================================================

/// Pushes, double pushes from the home row, diagonal captures and en passant.
pub fn pawn_moves(sq: Square, pos: &Position, turn: Option<Color>) -> Vec<Square> {
    let us = mover_color(sq, pos, turn);
    let forward = us.forward();
    let (home_row, en_passant_row) = match us {
        Color::White => (6, 3),
        Color::Black => (1, 4),
    };
    let mut moves = Vec::with_capacity(4);

    // --- Single and double push ---
    if let Some(one) = sq.offset(forward, 0)
        && pos.piece_at(one).is_none()
    {
        moves.push(one);
        if sq.row() == home_row
            && let Some(two) = sq.offset(2 * forward, 0)
            && pos.piece_at(two).is_none()
        {
            moves.push(two);
        }
    }

    // --- Captures ---
    for d_col in [-1, 1] {
        if let Some(target) = sq.offset(forward, d_col)
            && is_enemy(pos, target, us)
        {
            moves.push(target);
        }
    }

    // --- En passant ---
    if let Some(ep) = pos.en_passant
        && sq.row() == en_passant_row
        && (ep.col() - sq.col()).abs() == 1
        && ep.row() == sq.row() + forward
        && pos.piece_at(ep).is_none()
    {
        moves.push(ep);
    }

    moves
}

// =========================================================================
// Knight
// =========================================================================

/// The eight L-shaped jumps, mirrored for black so "up" faces the opponent.
pub fn knight_moves(sq: Square, pos: &Position, turn: Option<Color>) -> Vec<Square> {
    let us = mover_color(sq, pos, turn);
    let forward = us.forward();
    KNIGHT_OFFSETS
        .iter()
        .filter_map(|&(d_row, d_col)| sq.offset(d_row * -forward, d_col))
        .filter(|&to| is_empty_or_enemy(pos, to, us))
        .collect()
}

// =========================================================================
// Sliders (bishop, rook, queen)
// =========================================================================

/// Walk each ray until the board edge or the first occupied square, which is
/// included only when it holds an enemy piece.
fn slide(sq: Square, pos: &Position, us: Color, directions: &[(i8, i8)]) -> Vec<Square> {
    let mut moves = Vec::with_capacity(14);
    for &(d_row, d_col) in directions {
        let mut current = sq;
        for _ in 0..7 {
            let Some(next) = current.offset(d_row, d_col) else {
                break;
            };
            match pos.piece_at(next) {
                None => moves.push(next),
                Some(p) => {
                    if p.color != us {
                        moves.push(next);
                    }
                    break;
                }
            }
            current = next;
        }
    }
    moves
}

pub fn rook_moves(sq: Square, pos: &Position, turn: Option<Color>) -> Vec<Square> {
    slide(sq, pos, mover_color(sq, pos, turn), &ORTHOGONAL)
}

pub fn bishop_moves(sq: Square, pos: &Position, turn: Option<Color>) -> Vec<Square> {
    slide(sq, pos, mover_color(sq, pos, turn), &DIAGONAL)
}

pub fn queen_moves(sq: Square, pos: &Position, turn: Option<Color>) -> Vec<Square> {
    let us = mover_color(sq, pos, turn);
    let mut moves = slide(sq, pos, us, &ORTHOGONAL);
    moves.extend(slide(sq, pos, us, &DIAGONAL));
    moves
}

// =========================================================================
// King
// =========================================================================

/// Adjacent squares plus castling candidates. A castle is offered as the
/// rook's square when the right is held, the rook is home and the squares
/// between are empty; attacked squares are `legal`'s concern.
pub fn king_moves(sq: Square, pos: &Position, turn: Option<Color>) -> Vec<Square> {
    let us = mover_color(sq, pos, turn);
    let mut moves: Vec<Square> = KING_OFFSETS
        .iter()
        .filter_map(|&(d_row, d_col)| sq.offset(d_row, d_col))
        .filter(|&to| is_empty_or_enemy(pos, to, us))
        .collect();

    for kingside in [true, false] {
        if !pos.castling_rights.can_castle(us, kingside) {
            continue;
        }
        let geometry = CastleGeometry::new(us, kingside);
        if geometry.king_from == sq
            && pos.piece_at(geometry.rook_from) == Some(Piece::new(us, PieceKind::Rook))
            && geometry
                .between()
                .into_iter()
                .all(|between| pos.piece_at(between).is_none())
        {
            moves.push(geometry.rook_from);
        }
    }

    moves
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn names(squares: Vec<Square>) -> Vec<String> {
        let mut out: Vec<String> = squares.into_iter().map(|s| s.to_algebraic()).collect();
        out.sort();
        out
    }

    // -------------------------------------------------------------------
    // Open board counts
    // -------------------------------------------------------------------

    #[test_case('N', 8; "knight")]
    #[test_case('R', 14; "rook")]
    #[test_case('B', 13; "bishop")]
    #[test_case('Q', 27; "queen")]
    #[test_case('K', 8; "king")]
    fn center_of_open_board(symbol: char, expected: usize) {
        let mut p = Position::empty();
        p.set_piece(36, symbol).unwrap();
        if symbol != 'K' {
            p.put_piece(sq("a1"), Piece::new(Color::White, PieceKind::King));
        }
        p.put_piece(sq("h8"), Piece::new(Color::Black, PieceKind::King));
        assert_eq!(pseudo_legal_moves(Square(36), &p, None).len(), expected);
    }

    #[test]
    fn empty_square_has_no_moves() {
        let p = Position::starting();
        assert!(pseudo_legal_moves(sq("e4"), &p, None).is_empty());
    }

    // -------------------------------------------------------------------
    // Pawn
    // -------------------------------------------------------------------

    #[test]
    fn pawn_single_and_double_push() {
        let p = Position::starting();
        assert_eq!(names(pawn_moves(sq("e2"), &p, None)), ["e3", "e4"]);
        assert_eq!(names(pawn_moves(sq("d7"), &p, None)), ["d5", "d6"]);
    }

    #[test]
    fn pawn_double_push_needs_both_squares_empty() {
        let p = pos("4k3/8/8/8/4p3/8/4P3/4K3 w - - 0 1");
        assert_eq!(names(pawn_moves(sq("e2"), &p, None)), ["e3"]);
        let blocked = pos("4k3/8/8/8/8/4p3/4P3/4K3 w - - 0 1");
        assert!(pawn_moves(sq("e2"), &blocked, None).is_empty());
    }

    #[test]
    fn pawn_no_double_push_off_home_row() {
        let p = pos("4k3/8/8/8/8/4P3/8/4K3 w - - 0 1");
        assert_eq!(names(pawn_moves(sq("e3"), &p, None)), ["e4"]);
    }

    #[test]
    fn pawn_captures_only_enemies() {
        let p = pos("4k3/8/8/8/8/3p1N2/4P3/4K3 w - - 0 1");
        assert_eq!(names(pawn_moves(sq("e2"), &p, None)), ["d3", "e3", "e4"]);
    }

    #[test]
    fn pawn_edge_capture_does_not_wrap() {
        let p = pos("4k3/8/8/8/8/1p5p/P7/4K3 w - - 0 1");
        assert_eq!(names(pawn_moves(sq("a2"), &p, None)), ["a3", "a4", "b3"]);
    }

    #[test]
    fn pawn_en_passant_target() {
        let p = pos("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        assert_eq!(names(pawn_moves(sq("e5"), &p, None)), ["e6", "f6"]);
    }

    #[test]
    fn pawn_en_passant_needs_adjacent_file() {
        let p = pos("4k3/8/8/P2pP3/8/8/8/4K3 w - d6 0 1");
        assert_eq!(names(pawn_moves(sq("a5"), &p, None)), ["a6"]);
        assert_eq!(names(pawn_moves(sq("e5"), &p, None)), ["d6", "e6"]);
    }

    #[test]
    fn black_pawn_en_passant() {
        let p = pos("4k3/8/8/8/3Pp3/8/8/4K3 b - d3 0 1");
        assert_eq!(names(pawn_moves(sq("e4"), &p, None)), ["d3", "e3"]);
    }

    // -------------------------------------------------------------------
    // Knight
    // -------------------------------------------------------------------

    #[test]
    fn knight_in_corner() {
        let p = pos("4k3/8/8/8/8/8/8/N3K3 w - - 0 1");
        assert_eq!(names(knight_moves(sq("a1"), &p, None)), ["b3", "c2"]);
    }

    #[test]
    fn knight_does_not_wrap_files() {
        let p = pos("4k3/8/8/8/7N/8/8/4K3 w - - 0 1");
        assert_eq!(
            names(knight_moves(sq("h4"), &p, None)),
            ["f3", "f5", "g2", "g6"]
        );
    }

    #[test]
    fn knight_offsets_mirror_for_black() {
        let p = pos("4k3/8/8/3n4/8/8/8/4K3 b - - 0 1");
        let black = names(knight_moves(sq("d5"), &p, None));
        let as_white = names(knight_moves(sq("d5"), &p, Some(Color::White)));
        assert_eq!(black, as_white);
        assert_eq!(black.len(), 8);
    }

    #[test]
    fn knight_skips_friendly_squares() {
        let p = Position::starting();
        assert_eq!(names(knight_moves(sq("g1"), &p, None)), ["f3", "h3"]);
    }

    // -------------------------------------------------------------------
    // Sliders
    // -------------------------------------------------------------------

    #[test]
    fn rook_stops_at_blockers() {
        let p = pos("k7/8/8/8/1p2R1P1/8/8/4K3 w - - 0 1");
        assert_eq!(
            names(rook_moves(sq("e4"), &p, None)),
            ["b4", "c4", "d4", "e2", "e3", "e5", "e6", "e7", "e8", "f4"]
        );
    }

    #[test]
    fn bishop_captures_first_enemy_on_ray() {
        let p = pos("4k3/6p1/8/8/3B4/8/8/4K3 w - - 0 1");
        let moves = names(bishop_moves(sq("d4"), &p, None));
        assert!(moves.contains(&"g7".to_string()));
        assert!(!moves.contains(&"h8".to_string()));
    }

    #[test]
    fn queen_is_rook_plus_bishop() {
        let p = Position::from_fen("4k3/8/8/8/3Q4/8/8/4K3 w - - 0 1").unwrap();
        let mut both = rook_moves(sq("d4"), &p, None);
        both.extend(bishop_moves(sq("d4"), &p, None));
        assert_eq!(names(queen_moves(sq("d4"), &p, None)), names(both));
    }

    #[test]
    fn starting_sliders_are_boxed_in() {
        let p = Position::starting();
        for name in ["a1", "c1", "d1", "f1", "h1", "a8", "c8", "d8"] {
            assert!(
                pseudo_legal_moves(sq(name), &p, None).is_empty(),
                "{name} should have no moves"
            );
        }
    }

    // -------------------------------------------------------------------
    // King and castling candidates
    // -------------------------------------------------------------------

    #[test]
    fn king_offers_castles_as_rook_squares() {
        let p = pos("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(
            names(king_moves(sq("e1"), &p, None)),
            ["a1", "d1", "d2", "e2", "f1", "f2", "h1"]
        );
        assert_eq!(
            names(king_moves(sq("e8"), &p, None)),
            ["a8", "d7", "d8", "e7", "f7", "f8", "h8"]
        );
    }

    #[test]
    fn castle_candidate_needs_right_rook_and_empty_path() {
        let no_rights = pos("r3k2r/8/8/8/8/8/8/R3K2R w kq - 0 1");
        assert_eq!(king_moves(sq("e1"), &no_rights, None).len(), 5);

        let blocked = pos("r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1");
        assert_eq!(
            names(king_moves(sq("e1"), &blocked, None)),
            ["d1", "d2", "e2", "f1", "f2"]
        );

        let rook_gone = pos("r3k2r/8/8/8/8/8/8/4K2R w KQkq - 0 1");
        assert!(!king_moves(sq("e1"), &rook_gone, None).contains(&sq("a1")));
        assert!(king_moves(sq("e1"), &rook_gone, None).contains(&sq("h1")));
    }

    #[test]
    fn castle_candidate_ignores_attacks() {
        // f1 is attacked, but that is for the legality filter to reject.
        let p = pos("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let moves = king_moves(sq("e1"), &p, None);
        assert!(moves.contains(&sq("h1")));
        assert!(moves.contains(&sq("a1")));
    }

    #[test]
    fn rule_table_dispatches_by_kind() {
        let p = Position::starting();
        assert_eq!(rule_for(PieceKind::Knight)(sq("b1"), &p, None).len(), 2);
        assert_eq!(rule_for(PieceKind::Pawn)(sq("b2"), &p, None).len(), 2);
    }
}
