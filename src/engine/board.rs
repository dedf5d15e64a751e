//! Mailbox chess position and its text codec.
//!
//! `Position` stores the 64 cells as a flat array indexed a8 = 0 .. h1 = 63,
//! plus side to move, castling rights, en-passant target and move counters.
//! It is a small fixed-size value so the legality filter can clone it for
//! every candidate move.

use std::ops::Index;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::types::{CastlingRights, ChessError, Color, Move, Piece, PieceKind, Square};

/// Text of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Largest half-move clock the codec accepts.
pub const MAX_HALFMOVE_CLOCK: u16 = 100;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete chess position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Position {
    /// Cell contents, row-major from a8.
    cells: [Option<Piece>; 64],

    /// Whose turn it is.
    pub active_color: Color,

    /// Castling availability (K/Q/k/q).
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square skipped by a double pawn push).
    pub en_passant: Option<Square>,

    /// Plies since the last pawn move or capture.
    pub halfmove_clock: u16,

    /// Incremented after every black move.
    pub fullmove_number: u32,
}

/// Summary of remaining material, consumed by the insufficient-material rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterialInfo {
    /// Every knight and bishop still on the board.
    pub minor_pieces: Vec<Piece>,
    pub white_has_pawn: bool,
    pub black_has_pawn: bool,
    /// All pieces, kings included.
    pub piece_count: usize,
}

/// Squares involved in one castling move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastleGeometry {
    pub king_from: Square,
    pub rook_from: Square,
    pub king_to: Square,
    pub rook_to: Square,
}

impl CastleGeometry {
    /// Standard home and landing squares for `color` on the given side.
    pub fn new(color: Color, kingside: bool) -> Self {
        let row: u8 = match color {
            Color::White => 7,
            Color::Black => 0,
        };
        let at = |col: u8| Square(row * 8 + col);
        if kingside {
            CastleGeometry {
                king_from: at(4),
                rook_from: at(7),
                king_to: at(6),
                rook_to: at(5),
            }
        } else {
            CastleGeometry {
                king_from: at(4),
                rook_from: at(0),
                king_to: at(2),
                rook_to: at(3),
            }
        }
    }

    /// Squares strictly between king and rook.
    pub fn between(&self) -> Vec<Square> {
        let (lo, hi) = if self.king_from < self.rook_from {
            (self.king_from.0, self.rook_from.0)
        } else {
            (self.rook_from.0, self.king_from.0)
        };
        (lo + 1..hi).map(Square).collect()
    }

    /// Squares the king stands on or crosses: its home square, each
    /// transit square and its landing square.
    pub fn king_path(&self) -> Vec<Square> {
        let (from, to) = (self.king_from.0, self.king_to.0);
        if from < to {
            (from..=to).map(Square).collect()
        } else {
            (to..=from).rev().map(Square).collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Construction helpers
// ---------------------------------------------------------------------------

impl Position {
    /// Create an empty board with no pieces.
    pub fn empty() -> Self {
        Position {
            cells: [None; 64],
            active_color: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        Self::from_fen(STARTING_FEN).expect("starting FEN is always valid")
    }

    // -----------------------------------------------------------------------
    // Indexed access
    // -----------------------------------------------------------------------

    /// What piece (if any) is on a given square?
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.index()]
    }

    /// Checked read by raw index.
    pub fn get(&self, index: i64) -> Result<Option<Piece>, ChessError> {
        Ok(self.piece_at(Square::from_index(index)?))
    }

    /// Checked write by raw index. Only real piece symbols are accepted;
    /// squares are emptied through `make_move`.
    pub fn set_piece(&mut self, index: i64, symbol: char) -> Result<(), ChessError> {
        let sq = Square::from_index(index)?;
        let piece = Piece::from_symbol(symbol).ok_or(ChessError::InvalidPieceSymbol(symbol))?;
        self.cells[sq.index()] = Some(piece);
        Ok(())
    }

    /// All 64 cells, a8 first.
    #[inline]
    pub fn cells(&self) -> &[Option<Piece>; 64] {
        &self.cells
    }

    /// Place a piece directly; used by tests and board setup code.
    #[inline]
    pub fn put_piece(&mut self, sq: Square, piece: Piece) {
        self.cells[sq.index()] = Some(piece);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Square of `color`'s king, if it has one.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(color, PieceKind::King);
        self.cells
            .iter()
            .position(|&c| c == Some(king))
            .map(|i| Square(i as u8))
    }

    /// Every square holding exactly `piece`.
    pub fn indexes_for_piece(&self, piece: Piece) -> Vec<Square> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == Some(piece))
            .map(|(i, _)| Square(i as u8))
            .collect()
    }

    /// Number of occupied squares.
    pub fn pieces_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Material summary for draw detection.
    pub fn insufficient_material_info(&self) -> MaterialInfo {
        let mut info = MaterialInfo::default();
        for piece in self.cells.iter().flatten() {
            info.piece_count += 1;
            match (piece.kind, piece.color) {
                (PieceKind::Pawn, Color::White) => info.white_has_pawn = true,
                (PieceKind::Pawn, Color::Black) => info.black_has_pawn = true,
                (kind, _) if kind.is_minor() => info.minor_pieces.push(*piece),
                _ => {}
            }
        }
        info
    }

    /// Does moving `from` -> `to` name a castle? The king moves onto its
    /// own rook, standing on the rook's home square, with the matching
    /// right still held.
    pub fn is_castle_move(&self, from: Square, to: Square) -> bool {
        let (Some(king), Some(rook)) = (self.piece_at(from), self.piece_at(to)) else {
            return false;
        };
        if king.kind != PieceKind::King || rook != Piece::new(king.color, PieceKind::Rook) {
            return false;
        }
        let kingside = to.col() > from.col();
        let geometry = CastleGeometry::new(king.color, kingside);
        geometry.king_from == from
            && geometry.rook_from == to
            && self.castling_rights.can_castle(king.color, kingside)
    }

    /// Does moving `from` -> `to` capture en passant?
    pub fn is_en_passant_move(&self, from: Square, to: Square) -> bool {
        matches!(self.piece_at(from), Some(p) if p.kind == PieceKind::Pawn)
            && self.en_passant == Some(to)
            && from.col() != to.col()
            && self.piece_at(to).is_none()
    }

    /// Key for repetition counting: placement, castling and en passant.
    pub fn repetition_key(&self) -> String {
        let ep = self
            .en_passant
            .map(|sq| sq.to_algebraic())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{} {} {}",
            self.packed_placement(),
            self.castling_rights.to_fen(),
            ep
        )
    }

    // -----------------------------------------------------------------------
    // Make move
    // -----------------------------------------------------------------------

    /// Apply a move in place.
    ///
    /// The caller is responsible for legality (`legal::is_move_valid`);
    /// an illegal move leaves an unspecified position behind.
    pub fn make_move(&mut self, mv: Move) {
        let Move { from, to, piece } = mv;
        let mover = self.piece_at(from).unwrap_or(piece);
        let mut captured = false;

        if self.is_en_passant_move(from, to) {
            // The captured pawn sits beside the mover, not on the target.
            if let Some(victim) = Square::from_row_col(from.row(), to.col()) {
                self.cells[victim.index()] = None;
            }
            self.cells[to.index()] = Some(piece);
            self.cells[from.index()] = None;
            captured = true;
        } else if self.is_castle_move(from, to) {
            let geometry = CastleGeometry::new(mover.color, to.col() > from.col());
            let rook = self.cells[geometry.rook_from.index()];
            self.cells[geometry.king_from.index()] = None;
            self.cells[geometry.rook_from.index()] = None;
            self.cells[geometry.king_to.index()] = Some(mover);
            self.cells[geometry.rook_to.index()] = rook;
        } else {
            captured = self.cells[to.index()].is_some();
            self.cells[to.index()] = Some(piece);
            self.cells[from.index()] = None;
        }

        // ---- Castling rights ----
        self.castling_rights.0 &= CASTLING_MASK[from.index()];
        self.castling_rights.0 &= CASTLING_MASK[to.index()];

        // ---- En passant target ----
        self.en_passant = if mover.kind == PieceKind::Pawn && (to.row() - from.row()).abs() == 2 {
            Square::from_row_col((from.row() + to.row()) / 2, from.col())
        } else {
            None
        };

        // ---- Halfmove clock ----
        if mover.kind == PieceKind::Pawn || captured {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = (self.halfmove_clock + 1).min(MAX_HALFMOVE_CLOCK);
        }

        // ---- Fullmove number ----
        if self.active_color == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.active_color = !self.active_color;
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top), useful for debugging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for row in 0..8u8 {
            s.push((b'8' - row) as char);
            s.push(' ');
            for col in 0..8u8 {
                let ch = match self.cells[(row * 8 + col) as usize] {
                    Some(p) => p.symbol(),
                    None => '.',
                };
                s.push(ch);
                if col < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl Index<Square> for Position {
    type Output = Option<Piece>;

    fn index(&self, sq: Square) -> &Self::Output {
        &self.cells[sq.index()]
    }
}

/// Mask table indexed by square. When a move touches a square, AND the
/// castling rights with this mask: a king home square drops both of that
/// colour's rights, a rook home square drops the matching one.
#[rustfmt::skip]
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0b1111u8; 64];
    // a8
    mask[0]  = 0b1111 & !CastlingRights::BLACK_QUEENSIDE;
    // e8
    mask[4]  = 0b1111 & !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE);
    // h8
    mask[7]  = 0b1111 & !CastlingRights::BLACK_KINGSIDE;
    // a1
    mask[56] = 0b1111 & !CastlingRights::WHITE_QUEENSIDE;
    // e1
    mask[60] = 0b1111 & !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE);
    // h1
    mask[63] = 0b1111 & !CastlingRights::WHITE_KINGSIDE;
    mask
};

// ---------------------------------------------------------------------------
// Position text parsing & generation
// ---------------------------------------------------------------------------

impl Position {
    /// Expand and validate the piece-placement field into 64 cells.
    pub fn expand_placement(placement: &str) -> Result<[Option<Piece>; 64], ChessError> {
        let groups: Vec<&str> = placement.split('/').collect();
        if groups.len() != 8 {
            return Err(ChessError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                groups.len()
            )));
        }

        let mut cells = [None; 64];
        for (row, group) in groups.iter().enumerate() {
            let rank = 8 - row;
            let mut col = 0usize;
            for ch in group.chars() {
                if let Some(run) = ch.to_digit(10) {
                    if !(1..=8).contains(&run) {
                        return Err(ChessError::InvalidFen(format!(
                            "invalid empty count '{ch}' in rank {rank}"
                        )));
                    }
                    col += run as usize;
                } else if let Some(piece) = Piece::from_symbol(ch) {
                    if col < 8 {
                        cells[row * 8 + col] = Some(piece);
                    }
                    col += 1;
                } else {
                    return Err(ChessError::InvalidFen(format!(
                        "invalid character '{ch}' in piece placement"
                    )));
                }
                if col > 8 {
                    return Err(ChessError::InvalidFen(format!(
                        "too many squares in rank {rank}"
                    )));
                }
            }
            if col != 8 {
                return Err(ChessError::InvalidFen(format!(
                    "rank {rank} has {col} squares instead of 8"
                )));
            }
        }
        Ok(cells)
    }

    /// Pack the cells back into the piece-placement field.
    pub fn packed_placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for row in 0..8 {
            let mut empty_count = 0u8;
            for col in 0..8 {
                match self.cells[row * 8 + col] {
                    Some(piece) => {
                        if empty_count > 0 {
                            out.push((b'0' + empty_count) as char);
                            empty_count = 0;
                        }
                        out.push(piece.symbol());
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                out.push((b'0' + empty_count) as char);
            }
            if row < 7 {
                out.push('/');
            }
        }
        out
    }

    /// Decode position text into a `Position`.
    ///
    /// Validates all 6 fields. King counts are not checked: any
    /// syntactically valid placement is accepted.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        // ----- Field 1: Piece placement -----
        let cells = Self::expand_placement(fields[0])?;

        // ----- Field 2: Side to move -----
        let active_color = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::InvalidFen(format!(
                    "invalid side to move: '{other}'"
                )));
            }
        };

        // ----- Field 3: Castling availability -----
        let castling_rights = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
            ChessError::InvalidFen(format!("invalid castling string: '{}'", fields[2]))
        })?;

        // ----- Field 4: En passant target square -----
        let en_passant = if fields[3] == "-" {
            None
        } else {
            let ep_sq = Square::from_algebraic(fields[3]).map_err(|_| {
                ChessError::InvalidFen(format!("invalid en passant square: '{}'", fields[3]))
            })?;
            if ep_sq.rank() != 3 && ep_sq.rank() != 6 {
                return Err(ChessError::InvalidFen(format!(
                    "en passant square {} is not on rank 3 or 6",
                    fields[3]
                )));
            }
            Some(ep_sq)
        };

        // ----- Field 5: Halfmove clock -----
        let halfmove_clock = fields[4]
            .parse::<u16>()
            .ok()
            .filter(|&n| n <= MAX_HALFMOVE_CLOCK)
            .ok_or_else(|| {
                ChessError::InvalidFen(format!("invalid halfmove clock: '{}'", fields[4]))
            })?;

        // ----- Field 6: Fullmove number -----
        let fullmove_number = fields[5].parse::<u32>().map_err(|_| {
            ChessError::InvalidFen(format!("invalid fullmove number: '{}'", fields[5]))
        })?;

        Ok(Position {
            cells,
            active_color,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    /// Encode the position as text.
    pub fn to_fen(&self) -> String {
        let ep = match self.en_passant {
            Some(sq) => sq.to_algebraic(),
            None => "-".to_string(),
        };
        format!(
            "{} {} {} {} {} {}",
            self.packed_placement(),
            self.active_color.to_char(),
            self.castling_rights.to_fen(),
            ep,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

impl FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

impl From<Position> for String {
    fn from(pos: Position) -> Self {
        pos.to_fen()
    }
}

impl TryFrom<String> for Position {
    type Error = ChessError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Position::from_fen(&s)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
