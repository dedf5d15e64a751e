//! Standard Algebraic Notation (SAN) generation and parsing, plus the
//! coordinate form (`e2e4`, `e7e8q`) used by transports.
//!
//! SAN examples: `e4`, `Nf3`, `Bxe5`, `O-O`, `e8=Q+`, `Raxd1#`.

use crate::engine::board::{CastleGeometry, Position};
use crate::engine::legal;
use crate::engine::outcome;
use crate::engine::types::{ChessError, Color, Move, Piece, PieceKind, Square};

// =========================================================================
// SAN generation
// =========================================================================

/// Convert a legal move to SAN, including the `+`/`#` suffix.
///
/// `legal_moves` should be the full list of legal moves in the position
/// (passed in to avoid redundant generation).
pub fn move_to_san(pos: &Position, mv: Move, legal_moves: &[Move]) -> String {
    let mut san = san_body(pos, mv, legal_moves);

    let mut after = pos.clone();
    after.make_move(mv);
    let defender = after.active_color;
    if outcome::is_checkmate(&after, defender) {
        san.push('#');
    } else if outcome::is_check(&after, defender) {
        san.push('+');
    }
    san
}

fn san_body(pos: &Position, mv: Move, legal_moves: &[Move]) -> String {
    if pos.is_castle_move(mv.from, mv.to) {
        return if mv.to.col() > mv.from.col() {
            "O-O".into()
        } else {
            "O-O-O".into()
        };
    }

    let mover = pos.piece_at(mv.from).unwrap_or(mv.piece);
    let capture = legal::is_take(mv.from, mv.to, pos);
    let mut san = String::with_capacity(8);

    if mover.kind == PieceKind::Pawn {
        if capture {
            // Prefix with departure file on captures: "exd5".
            san.push(mv.from.file_char());
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());

        if mv.piece.kind != PieceKind::Pawn {
            san.push('=');
            san.push(piece_letter(mv.piece.kind));
        }
    } else {
        san.push(piece_letter(mover.kind));
        if mover.kind != PieceKind::King {
            san.push_str(&disambiguation(pos, mv, mover, legal_moves));
        }
        if capture {
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());
    }

    san
}

/// File, rank or both of the origin when another piece of the same kind can
/// reach the same destination.
fn disambiguation(pos: &Position, mv: Move, mover: Piece, legal_moves: &[Move]) -> String {
    let rivals: Vec<&Move> = legal_moves
        .iter()
        .filter(|m| m.to == mv.to && m.from != mv.from && pos.piece_at(m.from) == Some(mover))
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let same_file = rivals.iter().any(|m| m.from.col() == mv.from.col());
    let same_rank = rivals.iter().any(|m| m.from.row() == mv.from.row());
    let file = mv.from.file_char();
    let rank = (b'0' + mv.from.rank()) as char;

    match (same_file, same_rank) {
        (false, _) => file.to_string(),
        (true, false) => rank.to_string(),
        (true, true) => format!("{file}{rank}"),
    }
}

fn piece_letter(kind: PieceKind) -> char {
    kind.to_char(Color::White)
}

// =========================================================================
// SAN parsing
// =========================================================================

/// Parse a SAN token and return the matching legal move.
///
/// Check, mate and annotation suffixes (`+ # ! ?`) are ignored. Both `O-O`
/// and `0-0` spellings are accepted; the promotion `=` is optional.
pub fn parse_san(pos: &Position, san: &str) -> Result<Move, ChessError> {
    let legal = legal::legal_moves(pos);
    let token = san.trim().trim_end_matches(['+', '#', '!', '?']);

    match token {
        "O-O" | "0-0" => return find_castling(pos, &legal, true, san),
        "O-O-O" | "0-0-0" => return find_castling(pos, &legal, false, san),
        _ => {}
    }

    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 2 {
        return Err(ChessError::InvalidSan(san.to_string()));
    }

    // Promotion suffix, with or without '='.
    let (chars, promotion) = match chars.as_slice() {
        [rest @ .., '=', p] => (rest, Some(promotion_kind(*p, san)?)),
        [rest @ .., d, p] if d.is_ascii_digit() && "QRBN".contains(*p) => {
            let len = rest.len() + 1;
            (&chars[..len], Some(promotion_kind(*p, san)?))
        }
        _ => (chars.as_slice(), None),
    };

    let (kind, rest) = match chars.first() {
        Some(&c) if "NBRQK".contains(c) => {
            let (_, kind) =
                PieceKind::from_char(c).ok_or_else(|| ChessError::InvalidSan(san.to_string()))?;
            (kind, &chars[1..])
        }
        _ => (PieceKind::Pawn, chars),
    };

    let rest: Vec<char> = rest.iter().copied().filter(|&c| c != 'x').collect();
    if rest.len() < 2 {
        return Err(ChessError::InvalidSan(san.to_string()));
    }

    let dest_str: String = rest[rest.len() - 2..].iter().collect();
    let dest = Square::from_algebraic(&dest_str)?;

    let disambig = &rest[..rest.len() - 2];
    let disambig_col = disambig
        .iter()
        .find(|c| ('a'..='h').contains(*c))
        .map(|&c| (c as u8 - b'a') as i8);
    let disambig_rank = disambig
        .iter()
        .find(|c| ('1'..='8').contains(*c))
        .map(|&c| c as u8 - b'0');
    let recognised = usize::from(disambig_col.is_some()) + usize::from(disambig_rank.is_some());
    if disambig.len() != recognised {
        return Err(ChessError::InvalidSan(san.to_string()));
    }

    let candidates: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            let Some(mover) = pos.piece_at(m.from) else {
                return false;
            };
            mover.kind == kind
                && m.to == dest
                && !pos.is_castle_move(m.from, m.to)
                && disambig_col.is_none_or(|c| m.from.col() == c)
                && disambig_rank.is_none_or(|r| m.from.rank() == r)
                && m.piece.kind == promotion.unwrap_or(kind)
        })
        .collect();

    match candidates.as_slice() {
        [mv] => Ok(**mv),
        [] => Err(ChessError::InvalidMove {
            from: String::new(),
            to: dest.to_algebraic(),
            reason: format!("no legal move matches SAN '{san}'"),
        }),
        many => Err(ChessError::InvalidMove {
            from: String::new(),
            to: dest.to_algebraic(),
            reason: format!("ambiguous SAN '{san}': {} candidates", many.len()),
        }),
    }
}

fn promotion_kind(c: char, san: &str) -> Result<PieceKind, ChessError> {
    match PieceKind::from_char(c) {
        Some((_, kind)) if PieceKind::PROMOTIONS.contains(&kind) => Ok(kind),
        _ => Err(ChessError::InvalidPromotion(format!("'{c}' in '{san}'"))),
    }
}

/// Castling tokens name the king moving onto its own rook's square.
fn find_castling(
    pos: &Position,
    legal: &[Move],
    kingside: bool,
    san: &str,
) -> Result<Move, ChessError> {
    let geometry = CastleGeometry::new(pos.active_color, kingside);
    legal
        .iter()
        .find(|m| {
            m.from == geometry.king_from
                && m.to == geometry.rook_from
                && pos.is_castle_move(m.from, m.to)
        })
        .copied()
        .ok_or_else(|| ChessError::InvalidMove {
            from: geometry.king_from.to_algebraic(),
            to: geometry.rook_from.to_algebraic(),
            reason: format!("'{san}' is not legal here"),
        })
}

// =========================================================================
// Coordinate notation
// =========================================================================

impl Move {
    /// Build a move from coordinate text such as `e2e4` or `e7e8q`, using the
    /// piece standing on the source square. A promotion letter takes the
    /// mover's colour whatever its case.
    ///
    /// Only the shape is checked here; legality is `legal::is_move_valid`.
    pub fn from_coordinates(pos: &Position, text: &str) -> Result<Move, ChessError> {
        let text = text.trim();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(ChessError::InvalidSquare(text.to_string()));
        }
        let from = Square::from_algebraic(&text[0..2])?;
        let to = Square::from_algebraic(&text[2..4])?;
        let mover = pos.piece_at(from).ok_or_else(|| ChessError::InvalidMove {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
            reason: "no piece on source square".into(),
        })?;

        let piece = match text[4..].chars().next() {
            None => mover,
            Some(c) => Piece::new(mover.color, promotion_kind(c, text)?),
        };
        Ok(Move::new(from, to, piece))
    }

    /// Coordinate text, with a lowercase promotion letter when the placed
    /// piece differs from the mover.
    pub fn to_coordinates(&self, pos: &Position) -> String {
        match pos.piece_at(self.from) {
            Some(mover) if mover != self.piece => {
                format!("{self}{}", self.piece.kind.to_char(Color::Black))
            }
            _ => self.to_string(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
