//! PGN (Portable Game Notation) export and import.
//!
//! Export produces the Seven Tag Roster and numbered move text. Import reads
//! tag pairs and replays the move text, skipping comments (including clock
//! annotations), variations, NAGs, move numbers and the result token.

use tracing::{debug, trace};

use crate::engine::board::Position;
use crate::engine::game::Game;
use crate::engine::legal;
use crate::engine::san;
use crate::engine::types::{ChessError, Color, GameStatus, Move};

const LINE_WIDTH: usize = 80;
const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

// =========================================================================
// PGN generation
// =========================================================================

/// Export a game as a PGN string.
pub fn to_pgn(game: &Game) -> String {
    let mut pgn = String::with_capacity(512);

    // Seven Tag Roster.
    let date = game.created_at.format("%Y.%m.%d").to_string();
    let result = result_string(game.status(), game.side_to_move());

    pgn.push_str("[Event \"Casual Game\"]\n");
    pgn.push_str("[Site \"chess-rules\"]\n");
    pgn.push_str(&format!("[Date \"{date}\"]\n"));
    pgn.push_str("[Round \"-\"]\n");
    pgn.push_str(&format!("[White \"{}\"]\n", escape(&game.white_player)));
    pgn.push_str(&format!("[Black \"{}\"]\n", escape(&game.black_player)));
    pgn.push_str(&format!("[Result \"{result}\"]\n"));

    // If started from a custom position, add SetUp and FEN tags.
    if game.started_from_fen() {
        pgn.push_str("[SetUp \"1\"]\n");
        pgn.push_str(&format!("[FEN \"{}\"]\n", game.starting_fen()));
    }

    pgn.push('\n');

    // The starting position tells us who moved first and from which number.
    let start = Position::from_fen(game.starting_fen()).unwrap_or_default();
    let mut move_num = start.fullmove_number.max(1);
    let mut white_turn = start.active_color == Color::White;

    let mut tokens = Vec::with_capacity(game.move_history().len() * 3 / 2 + 1);
    for (i, record) in game.move_history().iter().enumerate() {
        if white_turn {
            tokens.push(format!("{move_num}. {}", record.san));
        } else if i == 0 {
            // First move by black: use "N... move" notation.
            tokens.push(format!("{move_num}... {}", record.san));
        } else {
            tokens.push(record.san.clone());
        }
        if !white_turn {
            move_num += 1;
        }
        white_turn = !white_turn;
    }
    tokens.push(result.to_string());

    // Line wrapping at 80 columns.
    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() && line.len() + 1 + token.len() > LINE_WIDTH {
            pgn.push_str(&line);
            pgn.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&token);
    }
    pgn.push_str(&line);
    pgn.push('\n');

    pgn
}

/// PGN result token. On checkmate the side to move is the loser.
fn result_string(status: &GameStatus, side_to_move: Color) -> &'static str {
    match status {
        GameStatus::Checkmate => match side_to_move {
            Color::White => "0-1",
            Color::Black => "1-0",
        },
        GameStatus::Stalemate | GameStatus::Draw(_) => "1/2-1/2",
        GameStatus::Active | GameStatus::Check => "*",
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

// =========================================================================
// PGN parsing
// =========================================================================

/// A game read from PGN text.
#[derive(Clone, Debug)]
pub struct PgnGame {
    /// Tag pairs in file order.
    pub tags: Vec<(String, String)>,
    /// Position the move text starts from (the `FEN` tag, if any).
    pub starting_position: Position,
    /// Moves in the order played.
    pub moves: Vec<Move>,
    /// SAN of each move as regenerated from the replay.
    pub san: Vec<String>,
    pub final_position: Position,
    /// Result token from the move text, else from the `Result` tag.
    pub result: Option<String>,
}

impl PgnGame {
    /// Value of the first tag named `name`.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replay the moves into a `Game` carrying the player tags.
    pub fn to_game(&self) -> Result<Game, ChessError> {
        let mut game = match self.tag("FEN") {
            Some(_) => Game::from_fen(&self.starting_position.to_fen())?,
            None => Game::new(),
        };
        if let Some(white) = self.tag("White") {
            game.white_player = white.to_string();
        }
        if let Some(black) = self.tag("Black") {
            game.black_player = black.to_string();
        }
        for &mv in &self.moves {
            game.make_move(mv)?;
        }
        Ok(game)
    }
}

/// Parse a single PGN game.
pub fn parse_pgn(text: &str) -> Result<PgnGame, ChessError> {
    let mut tags = Vec::new();
    let mut movetext = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('%') {
            // Escape line.
            continue;
        }
        if trimmed.starts_with('[') && movetext.trim().is_empty() {
            tags.push(parse_tag(trimmed)?);
        } else {
            movetext.push_str(line);
            movetext.push('\n');
        }
    }

    let starting_position = match tags.iter().find(|(key, _)| key == "FEN") {
        Some((_, fen)) => {
            debug!(fen = %fen, "starting from FEN tag");
            Position::from_fen(fen)?
        }
        None => Position::starting(),
    };

    let mut position = starting_position.clone();
    let mut moves = Vec::new();
    let mut sans = Vec::new();
    let mut result = None;

    for token in tokenize(&movetext)? {
        if RESULT_TOKENS.contains(&token.as_str()) {
            trace!(token = %token, "result token");
            result = Some(token);
            continue;
        }
        if token.starts_with('$') {
            trace!(token = %token, "skipping NAG");
            continue;
        }
        let token = strip_move_number(&token);
        if token.is_empty() {
            continue;
        }

        let mv = san::parse_san(&position, token).map_err(|e| {
            ChessError::InvalidPgn(format!("move {} '{token}': {e}", moves.len() + 1))
        })?;
        let legal = legal::legal_moves(&position);
        sans.push(san::move_to_san(&position, mv, &legal));
        position.make_move(mv);
        moves.push(mv);
    }

    if result.is_none() {
        result = tags
            .iter()
            .find(|(key, _)| key == "Result")
            .map(|(_, value)| value.clone());
    }

    Ok(PgnGame {
        tags,
        starting_position,
        moves,
        san: sans,
        final_position: position,
        result,
    })
}

/// `[Name "Value"]` with backslash escapes in the value.
fn parse_tag(line: &str) -> Result<(String, String), ChessError> {
    let inner = line
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| ChessError::InvalidPgn(format!("malformed tag: {line}")))?;
    let (name, rest) = inner
        .split_once(char::is_whitespace)
        .ok_or_else(|| ChessError::InvalidPgn(format!("tag without value: {line}")))?;
    let quoted = rest
        .trim()
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| ChessError::InvalidPgn(format!("unquoted tag value: {line}")))?;

    let mut value = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(escaped);
            }
        } else {
            value.push(c);
        }
    }
    Ok((name.to_string(), value))
}

/// Split move text into tokens, dropping `{...}` and `;` comments and
/// `(...)` variations.
fn tokenize(movetext: &str) -> Result<Vec<String>, ChessError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = movetext.chars();

    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        if !current.is_empty() {
            tokens.push(std::mem::take(current));
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                flush(&mut current, &mut tokens);
                let mut comment = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    comment.push(c);
                }
                if !closed {
                    return Err(ChessError::InvalidPgn("unterminated comment".into()));
                }
                trace!(comment = %comment.trim(), "skipping comment");
            }
            ';' => {
                flush(&mut current, &mut tokens);
                let comment: String = chars.by_ref().take_while(|&c| c != '\n').collect();
                trace!(comment = %comment.trim(), "skipping comment");
            }
            '(' => {
                flush(&mut current, &mut tokens);
                let mut depth = 1;
                for c in chars.by_ref() {
                    match c {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                if depth != 0 {
                    return Err(ChessError::InvalidPgn("unterminated variation".into()));
                }
                trace!("skipping variation");
            }
            ')' | '}' => {
                return Err(ChessError::InvalidPgn(format!("unbalanced '{c}'")));
            }
            c if c.is_whitespace() => flush(&mut current, &mut tokens),
            c => current.push(c),
        }
    }
    flush(&mut current, &mut tokens);
    Ok(tokens)
}

/// `12.e4` -> `e4`, `12...` -> ``, `Nf3` -> `Nf3`.
fn strip_move_number(token: &str) -> &str {
    let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < token.len() && rest.starts_with('.') {
        rest.trim_start_matches('.')
    } else {
        token
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::engine::types::Square;

    fn play(g: &mut Game, coordinates: &str) {
        let mv = Move::from_coordinates(g.position(), coordinates).unwrap();
        g.make_move(mv).unwrap();
    }

    // -------------------------------------------------------------------
    // Export
    // -------------------------------------------------------------------

    #[test]
    fn pgn_empty_game() {
        let g = Game::new();
        let pgn = to_pgn(&g);
        assert!(pgn.contains("[Event \"Casual Game\"]"));
        assert!(pgn.contains("[Result \"*\"]"));
        assert!(pgn.ends_with("\n*\n"));
        assert!(!pgn.contains("[SetUp"));
    }

    #[test]
    fn pgn_with_moves() {
        let mut g = Game::new();
        play(&mut g, "e2e4");
        play(&mut g, "e7e5");
        play(&mut g, "g1f3");
        let pgn = to_pgn(&g);
        assert!(pgn.contains("1. e4 e5 2. Nf3 *"));
    }

    #[test]
    fn pgn_scholars_mate() {
        let mut g = Game::new();
        for token in ["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7"] {
            g.play_san(token).unwrap();
        }
        assert_eq!(*g.status(), GameStatus::Checkmate);

        let pgn = to_pgn(&g);
        assert!(pgn.contains("[Result \"1-0\"]"));
        assert!(pgn.contains("4. Qxf7# 1-0\n"));
    }

    #[test]
    fn pgn_black_wins() {
        let mut g = Game::new();
        for token in ["f3", "e5", "g4", "Qh4"] {
            g.play_san(token).unwrap();
        }
        let pgn = to_pgn(&g);
        assert!(pgn.contains("[Result \"0-1\"]"));
        assert!(pgn.contains("2. g4 Qh4# 0-1"));
    }

    #[test]
    fn pgn_from_fen_has_setup_tag() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let mut g = Game::from_fen(fen).unwrap();
        play(&mut g, "e7e5");
        let pgn = to_pgn(&g);
        assert!(pgn.contains("[SetUp \"1\"]"));
        assert!(pgn.contains(&format!("[FEN \"{fen}\"]")));
        assert!(pgn.contains("1... e5 *"));
    }

    #[test]
    fn pgn_stalemate_result() {
        let g = Game::from_fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1").unwrap();
        let pgn = to_pgn(&g);
        assert!(pgn.contains("[Result \"1/2-1/2\"]"));
    }

    #[test]
    fn pgn_wraps_long_move_text() {
        let mut g = Game::with_config(RulesConfig {
            fifty_move_plies: 100,
            repetition_limit: 10,
        });
        for _ in 0..6 {
            for mv in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                play(&mut g, mv);
            }
        }
        let pgn = to_pgn(&g);
        let movetext = pgn.split("\n\n").nth(1).unwrap();
        assert!(movetext.lines().count() > 1);
        assert!(movetext.lines().all(|l| l.len() <= LINE_WIDTH));
    }

    #[test]
    fn pgn_escapes_player_names() {
        let mut g = Game::new();
        g.white_player = "A \"Quoted\" Name".into();
        let pgn = to_pgn(&g);
        assert!(pgn.contains(r#"[White "A \"Quoted\" Name"]"#));
        let parsed = parse_pgn(&pgn).unwrap();
        assert_eq!(parsed.tag("White"), Some("A \"Quoted\" Name"));
    }

    // -------------------------------------------------------------------
    // Import
    // -------------------------------------------------------------------

    #[test]
    fn parse_simple_game() {
        let text = "[Event \"Test\"]\n[Result \"*\"]\n\n1. e4 e5 2. Nf3 Nc6 *\n";
        let game = parse_pgn(text).unwrap();
        assert_eq!(game.tag("Event"), Some("Test"));
        assert_eq!(game.moves.len(), 4);
        assert_eq!(game.san, ["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(game.result.as_deref(), Some("*"));
        assert_eq!(
            game.final_position.to_fen(),
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3"
        );
    }

    #[test]
    fn parse_skips_comments_variations_and_nags() {
        let text = "1. e4 {[%clk 0:03:00]} 1... e5 $1 (1... c5 2. Nf3 (2. c3)) \
                    2.Nf3 ; a rest-of-line comment\n2... Nc6 1-0";
        let game = parse_pgn(text).unwrap();
        assert_eq!(game.san, ["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(game.result.as_deref(), Some("1-0"));
    }

    #[test]
    fn parse_castling_uses_rook_square() {
        let text = "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O *";
        let game = parse_pgn(text).unwrap();
        let castle = game.moves.last().unwrap();
        assert_eq!(castle.to, Square::from_algebraic("h1").unwrap());
        assert_eq!(
            game.final_position.king_square(Color::White),
            Square::from_algebraic("g1").ok()
        );
    }

    #[test]
    fn parse_with_fen_tag() {
        let text = "[SetUp \"1\"]\n[FEN \"7k/4P3/8/8/8/8/8/4K3 w - - 0 1\"]\n\n1. e8=Q+ *";
        let game = parse_pgn(text).unwrap();
        assert_eq!(game.san, ["e8=Q+"]);
        assert_eq!(game.final_position.to_fen(), "4Q2k/8/8/8/8/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn parse_result_from_tag_when_movetext_has_none() {
        let game = parse_pgn("[Result \"1/2-1/2\"]\n\n1. d4 d5").unwrap();
        assert_eq!(game.result.as_deref(), Some("1/2-1/2"));
    }

    #[test]
    fn parse_rejects_illegal_move() {
        let err = parse_pgn("1. e4 e5 2. Ke3 *").unwrap_err();
        assert!(matches!(err, ChessError::InvalidPgn(_)));
        assert!(err.to_string().contains("move 3"));
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(parse_pgn("[Event Test]\n1. e4").is_err());
        assert!(parse_pgn("1. e4 (1. d4").is_err());
        assert!(parse_pgn("1. e4 }").is_err());
        assert!(matches!(
            parse_pgn("1. e4 {never closed e5 2. Nf3"),
            Err(ChessError::InvalidPgn(_))
        ));
    }

    #[test]
    fn export_then_import_replays_game() {
        let mut g = Game::new();
        for token in ["d4", "d5", "c4", "dxc4", "e4", "b5", "a4", "c6", "axb5", "cxb5"] {
            g.play_san(token).unwrap();
        }
        g.white_player = "Alice".into();
        let parsed = parse_pgn(&to_pgn(&g)).unwrap();
        let replayed = parsed.to_game().unwrap();
        assert_eq!(replayed.to_fen(), g.to_fen());
        assert_eq!(replayed.white_player, "Alice");
        assert_eq!(parsed.san.len(), 10);
    }

    #[test]
    fn strip_move_numbers() {
        assert_eq!(strip_move_number("12.e4"), "e4");
        assert_eq!(strip_move_number("12..."), "");
        assert_eq!(strip_move_number("Nf3"), "Nf3");
        assert_eq!(strip_move_number("1-0"), "1-0");
    }
}
