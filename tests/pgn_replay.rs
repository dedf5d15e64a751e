//! Replays recorded games from PGN text and checks the engine agrees with
//! every move, including regenerated SAN and the final status.

use chess_rules::engine::pgn::{parse_pgn, to_pgn};
use chess_rules::engine::types::{Color, GameStatus, Piece, PieceKind, Square};
use chess_rules::engine::{Game, is_checkmate};

/// Paris 1858, the "Opera game", with clock annotations as exported by
/// online servers.
const OPERA_GAME: &str = r#"[Event "Paris"]
[Site "Paris FRA"]
[Date "1858.??.??"]
[Round "?"]
[White "Paul Morphy"]
[Black "Duke Karl / Count Isouard"]
[Result "1-0"]

1. e4 { [%clk 0:10:00] } 1... e5 { [%clk 0:10:00] } 2. Nf3 { [%clk 0:09:58] }
2... d6 { [%clk 0:09:55] } 3. d4 Bg4 4. dxe5 Bxf3 5. Qxf3 dxe5 6. Bc4 Nf6
7. Qb3 Qe7 8. Nc3 c6 9. Bg5 b5 10. Nxb5 cxb5 11. Bxb5+ Nbd7 12. O-O-O Rd8
13. Rxd7 Rxd7 14. Rd1 Qe6 15. Bxd7+ Nxd7 16. Qb8+ Nxb8 17. Rd8# 1-0
"#;

fn movetext_tokens(text: &str) -> Vec<String> {
    let body = text.split("\n\n").nth(1).unwrap();
    let mut tokens = Vec::new();
    let mut in_comment = false;
    for word in body.split_whitespace() {
        if word.starts_with('{') {
            in_comment = true;
        }
        if in_comment {
            in_comment = !word.ends_with('}');
            continue;
        }
        let word = word.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
        if !word.is_empty() && word != "1-0" {
            tokens.push(word.to_string());
        }
    }
    tokens
}

#[test]
fn opera_game_replays_to_checkmate() {
    let game = parse_pgn(OPERA_GAME).unwrap();

    assert_eq!(game.moves.len(), 33);
    assert_eq!(game.result.as_deref(), Some("1-0"));
    assert_eq!(game.tag("White"), Some("Paul Morphy"));
    assert_eq!(game.san, movetext_tokens(OPERA_GAME));
    assert_eq!(game.final_position.active_color, Color::Black);
    assert!(is_checkmate(&game.final_position, Color::Black));
}

#[test]
fn opera_game_castles_queenside_through_rook_square() {
    let game = parse_pgn(OPERA_GAME).unwrap();
    let castle = game.moves[22];
    assert_eq!(castle.from, Square::from_algebraic("e1").unwrap());
    assert_eq!(castle.to, Square::from_algebraic("a1").unwrap());
}

#[test]
fn opera_game_through_game_controller() {
    let game = parse_pgn(OPERA_GAME).unwrap().to_game().unwrap();
    assert_eq!(*game.status(), GameStatus::Checkmate);
    assert_eq!(game.black_player, "Duke Karl / Count Isouard");
    let last = game.move_history().last().unwrap();
    assert_eq!(last.san, "Rd8#");
    assert_eq!(last.status_after, GameStatus::Checkmate);

    let exported = to_pgn(&game);
    assert!(exported.contains("[Result \"1-0\"]"));
    assert!(exported.contains("17. Rd8#"));
    assert!(exported.ends_with("1-0\n"));
}

#[test]
fn en_passant_and_promotion_line() {
    let text = "1. e4 Nf6 2. e5 d5 3. exd6 Nc6 4. dxc7 e5 5. cxd8=Q+ Kxd8 *";
    let game = parse_pgn(text).unwrap();
    assert_eq!(
        game.san,
        ["e4", "Nf6", "e5", "d5", "exd6", "Nc6", "dxc7", "e5", "cxd8=Q+", "Kxd8"]
    );
    let d5 = Square::from_algebraic("d5").unwrap();
    let d8 = Square::from_algebraic("d8").unwrap();
    assert_eq!(game.final_position.piece_at(d5), None);
    assert_eq!(
        game.final_position.piece_at(d8),
        Some(Piece::new(Color::Black, PieceKind::King))
    );
    assert_eq!(game.final_position.castling_rights.to_fen(), "KQ");
}

#[test]
fn replayed_game_round_trips_through_export() {
    let mut game = Game::new();
    for token in ["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3", "a6"] {
        game.play_san(token).unwrap();
    }
    let reparsed = parse_pgn(&to_pgn(&game)).unwrap();
    assert_eq!(reparsed.final_position, *game.position());
    assert_eq!(reparsed.result.as_deref(), Some("*"));
}
