pub mod attacks;
pub mod board;
pub mod game;
pub mod legal;
pub mod movegen;
pub mod outcome;
pub mod pgn;
pub mod san;
pub mod types;

pub use attacks::{get_possible_threats, is_square_attacked};
pub use board::{CastleGeometry, MaterialInfo, Position, STARTING_FEN};
pub use game::{Game, MoveRecord};
pub use legal::{get_available_moves, is_king_safe, is_move_valid, is_take, legal_moves};
pub use outcome::{
    RepetitionCounter, is_check, is_checkmate, is_fifty_move_draw, is_insufficient_material,
    is_stalemate,
};
pub use pgn::{PgnGame, parse_pgn, to_pgn};
pub use san::{move_to_san, parse_san};
pub use types::*;
