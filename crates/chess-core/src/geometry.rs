//! Board geometry helpers: game phase, square zones and the squares touched
//! by the two-piece moves (castling, en passant).

use serde::{Deserialize, Serialize};
use shakmaty::{File, Rank, Square};

/// Half-move count at which the opening ends.
const MIDDLEGAME_FROM: u32 = 20;
/// Half-move count at which the endgame starts.
const ENDGAME_FROM: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Opening,
    Middlegame,
    Endgame,
}

/// Coarse region of the board a piece landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoardZone {
    BackRank,
    Center,
    Edge,
    PromotionAdjacent,
}

pub fn game_phase(half_moves: u32) -> GamePhase {
    if half_moves < MIDDLEGAME_FROM {
        GamePhase::Opening
    } else if half_moves < ENDGAME_FROM {
        GamePhase::Middlegame
    } else {
        GamePhase::Endgame
    }
}

/// Zone of a square. Squares can satisfy several predicates; the first in
/// the order back rank, center, edge, promotion-adjacent wins, and anything
/// left over counts as center.
pub fn board_zone(sq: Square) -> BoardZone {
    let file = u32::from(sq.file());
    let rank = u32::from(sq.rank());

    if rank == 0 || rank == 7 {
        BoardZone::BackRank
    } else if (3..=4).contains(&file) && (3..=4).contains(&rank) {
        BoardZone::Center
    } else if file == 0 || file == 7 {
        BoardZone::Edge
    } else if rank == 1 || rank == 6 {
        BoardZone::PromotionAdjacent
    } else {
        BoardZone::Center
    }
}

/// Rook origin and destination for a castling king move given as the king's
/// own origin and destination squares.
pub fn castling_rook_squares(king_from: Square, king_to: Square) -> (Square, Square) {
    let rank = king_from.rank();
    if u32::from(king_to.file()) > u32::from(king_from.file()) {
        (
            Square::from_coords(File::H, rank),
            Square::from_coords(File::F, rank),
        )
    } else {
        (
            Square::from_coords(File::A, rank),
            Square::from_coords(File::D, rank),
        )
    }
}

/// Where the pawn taken en passant actually stood.
pub fn en_passant_victim(from: Square, to: Square) -> Square {
    Square::from_coords(to.file(), from.rank())
}

/// Normalise a castling move to the king's two-file destination. Some move
/// sources encode castling as "king takes own rook".
pub fn castling_king_destination(king_from: Square, target: Square) -> Square {
    let rank: Rank = king_from.rank();
    if u32::from(target.file()) > u32::from(king_from.file()) {
        Square::from_coords(File::G, rank)
    } else {
        Square::from_coords(File::C, rank)
    }
}
