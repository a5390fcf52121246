//! Replay a SAN move list into `MoveEvent`s.
//!
//! Used by the replay binary and by tests that need realistic event streams.
//! Every flag is computed from the real position, so castling, en passant and
//! promotion arrive exactly as a live board would report them.

use shakmaty::san::{San, SanPlus};
use shakmaty::{Chess, Move, Position};
use thiserror::Error;

use crate::geometry::castling_king_destination;
use crate::move_event::{MoveEvent, MoveFlags};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Unparsable SAN at ply {ply}: {san}")]
    Parse { ply: usize, san: String },

    #[error("Illegal move at ply {ply}: {san}")]
    Illegal { ply: usize, san: String },

    #[error("Unsupported move at ply {ply}: {san}")]
    Unsupported { ply: usize, san: String },
}

/// Build one event from a legal move in `pos`. `pos` is left untouched;
/// the caller plays the move.
pub fn event_for_move(pos: &Chess, mv: Move, session_id: &str, half_moves: u32) -> Option<MoveEvent> {
    let from = mv.from()?;
    let san = SanPlus::from_move(pos.clone(), mv).to_string();

    let mut after = pos.clone();
    after.play_unchecked(mv);

    let to = if mv.is_castle() {
        castling_king_destination(from, mv.to())
    } else {
        mv.to()
    };

    let flags = MoveFlags {
        capture: mv.is_capture(),
        check: after.is_check(),
        checkmate: after.is_checkmate(),
        stalemate: after.is_stalemate(),
        castle: mv.is_castle(),
        en_passant: mv.is_en_passant(),
        promotion: mv.promotion(),
    };

    Some(
        MoveEvent::new(session_id, pos.turn(), mv.role(), Some(from), to, &san)
            .with_flags(flags)
            .with_captured(mv.capture())
            .with_half_moves(half_moves),
    )
}

/// Replay SAN moves from the standard starting position.
/// Stops with an error at the first move that does not parse or is illegal.
pub fn replay_san<S: AsRef<str>>(moves: &[S], session_id: &str) -> Result<Vec<MoveEvent>, ReplayError> {
    let mut pos = Chess::default();
    let mut events = Vec::with_capacity(moves.len());

    for (i, raw) in moves.iter().enumerate() {
        let raw = raw.as_ref().trim();
        let ply = i + 1;

        let san: San = raw.parse().map_err(|_| ReplayError::Parse {
            ply,
            san: raw.to_string(),
        })?;
        let mv = san.to_move(&pos).map_err(|_| ReplayError::Illegal {
            ply,
            san: raw.to_string(),
        })?;

        let event = event_for_move(&pos, mv, session_id, ply as u32).ok_or_else(|| {
            ReplayError::Unsupported {
                ply,
                san: raw.to_string(),
            }
        })?;

        pos.play_unchecked(mv);
        events.push(event);
    }

    Ok(events)
}

/// Split a move string like `"1. e4 e5 2. Nf3"` into bare SAN tokens,
/// dropping move numbers and results.
pub fn split_moves(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|tok| !tok.ends_with('.') && !matches!(*tok, "1-0" | "0-1" | "1/2-1/2" | "*"))
        .map(|tok| match tok.find('.') {
            // "1.e4" and "1...e5" style
            Some(idx) if tok[..idx].chars().all(|c| c.is_ascii_digit()) => {
                tok[idx..].trim_start_matches('.').to_string()
            }
            _ => tok.to_string(),
        })
        .filter(|tok| !tok.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{Color, Role, Square};

    #[test]
    fn test_replay_basic_flags() {
        let events = replay_san(&["e4", "d5", "exd5", "Qxd5"], "t").unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].from, Some(Square::E2));
        assert_eq!(events[0].to, Square::E4);
        assert_eq!(events[1].color, Color::Black);
        assert!(events[2].flags.capture);
        assert_eq!(events[2].captured, Some(Role::Pawn));
        assert_eq!(events[0].captured, None);
        assert_eq!(events[3].role, Role::Queen);
        assert_eq!(events[3].half_moves, 4);
    }

    #[test]
    fn test_replay_castle_uses_king_destination() {
        let events = replay_san(&["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "O-O"], "t").unwrap();
        let castle = events.last().unwrap();
        assert!(castle.flags.castle);
        assert_eq!(castle.role, Role::King);
        assert_eq!(castle.from, Some(Square::E1));
        assert_eq!(castle.to, Square::G1);
    }

    #[test]
    fn test_replay_scholars_mate() {
        let events = replay_san(&["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"], "t").unwrap();
        let mate = events.last().unwrap();
        assert!(mate.flags.checkmate);
        assert!(mate.flags.check);
        assert!(mate.flags.capture);
        assert!(mate.san.ends_with('#'));
    }

    #[test]
    fn test_replay_en_passant() {
        let events = replay_san(&["e4", "a6", "e5", "d5", "exd6"], "t").unwrap();
        let ep = events.last().unwrap();
        assert!(ep.flags.en_passant);
        assert!(ep.flags.capture);
        assert_eq!(ep.captured, Some(Role::Pawn));
        assert_eq!(ep.to, Square::D6);
    }

    #[test]
    fn test_replay_rejects_illegal() {
        let err = replay_san(&["e4", "e4"], "t").unwrap_err();
        assert!(matches!(err, ReplayError::Illegal { ply: 2, .. }));
        let err = replay_san(&["zz9"], "t").unwrap_err();
        assert!(matches!(err, ReplayError::Parse { ply: 1, .. }));
    }

    #[test]
    fn test_split_moves() {
        assert_eq!(split_moves("1. e4 e5 2.Nf3 Nc6 1-0"), vec!["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(split_moves("1.e4 1...c5"), vec!["e4", "c5"]);
    }
}
