//! Response conditions and their evaluation against a move.
//!
//! Documents write conditions as `{"type": "moveQuality", "value": "good"}`.
//! A condition whose value is missing or unreadable is kept as
//! [`Condition::Incomplete`] and never matches, so one bad entry silences a
//! single response instead of rejecting the whole personality.

use chess_core::geometry::{board_zone, game_phase, BoardZone, GamePhase};
use chess_core::move_event::parse_role;
use chess_core::quality::{classify_move, MoveQuality};
use chess_core::MoveEvent;
use serde::Deserialize;
use shakmaty::Role;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKind {
    MoveQuality,
    SpecialMove,
    PieceType,
    Opening,
    GamePhase,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecialMove {
    Capture,
    Check,
    Checkmate,
    Castle,
    EnPassant,
    Promotion,
    Fork,
    Pin,
    Skewer,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCondition")]
pub enum Condition {
    MoveQuality(MoveQuality),
    SpecialMove(SpecialMove),
    PieceType(Role),
    /// Case-insensitive substring of the opening name.
    Opening(String),
    GamePhase(GamePhase),
    Position(BoardZone),
    Incomplete(ConditionKind),
}

/// Wire shape of a condition before its payload is checked.
#[derive(Deserialize)]
struct RawCondition {
    #[serde(rename = "type")]
    kind: ConditionKind,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        let kind = raw.kind;
        let parsed = raw.value.and_then(|value| parse_payload(kind, value));
        parsed.unwrap_or_else(|| {
            warn!(?kind, "Condition has no usable value; it will never match");
            Condition::Incomplete(kind)
        })
    }
}

fn parse_payload(kind: ConditionKind, value: serde_json::Value) -> Option<Condition> {
    match kind {
        ConditionKind::MoveQuality => serde_json::from_value(value).ok().map(Condition::MoveQuality),
        ConditionKind::SpecialMove => serde_json::from_value(value).ok().map(Condition::SpecialMove),
        ConditionKind::PieceType => value.as_str().and_then(parse_role).map(Condition::PieceType),
        ConditionKind::Opening => value
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Condition::Opening(s.to_string())),
        ConditionKind::GamePhase => serde_json::from_value(value).ok().map(Condition::GamePhase),
        ConditionKind::Position => serde_json::from_value(value).ok().map(Condition::Position),
    }
}

/// Evaluate one condition. Total: every input yields a boolean.
pub fn matches(condition: &Condition, event: &MoveEvent) -> bool {
    match condition {
        Condition::MoveQuality(target) => {
            classify_move(event.eval_before, event.eval_after, event.color) == *target
        }
        Condition::SpecialMove(kind) => special_move_matches(*kind, event),
        Condition::PieceType(role) => event.role == *role,
        Condition::Opening(pattern) => event
            .opening
            .as_deref()
            .map(|name| name.to_lowercase().contains(&pattern.to_lowercase()))
            .unwrap_or(false),
        Condition::GamePhase(phase) => game_phase(event.half_moves) == *phase,
        Condition::Position(zone) => board_zone(event.to) == *zone,
        Condition::Incomplete(_) => false,
    }
}

/// All conditions hold. An empty list holds unconditionally.
pub fn all_match(conditions: &[Condition], event: &MoveEvent) -> bool {
    conditions.iter().all(|c| matches(c, event))
}

fn special_move_matches(kind: SpecialMove, event: &MoveEvent) -> bool {
    let flags = &event.flags;
    match kind {
        SpecialMove::Capture => flags.capture,
        // Mate has its own condition
        SpecialMove::Check => flags.check && !flags.checkmate,
        SpecialMove::Checkmate => flags.checkmate,
        SpecialMove::Castle => flags.castle,
        SpecialMove::EnPassant => flags.en_passant,
        SpecialMove::Promotion => flags.promotion.is_some(),
        // Tactical motifs need board analysis that does not exist yet
        SpecialMove::Fork | SpecialMove::Pin | SpecialMove::Skewer => false,
    }
}
