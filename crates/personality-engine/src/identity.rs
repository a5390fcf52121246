//! Piece identity across a game.
//!
//! Every piece on the starting board gets an entity key derived from where it
//! started (`white-knight-g1`). The tracker follows each key square by square
//! so that "the piece now on f3" can be answered with "the g1 knight", and
//! the identity map remembers which variant each key was bound to.

use std::collections::HashMap;
use std::fmt;

use chess_core::geometry::{castling_king_destination, castling_rook_squares, en_passant_victim};
use chess_core::move_event::{color_name, role_name};
use chess_core::MoveEvent;
use shakmaty::{Board, Color, Role, Square};
use tracing::{debug, warn};

/// Stable identifier for one physical piece within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(key: &str) -> Self {
        Self(key.to_string())
    }

    /// Key of a piece on its starting square.
    pub fn starting(color: Color, role: Role, square: Square) -> Self {
        Self(format!("{}-{}-{}", color_name(color), role_name(role), square))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entity key -> bound variant name. One per session.
#[derive(Debug, Default)]
pub struct IdentityMap {
    assignments: HashMap<EntityKey, String>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &EntityKey) -> Option<&str> {
        self.assignments.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: EntityKey, variant: String) {
        self.assignments.insert(key, variant);
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn clear(&mut self) {
        self.assignments.clear();
    }
}

/// Square -> entity key of the piece standing there.
#[derive(Debug)]
pub struct IdentityTracker {
    origins: HashMap<Square, EntityKey>,
    promotions: u32,
}

impl Default for IdentityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityTracker {
    /// A tracker seeded with the standard starting position.
    pub fn new() -> Self {
        let mut tracker = Self {
            origins: HashMap::with_capacity(32),
            promotions: 0,
        };
        tracker.initialize();
        tracker
    }

    /// Forget everything and seed the 32 starting pieces.
    pub fn initialize(&mut self) {
        self.origins.clear();
        self.promotions = 0;
        for (square, piece) in &Board::default() {
            self.origins
                .insert(square, EntityKey::starting(piece.color, piece.role, square));
        }
    }

    pub fn origin_at(&self, square: Square) -> Option<&EntityKey> {
        self.origins.get(&square)
    }

    /// Number of live tracked pieces.
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Move whatever is tracked on `from` to `to`. Returns the key of a
    /// captured piece; that key is simply dropped, so any variant bound to it
    /// becomes unreachable.
    pub fn apply_move(&mut self, from: Square, to: Square, is_capture: bool) -> Option<EntityKey> {
        let mover = self.origins.remove(&from);
        let displaced = self.origins.remove(&to);

        if displaced.is_some() && !is_capture {
            warn!(%from, %to, "Quiet move onto an occupied square; dropping the old identity");
        }
        match mover {
            Some(key) => {
                self.origins.insert(to, key);
            }
            None => debug!(%from, %to, "Move from an untracked square"),
        }
        displaced
    }

    /// King move plus the matching rook move, as one step. `king_to` may be
    /// given either as the king's destination or as the rook's square.
    pub fn apply_castle(&mut self, king_from: Square, king_to: Square) {
        let king_to = castling_king_destination(king_from, king_to);
        let (rook_from, rook_to) = castling_rook_squares(king_from, king_to);

        let king = self.origins.remove(&king_from);
        let rook = self.origins.remove(&rook_from);
        if let Some(key) = king {
            self.origins.insert(king_to, key);
        }
        if let Some(key) = rook {
            self.origins.insert(rook_to, key);
        }
    }

    /// Pawn capture en passant: the victim is beside the mover, not on `to`.
    pub fn apply_en_passant(&mut self, from: Square, to: Square) -> Option<EntityKey> {
        let victim = self.origins.remove(&en_passant_victim(from, to));
        self.apply_move(from, to, true);
        victim
    }

    /// The pawn's identity ends here; the promoted piece gets a fresh key.
    pub fn apply_promotion(
        &mut self,
        from: Square,
        to: Square,
        is_capture: bool,
        color: Color,
        role: Role,
    ) -> EntityKey {
        self.apply_move(from, to, is_capture);
        self.origins.remove(&to);

        self.promotions += 1;
        let key = EntityKey(format!(
            "{}-{}-promoted-{}",
            color_name(color),
            role_name(role),
            self.promotions
        ));
        self.origins.insert(to, key.clone());
        key
    }

    /// Update the map for whatever kind of move `event` describes.
    pub fn apply_event(&mut self, event: &MoveEvent) {
        let Some(from) = event.from else {
            return;
        };
        let flags = &event.flags;

        if flags.castle {
            self.apply_castle(from, event.to);
        } else if flags.en_passant {
            self.apply_en_passant(from, event.to);
        } else if let Some(role) = flags.promotion {
            self.apply_promotion(from, event.to, flags.capture, event.color, role);
        } else {
            self.apply_move(from, event.to, flags.capture);
        }
    }
}
