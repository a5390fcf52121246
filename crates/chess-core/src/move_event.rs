//! Per-move snapshot consumed by the personality engine.

use shakmaty::{Color, Role, Square};

/// Everything the engine may look at when a move has just been played.
///
/// Evaluations are centipawns from White's point of view, as produced by the
/// analysis collaborator. A missing evaluation is normal (book moves, engine
/// still thinking) and downgrades quality-based conditions to `neutral`.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveEvent {
    pub role: Role,
    pub color: Color,
    pub from: Option<Square>,
    pub to: Square,
    pub san: String,
    pub flags: MoveFlags,
    /// Role of the piece taken, when the move is a capture.
    pub captured: Option<Role>,
    pub eval_before: Option<i32>,
    pub eval_after: Option<i32>,
    /// Half-moves played so far, including this one.
    pub half_moves: u32,
    pub opening: Option<String>,
    /// Caller-owned identity for the moving piece. Overrides square tracking.
    pub piece_key: Option<String>,
    pub session_id: String,
}

/// Move-type flags. `promotion` carries the role the pawn became.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveFlags {
    pub capture: bool,
    pub check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
    pub castle: bool,
    pub en_passant: bool,
    pub promotion: Option<Role>,
}

impl MoveEvent {
    /// A quiet move with no evaluations or context attached.
    pub fn new(
        session_id: &str,
        color: Color,
        role: Role,
        from: Option<Square>,
        to: Square,
        san: &str,
    ) -> Self {
        Self {
            role,
            color,
            from,
            to,
            san: san.to_string(),
            flags: MoveFlags::default(),
            captured: None,
            eval_before: None,
            eval_after: None,
            half_moves: 0,
            opening: None,
            piece_key: None,
            session_id: session_id.to_string(),
        }
    }

    pub fn with_flags(mut self, flags: MoveFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_captured(mut self, captured: Option<Role>) -> Self {
        self.captured = captured;
        self
    }

    pub fn with_evals(mut self, before: Option<i32>, after: Option<i32>) -> Self {
        self.eval_before = before;
        self.eval_after = after;
        self
    }

    pub fn with_half_moves(mut self, half_moves: u32) -> Self {
        self.half_moves = half_moves;
        self
    }

    pub fn with_opening(mut self, opening: Option<&str>) -> Self {
        self.opening = opening.map(String::from);
        self
    }

    pub fn with_piece_key(mut self, key: &str) -> Self {
        self.piece_key = Some(key.to_string());
        self
    }

    pub fn is_promotion(&self) -> bool {
        self.flags.promotion.is_some()
    }
}

/// Lowercase role name as used in personality documents and entity keys.
pub fn role_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "pawn",
        Role::Knight => "knight",
        Role::Bishop => "bishop",
        Role::Rook => "rook",
        Role::Queen => "queen",
        Role::King => "king",
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// Inverse of [`role_name`], case-insensitive.
pub fn parse_role(name: &str) -> Option<Role> {
    match name.trim().to_ascii_lowercase().as_str() {
        "pawn" => Some(Role::Pawn),
        "knight" => Some(Role::Knight),
        "bishop" => Some(Role::Bishop),
        "rook" => Some(Role::Rook),
        "queen" => Some(Role::Queen),
        "king" => Some(Role::King),
        _ => None,
    }
}

pub fn parse_color(name: &str) -> Option<Color> {
    match name.trim().to_ascii_lowercase().as_str() {
        "white" | "w" => Some(Color::White),
        "black" | "b" => Some(Color::Black),
        _ => None,
    }
}

/// Parse a square like `e4`. Returns `None` for anything else.
pub fn parse_square(s: &str) -> Option<Square> {
    Square::from_ascii(s.trim().as_bytes()).ok()
}
