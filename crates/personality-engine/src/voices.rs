//! Speech voices per theme and piece, for the synthesized-speech fallback
//! and for rendering clips offline.
//!
//! Lookup order: the role's voice in the theme, the theme's default voice,
//! the role's voice in the default theme, then the narrator.

use shakmaty::Role;

use crate::variant::Theme;

/// Voice used when nothing more specific applies, and for board-wide clips.
pub const NARRATOR_VOICE: &str = "en-US-AriaNeural";

fn default_theme_voice(role: Role) -> &'static str {
    match role {
        Role::King => "en-GB-RyanNeural",
        Role::Queen => "en-GB-SoniaNeural",
        Role::Rook => "en-US-ChristopherNeural",
        Role::Bishop => "en-GB-ThomasNeural",
        Role::Knight => "en-US-GuyNeural",
        Role::Pawn => "en-US-AnaNeural",
    }
}

fn themed_voice(theme: Theme, role: Option<Role>) -> Option<&'static str> {
    let voice = match (theme, role) {
        (Theme::Italian, Some(Role::Queen)) => "it-IT-ElsaNeural",
        (Theme::Italian, _) => "it-IT-DiegoNeural",
        (Theme::French, Some(Role::Queen)) => "fr-FR-DeniseNeural",
        (Theme::French, _) => "fr-FR-HenriNeural",
        (Theme::Sicilian, Some(Role::Bishop)) => "it-IT-DiegoNeural",
        (Theme::Sicilian, _) => "it-IT-IsabellaNeural",
        (Theme::Royal, Some(Role::Bishop)) => "en-IE-ConnorNeural",
        (Theme::Royal, _) => "en-GB-RyanNeural",
        _ => return None,
    };
    Some(voice)
}

/// Voice for a piece of the given theme. `role` is `None` for the narrator.
pub fn voice_for(theme: Theme, role: Option<Role>) -> &'static str {
    themed_voice(theme, role)
        .or_else(|| role.map(default_theme_voice))
        .unwrap_or(NARRATOR_VOICE)
}
