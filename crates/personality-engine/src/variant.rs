//! Themed variants and their permanent binding to tracked pieces.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use crate::identity::{EntityKey, IdentityMap};
use crate::personality::{Responder, Variant};

/// Token meaning "no variant, use the responder's base responses".
pub const DEFAULT_VARIANT: &str = "default";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Royal,
    Aggressive,
    Italian,
    Spanish,
    French,
    Sicilian,
    Scholar,
    Defensive,
    Strategic,
    Tactical,
    #[default]
    Default,
}

impl Theme {
    pub fn name(&self) -> &'static str {
        match self {
            Theme::Royal => "royal",
            Theme::Aggressive => "aggressive",
            Theme::Italian => "italian",
            Theme::Spanish => "spanish",
            Theme::French => "french",
            Theme::Sicilian => "sicilian",
            Theme::Scholar => "scholar",
            Theme::Defensive => "defensive",
            Theme::Strategic => "strategic",
            Theme::Tactical => "tactical",
            Theme::Default => "default",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opening keyword -> theme. Matched as lowercase substrings; the longest
/// matching keyword is the most specific and wins.
const OPENING_THEMES: &[(&str, Theme)] = &[
    ("italian", Theme::Italian),
    ("giuoco piano", Theme::Italian),
    ("evans gambit", Theme::Aggressive),
    ("fried liver", Theme::Aggressive),
    ("king's gambit", Theme::Aggressive),
    ("danish gambit", Theme::Aggressive),
    ("ruy lopez", Theme::Spanish),
    ("spanish", Theme::Spanish),
    ("french", Theme::French),
    ("sicilian", Theme::Sicilian),
    ("najdorf", Theme::Sicilian),
    ("scholar", Theme::Scholar),
    ("queen's gambit", Theme::Royal),
    ("king's indian", Theme::Royal),
    ("queen's indian", Theme::Royal),
    ("caro-kann", Theme::Defensive),
    ("petrov", Theme::Defensive),
    ("petroff", Theme::Defensive),
    ("philidor", Theme::Defensive),
    ("pirc", Theme::Defensive),
    ("english", Theme::Strategic),
    ("reti", Theme::Strategic),
    ("réti", Theme::Strategic),
    ("london", Theme::Strategic),
    ("catalan", Theme::Strategic),
    ("scotch", Theme::Tactical),
    ("vienna", Theme::Tactical),
    ("two knights", Theme::Tactical),
];

/// Theme suggested by an opening name; `Default` when nothing matches.
pub fn theme_for_opening(opening: Option<&str>) -> Theme {
    let Some(opening) = opening else {
        return Theme::Default;
    };
    let lower = opening.to_lowercase();
    OPENING_THEMES
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .max_by_key(|(keyword, _)| keyword.chars().count())
        .map(|(_, theme)| *theme)
        .unwrap_or(Theme::Default)
}

/// Variant for `key`, binding one on first sight.
///
/// Once a piece has a variant it keeps it for the session, whatever the
/// opening or responder looks like on later moves. Non-contextual
/// personalities always draw from `default`-themed variants.
pub fn assign_variant<R: Rng + ?Sized>(
    identities: &mut IdentityMap,
    key: &EntityKey,
    opening: Option<&str>,
    contextual: bool,
    responder: &Responder,
    rng: &mut R,
) -> String {
    if let Some(existing) = identities.get(key) {
        return existing.to_string();
    }

    let theme = if contextual {
        theme_for_opening(opening)
    } else {
        Theme::Default
    };

    let themed: Vec<&Variant> = responder.variants.iter().filter(|v| v.theme == theme).collect();
    let pool = if themed.is_empty() {
        responder
            .variants
            .iter()
            .filter(|v| v.theme == Theme::Default)
            .collect()
    } else {
        themed
    };

    let chosen = pool
        .choose(rng)
        .map(|v| v.name.clone())
        .unwrap_or_else(|| DEFAULT_VARIANT.to_string());

    debug!(entity = %key, %theme, variant = %chosen, "Bound variant");
    identities.insert(key.clone(), chosen.clone());
    chosen
}
