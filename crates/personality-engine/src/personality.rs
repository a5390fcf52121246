//! Personality documents: which piece says what, when.
//!
//! A personality lives in a directory holding either one unified
//! `personality.json` or a pair of color-specific documents
//! (`personality.white.json` + `personality.black.json`). When both layouts
//! are present the color-specific pair wins. Recorded clips sit next to the
//! documents under `audio/<asset key>.mp3`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use chess_core::move_event::{color_name, parse_color, parse_role, role_name};
use regex::Regex;
use serde::{de, Deserialize, Deserializer};
use shakmaty::{Color, Role};
use tracing::{debug, info};

use crate::condition::Condition;
use crate::error::PersonalityError;
use crate::variant::Theme;

pub const UNIFIED_FILE: &str = "personality.json";
pub const WHITE_FILE: &str = "personality.white.json";
pub const BLACK_FILE: &str = "personality.black.json";

/// Global clip names the engine knows how to trigger.
pub const CLIP_BRILLIANT: &str = "brilliant";
pub const CLIP_BLUNDER: &str = "blunder";
pub const CLIP_CHECKMATE: &str = "checkmate";
pub const CLIP_STALEMATE: &str = "stalemate";

/// Asset keys are used verbatim as file names.
static ASSET_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("asset key pattern is valid"));

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Lets the opening being played pick themed variants.
    #[serde(default)]
    pub contextual: bool,
    #[serde(default)]
    pub pieces: Vec<Responder>,
    #[serde(default)]
    pub global_clips: HashMap<String, GlobalClip>,
    /// Directory name the clips are published under.
    #[serde(skip)]
    pub namespace: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Responder {
    #[serde(deserialize_with = "de_role")]
    pub role: Role,
    #[serde(default, deserialize_with = "de_color")]
    pub color: Option<Color>,
    #[serde(default)]
    pub responses: Vec<Response>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Also the audio asset key.
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub responses: Vec<Response>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalClip {
    pub id: String,
    pub text: String,
}

impl Response {
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

impl Responder {
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }
}

impl Personality {
    /// Parse and validate a single document.
    pub fn from_json_str(json: &str) -> Result<Self, PersonalityError> {
        let mut personality: Personality = serde_json::from_str(json)?;
        if personality.namespace.is_empty() {
            personality.namespace = slug(&personality.name);
        }
        personality.validate()?;
        Ok(personality)
    }

    pub fn load_file(path: &Path) -> Result<Self, PersonalityError> {
        let json = fs::read_to_string(path).map_err(|source| PersonalityError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Load a personality directory, preferring the color-specific pair.
    pub fn load_dir(dir: &Path) -> Result<Self, PersonalityError> {
        let white = dir.join(WHITE_FILE);
        let black = dir.join(BLACK_FILE);
        let unified = dir.join(UNIFIED_FILE);

        let mut personality = if white.is_file() && black.is_file() {
            debug!(dir = %dir.display(), "Loading color-specific personality documents");
            Self::merge_colors(Self::load_file(&white)?, Self::load_file(&black)?)
        } else if unified.is_file() {
            Self::load_file(&unified)?
        } else {
            return Err(PersonalityError::NotFound(dir.to_path_buf()));
        };

        if let Some(dir_name) = dir.file_name().and_then(|n| n.to_str()) {
            personality.namespace = dir_name.to_string();
        }

        info!(
            name = %personality.name,
            namespace = %personality.namespace,
            responders = personality.pieces.len(),
            "Loaded personality"
        );
        Ok(personality)
    }

    /// Combine a White and a Black document into one. Responders without a
    /// color are bound to the side whose document they came from.
    pub fn merge_colors(mut white: Personality, black: Personality) -> Personality {
        for responder in white.pieces.iter_mut() {
            responder.color.get_or_insert(Color::White);
        }
        let black_pieces = black.pieces.into_iter().map(|mut r| {
            r.color.get_or_insert(Color::Black);
            r
        });
        white.pieces.extend(black_pieces);
        white.contextual |= black.contextual;
        for (name, clip) in black.global_clips {
            white.global_clips.entry(name).or_insert(clip);
        }
        white
    }

    pub fn validate(&self) -> Result<(), PersonalityError> {
        for responder in &self.pieces {
            let mut seen = HashSet::new();
            for variant in &responder.variants {
                if !seen.insert(variant.name.as_str()) {
                    return Err(PersonalityError::DuplicateVariant {
                        role: role_name(responder.role).to_string(),
                        variant: variant.name.clone(),
                    });
                }
            }

            let all_responses = responder
                .responses
                .iter()
                .chain(responder.variants.iter().flat_map(|v| v.responses.iter()));
            for response in all_responses {
                check_asset_key(&response.id)?;
                let weight = response.weight();
                if !weight.is_finite() || weight <= 0.0 {
                    return Err(PersonalityError::InvalidWeight {
                        id: response.id.clone(),
                        weight,
                    });
                }
            }
        }

        for clip in self.global_clips.values() {
            check_asset_key(&clip.id)?;
        }
        Ok(())
    }

    /// The responder for a piece. A color-specific responder beats a
    /// colorless one.
    pub fn responder_for(&self, role: Role, color: Color) -> Option<&Responder> {
        self.pieces
            .iter()
            .find(|r| r.role == role && r.color == Some(color))
            .or_else(|| self.pieces.iter().find(|r| r.role == role && r.color.is_none()))
    }

    pub fn global_clip(&self, name: &str) -> Option<&GlobalClip> {
        self.global_clips.get(name)
    }
}

fn check_asset_key(key: &str) -> Result<(), PersonalityError> {
    if ASSET_KEY.is_match(key) {
        Ok(())
    } else {
        Err(PersonalityError::InvalidAssetKey(key.to_string()))
    }
}

/// Lowercase, dash-separated form of a display name.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

const ROLE_NAMES: &[&str] = &["pawn", "knight", "bishop", "rook", "queen", "king"];
const COLOR_NAMES: &[&str] = &["white", "black"];

fn de_role<'de, D: Deserializer<'de>>(d: D) -> Result<Role, D::Error> {
    let name = String::deserialize(d)?;
    parse_role(&name).ok_or_else(|| de::Error::unknown_variant(&name, ROLE_NAMES))
}

fn de_color<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Color>, D::Error> {
    match Option::<String>::deserialize(d)? {
        None => Ok(None),
        Some(name) => parse_color(&name)
            .map(Some)
            .ok_or_else(|| de::Error::unknown_variant(&name, COLOR_NAMES)),
    }
}

impl std::fmt::Display for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.color {
            Some(color) => write!(f, "{} {}", color_name(color), role_name(self.role)),
            None => f.write_str(role_name(self.role)),
        }
    }
}
