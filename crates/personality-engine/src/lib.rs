//! Chess piece personalities.
//!
//! Pieces get voices: every move is matched against a personality document,
//! a response is picked, and the pick is handed to an emitter that plays a
//! recorded clip or falls back to speech.

pub mod condition;
pub mod config;
pub mod emission;
pub mod engine;
pub mod error;
pub mod identity;
pub mod personality;
pub mod selector;
pub mod variant;
pub mod voices;

pub use config::EngineSettings;
pub use emission::{EmissionRequest, Emitter};
pub use engine::{PersonalityEngine, Playback, Session, TriggerOutcome};
pub use error::{EmissionError, PersonalityError};
pub use personality::Personality;
