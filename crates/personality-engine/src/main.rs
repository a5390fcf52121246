//! Personality replay
//!
//! Plays a SAN move list through a personality and logs what each piece
//! would say. Clips are "played" when the file exists under the personality
//! root; everything else goes to the speech channel, which here is the log.
//!
//! ```text
//! personality-replay --personality public/personalities/standard \
//!     --moves "1. e4 e5 2. Nf3 Nc6 3. Bc4" --opening "Italian Game"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use chess_core::replay::{replay_san, split_moves};
use personality_engine::emission::{EmissionOutcome, GateDecision};
use personality_engine::{
    EmissionError, EmissionRequest, Emitter, EngineSettings, Personality, PersonalityEngine, Playback, TriggerOutcome,
};
use tracing::{info, warn};

const SESSION_ID: &str = "replay";

struct LogEmitter {
    root: PathBuf,
}

impl Emitter for LogEmitter {
    async fn play_clip(&self, request: &EmissionRequest) -> Result<(), EmissionError> {
        let path = request.clip_path(&self.root);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {
                info!(clip = %path.display(), volume = request.volume, "Playing clip");
                Ok(())
            }
            Ok(false) => Err(EmissionError::ClipMissing(path.display().to_string())),
            Err(e) => Err(EmissionError::Playback(e.to_string())),
        }
    }

    async fn speak(&self, request: &EmissionRequest) -> Result<(), EmissionError> {
        let payload = serde_json::to_string(request).map_err(|e| EmissionError::Speech(e.to_string()))?;
        info!(voice = request.voice, text = %request.text, %payload, "Speaking");
        Ok(())
    }
}

/// Value following `--flag`, if present.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let mut settings = EngineSettings::from_env();
    if let Some(dir) = arg_value(&args, "--personality") {
        settings.personality_dir = Some(PathBuf::from(dir));
    }
    let dir = settings
        .personality_dir
        .clone()
        .context("No personality directory: pass --personality or set PERSONALITY_DIR")?;
    let moves = arg_value(&args, "--moves").context("Missing --moves \"1. e4 e5 ...\"")?;
    let opening = arg_value(&args, "--opening");
    let seed: Option<u64> = arg_value(&args, "--seed").and_then(|s| s.parse().ok());

    let personality = Personality::load_dir(&dir)?;
    let root = dir.parent().map(Path::to_path_buf).unwrap_or_default();

    let engine = PersonalityEngine::new(LogEmitter { root }, settings);
    let mut session = match seed {
        Some(seed) => personality_engine::Session::with_seed(SESSION_ID, engine.settings(), seed),
        None => engine.new_session(SESSION_ID),
    };
    session.set_personality(personality);
    let playback = Playback::from_settings(engine.settings());

    let sans = split_moves(&moves);
    let events = replay_san(&sans, SESSION_ID)?;
    info!(moves = events.len(), opening = ?opening, "Replaying");

    let mut spoken = 0usize;
    for event in events {
        let event = event.with_opening(opening.as_deref());
        match engine.on_move(&mut session, &event, &playback) {
            TriggerOutcome::Selected { request, decision } => {
                info!(san = %event.san, asset = %request.asset_key, text = %request.text, "Response");
                // Replays wait each emission out so every move gets a turn
                if let GateDecision::Started(handle) = decision {
                    match handle.await {
                        Ok(EmissionOutcome::Failed) => warn!(san = %event.san, "Emission failed"),
                        Ok(_) => spoken += 1,
                        Err(e) => warn!(san = %event.san, error = %e, "Emission task panicked"),
                    }
                }
            }
            TriggerOutcome::NoMatch => info!(san = %event.san, "Silent"),
            other => {
                info!(san = %event.san, outcome = ?other, "Stopped");
                break;
            }
        }
    }

    info!(spoken, tracked = session.tracker().len(), bound = session.identities().len(), "Replay finished");
    Ok(())
}
