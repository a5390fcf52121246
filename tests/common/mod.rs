#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use personality_engine::{EmissionError, EmissionRequest, Emitter};
use tempfile::TempDir;

/// Emitter that records every clip it was asked to play.
#[derive(Default)]
pub struct RecordingEmitter {
    pub played: Mutex<Vec<String>>,
    pub spoken: AtomicUsize,
    pub clips_fail: bool,
}

impl RecordingEmitter {
    pub fn failing_clips() -> Self {
        Self {
            clips_fail: true,
            ..Default::default()
        }
    }

    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }
}

impl Emitter for RecordingEmitter {
    async fn play_clip(&self, request: &EmissionRequest) -> Result<(), EmissionError> {
        if self.clips_fail {
            return Err(EmissionError::ClipMissing(request.asset_key.clone()));
        }
        self.played.lock().unwrap().push(request.asset_key.clone());
        Ok(())
    }

    async fn speak(&self, _request: &EmissionRequest) -> Result<(), EmissionError> {
        self.spoken.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub const UNIFIED: &str = r#"{
    "name": "Standard",
    "description": "Every piece has something to say",
    "contextual": true,
    "pieces": [
        {"role": "pawn", "responses": [
            {"id": "pawn_push", "text": "Onward."},
            {"id": "pawn_take", "text": "Mine now.", "weight": 5,
             "conditions": [{"type": "specialMove", "value": "capture"}]}
        ]},
        {"role": "knight", "responses": [{"id": "knight_hop", "text": "Hup!"}],
         "variants": [
            {"name": "luigi", "theme": "italian", "responses": [{"id": "knight_luigi", "text": "Andiamo!"}]}
         ]},
        {"role": "bishop", "responses": [
            {"id": "bishop_center", "text": "A fine diagonal.",
             "conditions": [{"type": "position", "value": "center"}]}
        ]},
        {"role": "queen", "responses": [
            {"id": "queen_check", "text": "Check, darling.",
             "conditions": [{"type": "specialMove", "value": "check"}]}
        ]}
    ],
    "globalClips": {
        "checkmate": {"id": "global_checkmate", "text": "That's mate."}
    }
}"#;

/// A temporary personality root holding one personality directory.
pub struct PersonalityFixture {
    _root: TempDir,
    pub dir: PathBuf,
}

pub fn write_personality(name: &str, files: &[(&str, &str)]) -> PersonalityFixture {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join(name);
    fs::create_dir_all(dir.join("audio")).unwrap();
    for (file, body) in files {
        fs::write(dir.join(file), body).unwrap();
    }
    PersonalityFixture { _root: root, dir }
}

pub fn touch_clip(dir: &Path, asset_key: &str) {
    fs::write(dir.join("audio").join(format!("{asset_key}.mp3")), b"ID3").unwrap();
}
