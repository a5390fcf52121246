//! Outward emissions (recorded clip or synthesized speech) and the gate that
//! keeps them to one voice at a time.
//!
//! The gate is either idle or emitting. A trigger while emitting is dropped,
//! never queued. A trigger while idle is debounced on the move signature,
//! then runs on its own tokio task: clip first, speech if the clip fails.
//! The task's `JoinHandle` is the completion signal; the engine itself never
//! awaits it.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chess_core::move_event::role_name;
use chess_core::MoveEvent;
use serde::{Serialize, Serializer};
use shakmaty::{Role, Square};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::config::EngineSettings;
use crate::error::EmissionError;

/// One thing to say.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionRequest {
    /// Personality the clip belongs to.
    pub namespace: String,
    pub asset_key: String,
    pub text: String,
    /// 0.0..=1.0
    pub volume: f32,
    /// Piece speaking, `None` for the narrator.
    #[serde(serialize_with = "ser_role")]
    pub voice_hint: Option<Role>,
    /// Speech voice for the fallback channel.
    pub voice: &'static str,
}

impl EmissionRequest {
    /// `<root>/<namespace>/audio/<asset key>.mp3`
    pub fn clip_path(&self, root: &Path) -> PathBuf {
        root.join(&self.namespace)
            .join("audio")
            .join(format!("{}.mp3", self.asset_key))
    }
}

fn ser_role<S: Serializer>(role: &Option<Role>, s: S) -> Result<S::Ok, S::Error> {
    role.map(role_name).serialize(s)
}

/// The two output channels. Implementations decide how a request is realised.
pub trait Emitter: Send + Sync + 'static {
    /// Play the pre-recorded clip for `request`.
    fn play_clip(&self, request: &EmissionRequest) -> impl Future<Output = Result<(), EmissionError>> + Send;

    /// Speak `request.text`.
    fn speak(&self, request: &EmissionRequest) -> impl Future<Output = Result<(), EmissionError>> + Send;
}

/// Debounce key: the same piece making the same move.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MoveSignature {
    pub from: Option<Square>,
    pub to: Square,
    pub san: String,
}

impl From<&MoveEvent> for MoveSignature {
    fn from(event: &MoveEvent) -> Self {
        Self {
            from: event.from,
            to: event.to,
            san: event.san.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmissionOutcome {
    Clip,
    Speech,
    Failed,
}

#[derive(Debug)]
pub enum GateDecision {
    /// Another emission is in flight.
    Busy,
    /// Same signature fired inside the debounce window.
    Debounced,
    /// No async runtime to run the emission on.
    Unavailable,
    Started(JoinHandle<EmissionOutcome>),
}

impl GateDecision {
    pub fn started(&self) -> bool {
        matches!(self, GateDecision::Started(_))
    }
}

pub struct EmissionGate {
    emitting: Arc<AtomicBool>,
    recent: Mutex<HashMap<MoveSignature, Instant>>,
    debounce_window: Duration,
    settle_delay: Duration,
    emission_timeout: Duration,
    capacity: usize,
    evict: usize,
}

impl EmissionGate {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            emitting: Arc::new(AtomicBool::new(false)),
            recent: Mutex::new(HashMap::new()),
            debounce_window: settings.debounce_window,
            settle_delay: settings.settle_delay,
            emission_timeout: settings.emission_timeout,
            capacity: settings.debounce_capacity,
            evict: settings.debounce_evict,
        }
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting.load(Ordering::Acquire)
    }

    /// Entries currently held in the debounce table.
    pub fn debounce_len(&self) -> usize {
        self.recent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Forget all debounce history. Used when a new game starts.
    pub fn reset(&self) {
        self.recent.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Try to start an emission.
    pub fn trigger<E: Emitter>(
        &self,
        emitter: &Arc<E>,
        signature: MoveSignature,
        request: EmissionRequest,
    ) -> GateDecision {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(asset = %request.asset_key, "No tokio runtime; emission skipped");
            return GateDecision::Unavailable;
        };

        {
            let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);

            if self.is_emitting() {
                debug!(asset = %request.asset_key, "Gate busy; dropping emission");
                return GateDecision::Busy;
            }

            let now = Instant::now();
            if let Some(last) = recent.get(&signature) {
                if now.duration_since(*last) < self.debounce_window {
                    debug!(san = %signature.san, "Debounced repeat emission");
                    return GateDecision::Debounced;
                }
            }

            if self
                .emitting
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return GateDecision::Busy;
            }

            recent.insert(signature, now);
            if recent.len() > self.capacity {
                evict_oldest(&mut recent, self.evict);
            }
        }

        let emitting = Arc::clone(&self.emitting);
        let emitter = Arc::clone(emitter);
        let limit = self.emission_timeout;
        let settle = self.settle_delay;

        let handle = runtime.spawn(async move {
            let outcome = emit(emitter, request, limit).await;
            if outcome != EmissionOutcome::Failed {
                tokio::time::sleep(settle).await;
            }
            emitting.store(false, Ordering::Release);
            outcome
        });
        GateDecision::Started(handle)
    }
}

/// Drop the `count` oldest entries.
fn evict_oldest(recent: &mut HashMap<MoveSignature, Instant>, count: usize) {
    let mut by_age: Vec<(Instant, MoveSignature)> =
        recent.iter().map(|(sig, at)| (*at, sig.clone())).collect();
    by_age.sort_by_key(|(at, _)| *at);
    for (_, sig) in by_age.into_iter().take(count) {
        recent.remove(&sig);
    }
}

async fn emit<E: Emitter>(emitter: Arc<E>, request: EmissionRequest, limit: Duration) -> EmissionOutcome {
    match timeout(limit, emitter.play_clip(&request)).await {
        Ok(Ok(())) => return EmissionOutcome::Clip,
        Ok(Err(e)) => debug!(asset = %request.asset_key, error = %e, "Clip failed; falling back to speech"),
        Err(_) => warn!(
            asset = %request.asset_key,
            error = %EmissionError::Timeout(limit),
            "Clip stalled; falling back to speech"
        ),
    }

    // Speech runs on its own task so a timeout here stops waiting without
    // cutting the voice off mid-sentence.
    let asset = request.asset_key.clone();
    let speech = tokio::spawn(async move { emitter.speak(&request).await });
    match timeout(limit, speech).await {
        Ok(Ok(Ok(()))) => EmissionOutcome::Speech,
        Ok(Ok(Err(e))) => {
            warn!(asset = %asset, error = %e, "Speech failed");
            EmissionOutcome::Failed
        }
        Ok(Err(join_err)) => {
            warn!(asset = %asset, error = %join_err, "Speech task aborted");
            EmissionOutcome::Failed
        }
        Err(_) => {
            warn!(asset = %asset, error = %EmissionError::Timeout(limit), "Speech still running; releasing gate");
            EmissionOutcome::Speech
        }
    }
}
