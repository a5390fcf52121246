//! Per-move orchestration: identity, variant, selection, emission.

use std::sync::Arc;

use chess_core::move_event::role_name;
use chess_core::quality::{classify_move, MoveQuality};
use chess_core::MoveEvent;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shakmaty::Role;
use tracing::{debug, info, warn};

use crate::config::EngineSettings;
use crate::emission::{EmissionGate, EmissionRequest, Emitter, GateDecision, MoveSignature};
use crate::error::PersonalityError;
use crate::identity::{EntityKey, IdentityMap, IdentityTracker};
use crate::personality::{
    GlobalClip, Personality, Responder, CLIP_BLUNDER, CLIP_BRILLIANT, CLIP_CHECKMATE, CLIP_STALEMATE,
};
use crate::selector::select;
use crate::variant::{assign_variant, Theme};
use crate::voices::voice_for;

/// All state belonging to one game. Nothing is shared between sessions.
pub struct Session {
    id: String,
    personality: Option<Personality>,
    identities: IdentityMap,
    tracker: IdentityTracker,
    gate: EmissionGate,
    rng: StdRng,
}

impl Session {
    pub fn new(id: &str, settings: &EngineSettings) -> Self {
        Self::with_rng(id, settings, StdRng::from_entropy())
    }

    /// Reproducible selections, for tests and replays.
    pub fn with_seed(id: &str, settings: &EngineSettings, seed: u64) -> Self {
        Self::with_rng(id, settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(id: &str, settings: &EngineSettings, rng: StdRng) -> Self {
        Self {
            id: id.to_string(),
            personality: None,
            identities: IdentityMap::new(),
            tracker: IdentityTracker::new(),
            gate: EmissionGate::new(settings),
            rng,
        }
    }

    /// Install the result of a load. A failed load leaves the session
    /// without a personality; it keeps tracking pieces regardless.
    pub fn load_personality(&mut self, loaded: Result<Personality, PersonalityError>) -> bool {
        match loaded {
            Ok(personality) => {
                self.set_personality(personality);
                true
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "Personality failed to load; staying silent");
                self.personality = None;
                false
            }
        }
    }

    pub fn set_personality(&mut self, personality: Personality) {
        info!(session = %self.id, personality = %personality.name, "Personality active");
        self.personality = Some(personality);
    }

    pub fn clear_personality(&mut self) {
        self.personality = None;
    }

    /// New game: forget identities, bindings and debounce history.
    pub fn reset(&mut self) {
        self.identities.clear();
        self.tracker.initialize();
        self.gate.reset();
        debug!(session = %self.id, "Session reset");
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn personality(&self) -> Option<&Personality> {
        self.personality.as_ref()
    }

    pub fn identities(&self) -> &IdentityMap {
        &self.identities
    }

    pub fn tracker(&self) -> &IdentityTracker {
        &self.tracker
    }

    pub fn gate(&self) -> &EmissionGate {
        &self.gate
    }
}

/// Host-controlled playback switches, read on every move.
#[derive(Debug, Clone, Copy)]
pub struct Playback {
    pub enabled: bool,
    pub volume: f32,
}

impl Playback {
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            enabled: settings.enabled,
            volume: settings.volume,
        }
    }
}

#[derive(Debug)]
pub enum TriggerOutcome {
    Disabled,
    NoPersonality,
    NoMatch,
    Selected {
        request: EmissionRequest,
        decision: GateDecision,
    },
}

/// What was picked, before it becomes a request.
struct Pick<'a> {
    asset_key: &'a str,
    text: &'a str,
    voice_hint: Option<Role>,
    theme: Theme,
}

impl<'a> Pick<'a> {
    fn narrator(clip: &'a GlobalClip) -> Self {
        Self {
            asset_key: &clip.id,
            text: &clip.text,
            voice_hint: None,
            theme: Theme::Default,
        }
    }
}

pub struct PersonalityEngine<E: Emitter> {
    emitter: Arc<E>,
    settings: EngineSettings,
}

impl<E: Emitter> PersonalityEngine<E> {
    pub fn new(emitter: E, settings: EngineSettings) -> Self {
        Self {
            emitter: Arc::new(emitter),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    pub fn new_session(&self, id: &str) -> Session {
        Session::new(id, &self.settings)
    }

    /// React to one move. Never blocks on the emission and never fails;
    /// every problem degrades to a quieter outcome.
    pub fn on_move(&self, session: &mut Session, event: &MoveEvent, playback: &Playback) -> TriggerOutcome {
        let Session {
            id,
            personality,
            identities,
            tracker,
            gate,
            rng,
        } = session;

        // Resolve before the tracker forgets the origin square
        let entity = match event.piece_key.as_deref() {
            Some(key) => Some(EntityKey::new(key)),
            None => event.from.and_then(|from| tracker.origin_at(from).cloned()),
        };
        tracker.apply_event(event);

        if !playback.enabled {
            return TriggerOutcome::Disabled;
        }
        let Some(personality) = personality.as_ref() else {
            return TriggerOutcome::NoPersonality;
        };

        let Some(pick) = choose(personality, identities, entity.as_ref(), event, rng) else {
            debug!(session = %id, san = %event.san, "Nothing to say");
            return TriggerOutcome::NoMatch;
        };

        let volume = if playback.volume.is_finite() {
            playback.volume.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let request = EmissionRequest {
            namespace: personality.namespace.clone(),
            asset_key: pick.asset_key.to_string(),
            text: render_text(pick.text, event),
            volume,
            voice_hint: pick.voice_hint,
            voice: voice_for(pick.theme, pick.voice_hint),
        };

        let decision = gate.trigger(&self.emitter, MoveSignature::from(event), request.clone());
        info!(
            session = %id,
            san = %event.san,
            asset = %request.asset_key,
            started = decision.started(),
            "Selected response"
        );
        TriggerOutcome::Selected { request, decision }
    }
}

/// Placeholder in response texts for the role of the piece just taken.
const CAPTURED_PIECE: &str = "{capturedPiece}";

/// Fill response placeholders. A capture without a known victim reads as
/// "piece".
fn render_text(text: &str, event: &MoveEvent) -> String {
    if !text.contains(CAPTURED_PIECE) {
        return text.to_string();
    }
    let captured = event.captured.map(role_name).unwrap_or("piece");
    text.replace(CAPTURED_PIECE, captured)
}

fn choose<'a, R: Rng + ?Sized>(
    personality: &'a Personality,
    identities: &mut IdentityMap,
    entity: Option<&EntityKey>,
    event: &MoveEvent,
    rng: &mut R,
) -> Option<Pick<'a>> {
    let board_clip = if event.flags.checkmate {
        personality.global_clip(CLIP_CHECKMATE)
    } else if event.flags.stalemate {
        personality.global_clip(CLIP_STALEMATE)
    } else {
        None
    };
    if let Some(clip) = board_clip {
        return Some(Pick::narrator(clip));
    }

    if let Some(responder) = personality.responder_for(event.role, event.color) {
        let pick = respond(personality.contextual, responder, identities, entity, event, rng);
        if pick.is_some() {
            return pick;
        }
    }

    let quality_clip = match classify_move(event.eval_before, event.eval_after, event.color) {
        MoveQuality::Blunder => personality.global_clip(CLIP_BLUNDER),
        MoveQuality::Excellent => personality.global_clip(CLIP_BRILLIANT),
        _ => None,
    };
    quality_clip.map(Pick::narrator)
}

fn respond<'a, R: Rng + ?Sized>(
    contextual: bool,
    responder: &'a Responder,
    identities: &mut IdentityMap,
    entity: Option<&EntityKey>,
    event: &MoveEvent,
    rng: &mut R,
) -> Option<Pick<'a>> {
    let variant = match entity {
        Some(key) => {
            let name = assign_variant(identities, key, event.opening.as_deref(), contextual, responder, rng);
            responder.variant(&name)
        }
        None => {
            debug!(san = %event.san, %responder, "Untracked mover; using base responses");
            None
        }
    };

    let themed = match variant {
        Some(v) => select(&v.responses, event, rng),
        None => None,
    };
    let response = match themed {
        Some(r) => r,
        None => select(&responder.responses, event, rng)?,
    };

    Some(Pick {
        asset_key: &response.id,
        text: &response.text,
        voice_hint: Some(event.role),
        theme: variant.map(|v| v.theme).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmissionError;
    use chess_core::MoveFlags;
    use shakmaty::{Color, Square};

    struct Silent;

    impl Emitter for Silent {
        async fn play_clip(&self, _request: &EmissionRequest) -> Result<(), EmissionError> {
            Ok(())
        }

        async fn speak(&self, _request: &EmissionRequest) -> Result<(), EmissionError> {
            Ok(())
        }
    }

    const CAST: &str = r#"{
        "name": "Standard",
        "contextual": true,
        "pieces": [
            {"role": "pawn", "responses": [
                {"id": "pawn_good", "text": "Forward!", "conditions": [{"type": "moveQuality", "value": "good"}]},
                {"id": "pawn_capture", "text": "Gotcha, one {capturedPiece} down.", "conditions": [{"type": "specialMove", "value": "capture"}]}
            ]},
            {"role": "knight",
             "responses": [{"id": "knight_base", "text": "Neigh."}],
             "variants": [
                {"name": "luigi", "theme": "italian", "responses": [{"id": "knight_luigi", "text": "Mamma mia!"}]},
                {"name": "quiet", "theme": "default", "responses": [
                    {"id": "knight_quiet", "text": "...", "conditions": [{"type": "specialMove", "value": "check"}]}
                ]}
            ]}
        ],
        "globalClips": {
            "checkmate": {"id": "global_checkmate", "text": "Checkmate!"},
            "blunder": {"id": "global_blunder", "text": "Oh no."}
        }
    }"#;

    fn engine() -> PersonalityEngine<Silent> {
        PersonalityEngine::new(Silent, EngineSettings::default())
    }

    fn session(engine: &PersonalityEngine<Silent>) -> Session {
        let mut s = Session::with_seed("game-1", engine.settings(), 17);
        assert!(s.load_personality(Personality::from_json_str(CAST)));
        s
    }

    fn on() -> Playback {
        Playback {
            enabled: true,
            volume: 0.8,
        }
    }

    fn mv(role: Role, color: Color, from: Square, to: Square, san: &str) -> MoveEvent {
        MoveEvent::new("game-1", color, role, Some(from), to, san)
    }

    fn asset(outcome: &TriggerOutcome) -> &str {
        match outcome {
            TriggerOutcome::Selected { request, .. } => &request.asset_key,
            other => panic!("expected a selection, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_good_pawn_push_speaks() {
        let engine = engine();
        let mut s = session(&engine);
        let ev = mv(Role::Pawn, Color::White, Square::E2, Square::E4, "e4").with_evals(Some(0), Some(25));

        let outcome = engine.on_move(&mut s, &ev, &on());
        match outcome {
            TriggerOutcome::Selected { request, decision } => {
                assert_eq!(request.asset_key, "pawn_good");
                assert_eq!(request.namespace, "standard");
                assert_eq!(request.voice_hint, Some(Role::Pawn));
                assert!((request.volume - 0.8).abs() < f32::EPSILON);
                assert!(decision.started());
            }
            other => panic!("{other:?}"),
        }
        assert_eq!(s.tracker().origin_at(Square::E4).unwrap().as_str(), "white-pawn-e2");
    }

    #[test]
    fn test_captured_piece_placeholder() {
        let take = mv(Role::Pawn, Color::White, Square::E4, Square::D5, "exd5").with_captured(Some(Role::Knight));
        assert_eq!(render_text("Got your {capturedPiece}!", &take), "Got your knight!");

        let unknown = mv(Role::Pawn, Color::White, Square::E4, Square::D5, "exd5");
        assert_eq!(render_text("Got your {capturedPiece}!", &unknown), "Got your piece!");
        assert_eq!(render_text("Plain text.", &unknown), "Plain text.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_text_names_the_victim() {
        let engine = engine();
        let mut s = session(&engine);
        let ev = mv(Role::Pawn, Color::White, Square::E4, Square::D5, "exd5")
            .with_flags(MoveFlags {
                capture: true,
                ..Default::default()
            })
            .with_captured(Some(Role::Pawn));
        match engine.on_move(&mut s, &ev, &on()) {
            TriggerOutcome::Selected { request, .. } => {
                assert_eq!(request.asset_key, "pawn_capture");
                assert_eq!(request.text, "Gotcha, one pawn down.");
            }
            other => panic!("{other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_and_absent_still_track() {
        let engine = engine();
        let mut s = Session::with_seed("g", engine.settings(), 1);
        let ev = mv(Role::Pawn, Color::White, Square::E2, Square::E4, "e4");

        assert!(matches!(engine.on_move(&mut s, &ev, &on()), TriggerOutcome::NoPersonality));
        assert!(s.tracker().origin_at(Square::E4).is_some());

        let off = Playback { enabled: false, volume: 1.0 };
        let ev = mv(Role::Pawn, Color::Black, Square::E7, Square::E5, "e5");
        assert!(matches!(engine.on_move(&mut s, &ev, &off), TriggerOutcome::Disabled));
        assert!(s.tracker().origin_at(Square::E5).is_some());
    }

    #[test]
    fn test_failed_load_keeps_session_silent() {
        let engine = engine();
        let mut s = Session::with_seed("g", engine.settings(), 1);
        assert!(!s.load_personality(Personality::from_json_str("{oops")));
        assert!(s.personality().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkmate_clip_takes_precedence() {
        let engine = engine();
        let mut s = session(&engine);
        let ev = mv(Role::Pawn, Color::White, Square::E4, Square::D5, "exd5#").with_flags(MoveFlags {
            capture: true,
            check: true,
            checkmate: true,
            ..Default::default()
        });
        let outcome = engine.on_move(&mut s, &ev, &on());
        assert_eq!(asset(&outcome), "global_checkmate");
        if let TriggerOutcome::Selected { request, .. } = outcome {
            assert_eq!(request.voice_hint, None);
            assert_eq!(request.voice, crate::voices::NARRATOR_VOICE);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_blunder_clip_when_piece_has_nothing() {
        let engine = engine();
        let mut s = session(&engine);
        let ev = mv(Role::Pawn, Color::White, Square::F2, Square::F3, "f3").with_evals(Some(0), Some(-400));
        assert_eq!(asset(&engine.on_move(&mut s, &ev, &on())), "global_blunder");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_match() {
        let engine = engine();
        let mut s = session(&engine);
        let ev = mv(Role::Bishop, Color::White, Square::F1, Square::C4, "Bc4");
        assert!(matches!(engine.on_move(&mut s, &ev, &on()), TriggerOutcome::NoMatch));
    }

    #[tokio::test(start_paused = true)]
    async fn test_variant_bound_on_first_move_and_kept() {
        let engine = engine();
        let mut s = session(&engine);
        let italian = Some("Italian Game");

        let first = mv(Role::Knight, Color::White, Square::G1, Square::F3, "Nf3").with_opening(italian);
        assert_eq!(asset(&engine.on_move(&mut s, &first, &on())), "knight_luigi");
        let key = EntityKey::new("white-knight-g1");
        assert_eq!(s.identities().get(&key), Some("luigi"));

        let second = mv(Role::Knight, Color::White, Square::F3, Square::G5, "Ng5").with_opening(Some("French Defense"));
        engine.on_move(&mut s, &second, &on());
        assert_eq!(s.identities().get(&key), Some("luigi"));
        assert_eq!(s.identities().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_variant_without_match_falls_back_to_base() {
        let engine = engine();
        let mut s = session(&engine);
        // No defensive knight, so the default-themed variant binds; its only
        // response needs a check
        let ev = mv(Role::Knight, Color::Black, Square::B8, Square::C6, "Nc6").with_opening(Some("Caro-Kann"));
        assert_eq!(asset(&engine.on_move(&mut s, &ev, &on())), "knight_base");
        assert_eq!(s.identities().get(&EntityKey::new("black-knight-b8")), Some("quiet"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_untracked_mover_is_not_adopted() {
        let engine = engine();
        let mut s = session(&engine);
        let ev = mv(Role::Knight, Color::White, Square::D4, Square::F5, "Nf5");
        assert_eq!(asset(&engine.on_move(&mut s, &ev, &on())), "knight_base");
        assert!(s.identities().is_empty());
        assert!(s.tracker().origin_at(Square::F5).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_key_overrides_tracker() {
        let engine = engine();
        let mut s = session(&engine);
        let ev = mv(Role::Knight, Color::White, Square::G1, Square::F3, "Nf3").with_piece_key("hero");
        engine.on_move(&mut s, &ev, &on());
        assert!(s.identities().get(&EntityKey::new("hero")).is_some());
        assert!(s.identities().get(&EntityKey::new("white-knight-g1")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_move_while_emitting_is_dropped() {
        let engine = engine();
        let mut s = session(&engine);
        let first = mv(Role::Pawn, Color::White, Square::E2, Square::E4, "e4").with_evals(Some(0), Some(25));
        let second = mv(Role::Pawn, Color::Black, Square::D7, Square::D5, "d5").with_evals(Some(25), Some(0));

        assert!(matches!(
            engine.on_move(&mut s, &first, &on()),
            TriggerOutcome::Selected { decision: GateDecision::Started(_), .. }
        ));
        // Black's d5 is "good" for Black too; the gate is still busy
        assert!(matches!(
            engine.on_move(&mut s, &second, &on()),
            TriggerOutcome::Selected { decision: GateDecision::Busy, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_session_state() {
        let engine = engine();
        let mut s = session(&engine);
        let ev = mv(Role::Knight, Color::White, Square::G1, Square::F3, "Nf3").with_opening(Some("Italian Game"));
        engine.on_move(&mut s, &ev, &on());
        assert_eq!(s.identities().len(), 1);

        s.reset();
        assert!(s.identities().is_empty());
        assert_eq!(s.tracker().len(), 32);
        assert_eq!(s.gate().debounce_len(), 0);
        assert_eq!(s.tracker().origin_at(Square::G1).unwrap().as_str(), "white-knight-g1");
        assert!(s.personality().is_some());
    }
}
