/// Move quality derivation — pure functions only
/// (evaluations in, label out; no engine or board dependencies)

use serde::{Deserialize, Serialize};
use shakmaty::Color;
use std::fmt;

/// Win-chance drop thresholds (percentage points)
const DROP_BLUNDER: f64 = 20.0;
const DROP_BAD: f64 = 10.0;
const DROP_DUBIOUS: f64 = 5.0;

/// Win-chance gain thresholds (percentage points)
const GAIN_EXCELLENT: f64 = 5.0;
const GAIN_GOOD: f64 = 2.0;

/// Centipawn loss thresholds
const CP_BLUNDER: i32 = 300;
const CP_BAD: i32 = 150;
const CP_DUBIOUS: i32 = 75;

/// Logistic slope mapping centipawns to win chance
const WIN_CHANCE_SLOPE: f64 = 0.003_682_08;

/// Evaluations beyond this are mate scores; clamp before doing arithmetic
const MAX_EVAL: i32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveQuality {
    Blunder,
    Bad,
    Dubious,
    Neutral,
    Good,
    Excellent,
}

impl MoveQuality {
    pub fn name(&self) -> &'static str {
        match self {
            MoveQuality::Blunder => "blunder",
            MoveQuality::Bad => "bad",
            MoveQuality::Dubious => "dubious",
            MoveQuality::Neutral => "neutral",
            MoveQuality::Good => "good",
            MoveQuality::Excellent => "excellent",
        }
    }
}

impl fmt::Display for MoveQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Win chance (0..100) for the side whose perspective `cp` is given in.
pub fn win_chance(cp: i32) -> f64 {
    let cp = cp.clamp(-MAX_EVAL, MAX_EVAL) as f64;
    50.0 + 50.0 * (2.0 / (1.0 + (-WIN_CHANCE_SLOPE * cp).exp()) - 1.0)
}

/// Centipawn loss of a move from the mover's perspective. Negative means the
/// position improved for the mover.
pub fn cp_loss(eval_before: i32, eval_after: i32, mover: Color) -> i32 {
    let before = eval_before.clamp(-MAX_EVAL, MAX_EVAL);
    let after = eval_after.clamp(-MAX_EVAL, MAX_EVAL);
    match mover {
        Color::White => before - after,
        Color::Black => after - before,
    }
}

/// Change in the mover's win chance. Positive is a gain.
pub fn win_chance_delta(eval_before: i32, eval_after: i32, mover: Color) -> f64 {
    let before = eval_before.clamp(-MAX_EVAL, MAX_EVAL);
    let after = eval_after.clamp(-MAX_EVAL, MAX_EVAL);
    match mover {
        Color::White => win_chance(after) - win_chance(before),
        Color::Black => win_chance(-after) - win_chance(-before),
    }
}

/// Label a move. Either evaluation missing yields `Neutral`.
pub fn classify_move(eval_before: Option<i32>, eval_after: Option<i32>, mover: Color) -> MoveQuality {
    let (Some(before), Some(after)) = (eval_before, eval_after) else {
        return MoveQuality::Neutral;
    };

    let loss = cp_loss(before, after, mover);
    let delta = win_chance_delta(before, after, mover);
    let drop = -delta;

    if drop > DROP_BLUNDER || loss > CP_BLUNDER {
        MoveQuality::Blunder
    } else if drop > DROP_BAD || loss > CP_BAD {
        MoveQuality::Bad
    } else if drop > DROP_DUBIOUS || loss > CP_DUBIOUS {
        MoveQuality::Dubious
    } else if delta > GAIN_EXCELLENT {
        MoveQuality::Excellent
    } else if delta > GAIN_GOOD {
        MoveQuality::Good
    } else {
        MoveQuality::Neutral
    }
}
