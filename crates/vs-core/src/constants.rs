/// Numerical epsilon for near-zero comparisons (turnout, weight totals).
pub const EPSILON: f64 = 1e-10;

/// Default scale of the demographic favorability tilt.
pub const DEFAULT_BONUS_MULTIPLIER: f64 = 0.3;

/// Raw recognition values are search-interest indices on a 0–100 scale.
pub const DEFAULT_RECOGNITION_SCALE: f64 = 100.0;

/// Vote share each side receives when nothing is decided.
pub const FALLBACK_SHARE_PCT: f64 = 50.0;

/// Gain applied to a similarity's distance from the mean before `tanh`.
pub const AMPLIFICATION_GAIN: f64 = 10.0;

/// Preference margin above which a segment lean is reported as high confidence.
pub const HIGH_CONFIDENCE_MARGIN: f64 = 0.3;

/// Preference margin above which a segment lean is reported as medium confidence.
pub const MEDIUM_CONFIDENCE_MARGIN: f64 = 0.15;
