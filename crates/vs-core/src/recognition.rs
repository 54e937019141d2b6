//! Recognition normalization.
//!
//! Raw recognition arrives as a search-interest index. Every call site maps
//! it into [0, 1] the same way: divide by a fixed scale and clamp. Relative
//! attention between the two entities is never used here, because it would
//! make one entity's marginal depend on the other's signal.

use crate::constants::DEFAULT_RECOGNITION_SCALE;

/// Map a raw recognition value into [0, 1].
///
/// A non-positive or non-finite scale falls back to the default scale;
/// a non-finite raw value counts as no recognition.
pub fn normalize_recognition(raw: f64, scale: f64) -> f64 {
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        DEFAULT_RECOGNITION_SCALE
    };
    if !raw.is_finite() {
        return 0.0;
    }
    (raw / scale).clamp(0.0, 1.0)
}
