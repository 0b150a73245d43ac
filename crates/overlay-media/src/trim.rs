//! First-clip trim planning.

use overlay_models::TrimMode;

/// Portion of a clip to keep: `duration` seconds starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimWindow {
    pub start: f64,
    pub duration: f64,
}

impl TrimWindow {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Plan a trim of a `source` second clip down to `target` seconds.
///
/// Returns `None` when no trim is needed: the target is not strictly
/// shorter than the source, or either value is not a positive number.
pub fn plan_trim(source: f64, target: f64, mode: TrimMode) -> Option<TrimWindow> {
    if !(source.is_finite() && target.is_finite()) || source <= 0.0 || target <= 0.0 {
        return None;
    }
    if target >= source {
        return None;
    }

    let excess = source - target;
    let start = match mode {
        TrimMode::Start => excess,
        TrimMode::End => 0.0,
        TrimMode::Both => excess / 2.0,
    };

    Some(TrimWindow {
        start,
        duration: target,
    })
}
