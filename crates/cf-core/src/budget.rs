//! Size budgeting: decide how much of a source to keep so the re-encoded
//! output fits under a byte ceiling.
//!
//! Output size for a roughly constant-bitrate stream scales linearly with
//! duration, so the planner shortens the encode in proportion to how far the
//! source overshoots the ceiling, discounted by a safety margin. The estimate
//! is first-order only; the encoder's hard size cutoff backs it up.

use serde::{Deserialize, Serialize};

use crate::media::{MediaDescriptor, TrimPlan};
use crate::{Error, Result};

/// Default multiplicative headroom applied to the size ratio.
pub const DEFAULT_SAFETY_MARGIN: f64 = 0.95;

/// Default shortest trim, in seconds.
pub const DEFAULT_MINIMUM_TRIM_FLOOR: f64 = 1.0;

/// Pure planner mapping a [`MediaDescriptor`] and a ceiling to a [`TrimPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetPlanner {
    safety_margin: f64,
    minimum_trim_floor: f64,
}

impl Default for BudgetPlanner {
    fn default() -> Self {
        Self {
            safety_margin: DEFAULT_SAFETY_MARGIN,
            minimum_trim_floor: DEFAULT_MINIMUM_TRIM_FLOOR,
        }
    }
}

impl BudgetPlanner {
    /// Create a planner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `safety_margin` is outside `(0, 1]` or
    /// `minimum_trim_floor` is not a finite positive number.
    pub fn new(safety_margin: f64, minimum_trim_floor: f64) -> Result<Self> {
        if !(safety_margin > 0.0 && safety_margin <= 1.0) {
            return Err(Error::Config(format!(
                "safety_margin must be in (0, 1], got {safety_margin}"
            )));
        }
        if !(minimum_trim_floor.is_finite() && minimum_trim_floor > 0.0) {
            return Err(Error::Config(format!(
                "minimum_trim_floor must be a positive number of seconds, got {minimum_trim_floor}"
            )));
        }
        Ok(Self {
            safety_margin,
            minimum_trim_floor,
        })
    }

    pub fn safety_margin(&self) -> f64 {
        self.safety_margin
    }

    pub fn minimum_trim_floor(&self) -> f64 {
        self.minimum_trim_floor
    }

    /// Decide whether `descriptor` must be trimmed to fit `size_ceiling_bytes`.
    ///
    /// A source at or under the ceiling is left alone. Otherwise the kept
    /// duration is `duration * (ceiling / size) * safety_margin`, never less
    /// than the minimum floor. A zero-duration source therefore plans the
    /// floor.
    pub fn plan(&self, descriptor: &MediaDescriptor, size_ceiling_bytes: u64) -> TrimPlan {
        let byte_size = descriptor.byte_size();
        if byte_size <= size_ceiling_bytes {
            return TrimPlan::NoTrim;
        }

        let ratio = (size_ceiling_bytes as f64 / byte_size as f64) * self.safety_margin;
        let seconds = (descriptor.duration_seconds() * ratio).max(self.minimum_trim_floor);

        TrimPlan::TrimTo { seconds }
    }
}
