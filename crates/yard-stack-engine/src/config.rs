// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Weights of the placement scoring function. Higher scores rank first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Penalty per row of distance from the approach side (columns count as fractions of a row).
    pub access_weight: f64,
    /// Penalty for burying containers, scaled by `height / capacity` of the target slot
    /// and by one column step. Kept below `access_weight` it never overrides row/col order.
    pub height_weight: f64,
    /// Bonus for slots inside one of the requested blocks.
    pub preferred_block_bonus: f64,
    /// Bonus scaled by the share of related containers already sitting in the block.
    pub co_location_bonus: f64,
    /// Number of candidates returned when the request does not say otherwise.
    pub top_k: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            access_weight: 1.0,
            height_weight: 0.5,
            preferred_block_bonus: 2.0,
            co_location_bonus: 1.5,
            top_k: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldConfig {
    /// Age after which a hold is reported as stale. Expiring it is up to the caller.
    pub stale_after_ms: u64,
}

impl HoldConfig {
    #[inline]
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            stale_after_ms: 30 * 60 * 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub holds: HoldConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{ "scoring": { "top_k": 3 } }"#).expect("valid config");
        assert_eq!(cfg.scoring.top_k, 3);
        assert_eq!(cfg.scoring.height_weight, ScoringConfig::default().height_weight);
        assert_eq!(cfg.holds, HoldConfig::default());
    }

    #[test]
    fn test_stale_after_duration() {
        let h = HoldConfig { stale_after_ms: 1_500 };
        assert_eq!(h.stale_after(), Duration::from_millis(1_500));
    }
}
