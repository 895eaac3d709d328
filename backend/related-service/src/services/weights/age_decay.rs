//! Penalizes stale shares and rewards candidates shared close in time
//! to the home item on a slow, months-scale curve.

use super::WeightCalculator;
use crate::models::RelatedResource;
use chrono::Utc;

const YEAR_SECS: i64 = 360 * 24 * 3600;
const NEUTRAL_SECS: i64 = 90 * 24 * 3600;

const RATIO_5Y: f64 = 0.4;
const RATIO_3Y: f64 = 0.7;
const RATIO_1Y: f64 = 0.85;
const CURVE_FLOOR: f64 = 0.75;

pub struct AgeDecayWeight;

impl AgeDecayWeight {
    fn weight_at(&self, now: i64, references: &[RelatedResource], candidates: &mut [RelatedResource]) {
        let Some(home) = references.first() else {
            return;
        };
        if home.link_creation() == 0 {
            return;
        }

        for entry in candidates.iter_mut() {
            // zero means the share row carried no timestamp, not 1970
            let creation = entry.link_creation();
            if creation == 0 {
                continue;
            }
            if creation < now - 5 * YEAR_SECS {
                entry.improve(RATIO_5Y, "ancien_5y", true);
            } else if creation < now - 3 * YEAR_SECS {
                entry.improve(RATIO_3Y, "ancien_3y", true);
            } else if creation < now - YEAR_SECS {
                entry.improve(RATIO_1Y, "ancien_1y", true);
            }

            // 1.2 for simultaneous shares, 1.0 at the 90-day neutral
            // point, floored at 0.75 beyond that
            let diff = (home.link_creation() - creation).abs();
            let drift = (diff - NEUTRAL_SECS) as f64;
            let improvement = (1.0 - drift * 0.2 / NEUTRAL_SECS as f64).max(CURVE_FLOOR);
            entry.improve(improvement, "ancien_3m", true);
        }
    }
}

impl WeightCalculator for AgeDecayWeight {
    fn name(&self) -> &'static str {
        "age_decay"
    }

    fn weight(&self, references: &[RelatedResource], candidates: &mut [RelatedResource]) {
        self.weight_at(Utc::now().timestamp(), references, candidates);
    }
}
