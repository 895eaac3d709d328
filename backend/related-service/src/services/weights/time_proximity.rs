//! Boosts candidates whose share was created by the same person around
//! the same time as a reference share. Someone sharing two items within
//! minutes of each other usually shares them for the same reason.

use super::WeightCalculator;
use crate::models::RelatedResource;

const DELAY_HIGH_SECS: i64 = 120;
const DELAY_MEDIUM_SECS: i64 = 900;
const DELAY_LOW_SECS: i64 = 7200;

pub struct TimeProximityWeight;

impl WeightCalculator for TimeProximityWeight {
    fn name(&self) -> &'static str {
        "time_proximity"
    }

    fn weight(&self, references: &[RelatedResource], candidates: &mut [RelatedResource]) {
        for reference in references {
            if reference.link_creation() == 0
                || reference.link_creator().is_empty()
                || reference.link_recipient().is_empty()
            {
                continue;
            }

            for entry in candidates.iter_mut() {
                if entry.link_creation() == 0
                    || entry.link_creator().is_empty()
                    || entry.link_recipient().is_empty()
                {
                    continue;
                }
                if entry.link_creator() != reference.link_creator() {
                    continue;
                }

                let delta = (entry.link_creation() - reference.link_creation()).abs();
                if delta < DELAY_HIGH_SECS {
                    entry.improve(RelatedResource::IMPROVE_HIGH_LINK, "time_delay_1", true);
                } else if delta < DELAY_MEDIUM_SECS {
                    entry.improve(RelatedResource::IMPROVE_MEDIUM_LINK, "time_delay_2", true);
                } else if delta < DELAY_LOW_SECS {
                    entry.improve(RelatedResource::IMPROVE_LOW_LINK, "time_delay_3", true);
                }
            }
        }
    }
}
