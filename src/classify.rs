use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::image::ImageRecord;
use crate::profile::ClassProfiles;

/// A predicted digit for the record with zero-based id `id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prediction {
    pub id: usize,
    pub label: u8,
}

impl Prediction {
    // External ids are one-based, matching the row numbering of the data files
    pub fn image_id(&self) -> usize {
        self.id + 1
    }
}

/// Nearest-centroid classification on ink count.
///
/// Picks the digit whose mean training ink count is closest to the record's own.
/// Degenerate profiles are skipped, and on equal distance the lowest digit wins.
pub fn classify(record: &ImageRecord, profiles: &ClassProfiles) -> Result<u8> {
    let ink = record.ink_count() as f64;
    profiles
        .iter()
        .filter_map(|profile| profile.mean().map(|mean| (profile.label(), (mean - ink).abs())))
        // Profiles come in ascending label order and only a strictly smaller
        // distance replaces the best, so ties keep the lower label
        .fold(None, |best: Option<(u8, f64)>, (label, distance)| match best {
            Some((_, best_distance)) if best_distance <= distance => best,
            _ => Some((label, distance)),
        })
        .map(|(label, _)| label)
        .ok_or(Error::UnclassifiableRecord { id: record.id() })
}

// Classify a batch, preserving input order.
// The first record that cannot be classified aborts the whole batch.
pub fn classify_all(records: &[ImageRecord], profiles: &ClassProfiles) -> Result<Vec<Prediction>> {
    records
        .par_iter()
        .map(|record| {
            classify(record, profiles).map(|label| Prediction {
                id: record.id(),
                label,
            })
        })
        .collect()
}
