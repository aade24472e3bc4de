use rand::{prelude::SliceRandom, Rng};

use crate::classify::Prediction;
use crate::error::{Error, Result};
use crate::image::ImageRecord;

// Shuffle the labeled records and split off `fraction` of them as a hold-out set.
// Returns (training, holdout). Ids are left untouched.
pub fn split_holdout(
    mut records: Vec<ImageRecord>,
    fraction: f64,
    rng: &mut impl Rng,
) -> Result<(Vec<ImageRecord>, Vec<ImageRecord>)> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(Error::InvalidHoldout { fraction });
    }
    records.shuffle(rng);
    let n_holdout = (records.len() as f64 * fraction).round() as usize;
    let holdout = records.split_off(records.len() - n_holdout);
    Ok((records, holdout))
}

/// Fraction of predictions that match the label of the record they were made for.
///
/// Predictions and records are paired positionally; unlabeled records count as misses.
/// An empty batch has accuracy 0.
pub fn accuracy(predictions: &[Prediction], truth: &[ImageRecord]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(truth)
        .filter(|(prediction, record)| record.label() == Some(prediction.label))
        .count();
    correct as f64 / truth.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::record_with_ink;
    use rand::{rngs::SmallRng, SeedableRng};

    fn labeled(n: usize) -> Vec<ImageRecord> {
        (0..n)
            .map(|i| record_with_ink(i, i % 50).with_label((i % 10) as u8))
            .collect()
    }

    #[test]
    fn test_split_sizes_and_disjointness() {
        let mut rng = SmallRng::seed_from_u64(0);
        let (train, holdout) = split_holdout(labeled(100), 0.2, &mut rng).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(holdout.len(), 20);

        let mut ids: Vec<usize> = train.iter().chain(&holdout).map(|r| r.id()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        let ids = |seed| {
            let mut rng = SmallRng::seed_from_u64(seed);
            let (_, holdout) = split_holdout(labeled(50), 0.5, &mut rng).unwrap();
            holdout.iter().map(|r| r.id()).collect::<Vec<_>>()
        };
        assert_eq!(ids(3), ids(3));
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let mut rng = SmallRng::seed_from_u64(0);
        for fraction in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                split_holdout(labeled(10), fraction, &mut rng),
                Err(Error::InvalidHoldout { .. })
            ));
        }
    }

    #[test]
    fn test_accuracy() {
        let truth = labeled(4);
        let predictions = [
            Prediction { id: 0, label: 0 },
            Prediction { id: 1, label: 1 },
            Prediction { id: 2, label: 9 },
            Prediction { id: 3, label: 3 },
        ];
        assert_eq!(accuracy(&predictions, &truth), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }
}
