use std::fmt;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::image::ImageRecord;
use crate::N_CLASSES;

/// Ink-count summary statistics for the training examples of one digit.
///
/// A profile with `count == 0` is degenerate: it has no mean, min or max and
/// the classifier never selects it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassProfile {
    label: u8,
    count: u64,
    sum: u64,
    min: u32,
    max: u32,
}

impl ClassProfile {
    pub fn empty(label: u8) -> Self {
        Self {
            label,
            count: 0,
            sum: 0,
            min: u32::MAX,
            max: 0,
        }
    }

    // Profile of a list of ink counts, mostly useful for building test fixtures
    pub fn from_ink_counts(label: u8, ink_counts: impl IntoIterator<Item = u32>) -> Self {
        ink_counts
            .into_iter()
            .fold(Self::empty(label), |mut profile, ink| {
                profile.add(ink);
                profile
            })
    }

    pub fn add(&mut self, ink: u32) {
        self.count += 1;
        self.sum += ink as u64;
        self.min = self.min.min(ink);
        self.max = self.max.max(ink);
    }

    pub fn merge(&mut self, other: &ClassProfile) {
        debug_assert_eq!(self.label, other.label);
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn label(&self) -> u8 {
        self.label
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_degenerate(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> Option<f64> {
        (!self.is_degenerate()).then(|| self.sum as f64 / self.count as f64)
    }

    pub fn min(&self) -> Option<u32> {
        (!self.is_degenerate()).then_some(self.min)
    }

    pub fn max(&self) -> Option<u32> {
        (!self.is_degenerate()).then_some(self.max)
    }
}

impl fmt::Display for ClassProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mean(), self.min(), self.max()) {
            (Some(mean), Some(min), Some(max)) => write!(
                f,
                "count={}, min={}, average={:.6}, max={}",
                self.count, min, mean, max
            ),
            _ => write!(f, "count=0 (no training examples)"),
        }
    }
}

/// One profile per digit, indexed by label.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassProfiles {
    profiles: [ClassProfile; N_CLASSES],
}

impl ClassProfiles {
    pub fn empty() -> Self {
        Self {
            profiles: array_init::array_init(|label| ClassProfile::empty(label as u8)),
        }
    }

    // Wrap prebuilt profiles; position i must hold the profile for label i
    pub fn from_profiles(profiles: [ClassProfile; N_CLASSES]) -> Self {
        debug_assert!(profiles
            .iter()
            .enumerate()
            .all(|(i, profile)| profile.label as usize == i));
        Self { profiles }
    }

    /// Aggregate the ink counts of a labeled training set, one profile per digit.
    ///
    /// Every record must carry a label. Digits without examples get a degenerate
    /// profile and a warning; use [`ClassProfiles::validate`] to treat that as an error.
    pub fn build(training: &[ImageRecord]) -> Result<Self> {
        // Each worker folds into its own accumulators, which are then merged pairwise
        let profiles = training
            .par_iter()
            .try_fold(Self::empty, |mut profiles, record| -> Result<Self> {
                let label = record
                    .label()
                    .ok_or(Error::UnlabeledTrainingRecord { id: record.id() })?;
                profiles.profiles[label as usize].add(record.ink_count());
                Ok(profiles)
            })
            .try_reduce(Self::empty, |mut a, b| {
                a.merge(&b);
                Ok(a)
            })?;

        for profile in profiles.degenerate() {
            warn!("{}", Error::InvalidClassProfile { label: profile.label });
        }
        debug!("Built class profiles from {} training examples", training.len());
        Ok(profiles)
    }

    fn merge(&mut self, other: &ClassProfiles) {
        self.profiles
            .iter_mut()
            .zip(other.profiles.iter())
            .for_each(|(a, b)| a.merge(b));
    }

    pub fn get(&self, label: u8) -> &ClassProfile {
        &self.profiles[label as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassProfile> {
        self.profiles.iter()
    }

    pub fn degenerate(&self) -> impl Iterator<Item = &ClassProfile> {
        self.iter().filter(|profile| profile.is_degenerate())
    }

    // Fails on the lowest digit that has no training examples
    pub fn validate(&self) -> Result<()> {
        match self.degenerate().next() {
            Some(profile) => Err(Error::InvalidClassProfile {
                label: profile.label,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ClassProfiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for profile in self.iter() {
            writeln!(f, "{}  ->  {}", profile.label, profile)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::record_with_ink;
    use proptest::prelude::*;

    fn training_set(examples: &[(u8, usize)]) -> Vec<ImageRecord> {
        examples
            .iter()
            .enumerate()
            .map(|(id, &(label, ink))| record_with_ink(id, ink).with_label(label))
            .collect()
    }

    #[test]
    fn test_build_statistics() {
        let mut examples = vec![(3, 10), (3, 20), (3, 60), (5, 7)];
        examples.extend((0..10).filter(|&l| l != 3 && l != 5).map(|l| (l, 1)));
        let profiles = ClassProfiles::build(&training_set(&examples)).unwrap();

        let three = profiles.get(3);
        assert_eq!(three.count(), 3);
        assert_eq!(three.mean(), Some(30.0));
        assert_eq!(three.min(), Some(10));
        assert_eq!(three.max(), Some(60));

        let five = profiles.get(5);
        assert_eq!(five.count(), 1);
        assert_eq!(five.mean(), Some(7.0));
        assert!(profiles.validate().is_ok());
    }

    #[test]
    fn test_missing_class_is_degenerate() {
        let profiles = ClassProfiles::build(&training_set(&[(0, 5), (1, 6)])).unwrap();
        assert_eq!(profiles.degenerate().count(), 8);
        let two = profiles.get(2);
        assert!(two.is_degenerate());
        assert_eq!(two.mean(), None);
        assert_eq!(two.min(), None);
        assert_eq!(two.max(), None);
        assert!(matches!(
            profiles.validate(),
            Err(Error::InvalidClassProfile { label: 2 })
        ));
    }

    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_missing_class_logs_warning() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let examples: Vec<(u8, usize)> = (0..10).filter(|&l| l != 6).map(|l| (l, 3)).collect();
        tracing::subscriber::with_default(subscriber, || {
            ClassProfiles::build(&training_set(&examples)).unwrap();
        });

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("No training examples for class 6"));
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_unlabeled_training_record_is_rejected() {
        let mut training = training_set(&[(0, 5), (1, 6)]);
        training.push(record_with_ink(2, 9));
        assert!(matches!(
            ClassProfiles::build(&training),
            Err(Error::UnlabeledTrainingRecord { id: 2 })
        ));
    }

    #[test]
    fn test_display_matches_report_layout() {
        let profile = ClassProfile::from_ink_counts(4, [10, 20]);
        assert_eq!(
            profile.to_string(),
            "count=2, min=10, average=15.000000, max=20"
        );
        let report = ClassProfiles::empty().to_string();
        assert_eq!(report.lines().count(), 10);
        assert!(report.starts_with("0  ->  count=0"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_profile_matches_ink_counts(
            examples in prop::collection::vec((0_u8..10, 0_usize..=784), 1..60),
        ) {
            let profiles = ClassProfiles::build(&training_set(&examples)).unwrap();
            for label in 0..10_u8 {
                let inks: Vec<u32> = examples
                    .iter()
                    .filter(|(l, _)| *l == label)
                    .map(|&(_, ink)| ink as u32)
                    .collect();
                let profile = profiles.get(label);
                prop_assert_eq!(profile.count(), inks.len() as u64);
                if inks.is_empty() {
                    prop_assert!(profile.is_degenerate());
                } else {
                    let mean = inks.iter().sum::<u32>() as f64 / inks.len() as f64;
                    prop_assert!((profile.mean().unwrap() - mean).abs() < 1e-9);
                    prop_assert_eq!(profile.min(), inks.iter().min().copied());
                    prop_assert_eq!(profile.max(), inks.iter().max().copied());
                }
            }
        }
    }
}
