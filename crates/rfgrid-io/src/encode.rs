//! Numeric feature encoding with train-fitted age imputation.

use tracing::debug;

use crate::IoError;
use crate::domain::Passenger;

/// Feature column names, in matrix column order.
pub const FEATURE_NAMES: [&str; 5] = ["pclass", "age", "sex", "sibsp", "parch"];

/// Turns passenger records into a row-major feature matrix.
///
/// Missing ages are replaced by the median age of the records the encoder
/// was fitted on, so fitting on the train partition alone keeps test
/// information out of training.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct FeatureEncoder {
    median_age: f64,
}

impl FeatureEncoder {
    /// Fit the imputation value on `passengers`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::NoKnownAges`] when no record has an age.
    pub fn fit(passengers: &[Passenger]) -> Result<Self, IoError> {
        let mut ages: Vec<f64> = passengers.iter().filter_map(|p| p.age).collect();
        if ages.is_empty() {
            return Err(IoError::NoKnownAges {
                n_records: passengers.len(),
            });
        }
        ages.sort_by(f64::total_cmp);
        let mid = ages.len() / 2;
        let median_age = if ages.len() % 2 == 0 {
            (ages[mid - 1] + ages[mid]) / 2.0
        } else {
            ages[mid]
        };
        debug!(median_age, n_known = ages.len(), "age imputation fitted");
        Ok(Self { median_age })
    }

    /// The imputed age.
    #[must_use]
    pub fn median_age(&self) -> f64 {
        self.median_age
    }

    /// Encode one record as `[pclass, age, sex, sibsp, parch]`.
    #[must_use]
    pub fn encode_one(&self, p: &Passenger) -> Vec<f64> {
        vec![
            f64::from(p.pclass.number()),
            p.age.unwrap_or(self.median_age),
            p.sex.code(),
            f64::from(p.sibsp),
            f64::from(p.parch),
        ]
    }

    /// Encode every record.
    #[must_use]
    pub fn encode(&self, passengers: &[Passenger]) -> Vec<Vec<f64>> {
        passengers.iter().map(|p| self.encode_one(p)).collect()
    }

    /// Column names matching [`FeatureEncoder::encode`].
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        FEATURE_NAMES.iter().map(ToString::to_string).collect()
    }
}

/// Class index of every record.
#[must_use]
pub fn encode_labels(passengers: &[Passenger]) -> Vec<usize> {
    passengers.iter().map(|p| p.survived.index()).collect()
}
