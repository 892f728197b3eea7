//! Domain types for rfgrid-io.

use std::fmt;
use std::str::FromStr;

use crate::IoError;

/// Ticket class of a passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum PassengerClass {
    First,
    Second,
    Third,
}

impl PassengerClass {
    /// Numeric class, 1 through 3.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }
}

impl FromStr for PassengerClass {
    type Err = IoError;

    /// Accepts `1st`/`2nd`/`3rd` or `1`/`2`/`3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1st" | "1" | "first" => Ok(Self::First),
            "2nd" | "2" | "second" => Ok(Self::Second),
            "3rd" | "3" | "third" => Ok(Self::Third),
            _ => Err(IoError::UnknownLevel {
                field: "pclass",
                raw: s.to_string(),
            }),
        }
    }
}

/// Recorded sex of a passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    /// Feature encoding: female 0, male 1.
    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Female => 0.0,
            Self::Male => 1.0,
        }
    }
}

impl FromStr for Sex {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" | "f" => Ok(Self::Female),
            "male" | "m" => Ok(Self::Male),
            _ => Err(IoError::UnknownLevel {
                field: "sex",
                raw: s.to_string(),
            }),
        }
    }
}

/// Outcome label. `Died` is the first level (class index 0).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Survival {
    Died,
    Survived,
}

impl Survival {
    /// All levels in class-index order.
    pub const LEVELS: [Survival; 2] = [Self::Died, Self::Survived];

    /// Class index used by the classifier.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Died => 0,
            Self::Survived => 1,
        }
    }

    /// Inverse of [`Survival::index`].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::LEVELS.get(index).copied()
    }

    /// Lowercase level name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Died => "died",
            Self::Survived => "survived",
        }
    }
}

impl fmt::Display for Survival {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Survival {
    type Err = IoError;

    /// Accepts `died`/`survived`, `no`/`yes` or `0`/`1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "died" | "no" | "0" => Ok(Self::Died),
            "survived" | "yes" | "1" => Ok(Self::Survived),
            _ => Err(IoError::UnknownLevel {
                field: "survived",
                raw: s.to_string(),
            }),
        }
    }
}

/// One validated passenger record.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Passenger {
    pub pclass: PassengerClass,
    pub survived: Survival,
    pub sex: Sex,
    /// `None` when the age was not recorded.
    pub age: Option<f64>,
    pub sibsp: u32,
    pub parch: u32,
}

/// The loaded passenger records, in file order.
#[derive(Debug, Clone)]
pub struct PassengerDataset {
    passengers: Vec<Passenger>,
}

impl PassengerDataset {
    pub(crate) fn new(passengers: Vec<Passenger>) -> Self {
        Self { passengers }
    }

    /// Return the records.
    #[must_use]
    pub fn passengers(&self) -> &[Passenger] {
        &self.passengers
    }

    /// Return the class index of every record.
    #[must_use]
    pub fn labels(&self) -> Vec<usize> {
        self.passengers.iter().map(|p| p.survived.index()).collect()
    }

    /// Record count per label level, in class-index order.
    #[must_use]
    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(&self.passengers)
    }

    /// Number of records whose age is missing.
    #[must_use]
    pub fn n_missing_age(&self) -> usize {
        self.passengers.iter().filter(|p| p.age.is_none()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.passengers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passengers.is_empty()
    }
}

/// Count records per label level, in class-index order.
#[must_use]
pub fn class_counts(passengers: &[Passenger]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for p in passengers {
        counts[p.survived.index()] += 1;
    }
    counts
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name `{experiment}_{suffix}`.
    pub(crate) fn file_name(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.0)
    }
}

impl fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_in_every_spelling() {
        assert_eq!("1st".parse::<PassengerClass>().unwrap(), PassengerClass::First);
        assert_eq!(" 3 ".parse::<PassengerClass>().unwrap().number(), 3);
        assert_eq!("Female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!("yes".parse::<Survival>().unwrap(), Survival::Survived);
        assert_eq!("0".parse::<Survival>().unwrap(), Survival::Died);
        assert!(matches!(
            "4th".parse::<PassengerClass>(),
            Err(IoError::UnknownLevel { field: "pclass", .. })
        ));
    }

    #[test]
    fn survival_index_round_trips() {
        for level in Survival::LEVELS {
            assert_eq!(Survival::from_index(level.index()), Some(level));
        }
        assert_eq!(Survival::from_index(2), None);
        assert_eq!(Survival::Died.to_string(), "died");
    }

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("titanic-grid_01".to_string()).unwrap();
        assert_eq!(name.as_str(), "titanic-grid_01");
        assert_eq!(name.file_name("results.json"), "titanic-grid_01_results.json");
    }

    #[test]
    fn experiment_name_rejects_empty_and_special_chars() {
        for bad in ["", "my experiment!", "../escape"] {
            assert!(matches!(
                ExperimentName::new(bad.to_string()),
                Err(IoError::InvalidExperimentName { .. })
            ));
        }
    }
}
