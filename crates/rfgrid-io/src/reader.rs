//! CSV passenger reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{Passenger, PassengerClass, PassengerDataset, Sex, Survival};

/// Columns that must appear in the header; any others are ignored.
pub const REQUIRED_COLUMNS: [&str; 6] = ["pclass", "survived", "sex", "age", "sibsp", "parch"];

/// Age cells treated as not recorded.
const MISSING_AGE: [&str; 4] = ["", "na", "nan", "?"];

/// One CSV row as text, before validation.
#[derive(Debug, serde::Deserialize)]
struct RawPassenger {
    pclass: String,
    survived: String,
    sex: String,
    age: Option<String>,
    sibsp: String,
    parch: String,
}

/// Reads passenger records from a CSV file.
///
/// Expected CSV format:
/// - Header row required, containing at least [`REQUIRED_COLUMNS`] in any order
/// - `pclass` is `1st|2nd|3rd` or `1|2|3`
/// - `survived` is `died|survived`, `no|yes` or `0|1`
/// - `sex` is `male|female`, case-insensitive
/// - `age` is a non-negative number, or empty/`NA` when unknown
/// - `sibsp` and `parch` are non-negative integers
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | A required column is absent from the header |
/// | [`IoError::InvalidValue`] | A cell cannot be interpreted |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
pub struct PassengerReader {
    path: PathBuf,
}

impl PassengerReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }

    fn invalid(&self, row_index: usize, column: &'static str, raw: &str) -> IoError {
        IoError::InvalidValue {
            path: self.path.clone(),
            row_index,
            column,
            raw: raw.to_string(),
        }
    }

    /// Read and validate the CSV file, returning a [`PassengerDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<PassengerDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        for column in REQUIRED_COLUMNS {
            if !header.iter().any(|h| h == column) {
                return Err(IoError::MissingColumn {
                    path: self.path.clone(),
                    column,
                });
            }
        }
        debug!(n_columns = header.len(), "read CSV header");

        let mut passengers = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let raw: RawPassenger = record
                .deserialize(Some(&header))
                .map_err(|e| self.csv_error(e))?;
            passengers.push(self.validate(row_index, raw)?);
        }

        if passengers.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let dataset = PassengerDataset::new(passengers);
        info!(
            n_records = dataset.len(),
            n_missing_age = dataset.n_missing_age(),
            class_counts = ?dataset.class_counts(),
            "passenger dataset loaded"
        );
        Ok(dataset)
    }

    fn validate(&self, row_index: usize, raw: RawPassenger) -> Result<Passenger, IoError> {
        let pclass: PassengerClass = raw
            .pclass
            .parse()
            .map_err(|_| self.invalid(row_index, "pclass", &raw.pclass))?;
        let survived: Survival = raw
            .survived
            .parse()
            .map_err(|_| self.invalid(row_index, "survived", &raw.survived))?;
        let sex: Sex = raw
            .sex
            .parse()
            .map_err(|_| self.invalid(row_index, "sex", &raw.sex))?;

        let age = match raw.age.as_deref().map(str::trim) {
            None => None,
            Some(text) if MISSING_AGE.contains(&text.to_ascii_lowercase().as_str()) => None,
            Some(text) => match text.parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
                _ => return Err(self.invalid(row_index, "age", text)),
            },
        };

        let count = |column: &'static str, text: &str| {
            text.parse::<u32>()
                .map_err(|_| self.invalid(row_index, column, text))
        };

        Ok(Passenger {
            pclass,
            survived,
            sex,
            age,
            sibsp: count("sibsp", &raw.sibsp)?,
            parch: count("parch", &raw.parch)?,
        })
    }
}
