use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{BracketTable, BracketTableError, TaxBracket};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading bracket schedules.
#[derive(Debug, Error)]
pub enum BracketLoaderError {
    #[error("cannot open '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("no {0} brackets in the file")]
    MissingSchedule(Schedule),

    #[error("invalid {schedule} schedule: {source}")]
    InvalidTable {
        schedule: Schedule,
        #[source]
        source: BracketTableError,
    },
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// Which schedule a CSV row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    Annual,
    Monthly,
}

impl fmt::Display for Schedule {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Schedule::Annual => f.write_str("annual"),
            Schedule::Monthly => f.write_str("monthly"),
        }
    }
}

/// A single row of the brackets CSV file.
///
/// - `schedule`: `annual` or `monthly`
/// - `upper_bound`: inclusive upper bound (empty for the top bracket)
/// - `rate`: marginal rate as a decimal (e.g. `0.075`)
/// - `deduction`: amount subtracted after applying the rate
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub schedule: Schedule,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    pub deduction: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// The pair of schedules the income tax calculator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketTables {
    pub annual: BracketTable,
    pub monthly: BracketTable,
}

/// Loader for bracket schedules stored as CSV.
///
/// Rows for each schedule must appear in ascending order of upper bound;
/// the rows of the two schedules may be interleaved.
pub struct BracketTableLoader;

impl BracketTableLoader {
    /// Parse bracket rows from any reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Split parsed rows into the annual and monthly tables and validate each.
    pub fn build(records: &[BracketRecord]) -> Result<BracketTables, BracketLoaderError> {
        Ok(BracketTables {
            annual: Self::table_for(records, Schedule::Annual)?,
            monthly: Self::table_for(records, Schedule::Monthly)?,
        })
    }

    /// Read, parse and validate a CSV file in one go.
    pub fn load_file(path: &Path) -> Result<BracketTables, BracketLoaderError> {
        let file = File::open(path).map_err(|source| BracketLoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records = Self::parse(file)?;
        debug!(path = %path.display(), rows = records.len(), "bracket file parsed");
        Self::build(&records)
    }

    fn table_for(
        records: &[BracketRecord],
        schedule: Schedule,
    ) -> Result<BracketTable, BracketLoaderError> {
        let brackets: Vec<TaxBracket> = records
            .iter()
            .filter(|r| r.schedule == schedule)
            .map(|r| TaxBracket::new(r.upper_bound, r.rate, r.deduction))
            .collect();

        if brackets.is_empty() {
            return Err(BracketLoaderError::MissingSchedule(schedule));
        }

        BracketTable::new(brackets)
            .map_err(|source| BracketLoaderError::InvalidTable { schedule, source })
    }
}
