//! CSV output of a run: the daily case counts and a one-line summary.
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::Path;

use csv::Writer;
use serde::Serialize;
use serde_derive::Deserialize;

use crate::error::StrideError;
use crate::people::HealthCounts;

pub const CASES_FILE: &str = "cases.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist.
fn generate_validate_filepath(path: &Path) -> Result<File, StrideError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(StrideError::StrideError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

/// Writes rows of one type to a CSV file, one row per call to [`ReportWriter::send()`].
pub struct ReportWriter {
    writer: Writer<File>,
}

impl ReportWriter {
    pub fn new(path: &Path) -> Result<ReportWriter, StrideError> {
        let file = generate_validate_filepath(path)?;
        Ok(ReportWriter {
            writer: Writer::from_writer(file),
        })
    }

    pub fn send<T: Serialize>(&mut self, row: &T) -> Result<(), StrideError> {
        self.writer.serialize(row)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Health counts at the end of a simulated day.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CasesRow {
    pub day: u32,
    /// Cumulative: everyone who is or has been infected.
    pub infected: usize,
    pub infectious: usize,
    pub symptomatic: usize,
    pub immune: usize,
}

impl CasesRow {
    pub fn new(day: u32, counts: HealthCounts) -> CasesRow {
        CasesRow {
            day,
            infected: counts.infected,
            infectious: counts.infectious,
            symptomatic: counts.symptomatic,
            immune: counts.immune,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub rng_seed: u64,
    pub num_days: u32,
    pub num_workers: usize,
    pub population: usize,
    pub r0: f64,
    pub transmission_rate: f64,
    pub seeding_rate: f64,
    pub immunity_rate: f64,
    pub total_cases: usize,
    pub run_time_ms: u64,
}
