//! Outcome records for pipeline runs.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Step;

/// A step as it would run, with credentials masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCommand {
    pub step: Step,
    pub command: String,
}

/// A completed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: Step,
    pub command: String,
    pub duration_ms: u64,
    pub output_lines: usize,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub work_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn total_duration_ms(&self) -> u64 {
        self.steps.iter().map(|record| record.duration_ms).sum()
    }
}
