//! One row per attempted template, written to a CSV file when the run ends.
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::normalizer::NormalizedTemplate;
use crate::publisher::PublishOutcome;

const CSV_HEADERS: &[&str] = &[
    "Run ID",
    "Timestamp",
    "Template Name",
    "Language",
    "Category",
    "Status",
    "Components",
    "Media Handle",
    "Media Error",
    "Buttons",
    "Dropped Buttons",
    "Error",
];

#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Ok,
    Error,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Ok => "OK",
            RecordStatus::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub run_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub name: String,
    pub language: String,
    pub category: String,
    pub status: RecordStatus,
    pub components: Vec<String>,
    pub media_handles: Vec<String>,
    /// Header media that could not be moved; the template went out degraded.
    pub media_errors: Vec<String>,
    pub buttons: Vec<String>,
    pub dropped_buttons: Vec<String>,
    /// Upstream response body, verbatim, when publishing failed.
    pub error: Option<String>,
}

impl MigrationRecord {
    pub fn from_outcome(run_id: Uuid, normalized: &NormalizedTemplate, outcome: &PublishOutcome) -> Self {
        let (status, error) = match outcome {
            PublishOutcome::Created { .. } => (RecordStatus::Ok, None),
            PublishOutcome::Rejected { body, .. } => (RecordStatus::Error, Some(body.clone())),
        };
        let template = &normalized.template;
        MigrationRecord {
            run_id,
            recorded_at: Utc::now(),
            name: template.name.clone(),
            language: template.language.clone(),
            category: template.category.to_string(),
            status,
            components: normalized.source_kinds.clone(),
            media_handles: normalized
                .media_handles()
                .into_iter()
                .map(|h| h.to_string())
                .collect(),
            media_errors: normalized.media_errors().into_iter().map(str::to_string).collect(),
            buttons: normalized.buttons.clone(),
            dropped_buttons: normalized.dropped_buttons.clone(),
            error,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.media_errors.is_empty()
    }

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.run_id.to_string(),
            self.recorded_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.name.clone(),
            self.language.clone(),
            self.category.clone(),
            self.status.as_str().to_string(),
            self.components.join(", "),
            self.media_handles.join(", "),
            self.media_errors.join("; "),
            self.buttons.join(", "),
            self.dropped_buttons.join(", "),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

/// Write `records` to `path`. In append mode the header row is written only
/// when the file is new or empty. Nothing is written for an empty run.
pub fn write_log(path: &Path, records: &[MigrationRecord], append: bool) -> Result<(), LogError> {
    if records.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    let needs_header = !append || file.metadata()?.len() == 0;

    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    if needs_header {
        wtr.write_record(CSV_HEADERS)?;
    }
    for record in records {
        wtr.write_record(record.csv_row())?;
    }
    wtr.flush()?;
    Ok(())
}
