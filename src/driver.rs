//! Fetch → select → normalize → publish, one template at a time.
use std::collections::HashSet;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::fetcher::fetch_all_templates;
use crate::graph::{GraphApi, GraphError};
use crate::model::Template;
use crate::normalizer::normalize_template;
use crate::publisher::publish_template;
use crate::record::{MigrationRecord, RecordStatus};

/// Inputs of one migration run, usually built from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub source_account: String,
    pub target_account: String,
    pub template_names: Vec<String>,
    pub skip_existing: bool,
}

impl From<&Config> for MigrationPlan {
    fn from(cfg: &Config) -> Self {
        Self {
            source_account: cfg.source_account.clone(),
            target_account: cfg.target_account.clone(),
            template_names: cfg.template_names.clone(),
            skip_existing: cfg.skip_existing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub run_id: Uuid,
    pub records: Vec<MigrationRecord>,
    /// Allow-listed names absent from the source listing.
    pub not_found: Vec<String>,
    /// Allow-listed names skipped because the destination already has them.
    pub skipped_existing: Vec<String>,
}

impl MigrationReport {
    pub fn nothing_to_migrate(&self) -> bool {
        self.records.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.count(RecordStatus::Ok)
    }

    pub fn failed(&self) -> usize {
        self.count(RecordStatus::Error)
    }

    pub fn degraded(&self) -> usize {
        self.records.iter().filter(|r| r.is_degraded()).count()
    }

    fn count(&self, status: RecordStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}

/// Templates whose name is allow-listed and not in `existing`, in listing order.
pub fn select_templates<'a>(
    source: &'a [Template],
    allow_list: &[String],
    existing: &HashSet<String>,
) -> Vec<&'a Template> {
    let allowed: HashSet<&str> = allow_list.iter().map(String::as_str).collect();
    source
        .iter()
        .filter(|t| allowed.contains(t.name.as_str()))
        .filter(|t| !existing.contains(&t.name))
        .collect()
}

/// Run one migration. Only listing failures are returned as errors; every
/// per-template outcome ends up in the report.
#[instrument(skip_all, fields(source = %plan.source_account, target = %plan.target_account))]
pub async fn run_migration(
    api: &dyn GraphApi,
    plan: &MigrationPlan,
) -> Result<MigrationReport, GraphError> {
    let run_id = Uuid::new_v4();
    info!(%run_id, names = plan.template_names.len(), "fetching source templates");
    let source = fetch_all_templates(api, &plan.source_account).await?;

    let existing: HashSet<String> = if plan.skip_existing {
        info!("fetching destination templates");
        fetch_all_templates(api, &plan.target_account)
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect()
    } else {
        HashSet::new()
    };

    let not_found: Vec<String> = plan
        .template_names
        .iter()
        .filter(|name| !source.iter().any(|t| &t.name == *name))
        .cloned()
        .collect();
    for name in &not_found {
        warn!(template = %name, "template not found in source account");
    }
    let skipped_existing: Vec<String> = plan
        .template_names
        .iter()
        .filter(|name| existing.contains(*name))
        .cloned()
        .collect();
    for name in &skipped_existing {
        info!(template = %name, "already present at destination, skipping");
    }

    let selected = select_templates(&source, &plan.template_names, &existing);
    let mut report = MigrationReport {
        run_id,
        records: Vec::with_capacity(selected.len()),
        not_found,
        skipped_existing,
    };
    if selected.is_empty() {
        info!("nothing to migrate");
        return Ok(report);
    }

    for template in selected {
        info!(template = %template.name, language = %template.language, "migrating template");
        let normalized = normalize_template(api, template, &plan.target_account).await;
        let outcome = publish_template(api, &plan.target_account, &normalized.template).await;
        let record = MigrationRecord::from_outcome(run_id, &normalized, &outcome);
        match (record.status, record.is_degraded()) {
            (RecordStatus::Ok, false) => info!(template = %record.name, "template migrated"),
            (RecordStatus::Ok, true) => {
                warn!(template = %record.name, "template migrated without header media")
            }
            (RecordStatus::Error, _) => error!(template = %record.name, "template migration failed"),
        }
        report.records.push(record);
    }

    info!(
        ok = report.succeeded(),
        failed = report.failed(),
        degraded = report.degraded(),
        "migration finished"
    );
    Ok(report)
}
