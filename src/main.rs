use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use waba_template_migrator::config::Config;
use waba_template_migrator::driver::{run_migration, MigrationPlan, MigrationReport};
use waba_template_migrator::dry_run::DryRunGraph;
use waba_template_migrator::graph::{GraphApi, GraphClient};
use waba_template_migrator::record;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Copy WhatsApp message templates from one business account to another"
)]
struct Args {
    /// Env file to load before reading the environment (default: ./.env if present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// CSV file receiving one row per attempted template (overrides LOG_FILE)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Truncate the log file instead of appending to it
    #[arg(long)]
    overwrite_log: bool,

    /// Also migrate templates whose name already exists at the destination
    #[arg(long)]
    include_existing: bool,

    /// List both accounts but print create payloads instead of uploading or creating anything
    #[arg(long)]
    dry_run: bool,

    /// Per-request HTTP timeout in seconds (overrides HTTP_TIMEOUT_SECS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(args.env_file.as_deref())?;
    if let Some(path) = args.log_file.clone() {
        cfg.log_file = path;
    }
    if args.include_existing {
        cfg.skip_existing = false;
    }
    if let Some(secs) = args.timeout_secs {
        cfg.api.timeout = Duration::from_secs(secs);
    }

    let client = GraphClient::new(&cfg.api)?;
    let plan = MigrationPlan::from(&cfg);
    info!(
        source = %plan.source_account,
        target = %plan.target_account,
        templates = ?plan.template_names,
        skip_existing = plan.skip_existing,
        dry_run = args.dry_run,
        "starting template migration"
    );

    let report = if args.dry_run {
        migrate(&DryRunGraph::new(client), &plan).await?
    } else {
        migrate(&client, &plan).await?
    };

    if report.nothing_to_migrate() {
        println!("Nothing to migrate.");
        return Ok(());
    }

    if args.dry_run {
        info!("dry run: log file not written");
    } else {
        record::write_log(&cfg.log_file, &report.records, !args.overwrite_log)
            .with_context(|| format!("failed to write log file {}", cfg.log_file.display()))?;
        info!(path = %cfg.log_file.display(), "migration log written");
    }

    print_summary(&report);
    Ok(())
}

async fn migrate(api: &dyn GraphApi, plan: &MigrationPlan) -> Result<MigrationReport> {
    run_migration(api, plan).await.map_err(|err| {
        error!(error = %err, "template listing failed, aborting");
        anyhow::Error::new(err).context("failed to list templates")
    })
}

fn print_summary(report: &MigrationReport) {
    for r in &report.records {
        let marker = match (r.status, r.is_degraded()) {
            (record::RecordStatus::Ok, false) => "OK      ",
            (record::RecordStatus::Ok, true) => "DEGRADED",
            (record::RecordStatus::Error, _) => "ERROR   ",
        };
        println!("{} {} [{}]", marker, r.name, r.language);
        if let Some(err) = &r.error {
            println!("         {}", err);
        }
        for media_err in &r.media_errors {
            println!("         media: {}", media_err);
        }
    }
    for name in &report.not_found {
        println!("MISSING  {} (not in source account)", name);
    }
    println!(
        "{} migrated, {} failed, {} without header media (run {})",
        report.succeeded(),
        report.failed(),
        report.degraded(),
        report.run_id
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Args::try_parse_from(["waba-template-migrator", "--timeout-secs", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn positive_timeout_is_accepted() {
        let args = Args::try_parse_from(["waba-template-migrator", "--timeout-secs", "5"]).unwrap();
        assert_eq!(args.timeout_secs, Some(5));
    }
}
