use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use waba_template_migrator::config::ApiSettings;
use waba_template_migrator::fetcher::fetch_all_templates;
use waba_template_migrator::graph::GraphClient;

#[derive(Parser, Debug)]
#[command(about = "Print every message template of a business account")]
struct Args {
    /// Business account (WABA) id to list
    #[arg(long)]
    account: String,

    /// Env file providing ACCESS_TOKEN and optional GRAPH_API_URL
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let settings = ApiSettings::load(args.env_file.as_deref())?;
    let client = GraphClient::new(&settings)?;

    let templates = fetch_all_templates(&client, &args.account).await?;
    println!("Account: {} ({} templates)", args.account, templates.len());
    for t in templates {
        println!(
            "  {} [{}] {} -> {}",
            t.name,
            t.language,
            t.category,
            t.component_kinds().join(", ")
        );
    }
    Ok(())
}
