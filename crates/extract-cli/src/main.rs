//! extract: provision a bucket and copy a remote file into it.
//!
//! Configuration comes from the environment (and `.env`): S3_BUCKET, S3_REGION,
//! PIPELINE_URL, STORAGE_BACKEND, S3_ENDPOINT, AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY,
//! LOCAL_STORAGE_PATH, LOG_FORMAT.

use anyhow::Context;
use clap::{Parser, Subcommand};
use extract_cli::{describe_dag, parse_locator_for, print_json};
use extract_core::Config;
use extract_infra::{build_http_client, init_telemetry, shutdown_telemetry};
use extract_pipeline::{example_dag, DagRun};
use extract_storage::create_storage;

#[derive(Parser)]
#[command(name = "extract", about = "Bucket provisioning and URL-to-storage transfer pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once and print the run report
    Run {
        /// Source URL (overrides PIPELINE_URL)
        #[arg(long)]
        url: Option<String>,
        /// Destination bucket (overrides S3_BUCKET)
        #[arg(long)]
        s3_bucket: Option<String>,
        /// Region for bucket creation (overrides S3_REGION)
        #[arg(long)]
        region: Option<String>,
    },
    /// Print the task graph
    Show {
        /// Print Graphviz DOT instead of JSON
        #[arg(long)]
        dot: bool,
    },
    /// Check whether an object exists, given its locator (e.g. s3://test-bucket/extract/deniro.csv)
    CheckKey {
        /// Object locator
        locator: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;

    init_telemetry(config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    let result = match cli.command {
        Commands::Run {
            url,
            s3_bucket,
            region,
        } => {
            config.params = config.params.with_overrides(url, s3_bucket, region);
            run(&config).await
        }
        Commands::Show { dot } => {
            let dag = example_dag(config.params.clone(), config.retry)?;
            if dot {
                println!("{}", dag.to_dot());
                Ok(())
            } else {
                print_json(&describe_dag(&dag)?)
            }
        }
        Commands::CheckKey { locator } => check_key(&config, &locator).await,
    };

    shutdown_telemetry().await;
    result
}

async fn run(config: &Config) -> anyhow::Result<()> {
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        url = %config.params.url,
        bucket = %config.params.s3_bucket,
        region = %config.params.region,
        backend = %config.storage.backend,
        "Starting pipeline run"
    );

    let storage = create_storage(&config.storage, &config.params.region)
        .await
        .context("Failed to create storage backend")?;
    let http = build_http_client(&config.http)?;

    let dag = example_dag(config.params.clone(), config.retry)?;
    let report = DagRun::with_dag_params(&dag, storage, http)
        .execute()
        .await?;

    print_json(&report)?;

    if !report.is_success() {
        anyhow::bail!("DAG run {} failed", report.run_id);
    }
    Ok(())
}

async fn check_key(config: &Config, locator: &str) -> anyhow::Result<()> {
    let locator = parse_locator_for(locator, config.storage.backend)?;

    let storage = create_storage(&config.storage, &config.params.region)
        .await
        .context("Failed to create storage backend")?;
    let exists = storage
        .object_exists(locator.bucket(), locator.key())
        .await
        .with_context(|| format!("Failed to check {}", locator))?;

    print_json(&serde_json::json!({ "locator": locator, "exists": exists }))?;

    if !exists {
        anyhow::bail!("Object {} not found", locator);
    }
    Ok(())
}
