mod config;
mod logging;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use curator_engine::{
    build_bundles, publish_with_retry, Bucket, BundleSummary, Classifier, DecodeProbe,
    DryRunPublisher, FetchSettings, HttpFetcher, HttpPageRenderer, Pipeline, PipelineSettings,
    RetryPolicy, RunSummary, SourceKind, SourceSpec,
};
use pipeline_logging::set_active_source;

use crate::config::{AppConfig, CONFIG_FILE};
use crate::logging::LogDestination;

#[derive(Parser)]
#[command(name = "curator", about = "Harvest, package and publish archive datasets")]
struct Cli {
    /// Path to the RON config file
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Enable debug-level logging
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured sources
    Sources,
    /// Harvest one source into its raw directory
    Harvest {
        /// Source id from the config
        #[arg(short, long)]
        source: String,
    },
    /// Rebuild dataset bundles from a source's raw directory
    Package {
        #[arg(short, long)]
        source: String,
    },
    /// Upload a source's bundles to the dataset host
    Publish {
        #[arg(short, long)]
        source: String,
        /// Restrict to one bucket (images, audio, documents)
        #[arg(short, long)]
        bucket: Option<String>,
    },
    /// Harvest + package + publish in one pipeline
    Run {
        #[arg(short, long)]
        source: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(LogDestination::Both, cli.verbose);

    let config = AppConfig::load(&cli.config);

    match cli.command {
        Commands::Sources => {
            for source in &config.sources {
                let kind = match &source.kind {
                    SourceKind::Catalogue(_) => "catalogue",
                    SourceKind::WordPressApi(_) => "wordpress",
                };
                println!("{:<20} {:<10} {}", source.id, kind, source.name);
            }
            Ok(())
        }
        Commands::Harvest { source } => {
            let source = lookup(&config, &source)?;
            let summary = harvest_source(&config, source).await?;
            print_run(&summary);
            Ok(())
        }
        Commands::Package { source } => {
            let source = lookup(&config, &source)?;
            let summaries = package_source(&config, source)?;
            print_bundles(&summaries);
            Ok(())
        }
        Commands::Publish { source, bucket } => {
            let source = lookup(&config, &source)?;
            let buckets = match bucket {
                Some(name) => vec![parse_bucket(&name)?],
                None => Bucket::KEPT.to_vec(),
            };
            publish_source(&config, source, &buckets).await
        }
        Commands::Run { source } => {
            let source = lookup(&config, &source)?;
            let summary = harvest_source(&config, source).await?;
            print_run(&summary);
            let summaries = package_source(&config, source)?;
            print_bundles(&summaries);
            publish_source(&config, source, &Bucket::KEPT).await
        }
    }
}

fn lookup<'a>(config: &'a AppConfig, id: &str) -> anyhow::Result<&'a SourceSpec> {
    config
        .find_source(id)
        .with_context(|| format!("unknown source '{id}'; see 'curator sources'"))
}

fn parse_bucket(name: &str) -> anyhow::Result<Bucket> {
    match name {
        "images" => Ok(Bucket::Image),
        "audio" => Ok(Bucket::Audio),
        "documents" => Ok(Bucket::Document),
        other => bail!("unknown bucket '{other}' (expected images, audio or documents)"),
    }
}

async fn harvest_source(config: &AppConfig, source: &SourceSpec) -> anyhow::Result<RunSummary> {
    set_active_source(&source.id);
    let layout = config.layout_for(source);

    let fetcher = HttpFetcher::new(FetchSettings::default())
        .context("failed to construct HTTP client")?;
    let renderer = HttpPageRenderer::new(fetcher.clone());
    let probe = DecodeProbe;
    let classifier = Classifier::default();

    let pipeline = Pipeline::new(
        &renderer,
        &fetcher,
        &probe,
        &classifier,
        &layout,
        PipelineSettings::default(),
    );
    let summary = pipeline
        .run_source(source)
        .await
        .with_context(|| format!("harvest of '{}' failed", source.id))?;
    Ok(summary)
}

fn package_source(
    config: &AppConfig,
    source: &SourceSpec,
) -> anyhow::Result<Vec<BundleSummary>> {
    set_active_source(&source.id);
    let layout = config.layout_for(source);
    build_bundles(&layout, &DecodeProbe)
        .with_context(|| format!("packaging of '{}' failed", source.id))
}

async fn publish_source(
    config: &AppConfig,
    source: &SourceSpec,
    buckets: &[Bucket],
) -> anyhow::Result<()> {
    set_active_source(&source.id);
    let layout = config.layout_for(source);
    let publisher = DryRunPublisher;
    let policy = RetryPolicy {
        attempts: config.publish.attempts,
        backoff: Duration::from_secs(config.publish.backoff_secs),
    };

    let mut failures = 0usize;
    for &bucket in buckets {
        let Some(dir) = layout.bundle_dir(bucket) else {
            continue;
        };
        if !dir.join("data.jsonl").exists() {
            println!("No {bucket} bundle for '{}'; run 'package' first.", source.id);
            continue;
        }
        let media = bucket.dir_name().unwrap_or("bundle");
        let repo_id = config
            .repo_id(source, bucket)
            .unwrap_or_else(|| format!("dry-run/{}-{media}", source.id));
        if publish_with_retry(&publisher, &dir, &repo_id, policy).await.is_err() {
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{failures} bundle(s) failed to publish");
    }
    Ok(())
}

fn print_run(summary: &RunSummary) {
    println!(
        "{}: {} items discovered, {} records written, {} skipped, {} assets saved",
        summary.source_id,
        summary.items_discovered,
        summary.records_written,
        summary.items_skipped,
        summary.assets_saved
    );
}

fn print_bundles(summaries: &[BundleSummary]) {
    for summary in summaries {
        println!(
            "{:<10} {:>5} records {:>5} assets  {}",
            summary.bucket.to_string(),
            summary.records,
            summary.assets,
            summary.dir.display()
        );
    }
}
