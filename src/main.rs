use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use logtriage::config::{AppConfig, DetectionConfig, LogFormat, LoggingConfig, ModelKind};

#[derive(Parser)]
#[command(
    name = "logtriage",
    about = "Lightweight log anomaly triage: error spikes and statistical outliers",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file (default: $LOGTRIAGE_CONFIG, then ./logtriage.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    detection: DetectionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for individual detection options.
#[derive(Args)]
struct DetectionArgs {
    /// Spike bucket width in seconds
    #[arg(long, global = true)]
    window: Option<u32>,

    /// ERROR count a bucket must exceed to be a spike
    #[arg(long, global = true)]
    threshold: Option<usize>,

    /// Expected anomalous fraction for the outlier model
    #[arg(long, global = true)]
    contamination: Option<f64>,

    /// Seed for the outlier model
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Outlier model
    #[arg(long, global = true, value_enum)]
    model: Option<ModelKind>,

    /// Abort on unknown level names instead of skipping the line
    #[arg(long, global = true)]
    strict_levels: bool,
}

impl DetectionArgs {
    fn apply(&self, config: &mut DetectionConfig) {
        if let Some(window) = self.window {
            config.window_size_seconds = window;
        }
        if let Some(threshold) = self.threshold {
            config.spike_threshold = threshold;
        }
        if let Some(contamination) = self.contamination {
            config.contamination = contamination;
        }
        if let Some(seed) = self.seed {
            config.random_seed = seed;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if self.strict_levels {
            config.strict_levels = true;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a log file and print the findings
    Analyze {
        /// Log file to analyze
        file: PathBuf,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Analyze a log file and write an HTML report
    Report {
        /// Log file to analyze
        file: PathBuf,

        /// Output file path
        #[arg(long, default_value = "anomaly_results.html")]
        output: PathBuf,
    },

    /// Serve the live dashboard and JSON API
    Serve {
        /// Bind address
        #[arg(long)]
        bind: Option<String>,

        /// Log file analyzed on every request
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Directory served for non-API paths
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    cli.detection.apply(&mut config.detection);
    init_tracing(&config.logging);

    match cli.command {
        Commands::Analyze { file, json } => {
            tracing::info!(file = %file.display(), "Running analysis");
            let analysis = logtriage::analysis::analyze_file(&file, &config.detection)?;
            let result = &analysis.result;
            if json {
                println!("{}", serde_json::to_string_pretty(&result.report())?);
            } else {
                println!("\n=== Log Anomaly Report: {} ===", file.display());
                println!("Total logs:    {}", result.total_records);
                println!("Skipped lines: {}", analysis.skipped_lines);
                println!(
                    "Outliers:      {} ({:.1}%, {})",
                    result.outlier_anomalies.len(),
                    result.anomaly_rate(),
                    analysis.model_name
                );
                println!("\nLevel distribution:");
                for (level, count) in &result.level_distribution {
                    println!(" - {:<9} {}", level, count);
                }

                println!("\nError spikes ({}s windows):", result.window_size_seconds);
                if result.spike_anomalies.is_empty() {
                    println!(" (none)");
                }
                for spike in &result.spike_anomalies {
                    println!(
                        " - {} : {} ERROR logs",
                        spike.window_start.format(logtriage::parse::DISPLAY_FORMAT),
                        spike.error_count
                    );
                }

                println!("\nOutliers:");
                if result.outlier_anomalies.is_empty() {
                    println!(" (none)");
                }
                for verdict in result.outliers_by_time() {
                    let r = &verdict.record.record;
                    println!(
                        " - {} | {:<8} | {}",
                        r.timestamp.format(logtriage::parse::DISPLAY_FORMAT),
                        r.level,
                        r.message
                    );
                }
                println!();
            }
        }
        Commands::Report { file, output } => {
            tracing::info!(file = %file.display(), output = %output.display(), "Generating report");
            let analysis = logtriage::analysis::analyze_file(&file, &config.detection)?;
            logtriage::report::write_report(&analysis, &output)?;
            println!(
                "Report written to {} ({} anomalies out of {} logs)",
                output.display(),
                analysis.result.outlier_anomalies.len(),
                analysis.result.total_records
            );
        }
        Commands::Serve {
            bind,
            log_file,
            report_dir,
        } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(log_file) = log_file {
                config.server.log_file = log_file;
            }
            if let Some(report_dir) = report_dir {
                config.server.report_dir = report_dir;
            }
            tracing::info!(bind = %config.server.bind, "Starting logtriage dashboard");
            logtriage::serve(&config).await?;
        }
    }

    Ok(())
}
