//! Influx Series CLI
//!
//! Command-line interface for measurement queries:
//! - Render or run paged queries
//! - List measurements
//! - Create the configured database
//! - Generate a config file

use anyhow::{bail, Context};
use chrono::Duration;
use clap::{Parser, Subcommand};
use influx_series::config::{generate_default_config, Config, LoggingConfig};
use influx_series::context::{InfluxClient, MeasurementInfo, SerieContext, SerieContextFactory};
use influx_series::series::{camel_case, write_page_json, NameMapper, Paging};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "influx-series")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Paged queries over InfluxDB measurements")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: user config dir, /etc/influx-series, ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database override
    #[arg(long, global = true)]
    pub database: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query one page of a measurement
    Query {
        /// Measurement name (case-insensitive)
        measurement: String,
        /// Time range (e.g., 30s, 5m, 6h, 7d, 2w)
        #[arg(short, long, default_value = "1h")]
        last: String,
        /// Tags selected before the fields (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Fields to select; skips the schema lookup when given
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Average every field over buckets of this size (e.g., 5m)
        #[arg(long)]
        mean: Option<String>,
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: i64,
        /// Rows per page
        #[arg(short = 's', long, default_value = "10")]
        page_size: i64,
        /// Rename columns to camelCase
        #[arg(long)]
        camel_case: bool,
        /// Print the statements instead of running them
        #[arg(long)]
        dry_run: bool,
    },

    /// List measurements of the database
    Measurements,

    /// Create the database if it does not exist
    Init,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(database) = cli.database {
        config.influxdb.database = database;
    }

    init_tracing(&config.logging);
    tracing::debug!("InfluxDB: {}", config.influxdb);

    match cli.command {
        Commands::Query {
            measurement,
            last,
            tags,
            fields,
            mean,
            page,
            page_size,
            camel_case: camel,
            dry_run,
        } => {
            let last = parse_duration(&last)?;
            let context = if fields.is_empty() {
                let factory = SerieContextFactory::from_config(&config.influxdb)?;
                factory.context(&measurement).await?
            } else {
                let info = MeasurementInfo::new(
                    config.influxdb.database.as_str(),
                    measurement.as_str(),
                    config.influxdb.time_zone.as_str(),
                    fields,
                    Vec::new(),
                );
                let client = InfluxClient::new(config.influxdb.clone())?;
                SerieContext::new(info, Arc::new(client))
            };

            let builder = match mean {
                Some(interval) => context.build_mean_query(parse_duration(&interval)?),
                None => {
                    let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
                    context.build_query(&tags).order_by_desc(["time"])
                }
            }
            .start_duration(last);

            if dry_run {
                let paging = Paging::new(page, page_size);
                println!("{}", builder.to_count()?);
                println!(
                    "{}",
                    builder.to_limit_and_offset(paging.page_size, paging.offset())?
                );
                return Ok(());
            }

            let result = context.page(&builder, page, page_size).await?;
            tracing::info!("Fetched {}", result.page);

            let mapper: Option<NameMapper> = if camel { Some(&camel_case) } else { None };
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            write_page_json(&result, &mut out, mapper)?;
            writeln!(out)?;
        }

        Commands::Measurements => {
            let factory = SerieContextFactory::from_config(&config.influxdb)?;
            let measurements = factory.measurements().await?;

            if measurements.is_empty() {
                println!("No measurements in '{}'", factory.database());
            }
            for name in measurements {
                println!("{}", name);
            }
        }

        Commands::Init => {
            let factory = SerieContextFactory::from_config(&config.influxdb)?;
            if factory.ensure_created().await? {
                println!("Created database '{}'", factory.database());
            } else {
                println!("Database '{}' already exists", factory.database());
            }
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("creating {:?}", parent))?;
                    }
                    std::fs::write(&path, &config)
                        .with_context(|| format!("writing {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("influx_series={}", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim().to_lowercase();

    let parse = |digits: &str| -> anyhow::Result<i64> {
        digits
            .parse()
            .with_context(|| format!("Invalid duration: {}", s))
    };

    if let Some(seconds) = s.strip_suffix('s') {
        Ok(Duration::seconds(parse(seconds)?))
    } else if let Some(minutes) = s.strip_suffix('m') {
        Ok(Duration::minutes(parse(minutes)?))
    } else if let Some(hours) = s.strip_suffix('h') {
        Ok(Duration::hours(parse(hours)?))
    } else if let Some(days) = s.strip_suffix('d') {
        Ok(Duration::days(parse(days)?))
    } else if let Some(weeks) = s.strip_suffix('w') {
        Ok(Duration::weeks(parse(weeks)?))
    } else {
        bail!("Invalid duration format: {}. Use: 30s, 5m, 6h, 7d, 2w", s)
    }
}
