use clap::{Parser, Subcommand};
use footprint_forecast::pipeline::ErrorResponse;
use footprint_forecast::{
    sample_payload, DataLoader, FileModelRepository, ForecastConfig, ForecastError,
    ForecastPipeline, ForecastRequest,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "footprint")]
#[command(
    about = "Carbon footprint forecasting, anomaly detection and insights",
    long_about = "Carbon footprint forecasting, anomaly detection and insights.\n\n\
                  The model artifact path can be overridden with FOOTPRINT_MODEL_PATH."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Forecast from a history file and print the response as JSON
    Run {
        /// History file (JSON request, JSON array of records, or CSV)
        input: PathBuf,

        /// Number of days to forecast
        #[arg(short, long)]
        days: Option<usize>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print a synthetic request payload
    Sample {
        /// Days of history to generate
        #[arg(default_value_t = 30)]
        days: usize,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "footprint=info,footprint_forecast=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            input,
            days,
            config,
        } => run(&input, days, config.as_deref()),
        Commands::Sample { days } => sample(days),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", serde_json::json!(ErrorResponse::from(&e)));
            ExitCode::from(if e.status_class().http_status() == 400 { 2 } else { 1 })
        }
    }
}

fn run(input: &Path, days: Option<usize>, config_path: Option<&Path>) -> Result<(), ForecastError> {
    let mut config = match config_path {
        Some(path) => ForecastConfig::from_file(path)?,
        None => ForecastConfig::default(),
    };
    if let Ok(path) = env::var("FOOTPRINT_MODEL_PATH") {
        config.model_path = PathBuf::from(path);
    }

    let repository = FileModelRepository::new(config.model_path.clone());
    let horizon = days.unwrap_or(config.forecast.default_horizon);
    let pipeline = ForecastPipeline::new(config, repository)?;

    let response = if is_csv(input) {
        pipeline.run_observations(DataLoader::from_csv(input)?, horizon)?
    } else {
        let payload: serde_json::Value = serde_json::from_str(&fs::read_to_string(input)?)?;
        let mut request = match payload {
            serde_json::Value::Array(records) => ForecastRequest {
                historical_data: records,
                forecast_days: None,
            },
            other => ForecastRequest::from_json(&other)?,
        };
        if days.is_some() || request.forecast_days.is_none() {
            request.forecast_days = Some(horizon);
        }
        pipeline.run(&request)?
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn sample(days: usize) -> Result<(), ForecastError> {
    println!("{}", serde_json::to_string_pretty(&sample_payload(days)?)?);
    Ok(())
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
}
