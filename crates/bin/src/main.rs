//! Hobart CLI binary.
//!
//! Runs the PCA and Fama-French analyses from the command line.

mod render;

use chrono::{Months, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use hobart::data::{CsvFactorFile, FactorDataSource, KenFrenchClient, YahooQuoteProvider};
use hobart::output::{
    AnalysisKind, ExportFormat, Exporter, PcaExport, Report, ReportBuilder,
    RollingCoefficientsExport,
};
use hobart::{
    AnalysisConfig, AnalysisError, MarketFactor, PcaRequest, RegressionRequest, Response,
    run_factor_regression, run_pca,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: PCA and Fama-French analysis of equity portfolios", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Also write the results to a .csv or .json file
    #[arg(long, global = true)]
    export: Option<PathBuf>,

    /// Write the JSON report envelope to this file
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    /// Log the duration of every instrumented step
    #[arg(long, global = true)]
    timings: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Principal component analysis of daily returns
    Pca {
        /// Comma-separated ticker symbols
        #[arg(long)]
        tickers: String,

        /// Number of components to retain
        #[arg(long, default_value_t = 2)]
        components: usize,

        /// Start date (YYYY-MM-DD), defaults to three years before the end
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        end: Option<String>,
    },

    /// Fama-French regression of a portfolio's active returns
    FamaFrench {
        /// Comma-separated ticker symbols
        #[arg(long)]
        tickers: String,

        /// Comma-separated weights, one per ticker, summing to 1
        #[arg(long)]
        weights: String,

        /// Factor model (FF3 or FF5)
        #[arg(long, default_value = "FF3")]
        model: String,

        /// Include the market excess return as a regressor
        #[arg(long)]
        include_market: bool,

        /// Read factors from a local Ken French CSV instead of downloading
        #[arg(long)]
        factors_csv: Option<PathBuf>,

        /// Start date (YYYY-MM-DD), defaults to three years before the end
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        end: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.timings);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(timings: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,hobart=info,hobart_data=info,hobart_stats=info"));
    let span_events = if timings {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> CliResult<AnalysisConfig> {
    if let Some(path) = path {
        return Ok(AnalysisConfig::from_file(path)?);
    }
    match dirs::config_dir().map(|dir| dir.join("hobart").join("config.json")) {
        Some(default) if default.is_file() => {
            tracing::info!(path = %default.display(), "using configuration file");
            Ok(AnalysisConfig::from_file(&default)?)
        }
        _ => Ok(AnalysisConfig::default()),
    }
}

/// Fill in the dashboard's default period: the three years up to today.
fn resolve_dates(start: Option<String>, end: Option<String>) -> (String, String) {
    let today = Utc::now().date_naive();
    let end = end.unwrap_or_else(|| today.to_string());
    let start = start.unwrap_or_else(|| {
        let anchor = NaiveDate::parse_from_str(&end, "%Y-%m-%d").unwrap_or(today);
        anchor
            .checked_sub_months(Months::new(36))
            .unwrap_or(anchor)
            .to_string()
    });
    (start, end)
}

fn spinner(message: &'static str) -> CliResult<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

fn exit_code<T>(result: &Result<T, AnalysisError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(e) if e.is_validation() => 2,
        Err(_) => 1,
    }
}

async fn run(cli: Cli) -> CliResult<ExitCode> {
    let mut config = load_config(cli.config.as_deref())?;
    let market = YahooQuoteProvider::with_rate_limit(config.data.rate_limit())?;

    match cli.command {
        Commands::Pca {
            tickers,
            components,
            start,
            end,
        } => {
            let (start, end) = resolve_dates(start, end);
            let request = PcaRequest::new(tickers, components, start, end);

            let pb = spinner("Running principal component analysis...")?;
            let result = run_pca(&market, &request, &config).await;
            pb.finish_and_clear();

            let code = exit_code(&result);
            if let (Ok(outcome), Some(path)) = (&result, cli.export.as_deref()) {
                PcaExport::new(&outcome.result)
                    .export_to_file(path, ExportFormat::from_path(path)?)?;
                tracing::info!(path = %path.display(), "exported PCA results");
            }
            let tickers = result
                .as_ref()
                .map(|o| o.request.tickers.as_slice().to_vec())
                .unwrap_or_default();
            let output = Output {
                format: cli.format,
                report: cli.report.as_deref(),
            };
            emit(Response::from_result(result), AnalysisKind::Pca, tickers, output)?;
            Ok(ExitCode::from(code))
        }
        Commands::FamaFrench {
            tickers,
            weights,
            model,
            include_market,
            factors_csv,
            start,
            end,
        } => {
            if include_market {
                config.regression.market_factor = MarketFactor::Include;
            }
            let (start, end) = resolve_dates(start, end);
            let request = RegressionRequest::new(tickers, weights, model, start, end);

            match factors_csv {
                Some(path) => {
                    let factors = CsvFactorFile::new(path);
                    regress(
                        &market,
                        &factors,
                        &request,
                        &config,
                        cli.export.as_deref(),
                        Output {
                            format: cli.format,
                            report: cli.report.as_deref(),
                        },
                    )
                    .await
                }
                None => {
                    let factors =
                        KenFrenchClient::with_base_url(config.data.french_base_url.clone());
                    regress(
                        &market,
                        &factors,
                        &request,
                        &config,
                        cli.export.as_deref(),
                        Output {
                            format: cli.format,
                            report: cli.report.as_deref(),
                        },
                    )
                    .await
                }
            }
        }
    }
}

async fn regress<F: FactorDataSource>(
    market: &YahooQuoteProvider,
    factors: &F,
    request: &RegressionRequest,
    config: &AnalysisConfig,
    export: Option<&Path>,
    output: Output<'_>,
) -> CliResult<ExitCode> {
    let pb = spinner("Running factor regression...")?;
    let result = run_factor_regression(market, factors, request, config).await;
    pb.finish_and_clear();

    let code = exit_code(&result);
    if let (Ok(outcome), Some(path)) = (&result, export) {
        RollingCoefficientsExport::new(outcome.window, &outcome.rolling)
            .export_to_file(path, ExportFormat::from_path(path)?)?;
        tracing::info!(path = %path.display(), "exported rolling coefficients");
    }
    let tickers = result
        .as_ref()
        .map(|o| o.request.tickers.as_slice().to_vec())
        .unwrap_or_default();
    emit(
        Response::from_result(result),
        AnalysisKind::FamaFrench,
        tickers,
        output,
    )?;
    Ok(ExitCode::from(code))
}

/// Where and how a response is written.
#[derive(Debug, Clone, Copy)]
struct Output<'a> {
    format: OutputFormat,
    report: Option<&'a Path>,
}

fn build_report(
    response: &Response,
    kind: AnalysisKind,
    tickers: Vec<String>,
) -> CliResult<Report> {
    Ok(ReportBuilder::new()
        .kind(kind)
        .tickers(tickers)
        .failed(response.is_error())
        .contents(serde_json::to_value(response)?)
        .build()?)
}

fn emit(
    response: Response,
    kind: AnalysisKind,
    tickers: Vec<String>,
    output: Output<'_>,
) -> CliResult<()> {
    let report = build_report(&response, kind, tickers)?;
    if let Some(path) = output.report {
        report.write_to(path)?;
        tracing::info!(path = %path.display(), "wrote report");
    }

    match output.format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => match &response {
            Response::Error { message, .. } => eprintln!("Error: {message}"),
            other => println!("{}", render::to_text(other)),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobart::ValidationError;

    #[test]
    fn test_resolve_dates_defaults_to_three_years() {
        let (start, end) = resolve_dates(None, Some("2024-06-30".to_string()));
        assert_eq!(start, "2021-06-30");
        assert_eq!(end, "2024-06-30");
    }

    #[test]
    fn test_resolve_dates_keeps_explicit_values() {
        let (start, end) = resolve_dates(Some("2020-01-01".into()), Some("2020-12-31".into()));
        assert_eq!(start, "2020-01-01");
        assert_eq!(end, "2020-12-31");
    }

    #[test]
    fn test_exit_codes() {
        let validation: Result<(), AnalysisError> =
            Err(ValidationError::NoTickers.into());
        assert_eq!(exit_code(&validation), 2);
        assert_eq!(exit_code::<()>(&Err(AnalysisError::NoOverlap)), 1);
        assert_eq!(exit_code(&Ok::<(), AnalysisError>(())), 0);
    }

    #[test]
    fn test_cli_parses_fama_french() {
        let cli = Cli::try_parse_from([
            "hobart",
            "fama-french",
            "--tickers",
            "AAPL,SPY",
            "--weights",
            "0.5,0.5",
            "--model",
            "FF5",
            "--include-market",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::FamaFrench {
                model,
                include_market,
                ..
            } => {
                assert_eq!(model, "FF5");
                assert!(include_market);
            }
            Commands::Pca { .. } => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn test_error_response_report_is_marked_failed() {
        let response = Response::from_error(&AnalysisError::NoOverlap);
        let report =
            build_report(&response, AnalysisKind::FamaFrench, vec!["AAPL".into()]).unwrap();
        assert!(!report.succeeded);
        assert_eq!(report.contents["kind"], "error");
    }

    #[test]
    fn test_emit_writes_report_file() {
        let path = std::env::temp_dir().join(format!("hobart-cli-{}.json", std::process::id()));
        let response = Response::from_error(&ValidationError::NoTickers.into());
        let output = Output {
            format: OutputFormat::Text,
            report: Some(&path),
        };
        emit(response, AnalysisKind::Pca, Vec::new(), output).unwrap();

        let report: Report =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(report.kind, AnalysisKind::Pca);
        assert!(!report.succeeded);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_cli_pca_defaults() {
        let cli = Cli::try_parse_from(["hobart", "pca", "--tickers", "AAPL,MSFT"]).unwrap();
        match cli.command {
            Commands::Pca {
                components, start, ..
            } => {
                assert_eq!(components, 2);
                assert!(start.is_none());
            }
            Commands::FamaFrench { .. } => panic!("parsed the wrong subcommand"),
        }
    }
}
