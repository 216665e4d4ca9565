use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use oil_inspector::analysis::CleanlinessStatus;
use oil_inspector::config::AppConfig;
use oil_inspector::dashboard::DashboardView;
use oil_inspector::fixtures::{ExpectationDiff, FixtureCatalog, FixtureRunner};
use oil_inspector::inspection::RunResult;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "oil_cli",
    about = "Deterministic fixture harness for the oil inspection dashboard"
)]
struct Cli {
    /// Override directory containing fixture scripts (defaults to fixtures/)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// JSON config file (defaults to assets/inspector_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct WindowArgs {
    /// Override the detection window (milliseconds)
    #[arg(long)]
    window_ms: Option<u64>,
    /// Override the delay between frames (milliseconds)
    #[arg(long)]
    frame_interval_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one detection over a fixture script and print the report
    Inspect {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Print the status derived from a cleanliness percent
    Status {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    /// List available fixtures on disk
    DumpFixtures,
    /// Serve the debug HTTP surface over a fixture (requires debug_http feature)
    Serve {
        #[arg(long)]
        fixture: String,
        #[command(flatten)]
        window: WindowArgs,
    },
}

fn main() -> ExitCode {
    oil_inspector::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_default();
    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);

    match cli.command {
        Commands::Inspect {
            fixture,
            expect,
            output,
            window,
        } => run_inspect(&catalog, config, &fixture, expect, output, window),
        Commands::Status { percent } => run_status(percent),
        Commands::DumpFixtures => run_dump(&catalog),
        Commands::Serve { fixture, window } => run_serve(&catalog, config, &fixture, window),
    }
}

fn runner_for(config: AppConfig, window: &WindowArgs) -> FixtureRunner {
    let mut runner = FixtureRunner::new(config);
    if let Some(window_ms) = window.window_ms {
        runner = runner.with_window_ms(window_ms);
    }
    if let Some(frame_interval_ms) = window.frame_interval_ms {
        runner = runner.with_frame_interval_ms(frame_interval_ms);
    }
    runner
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")
}

fn run_inspect(
    catalog: &FixtureCatalog,
    config: AppConfig,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
    window: WindowArgs,
) -> Result<ExitCode> {
    let runner = runner_for(config, &window);
    let data = catalog.load(fixture, override_expect)?;

    let runtime = build_runtime()?;
    let result = runtime.block_on(runner.run(&data))?;

    emit_report(&data.metadata.name, &result, output_path)?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&result) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_status(percent: u8) -> Result<ExitCode> {
    let status = CleanlinessStatus::from_percent(percent);
    let payload = StatusPayload {
        percent,
        status,
        note: status.note(),
        badge: status.badge().css_class(),
    };
    println!("{}", serde_json::to_string(&payload)?);
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

#[cfg(feature = "debug_http")]
fn run_serve(
    catalog: &FixtureCatalog,
    config: AppConfig,
    fixture: &str,
    window: WindowArgs,
) -> Result<ExitCode> {
    use oil_inspector::http::{bind_addr_from_env, run_http_server, token_from_env, DebugHttpState};
    use std::sync::Arc;

    let runner = runner_for(config, &window);
    let data = catalog.load(fixture, None)?;
    let handle = Arc::new(runner.handle_for(&data)?);
    let state = DebugHttpState::new(handle, token_from_env());
    let addr = bind_addr_from_env();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("building tokio runtime for debug HTTP server")?;
    runtime.block_on(run_http_server(state, addr))?;
    Ok(ExitCode::from(0))
}

#[cfg(not(feature = "debug_http"))]
fn run_serve(
    _catalog: &FixtureCatalog,
    _config: AppConfig,
    _fixture: &str,
    _window: WindowArgs,
) -> Result<ExitCode> {
    anyhow::bail!("serve requires building with --features debug_http")
}

fn emit_report(fixture: &str, result: &RunResult, output_path: Option<PathBuf>) -> Result<()> {
    let view = DashboardView::from_result(result, oil_inspector::telemetry::now_timestamp_ms());
    let report = InspectionReportPayload {
        fixture,
        result,
        view: &view,
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct InspectionReportPayload<'a> {
    fixture: &'a str,
    result: &'a RunResult,
    view: &'a DashboardView,
}

#[derive(Serialize)]
struct StatusPayload {
    percent: u8,
    status: CleanlinessStatus,
    note: &'static str,
    badge: &'static str,
}
