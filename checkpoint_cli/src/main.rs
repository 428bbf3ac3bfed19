mod cli;
mod error_fmt;
mod rt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use checkpoint_core::error::MonitorError;
use checkpoint_core::{RunSummary, TelemetryRecord};
use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    color_eyre::install()?;

    let cfg = load_config(&cli.config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging);
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    match cli.cmd {
        Commands::Run {
            duration_ms,
            rt,
            rt_prio,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&shutdown);
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            }

            let summary = run::run_monitor(&cfg, duration_ms, rt, rt_prio, shutdown)?;
            report_summary(&summary, cli.json);
            Ok(())
        }
        Commands::SelfCheck => {
            let report = run::self_check(&cfg)?;
            if cli.json {
                let cells: Vec<_> = report
                    .cells
                    .iter()
                    .map(|(ch, raw, weight)| {
                        serde_json::json!({ "channel": ch, "raw": raw, "weight": weight })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "ok",
                        "backend": report.backend,
                        "distance_cm": report.distance_cm,
                        "cells": cells,
                    })
                );
            } else {
                println!("backend: {}", report.backend);
                println!("ranging: ok ({} cm)", report.distance_cm);
                for (ch, raw, weight) in &report.cells {
                    println!("load cell {ch}: ok (raw {raw}, {weight:.1})");
                }
                println!("self-check ok");
            }
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> eyre::Result<checkpoint_config::Config> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eyre::Report::new(MonitorError::Config(format!(
            "cannot read {}: {e}",
            path.display()
        )))
    })?;
    let cfg = checkpoint_config::load_toml(&text)
        .wrap_err_with(|| format!("failed to parse {}", path.display()))?;
    cfg.validate()
        .map_err(|e| eyre::Report::new(MonitorError::Config(e.to_string())))?;
    Ok(cfg)
}

/// Logs go to stderr: stdout is the telemetry link.
/// Level precedence: RUST_LOG, then --log-level, then [logging].level, then info.
fn init_tracing(json: bool, cli_level: Option<&str>, logging: &checkpoint_config::Logging) {
    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed(),
        );
    } else {
        layers.push(fmt::layer().with_writer(std::io::stderr).boxed());
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "checkpoint.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, &name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, &name),
            _ => tracing_appender::rolling::never(dir, &name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();
}

fn record_json(record: &TelemetryRecord) -> serde_json::Value {
    serde_json::json!({
        "vehicle_weight": record.vehicle_weight,
        "peak_speed": record.peak_speed,
    })
}

fn report_summary(summary: &RunSummary, json: bool) {
    let barrier = format!("{:?}", summary.barrier).to_lowercase();
    if json {
        eprintln!(
            "{}",
            serde_json::json!({
                "status": "stopped",
                "elapsed_ms": summary.elapsed_ms,
                "record": record_json(&summary.record),
                "barrier": barrier,
                "stalls": summary.stalls,
                "ranging_failures": summary.health.ranging.total_failures,
                "weighing_failures": summary.health.weighing.total_failures,
            })
        );
    } else {
        eprintln!(
            "stopped after {} ms: weight {:.0}, peak speed {:.3} cm/ms, barrier {barrier}, stalls {}",
            summary.elapsed_ms,
            summary.record.vehicle_weight,
            summary.record.peak_speed,
            summary.stalls,
        );
    }
}
