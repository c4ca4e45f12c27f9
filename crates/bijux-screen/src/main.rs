// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod cli;

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode as ProcessExitCode;

use bijux_screen_core::config::DEFAULT_CONFIG_PATH;
use bijux_screen_core::{
    build_probe, execute, render, resolve_suite, session_id, AbortSignal, ExitCode, HarnessConfig,
    HarnessError, OutputFormat, ENV_BIJUX_LOG_LEVEL,
};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command};

const ENV_LOG_JSON: &str = "BIJUX_SCREEN_LOG_JSON";

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn log_filter() -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    env::var(ENV_BIJUX_LOG_LEVEL)
        .ok()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn init_tracing(log_json: bool) {
    let filter = log_filter();
    if log_json || env_bool(ENV_LOG_JSON, false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// defaults -> config file -> environment; flags are applied by the caller.
fn layered_config(explicit: Option<&Path>) -> Result<HarnessConfig, HarnessError> {
    let mut config = HarnessConfig::default();
    match explicit {
        Some(path) => config.apply_file_path(path, true)?,
        None => config.apply_file_path(&PathBuf::from(DEFAULT_CONFIG_PATH), false)?,
    }
    config.apply_env(|key| env::var(key).ok())?;
    Ok(config)
}

fn spawn_ctrl_c(abort: AbortSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; remaining scenarios will be skipped");
            abort.trip();
        }
    });
}

async fn run(cli: Cli) -> Result<ExitCode, HarnessError> {
    let mut config = layered_config(cli.config.as_deref())?;
    match cli.command {
        Command::Run(args) => {
            args.apply(&mut config);
            config.validate()?;
            let probe = build_probe(&config)?;
            info!(
                base_url = config.base_url.as_str(),
                concurrency = config.concurrency,
                "probe client ready"
            );
            let abort = AbortSignal::new();
            spawn_ctrl_c(abort.clone());
            let report = execute(&config, probe, abort).await?;
            let rendered = match config.format {
                OutputFormat::Text => render::render_text(&report),
                OutputFormat::Json => render::render_json(&report)?,
            };
            println!("{rendered}");
            Ok(report.exit_code())
        }
        Command::Scenarios(args) => {
            args.apply(&mut config);
            let suite = resolve_suite(&config, &session_id())?;
            let rendered = match config.format {
                OutputFormat::Text => render::render_suite_text(&suite),
                OutputFormat::Json => render::render_suite_json(&suite)?,
            };
            println!("{rendered}");
            Ok(ExitCode::Success)
        }
        Command::Config(args) => {
            args.apply(&mut config);
            config.validate()?;
            let rendered = match config.format {
                OutputFormat::Text => config.render_toml()?,
                OutputFormat::Json => config.render_json()?,
            };
            println!("{rendered}");
            Ok(ExitCode::Success)
        }
    }
}

#[tokio::main]
async fn main() -> ProcessExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            err.exit_code()
        }
    };
    ProcessExitCode::from(code as u8)
}
