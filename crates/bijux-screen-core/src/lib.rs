// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bijux_screen_adapters::{HttpProbeClient, ProbeClient, RetryingProbe};
use bijux_screen_model::{Run, Summary};
use serde::Serialize;
use tracing::info;

pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod render;
pub mod reporter;
pub mod suite;

pub use config::{HarnessConfig, OutputFormat};
pub use engine::{AbortSignal, Engine, RunOptions};
pub use suite::{load_suite, validate_suite, Suite};

pub const CRATE_NAME: &str = "bijux-screen-core";
pub const ENV_BIJUX_LOG_LEVEL: &str = "BIJUX_LOG_LEVEL";

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Usage = 2,
    Validation = 3,
    Internal = 10,
}

impl ExitCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Usage => "usage",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    Config(String),
    Suite(String),
    Io { path: PathBuf, detail: String },
    Render(String),
}

impl HarnessError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::Suite(_) | Self::Io { .. } => ExitCode::Usage,
            Self::Render(_) => ExitCode::Internal,
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config error: {msg}"),
            Self::Suite(msg) => write!(f, "suite error: {msg}"),
            Self::Io { path, detail } => write!(f, "io error: {} ({detail})", path.display()),
            Self::Render(msg) => write!(f, "render error: {msg}"),
        }
    }
}

impl std::error::Error for HarnessError {}

/// Everything one invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub session_id: String,
    pub suite: String,
    pub base_url: String,
    pub run: Run,
    pub summary: Summary,
}

impl RunReport {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        reporter::exit_code_for_summary(&self.summary)
    }
}

#[must_use]
pub fn session_id() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("validation_session_{secs}")
}

/// Built-in suite by name, else a suite file path.
pub fn resolve_suite(config: &HarnessConfig, session_id: &str) -> Result<Suite, HarnessError> {
    match config.suite_path() {
        // `load_suite` validates what it reads.
        Some(path) => load_suite(&path),
        None => {
            let suite = catalog::suite(&config.suite, session_id)
                .ok_or_else(|| HarnessError::Suite(format!("unknown suite `{}`", config.suite)))?;
            validate_suite(&suite)?;
            Ok(suite)
        }
    }
}

/// HTTP client wrapped in the configured retry policy.
pub fn build_probe(config: &HarnessConfig) -> Result<Arc<dyn ProbeClient>, HarnessError> {
    let http = HttpProbeClient::new(&config.base_url).map_err(HarnessError::Config)?;
    Ok(Arc::new(RetryingProbe::new(http, config.retry.clone())))
}

/// Resolves the suite, runs it, analyzes relations and summarizes.
pub async fn execute(
    config: &HarnessConfig,
    probe: Arc<dyn ProbeClient>,
    abort: AbortSignal,
) -> Result<RunReport, HarnessError> {
    config.validate()?;
    let session_id = session_id();
    let suite = resolve_suite(config, &session_id)?;
    info!(
        suite = suite.name.as_str(),
        session = session_id.as_str(),
        base_url = config.base_url.as_str(),
        "executing suite"
    );
    let engine = Engine::new(probe, config.run_options()).with_abort(abort);
    let run = engine.run(suite.scenarios).await;
    let findings = analyzer::analyze(&run, &suite.relations);
    let summary = reporter::summarize(&run, &findings);
    info!(
        passed = summary.passed,
        failed = summary.failed,
        critical = summary.critical_failures.len(),
        deployment_ready = summary.deployment_ready,
        "run summarized"
    );
    Ok(RunReport {
        session_id,
        suite: suite.name,
        base_url: config.base_url.clone(),
        run: run.with_findings(findings),
        summary,
    })
}
