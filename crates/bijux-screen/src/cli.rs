// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

use bijux_screen_core::{HarnessConfig, OutputFormat};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bijux-screen", version, disable_help_subcommand = true)]
#[command(about = "Black-box validation harness for the bijux screening service")]
pub struct Cli {
    /// Harness TOML config; defaults to .bijux/screen.toml when present.
    #[arg(long, global = true, env = "BIJUX_SCREEN_CONFIG")]
    pub config: Option<PathBuf>,
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a suite against the service and report a verdict.
    Run(RunArgs),
    /// List the scenarios and relations of a suite without probing.
    Scenarios(SuiteArgs),
    /// Print the effective configuration after layering.
    Config(FormatOnly),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    #[arg(long)]
    pub base_url: Option<String>,
    /// Built-in suite name or a suite TOML path.
    #[arg(long)]
    pub suite: Option<String>,
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
    #[arg(long)]
    pub concurrency: Option<usize>,
    #[arg(long)]
    pub probe_timeout_ms: Option<u64>,
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,
    #[arg(long)]
    pub retry_attempts: Option<u32>,
    #[arg(long)]
    pub retry_backoff_ms: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub struct SuiteArgs {
    #[arg(long)]
    pub suite: Option<String>,
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

#[derive(Args, Debug, Default)]
pub struct FormatOnly {
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

impl RunArgs {
    /// Flags are the last layer; only the ones given override.
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(v) = &self.base_url {
            config.base_url = v.clone();
        }
        if let Some(v) = &self.suite {
            config.suite = v.clone();
        }
        if let Some(v) = self.format {
            config.format = v.into();
        }
        if let Some(v) = self.concurrency {
            config.concurrency = v;
        }
        if let Some(v) = self.probe_timeout_ms {
            config.probe_timeout = Duration::from_millis(v);
        }
        if self.fail_fast {
            config.fail_fast = true;
        }
        if let Some(v) = self.retry_attempts {
            config.retry.max_attempts = v;
        }
        if let Some(v) = self.retry_backoff_ms {
            config.retry.base_backoff_ms = v;
        }
    }
}

impl SuiteArgs {
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(v) = &self.suite {
            config.suite = v.clone();
        }
        if let Some(v) = self.format {
            config.format = v.into();
        }
    }
}

impl FormatOnly {
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(v) = self.format {
            config.format = v.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_override_only_what_they_name() {
        let cli = Cli::parse_from([
            "bijux-screen",
            "run",
            "--base-url",
            "http://svc:9000",
            "--concurrency",
            "4",
            "--fail-fast",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let mut config = HarnessConfig::default();
        args.apply(&mut config);
        assert_eq!(config.base_url, "http://svc:9000");
        assert_eq!(config.concurrency, 4);
        assert!(config.fail_fast);
        assert_eq!(config.suite, "validation");
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn global_flags_parse_after_the_subcommand() {
        let cli = Cli::parse_from(["bijux-screen", "config", "--log-json", "--format", "json"]);
        assert!(cli.log_json);
        let Command::Config(args) = cli.command else {
            panic!("expected config");
        };
        let mut config = HarnessConfig::default();
        args.apply(&mut config);
        assert_eq!(config.format, OutputFormat::Json);
    }
}
