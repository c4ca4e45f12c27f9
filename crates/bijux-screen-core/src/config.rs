// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bijux_screen_adapters::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::engine::RunOptions;
use crate::HarnessError;

pub const ENV_BASE_URL: &str = "BIJUX_SCREEN_BASE_URL";
pub const ENV_PROBE_TIMEOUT_MS: &str = "BIJUX_SCREEN_PROBE_TIMEOUT_MS";
pub const ENV_CONCURRENCY: &str = "BIJUX_SCREEN_CONCURRENCY";
pub const ENV_FAIL_FAST: &str = "BIJUX_SCREEN_FAIL_FAST";
pub const ENV_RETRY_ATTEMPTS: &str = "BIJUX_SCREEN_RETRY_ATTEMPTS";
pub const ENV_RETRY_BACKOFF_MS: &str = "BIJUX_SCREEN_RETRY_BACKOFF_MS";
pub const ENV_SUITE: &str = "BIJUX_SCREEN_SUITE";
pub const ENV_FORMAT: &str = "BIJUX_SCREEN_FORMAT";

/// Upper bound on `retry_attempts`.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Config file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = ".bijux/screen.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format `{other}` (expected text|json)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub base_url: String,
    pub probe_timeout: Duration,
    pub concurrency: usize,
    pub fail_fast: bool,
    pub retry: RetryPolicy,
    /// Built-in suite name or path to a suite TOML file.
    pub suite: String,
    pub format: OutputFormat,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            probe_timeout: Duration::from_secs(15),
            concurrency: 1,
            fail_fast: false,
            retry: RetryPolicy::default(),
            suite: "validation".to_string(),
            format: OutputFormat::Text,
        }
    }
}

/// On-disk shape; every key optional so files can override selectively.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub probe_timeout_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub fail_fast: Option<bool>,
    pub retry_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub suite: Option<String>,
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    base_url: &'a str,
    probe_timeout_ms: u64,
    concurrency: usize,
    fail_fast: bool,
    retry_attempts: u32,
    retry_backoff_ms: u64,
    suite: &'a str,
    format: OutputFormat,
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, String> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| format!("{name}: cannot parse `{raw}`"))
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool, String> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Ok(false),
        _ => Err(format!("{name}: expected a boolean, got `{raw}`")),
    }
}

impl HarnessConfig {
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.base_url {
            self.base_url = v;
        }
        if let Some(v) = file.probe_timeout_ms {
            self.probe_timeout = Duration::from_millis(v);
        }
        if let Some(v) = file.concurrency {
            self.concurrency = v;
        }
        if let Some(v) = file.fail_fast {
            self.fail_fast = v;
        }
        if let Some(v) = file.retry_attempts {
            self.retry.max_attempts = v;
        }
        if let Some(v) = file.retry_backoff_ms {
            self.retry.base_backoff_ms = v;
        }
        if let Some(v) = file.suite {
            self.suite = v;
        }
        if let Some(v) = file.format {
            self.format = v;
        }
    }

    /// Loads `path`; when `explicit` is false a missing file is not an error.
    pub fn apply_file_path(&mut self, path: &Path, explicit: bool) -> Result<(), HarnessError> {
        if !explicit && !path.exists() {
            return Ok(());
        }
        let raw = fs::read_to_string(path).map_err(|e| HarnessError::Io {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let file: ConfigFile = toml::from_str(&raw)
            .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))?;
        self.apply_file(file);
        Ok(())
    }

    /// Applies `BIJUX_SCREEN_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), HarnessError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let apply = |cfg: &mut Self| -> Result<(), String> {
            if let Some(v) = lookup(ENV_BASE_URL) {
                cfg.base_url = v;
            }
            if let Some(v) = lookup(ENV_PROBE_TIMEOUT_MS) {
                cfg.probe_timeout = Duration::from_millis(parse_env(ENV_PROBE_TIMEOUT_MS, &v)?);
            }
            if let Some(v) = lookup(ENV_CONCURRENCY) {
                cfg.concurrency = parse_env(ENV_CONCURRENCY, &v)?;
            }
            if let Some(v) = lookup(ENV_FAIL_FAST) {
                cfg.fail_fast = parse_env_bool(ENV_FAIL_FAST, &v)?;
            }
            if let Some(v) = lookup(ENV_RETRY_ATTEMPTS) {
                cfg.retry.max_attempts = parse_env(ENV_RETRY_ATTEMPTS, &v)?;
            }
            if let Some(v) = lookup(ENV_RETRY_BACKOFF_MS) {
                cfg.retry.base_backoff_ms = parse_env(ENV_RETRY_BACKOFF_MS, &v)?;
            }
            if let Some(v) = lookup(ENV_SUITE) {
                cfg.suite = v;
            }
            if let Some(v) = lookup(ENV_FORMAT) {
                cfg.format = OutputFormat::parse(&v)?;
            }
            Ok(())
        };
        apply(self).map_err(HarnessError::Config)
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(HarnessError::Config("base_url must be non-empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(HarnessError::Config(format!(
                "base_url must start with http:// or https://, got `{base}`"
            )));
        }
        if self.probe_timeout.is_zero() {
            return Err(HarnessError::Config("probe timeout must be > 0".to_string()));
        }
        if self.concurrency == 0 {
            return Err(HarnessError::Config("concurrency must be >= 1".to_string()));
        }
        if !(1..=MAX_RETRY_ATTEMPTS).contains(&self.retry.max_attempts) {
            return Err(HarnessError::Config(format!(
                "retry attempts must be within 1..={MAX_RETRY_ATTEMPTS}, got {}",
                self.retry.max_attempts
            )));
        }
        if self.suite.trim().is_empty() {
            return Err(HarnessError::Config("suite must be non-empty".to_string()));
        }
        Ok(())
    }

    /// Engine options; the scenario deadline covers every retry and its backoff.
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        let attempts = self.retry.max_attempts.max(1);
        RunOptions {
            concurrency: self.concurrency.max(1),
            probe_timeout: self.probe_timeout,
            scenario_deadline: self
                .probe_timeout
                .saturating_mul(attempts)
                .saturating_add(self.retry.total_backoff())
                .saturating_add(Duration::from_secs(1)),
            fail_fast: self.fail_fast,
        }
    }

    /// Suite file path when `suite` does not name a built-in suite.
    #[must_use]
    pub fn suite_path(&self) -> Option<PathBuf> {
        if crate::catalog::SUITE_NAMES.contains(&self.suite.as_str()) {
            None
        } else {
            Some(PathBuf::from(&self.suite))
        }
    }

    pub fn render_toml(&self) -> Result<String, HarnessError> {
        toml::to_string_pretty(&self.effective())
            .map_err(|e| HarnessError::Render(e.to_string()))
    }

    pub fn render_json(&self) -> Result<String, HarnessError> {
        serde_json::to_string_pretty(&self.effective())
            .map_err(|e| HarnessError::Render(e.to_string()))
    }

    fn effective(&self) -> EffectiveConfig<'_> {
        EffectiveConfig {
            base_url: &self.base_url,
            probe_timeout_ms: u64::try_from(self.probe_timeout.as_millis()).unwrap_or(u64::MAX),
            concurrency: self.concurrency,
            fail_fast: self.fail_fast,
            retry_attempts: self.retry.max_attempts,
            retry_backoff_ms: self.retry.base_backoff_ms,
            suite: &self.suite,
            format: self.format,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn defaults_satisfy_the_contract() {
        let cfg = HarnessConfig::default();
        cfg.validate().expect("defaults valid");
        assert_eq!(cfg.suite_path(), None);
        assert_eq!(
            cfg.run_options().scenario_deadline,
            Duration::from_secs(45) + Duration::from_millis(750) + Duration::from_secs(1)
        );
    }

    #[test]
    fn file_then_env_layering() {
        let mut cfg = HarnessConfig::default();
        let file: ConfigFile = toml::from_str(
            r#"
            base_url = "http://file:9000"
            concurrency = 4
            suite = "compatibility"
            "#,
        )
        .expect("decode config");
        cfg.apply_file(file);
        let env = BTreeMap::from([
            (ENV_BASE_URL, "http://env:7000"),
            (ENV_FAIL_FAST, "yes"),
            (ENV_FORMAT, "json"),
        ]);
        cfg.apply_env(|k| env.get(k).map(|v| (*v).to_string()))
            .expect("apply env");
        assert_eq!(cfg.base_url, "http://env:7000");
        assert_eq!(cfg.concurrency, 4);
        assert_eq!(cfg.suite, "compatibility");
        assert!(cfg.fail_fast);
        assert_eq!(cfg.format, OutputFormat::Json);
    }

    #[test]
    fn malformed_env_values_are_config_errors() {
        let mut cfg = HarnessConfig::default();
        let err = cfg
            .apply_env(|k| (k == ENV_CONCURRENCY).then(|| "many".to_string()))
            .expect_err("invalid concurrency");
        assert_eq!(
            err.to_string(),
            "config error: BIJUX_SCREEN_CONCURRENCY: cannot parse `many`"
        );
    }

    #[test]
    fn contract_rejects_degenerate_settings() {
        let mut cfg = HarnessConfig {
            concurrency: 0,
            ..HarnessConfig::default()
        };
        assert!(cfg.validate().is_err());
        cfg.concurrency = 1;
        cfg.base_url = "ftp://host".to_string();
        assert!(cfg.validate().is_err());
        cfg.base_url = "http://host".to_string();
        cfg.retry.max_attempts = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn huge_retry_settings_are_rejected_without_overflow() {
        let mut cfg = HarnessConfig::default();
        let env = BTreeMap::from([
            (ENV_RETRY_ATTEMPTS, "4294967295"),
            (ENV_RETRY_BACKOFF_MS, "18446744073709551615"),
            (ENV_PROBE_TIMEOUT_MS, "18446744073709551615"),
        ]);
        cfg.apply_env(|k| env.get(k).map(|v| (*v).to_string()))
            .expect("values parse");
        let err = cfg.validate().expect_err("attempts above the bound");
        assert!(err.to_string().contains("retry attempts must be within 1..=10"));
        assert_eq!(cfg.run_options().scenario_deadline, Duration::MAX);

        cfg.retry.max_attempts = MAX_RETRY_ATTEMPTS;
        cfg.probe_timeout = Duration::from_secs(15);
        cfg.retry.base_backoff_ms = 250;
        cfg.validate().expect("bound itself is allowed");
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("screen.toml");
        std::fs::write(&path, "base_url = \"http://x\"\nretries = 3\n").expect("write config");
        let mut cfg = HarnessConfig::default();
        assert!(cfg.apply_file_path(&path, true).is_err());
        cfg.apply_file_path(&dir.path().join("absent.toml"), false)
            .expect("implicit file is optional");
    }

    #[test]
    fn suite_paths_and_effective_rendering() {
        let cfg = HarnessConfig {
            suite: "suites/nightly.toml".to_string(),
            ..HarnessConfig::default()
        };
        assert_eq!(cfg.suite_path(), Some(PathBuf::from("suites/nightly.toml")));
        let rendered = cfg.render_toml().expect("render toml");
        assert!(rendered.contains("suite = \"suites/nightly.toml\""));
        assert!(rendered.contains("probe_timeout_ms = 15000"));
    }
}
