// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use bijux_screen_model::{Relation, Scenario};
use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// Scenarios plus the relations that read their results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suite {
    pub name: String,
    pub scenarios: Vec<Scenario>,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteFile {
    name: Option<String>,
    #[serde(default)]
    scenarios: Vec<Scenario>,
    #[serde(default)]
    relations: Vec<Relation>,
}

impl Suite {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    #[must_use]
    pub fn scenarios(mut self, scenarios: impl IntoIterator<Item = Scenario>) -> Self {
        self.scenarios.extend(scenarios);
        self
    }

    #[must_use]
    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn from_toml_str(raw: &str, default_name: &str) -> Result<Self, HarnessError> {
        let file: SuiteFile =
            toml::from_str(raw).map_err(|e| HarnessError::Suite(format!("{default_name}: {e}")))?;
        Ok(Self {
            name: file.name.unwrap_or_else(|| default_name.to_string()),
            scenarios: file.scenarios,
            relations: file.relations,
        })
    }
}

/// Reads and validates a suite file.
pub fn load_suite(path: &Path) -> Result<Suite, HarnessError> {
    let raw = fs::read_to_string(path).map_err(|e| HarnessError::Io {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("suite");
    let suite = Suite::from_toml_str(&raw, stem)?;
    validate_suite(&suite)?;
    Ok(suite)
}

/// Registry-style checks run before any probe is sent.
pub fn validate_suite(suite: &Suite) -> Result<(), HarnessError> {
    let mut errors = Vec::new();
    if suite.scenarios.is_empty() {
        errors.push("suite has no scenarios".to_string());
    }
    let mut seen = BTreeSet::new();
    for scenario in &suite.scenarios {
        let name = scenario.name.as_str();
        if name.trim().is_empty() {
            errors.push("scenario name cannot be empty".to_string());
        } else if !seen.insert(name) {
            errors.push(format!("duplicate scenario name `{name}`"));
        }
        if scenario.invariants.is_empty() {
            errors.push(format!("scenario `{name}` declares no invariants"));
        }
        for invariant in &scenario.invariants {
            if let Err(err) = invariant.validate() {
                errors.push(format!("scenario `{name}`: {err}"));
            }
        }
        if !scenario.is_negative() {
            for violation in scenario.payload.kind_violations() {
                errors.push(format!("scenario `{name}` payload field {violation}"));
            }
        }
    }
    for relation in &suite.relations {
        if let Err(err) = relation.validate() {
            errors.push(err);
        }
        for member in relation.members() {
            if !seen.contains(member) {
                errors.push(format!(
                    "{} relation references unknown scenario `{member}`",
                    relation.check()
                ));
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::Suite(format!(
            "suite `{}` is invalid: {}",
            suite.name,
            errors.join("; ")
        )))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use bijux_screen_model::{Endpoint, FieldKind, Invariant, Payload, ProbeStatus};

    const SUITE: &str = r#"
        name = "smoke"

        [[scenarios]]
        name = "high"
        endpoint = "behavioral"
        severity = "critical"
        payload = { A1_Score = { kind = "bounded_score", value = 1.0 }, gender = { kind = "categorical", value = "m" } }

        [[scenarios.invariants]]
        kind = "probability_above"
        threshold = 0.8

        [[scenarios]]
        name = "low"
        endpoint = "behavioral"
        payload = { A1_Score = { kind = "bounded_score", value = 0.0 } }

        [[scenarios.invariants]]
        kind = "probability_below"
        threshold = 0.2

        [[relations]]
        check = "polarity"
        high = ["high"]
        low = ["low"]
    "#;

    #[test]
    fn toml_suite_decodes_and_validates() {
        let suite = Suite::from_toml_str(SUITE, "fallback").expect("decode suite");
        assert_eq!(suite.name, "smoke");
        assert_eq!(suite.scenarios.len(), 2);
        assert_eq!(suite.scenarios[0].endpoint, Endpoint::Behavioral);
        assert_eq!(
            suite.scenarios[0].payload.get("A1_Score").map(|f| f.kind),
            Some(FieldKind::BoundedScore)
        );
        validate_suite(&suite).expect("valid suite");
    }

    #[test]
    fn unknown_relation_members_and_duplicates_are_rejected() {
        let scenario = Scenario::new("high", Endpoint::Behavioral, Payload::new())
            .invariant(Invariant::PredictionMatchesProbability);
        let suite = Suite::new("broken")
            .scenario(scenario.clone())
            .scenario(scenario)
            .relation(Relation::Polarity {
                high: vec!["high".to_string()],
                low: vec!["ghost".to_string()],
            });
        let err = validate_suite(&suite).expect_err("invalid").to_string();
        assert!(err.contains("duplicate scenario name `high`"));
        assert!(err.contains("unknown scenario `ghost`"));
    }

    #[test]
    fn kind_violations_are_allowed_only_for_negative_scenarios() {
        let bad = Payload::new().score("A1_Score", 1.5);
        let positive = Scenario::new("positive", Endpoint::Behavioral, bad.clone())
            .invariant(Invariant::PredictionMatchesProbability);
        let err = validate_suite(&Suite::new("s").scenario(positive)).expect_err("invalid");
        assert!(err.to_string().contains("A1_Score (bounded_score)"));

        let negative = Scenario::new("negative", Endpoint::Behavioral, bad).invariant(
            Invariant::StatusOneOf {
                allowed: vec![ProbeStatus::ClientError],
            },
        );
        validate_suite(&Suite::new("s").scenario(negative))
            .expect("negative payloads may break kinds");
    }

    #[test]
    fn load_suite_reads_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nightly.toml");
        std::fs::write(&path, SUITE.replace("name = \"smoke\"", "")).expect("write suite");
        let suite = load_suite(&path).expect("load suite");
        assert_eq!(suite.name, "nightly");

        let missing = load_suite(&dir.path().join("missing.toml")).expect_err("missing file");
        assert!(matches!(missing, HarnessError::Io { .. }));
    }
}
