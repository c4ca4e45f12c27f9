// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Endpoint, Payload, ProbeStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    #[default]
    Normal,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stateless predicate over a normalized response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Invariant {
    ProbabilityAbove { threshold: f64 },
    ProbabilityBelow { threshold: f64 },
    ProbabilityBetween { low: f64, high: f64 },
    PredictionMatchesProbability,
    WeightsNormalized { tolerance: f64 },
    ResponseTimeUnder { seconds: f64 },
    StatusOneOf { allowed: Vec<ProbeStatus> },
    ScoresInUnitRange,
    FieldsPresent { paths: Vec<String> },
    CountAtLeast { path: String, minimum: f64 },
}

impl Invariant {
    /// Stable display name, parameters included.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::ProbabilityAbove { threshold } => format!("probability_above({threshold})"),
            Self::ProbabilityBelow { threshold } => format!("probability_below({threshold})"),
            Self::ProbabilityBetween { low, high } => {
                format!("probability_between({low}, {high})")
            }
            Self::PredictionMatchesProbability => "prediction_matches_probability()".to_string(),
            Self::WeightsNormalized { tolerance } => format!("weights_normalized({tolerance})"),
            Self::ResponseTimeUnder { seconds } => format!("response_time_under({seconds})"),
            Self::StatusOneOf { allowed } => format!(
                "status_one_of({})",
                allowed
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::ScoresInUnitRange => "scores_in_unit_range()".to_string(),
            Self::FieldsPresent { paths } => format!("fields_present({})", paths.join(", ")),
            Self::CountAtLeast { path, minimum } => format!("count_at_least({path}, {minimum})"),
        }
    }

    /// Rejects parameters that make the predicate meaningless.
    pub fn validate(&self) -> Result<(), String> {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        match self {
            Self::ProbabilityAbove { threshold } | Self::ProbabilityBelow { threshold }
                if !unit(*threshold) =>
            {
                Err(format!("{}: threshold must lie in [0, 1]", self.name()))
            }
            Self::ProbabilityBetween { low, high } if !unit(*low) || !unit(*high) || low > high => {
                Err(format!("{}: expected 0 <= low <= high <= 1", self.name()))
            }
            Self::WeightsNormalized { tolerance }
                if !(tolerance.is_finite() && *tolerance >= 0.0) =>
            {
                Err(format!("{}: tolerance must be >= 0", self.name()))
            }
            Self::ResponseTimeUnder { seconds } if !(seconds.is_finite() && *seconds > 0.0) => {
                Err(format!("{}: seconds must be > 0", self.name()))
            }
            Self::StatusOneOf { allowed } if allowed.is_empty() => {
                Err("status_one_of(): allowed set cannot be empty".to_string())
            }
            Self::FieldsPresent { paths }
                if paths.is_empty() || paths.iter().any(|p| p.trim().is_empty()) =>
            {
                Err(format!("{}: paths must be non-empty", self.name()))
            }
            Self::CountAtLeast { path, .. } if path.trim().is_empty() => {
                Err(format!("{}: path must be non-empty", self.name()))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// One declarative test case. Built before a run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    pub endpoint: Endpoint,
    #[serde(default)]
    pub payload: Payload,
    pub invariants: Vec<Invariant>,
    #[serde(default)]
    pub severity: Severity,
}

impl Scenario {
    #[must_use]
    pub fn new(name: impl Into<String>, endpoint: Endpoint, payload: Payload) -> Self {
        Self {
            name: name.into(),
            endpoint,
            payload,
            invariants: Vec::new(),
            severity: Severity::Normal,
        }
    }

    #[must_use]
    pub fn invariant(mut self, invariant: Invariant) -> Self {
        self.invariants.push(invariant);
        self
    }

    #[must_use]
    pub fn critical(mut self) -> Self {
        self.severity = Severity::Critical;
        self
    }

    /// Negative scenarios assert a status set that excludes success.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.invariants.iter().any(|inv| {
            matches!(
                inv,
                Invariant::StatusOneOf { allowed } if !allowed.contains(&ProbeStatus::Success)
            )
        })
    }

    /// Copies of this scenario named `<name>_1 .. <name>_<times>`.
    #[must_use]
    pub fn repeated(&self, times: usize) -> Vec<Self> {
        (1..=times)
            .map(|idx| Self {
                name: format!("{}_{idx}", self.name),
                ..self.clone()
            })
            .collect()
    }
}
