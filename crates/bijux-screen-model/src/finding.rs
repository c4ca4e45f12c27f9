// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Severity;

/// A relational expectation across several scenario results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Relation {
    Polarity {
        high: Vec<String>,
        low: Vec<String>,
    },
    Monotonic {
        low: String,
        neutral: String,
        high: String,
    },
    Variation {
        first: String,
        second: String,
        min_margin: f64,
    },
    Consistency {
        members: Vec<String>,
        max_variance: f64,
    },
}

impl Relation {
    #[must_use]
    pub const fn check(&self) -> &'static str {
        match self {
            Self::Polarity { .. } => "polarity",
            Self::Monotonic { .. } => "monotonic",
            Self::Variation { .. } => "variation",
            Self::Consistency { .. } => "consistency",
        }
    }

    /// Polarity inversions always escalate the run.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Polarity { .. } => Severity::Critical,
            _ => Severity::Normal,
        }
    }

    /// Every scenario name the relation reads.
    #[must_use]
    pub fn members(&self) -> Vec<&str> {
        match self {
            Self::Polarity { high, low } => high.iter().chain(low).map(String::as_str).collect(),
            Self::Monotonic { low, neutral, high } => {
                vec![low.as_str(), neutral.as_str(), high.as_str()]
            }
            Self::Variation { first, second, .. } => vec![first.as_str(), second.as_str()],
            Self::Consistency { members, .. } => members.iter().map(String::as_str).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Polarity { high, low } if high.is_empty() || low.is_empty() => {
                Err("polarity: both groups need at least one scenario".to_string())
            }
            Self::Variation { min_margin, .. }
                if !(min_margin.is_finite() && *min_margin >= 0.0) =>
            {
                Err(format!("variation: min_margin {min_margin} must be >= 0"))
            }
            Self::Consistency { members, .. } if members.len() < 2 => {
                Err("consistency: needs at least two repeated scenarios".to_string())
            }
            Self::Consistency { max_variance, .. }
                if !(max_variance.is_finite() && *max_variance > 0.0) =>
            {
                Err(format!("consistency: max_variance {max_variance} must be > 0"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingOutcome {
    Holds,
    Violated,
    Inconclusive,
}

impl FindingOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Holds => "holds",
            Self::Violated => "violated",
            Self::Inconclusive => "inconclusive",
        }
    }
}

impl fmt::Display for FindingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of one relation over a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub check: String,
    pub severity: Severity,
    pub outcome: FindingOutcome,
    pub message: String,
    pub scenarios: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observed: Vec<f64>,
    /// Set when the relation went undecided only because a member hit a 501.
    #[serde(default)]
    pub capability_missing: bool,
}

impl Finding {
    #[must_use]
    pub fn is_violation(&self) -> bool {
        self.outcome == FindingOutcome::Violated
    }

    #[must_use]
    pub fn is_polarity_violation(&self) -> bool {
        self.is_violation() && self.check == "polarity"
    }

    /// A critical relation that could not be decided for any reason other
    /// than an unavailable capability cannot sign off a deployment.
    #[must_use]
    pub fn is_undecided_critical(&self) -> bool {
        self.severity == Severity::Critical
            && self.outcome == FindingOutcome::Inconclusive
            && !self.capability_missing
    }

    /// Whether this finding keeps the run from being deployment ready.
    #[must_use]
    pub fn blocks_readiness(&self) -> bool {
        (self.severity == Severity::Critical && self.is_violation()) || self.is_undecided_critical()
    }
}
