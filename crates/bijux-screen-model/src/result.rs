// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::{Finding, ProbeStatus, Response, Scenario, Severity, TransportFailure};

/// Name of the leading outcome recorded for scoring responses.
pub const RESPONSE_STRUCTURE: &str = "response_structure";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvariantOutcome {
    pub invariant: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InvariantOutcome {
    #[must_use]
    pub fn pass(invariant: impl Into<String>) -> Self {
        Self {
            invariant: invariant.into(),
            passed: true,
            message: None,
        }
    }

    #[must_use]
    pub fn fail(invariant: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            invariant: invariant.into(),
            passed: false,
            message: Some(message.into()),
        }
    }
}

/// Error taxonomy class assigned to a failed (or unavailable) result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectClass {
    TransportError,
    ClientError,
    ServiceUnavailable,
    InvariantViolation,
    StructuralDefect,
}

impl DefectClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TransportError => "transport_error",
            Self::ClientError => "client_error",
            Self::ServiceUnavailable => "service_unavailable",
            Self::InvariantViolation => "invariant_violation",
            Self::StructuralDefect => "structural_defect",
        }
    }
}

fn scenario_name<S: Serializer>(value: &Arc<Scenario>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.name)
}

/// Outcome of executing one scenario. Built once by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    #[serde(serialize_with = "scenario_name")]
    pub scenario: Arc<Scenario>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportFailure>,
    pub outcomes: Vec<InvariantOutcome>,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defect: Option<DefectClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ScenarioResult {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.scenario.name
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.scenario.severity
    }

    #[must_use]
    pub fn status(&self) -> ProbeStatus {
        self.response
            .as_ref()
            .map_or(ProbeStatus::TransportError, |r| r.status)
    }

    /// Probability of an answered, available response.
    #[must_use]
    pub fn probability(&self) -> Option<f64> {
        self.response
            .as_ref()
            .filter(|r| r.status != ProbeStatus::ServiceUnavailable)
            .and_then(|r| r.probability)
    }

    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.status() == ProbeStatus::ServiceUnavailable
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.response
            .as_ref()
            .map(|r| r.attempts)
            .or_else(|| self.transport.as_ref().map(|t| t.attempts))
            .unwrap_or(0)
    }

    /// First failing outcome message, for one-line reports.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        self.outcomes
            .iter()
            .find(|o| !o.passed)
            .map(|o| match &o.message {
                Some(msg) => format!("{}: {msg}", o.invariant),
                None => o.invariant.clone(),
            })
    }
}

/// One execution of the harness. Owned by the caller once the engine returns.
#[derive(Debug, Clone, Serialize)]
pub struct Run {
    pub results: Vec<ScenarioResult>,
    pub findings: Vec<Finding>,
    pub aborted: bool,
    pub skipped: Vec<String>,
    #[serde(rename = "elapsed_ms", serialize_with = "crate::duration_ms")]
    pub elapsed: Duration,
}

impl Run {
    #[must_use]
    pub fn result(&self, name: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.name() == name)
    }

    #[must_use]
    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.findings = findings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Endpoint, Payload};

    fn result_with(response: Option<Response>) -> ScenarioResult {
        ScenarioResult {
            scenario: Arc::new(Scenario::new("s", Endpoint::Behavioral, Payload::new())),
            response,
            transport: None,
            outcomes: vec![
                InvariantOutcome::pass("prediction_matches_probability()"),
                InvariantOutcome::fail("probability_above(0.8)", "observed 0.4, expected > 0.8"),
            ],
            passed: false,
            defect: Some(DefectClass::InvariantViolation),
            note: None,
        }
    }

    #[test]
    fn unavailable_results_expose_no_probability() {
        let mut response = Response::new(ProbeStatus::ServiceUnavailable, 501, Duration::ZERO);
        response.probability = Some(0.3);
        let result = result_with(Some(response));
        assert!(result.is_unavailable());
        assert_eq!(result.probability(), None);
    }

    #[test]
    fn failure_message_names_first_failing_invariant() {
        let result = result_with(None);
        assert_eq!(result.status(), ProbeStatus::TransportError);
        assert_eq!(
            result.failure_message().as_deref(),
            Some("probability_above(0.8): observed 0.4, expected > 0.8")
        );
    }

    #[test]
    fn result_serializes_scenario_by_name() {
        let json = serde_json::to_value(result_with(None)).unwrap_or_default();
        assert_eq!(json["scenario"], "s");
        assert_eq!(json["defect"], "invariant_violation");
    }
}
