// SPDX-License-Identifier: Apache-2.0

use bijux_screen_model::{
    DefectClass, FailureEntry, FailureSource, Finding, FindingOutcome, Run, ScenarioResult,
    Severity, Summary,
};

use crate::ExitCode;

/// Whether a failed result escalates the run.
///
/// Structural defects always do. A transport error only does once it
/// recurred across retries; a single-attempt one stays inconclusive.
#[must_use]
pub fn is_critical_failure(result: &ScenarioResult) -> bool {
    if result.passed {
        return false;
    }
    match result.defect {
        Some(DefectClass::StructuralDefect) => true,
        Some(DefectClass::TransportError) if result.attempts() <= 1 => false,
        _ => result.severity() == Severity::Critical,
    }
}

fn scenario_entry(result: &ScenarioResult, severity: Severity) -> FailureEntry {
    FailureEntry {
        source: FailureSource::Scenario,
        name: result.name().to_string(),
        severity,
        defect: result.defect,
        message: result
            .failure_message()
            .unwrap_or_else(|| "failed".to_string()),
    }
}

fn finding_entry(finding: &Finding) -> FailureEntry {
    let message = if finding.is_undecided_critical() {
        format!("could not be decided: {}", finding.message)
    } else {
        finding.message.clone()
    };
    FailureEntry {
        source: FailureSource::Finding,
        name: format!("{}({})", finding.check, finding.scenarios.join(", ")),
        severity: finding.severity,
        defect: None,
        message,
    }
}

#[must_use]
pub fn summarize(run: &Run, findings: &[Finding]) -> Summary {
    let total = run.results.len();
    let passed = run.results.iter().filter(|r| r.passed).count();
    let mut critical_failures = Vec::new();
    let mut normal_failures = Vec::new();
    for result in run.results.iter().filter(|r| !r.passed) {
        if is_critical_failure(result) {
            critical_failures.push(scenario_entry(result, Severity::Critical));
        } else {
            normal_failures.push(scenario_entry(result, Severity::Normal));
        }
    }
    for finding in findings {
        if finding.blocks_readiness() {
            critical_failures.push(finding_entry(finding));
        } else if finding.is_violation() {
            normal_failures.push(finding_entry(finding));
        }
    }
    let polarity_violated = findings.iter().any(Finding::is_polarity_violation);
    Summary {
        total,
        passed,
        failed: total - passed,
        skipped: run.skipped.len(),
        success_rate: if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        },
        unavailable: run.results.iter().filter(|r| r.is_unavailable()).count(),
        deployment_ready: critical_failures.is_empty() && !polarity_violated && !run.aborted,
        critical_failures,
        normal_failures,
        findings_violated: findings.iter().filter(|f| f.is_violation()).count(),
        findings_inconclusive: findings
            .iter()
            .filter(|f| f.outcome == FindingOutcome::Inconclusive)
            .count(),
        polarity_violated,
        aborted: run.aborted,
    }
}

#[must_use]
pub fn exit_code_for_summary(summary: &Summary) -> ExitCode {
    if summary.deployment_ready {
        ExitCode::Success
    } else {
        ExitCode::Validation
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use bijux_screen_model::{
        Endpoint, InvariantOutcome, Payload, ProbeStatus, Response, Scenario, TransportFailure,
        TransportKind,
    };
    use std::sync::Arc;
    use std::time::Duration;

    fn result(
        name: &str,
        severity: Severity,
        passed: bool,
        defect: Option<DefectClass>,
    ) -> ScenarioResult {
        let mut scenario = Scenario::new(name, Endpoint::Behavioral, Payload::new());
        scenario.severity = severity;
        ScenarioResult {
            scenario: Arc::new(scenario),
            response: Some(Response::new(ProbeStatus::Success, 200, Duration::ZERO)),
            transport: None,
            outcomes: if passed {
                Vec::new()
            } else {
                vec![InvariantOutcome::fail(
                    "probability_above(0.8)",
                    "probability 0.1 not above 0.8",
                )]
            },
            passed,
            defect,
            note: None,
        }
    }

    fn transport(name: &str, attempts: u32) -> ScenarioResult {
        let mut failure = TransportFailure::new(TransportKind::Connect, "refused");
        failure.attempts = attempts;
        let mut r = result(name, Severity::Critical, false, Some(DefectClass::TransportError));
        r.response = None;
        r.transport = Some(failure);
        r
    }

    fn run_of(results: Vec<ScenarioResult>) -> Run {
        Run {
            results,
            findings: Vec::new(),
            aborted: false,
            skipped: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn escalation_follows_severity_and_defect_class() {
        let violated = Some(DefectClass::InvariantViolation);
        let malformed = Some(DefectClass::StructuralDefect);
        assert!(is_critical_failure(&result("a", Severity::Critical, false, violated)));
        assert!(!is_critical_failure(&result("b", Severity::Normal, false, violated)));
        assert!(is_critical_failure(&result("c", Severity::Normal, false, malformed)));
        assert!(!is_critical_failure(&transport("d", 1)));
        assert!(is_critical_failure(&transport("e", 3)));
        assert!(!is_critical_failure(&result("f", Severity::Critical, true, None)));
    }

    #[test]
    fn normal_failures_do_not_block_readiness() {
        let run = run_of(vec![
            result("high", Severity::Critical, true, None),
            result("smoke", Severity::Normal, false, Some(DefectClass::InvariantViolation)),
        ]);
        let summary = summarize(&run, &[]);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed, 1);
        assert!((summary.success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(summary.normal_failures.len(), 1);
        assert!(summary.deployment_ready);
        assert_eq!(exit_code_for_summary(&summary), ExitCode::Success);
    }

    #[test]
    fn polarity_violation_blocks_readiness() {
        let run = run_of(vec![result("high", Severity::Critical, true, None)]);
        let finding = Finding {
            check: "polarity".to_string(),
            severity: Severity::Critical,
            outcome: FindingOutcome::Violated,
            message: "polarity inverted".to_string(),
            scenarios: vec!["high".to_string(), "low".to_string()],
            observed: vec![0.1, 0.9],
            capability_missing: false,
        };
        let summary = summarize(&run, &[finding]);
        assert!(summary.polarity_violated);
        assert_eq!(summary.critical_failures[0].name, "polarity(high, low)");
        assert_eq!(summary.critical_failures[0].source, FailureSource::Finding);
        assert!(!summary.deployment_ready);
        assert_eq!(exit_code_for_summary(&summary), ExitCode::Validation);
    }

    #[test]
    fn inconclusive_findings_are_counted_not_failed() {
        let finding = Finding {
            check: "variation".to_string(),
            severity: Severity::Normal,
            outcome: FindingOutcome::Inconclusive,
            message: "scenario `eye_normal` hit an unavailable capability".to_string(),
            scenarios: vec![],
            observed: vec![],
            capability_missing: true,
        };
        let summary = summarize(&run_of(Vec::new()), &[finding]);
        assert_eq!(summary.findings_inconclusive, 1);
        assert_eq!(summary.findings_violated, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert!(summary.deployment_ready);
    }

    #[test]
    fn undecided_critical_relations_block_readiness() {
        let run = run_of(vec![transport("high", 1), transport("low", 1)]);
        let finding = Finding {
            check: "polarity".to_string(),
            severity: Severity::Critical,
            outcome: FindingOutcome::Inconclusive,
            message: "scenario `high` produced no probability".to_string(),
            scenarios: vec!["high".to_string(), "low".to_string()],
            observed: vec![],
            capability_missing: false,
        };
        let summary = summarize(&run, &[finding]);
        assert!(!summary.polarity_violated);
        assert_eq!(summary.findings_inconclusive, 1);
        let entry = summary
            .critical_failures
            .iter()
            .find(|e| e.source == FailureSource::Finding)
            .expect("undecided polarity entry");
        assert!(entry.message.starts_with("could not be decided"));
        assert!(!summary.deployment_ready);
        assert_eq!(exit_code_for_summary(&summary), ExitCode::Validation);
    }
}
