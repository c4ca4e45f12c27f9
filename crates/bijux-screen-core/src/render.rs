// SPDX-License-Identifier: Apache-2.0

use bijux_screen_model::Summary;

use crate::suite::Suite;
use crate::{HarnessError, RunReport};

#[must_use]
pub fn render_text_summary(summary: &Summary) -> String {
    format!(
        "summary: total={} passed={} failed={} skipped={} unavailable={} success_rate={:.1}% findings_violated={} findings_inconclusive={} deployment_ready={}",
        summary.total,
        summary.passed,
        summary.failed,
        summary.skipped,
        summary.unavailable,
        summary.success_rate * 100.0,
        summary.findings_violated,
        summary.findings_inconclusive,
        summary.deployment_ready,
    )
}

#[must_use]
pub fn render_text(report: &RunReport) -> String {
    let mut lines = vec![format!(
        "run: session={} suite={} base_url={} elapsed_ms={}",
        report.session_id,
        report.suite,
        report.base_url,
        report.run.elapsed.as_millis()
    )];
    for result in &report.run.results {
        let mut line = format!(
            "scenario: {} status={} passed={}",
            result.name(),
            result.status().as_str(),
            result.passed
        );
        if let Some(defect) = result.defect.filter(|_| !result.passed) {
            line.push_str(&format!(" defect={}", defect.as_str()));
        }
        if result.attempts() > 1 {
            line.push_str(&format!(" attempts={}", result.attempts()));
        }
        lines.push(line);
        for outcome in result.outcomes.iter().filter(|o| !o.passed) {
            lines.push(format!(
                "  fail: {}: {}",
                outcome.invariant,
                outcome.message.as_deref().unwrap_or("failed")
            ));
        }
        if let Some(note) = &result.note {
            lines.push(format!("  note: {note}"));
        }
    }
    for finding in &report.run.findings {
        lines.push(format!(
            "finding: {} outcome={} severity={} scenarios={}: {}",
            finding.check,
            finding.outcome.as_str(),
            finding.severity.as_str(),
            finding.scenarios.join(","),
            finding.message
        ));
    }
    if !report.run.skipped.is_empty() {
        lines.push(format!("skipped: {}", report.run.skipped.join(", ")));
    }
    for entry in &report.summary.critical_failures {
        lines.push(format!("critical: {}: {}", entry.name, entry.message));
    }
    lines.push(render_text_summary(&report.summary));
    lines.join("\n")
}

pub fn render_json(report: &RunReport) -> Result<String, HarnessError> {
    serde_json::to_string_pretty(report).map_err(|e| HarnessError::Render(e.to_string()))
}

#[must_use]
pub fn render_suite_text(suite: &Suite) -> String {
    let mut lines = vec![format!(
        "suite: {} scenarios={} relations={}",
        suite.name,
        suite.scenarios.len(),
        suite.relations.len()
    )];
    for scenario in &suite.scenarios {
        lines.push(format!(
            "scenario: {} endpoint={} severity={} invariants={}",
            scenario.name,
            scenario.endpoint,
            scenario.severity,
            scenario
                .invariants
                .iter()
                .map(|inv| inv.name())
                .collect::<Vec<_>>()
                .join("; ")
        ));
    }
    for relation in &suite.relations {
        lines.push(format!(
            "relation: {} severity={} scenarios={}",
            relation.check(),
            relation.severity(),
            relation.members().join(",")
        ));
    }
    lines.join("\n")
}

pub fn render_suite_json(suite: &Suite) -> Result<String, HarnessError> {
    serde_json::to_string_pretty(suite).map_err(|e| HarnessError::Render(e.to_string()))
}
