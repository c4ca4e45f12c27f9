// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

use crate::{DefectClass, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureSource {
    Scenario,
    Finding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub source: FailureSource,
    pub name: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defect: Option<DefectClass>,
    pub message: String,
}

/// Aggregated verdict of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub success_rate: f64,
    pub unavailable: usize,
    pub critical_failures: Vec<FailureEntry>,
    pub normal_failures: Vec<FailureEntry>,
    pub findings_violated: usize,
    pub findings_inconclusive: usize,
    pub polarity_violated: bool,
    pub aborted: bool,
    pub deployment_ready: bool,
}
