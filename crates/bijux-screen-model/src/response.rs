// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Model-results entry that carries the ensemble weights.
pub const ENSEMBLE_MODEL: &str = "pso";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Success,
    ServiceUnavailable,
    ClientError,
    ServerError,
    TransportError,
}

impl ProbeStatus {
    /// Classifies an HTTP status code.
    #[must_use]
    pub const fn from_http(code: u16) -> Self {
        match code {
            200..=299 => Self::Success,
            501 => Self::ServiceUnavailable,
            400..=499 => Self::ClientError,
            _ => Self::ServerError,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ServiceUnavailable => "service_unavailable",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
            Self::TransportError => "transport_error",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
}

/// Normalized answer of the scored service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: ProbeStatus,
    pub http_status: u16,
    pub prediction: Option<u8>,
    pub probability: Option<f64>,
    pub confidence: Option<f64>,
    pub model_results: BTreeMap<String, ModelResult>,
    #[serde(rename = "elapsed_ms", serialize_with = "crate::duration_ms")]
    pub elapsed: Duration,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl Response {
    #[must_use]
    pub fn new(status: ProbeStatus, http_status: u16, elapsed: Duration) -> Self {
        Self {
            status,
            http_status,
            prediction: None,
            probability: None,
            confidence: None,
            model_results: BTreeMap::new(),
            elapsed,
            attempts: 1,
            body: None,
        }
    }

    #[must_use]
    pub fn ensemble(&self) -> Option<&ModelResult> {
        self.model_results.get(ENSEMBLE_MODEL)
    }

    #[must_use]
    pub fn field(&self, path: &str) -> Option<&Value> {
        self.body.as_ref().and_then(|b| crate::lookup_path(b, path))
    }

    /// Mandatory scoring fields that are absent.
    #[must_use]
    pub fn structural_gaps(&self) -> Vec<&'static str> {
        let mut gaps = Vec::new();
        if self.prediction.is_none() {
            gaps.push("prediction");
        }
        if self.probability.is_none() {
            gaps.push("probability");
        }
        gaps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Timeout,
    Connect,
    Request,
    Body,
}

impl TransportKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
        }
    }
}

/// A probe that never produced an HTTP answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportFailure {
    pub kind: TransportKind,
    pub detail: String,
    pub attempts: u32,
}

impl TransportFailure {
    #[must_use]
    pub fn new(kind: TransportKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            attempts: 1,
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transport error ({}) after {} attempt(s): {}",
            self.kind.as_str(),
            self.attempts,
            self.detail
        )
    }
}

impl std::error::Error for TransportFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_codes_classify_into_probe_status() {
        assert_eq!(ProbeStatus::from_http(200), ProbeStatus::Success);
        assert_eq!(ProbeStatus::from_http(501), ProbeStatus::ServiceUnavailable);
        assert_eq!(ProbeStatus::from_http(422), ProbeStatus::ClientError);
        assert_eq!(ProbeStatus::from_http(400), ProbeStatus::ClientError);
        assert_eq!(ProbeStatus::from_http(500), ProbeStatus::ServerError);
        assert_eq!(ProbeStatus::from_http(302), ProbeStatus::ServerError);
    }

    #[test]
    fn structural_gaps_name_missing_fields() {
        let mut response = Response::new(ProbeStatus::Success, 200, Duration::from_millis(5));
        assert_eq!(response.structural_gaps(), vec!["prediction", "probability"]);
        response.prediction = Some(1);
        response.probability = Some(0.9);
        assert!(response.structural_gaps().is_empty());
    }

    #[test]
    fn transport_failure_display_is_diagnosable() {
        let mut failure = TransportFailure::new(TransportKind::Timeout, "deadline 15s elapsed");
        failure.attempts = 3;
        assert_eq!(
            failure.to_string(),
            "transport error (timeout) after 3 attempt(s): deadline 15s elapsed"
        );
    }
}
