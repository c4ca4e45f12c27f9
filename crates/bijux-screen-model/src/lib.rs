// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod endpoint;
mod finding;
mod payload;
mod response;
mod result;
mod scenario;
mod summary;

pub use endpoint::{Endpoint, HttpMethod};
pub use finding::{Finding, FindingOutcome, Relation};
pub use payload::{FieldKind, Payload, PayloadField};
pub use response::{
    ModelResult, ProbeStatus, Response, TransportFailure, TransportKind, ENSEMBLE_MODEL,
};
pub use result::{DefectClass, InvariantOutcome, Run, ScenarioResult, RESPONSE_STRUCTURE};
pub use scenario::{Invariant, Scenario, Severity};
pub use summary::{FailureEntry, FailureSource, Summary};

pub const CRATE_NAME: &str = "bijux-screen-model";

/// Decision boundary between the two binary labels.
pub const DECISION_THRESHOLD: f64 = 0.5;

pub(crate) fn duration_ms<S: serde::Serializer>(
    value: &std::time::Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}

/// Resolves a dotted path (`explanation.overall_result`) inside a JSON value.
#[must_use]
pub fn lookup_path<'a>(root: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut cur = root;
    for seg in path.split('.') {
        if seg.is_empty() {
            return None;
        }
        cur = cur.as_object()?.get(seg)?;
    }
    Some(cur)
}
