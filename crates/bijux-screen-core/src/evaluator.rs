// SPDX-License-Identifier: Apache-2.0

//! Pure predicates over a normalized response.

use bijux_screen_model::{
    Invariant, InvariantOutcome, ProbeStatus, Response, DECISION_THRESHOLD, RESPONSE_STRUCTURE,
};
use serde_json::Value;

/// Evaluates every invariant in order. No short-circuit.
#[must_use]
pub fn evaluate_all(invariants: &[Invariant], response: &Response) -> Vec<InvariantOutcome> {
    invariants.iter().map(|inv| evaluate(inv, response)).collect()
}

#[must_use]
pub fn evaluate(invariant: &Invariant, response: &Response) -> InvariantOutcome {
    let name = invariant.name();
    match check(invariant, response) {
        Ok(()) => InvariantOutcome::pass(name),
        Err(message) => InvariantOutcome::fail(name, message),
    }
}

/// Mandatory scoring fields of a successful answer, and the label agreeing
/// with its probability at the decision threshold.
#[must_use]
pub fn structure_outcome(response: &Response) -> InvariantOutcome {
    let gaps = response.structural_gaps();
    if !gaps.is_empty() {
        return InvariantOutcome::fail(
            RESPONSE_STRUCTURE,
            format!(
                "missing or malformed mandatory field(s): {} (prediction must be 0 or 1)",
                gaps.join(", ")
            ),
        );
    }
    match label_agreement(response) {
        Ok(()) => InvariantOutcome::pass(RESPONSE_STRUCTURE),
        Err(message) => InvariantOutcome::fail(RESPONSE_STRUCTURE, message),
    }
}

fn label_agreement(response: &Response) -> Result<(), String> {
    let p = probability(response)?;
    let label = response
        .prediction
        .ok_or_else(|| "no binary prediction in response".to_string())?;
    let expected = u8::from(p > DECISION_THRESHOLD);
    if label == expected {
        Ok(())
    } else {
        Err(format!(
            "prediction {label} disagrees with probability {p:.6} (expected {expected} at threshold {DECISION_THRESHOLD})"
        ))
    }
}

fn probability(response: &Response) -> Result<f64, String> {
    response.probability.ok_or_else(|| {
        format!(
            "no probability in response (status {})",
            response.status.as_str()
        )
    })
}

fn check(invariant: &Invariant, response: &Response) -> Result<(), String> {
    match invariant {
        Invariant::ProbabilityAbove { threshold } => {
            let p = probability(response)?;
            if p > *threshold {
                Ok(())
            } else {
                Err(format!("probability {p:.6} not above {threshold}"))
            }
        }
        Invariant::ProbabilityBelow { threshold } => {
            let p = probability(response)?;
            if p < *threshold {
                Ok(())
            } else {
                Err(format!("probability {p:.6} not below {threshold}"))
            }
        }
        Invariant::ProbabilityBetween { low, high } => {
            let p = probability(response)?;
            if (*low..=*high).contains(&p) {
                Ok(())
            } else {
                Err(format!("probability {p:.6} outside [{low}, {high}]"))
            }
        }
        Invariant::PredictionMatchesProbability => label_agreement(response),
        Invariant::WeightsNormalized { tolerance } => {
            let ensemble = response
                .ensemble()
                .ok_or_else(|| "no pso entry in model_results".to_string())?;
            let weights = ensemble
                .weights
                .as_ref()
                .filter(|w| !w.is_empty())
                .ok_or_else(|| "pso entry carries no numeric weights".to_string())?;
            let sum: f64 = weights.iter().sum();
            if (sum - 1.0).abs() <= *tolerance {
                Ok(())
            } else {
                Err(format!("pso weights sum to {sum:.6}, expected 1.0 ± {tolerance}"))
            }
        }
        Invariant::ResponseTimeUnder { seconds } => {
            let observed = response.elapsed.as_secs_f64();
            if observed < *seconds {
                Ok(())
            } else {
                Err(format!("response took {observed:.3}s, expected under {seconds}s"))
            }
        }
        Invariant::StatusOneOf { allowed } => {
            if allowed.contains(&response.status) {
                Ok(())
            } else {
                Err(format!(
                    "status {} (HTTP {}) not in [{}]",
                    response.status.as_str(),
                    response.http_status,
                    allowed
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            }
        }
        Invariant::ScoresInUnitRange => {
            let mut offenders = Vec::new();
            let unit = |v: f64| (0.0..=1.0).contains(&v);
            if let Some(p) = response.probability.filter(|p| !unit(*p)) {
                offenders.push(format!("probability={p}"));
            }
            if let Some(c) = response.confidence.filter(|c| !unit(*c)) {
                offenders.push(format!("confidence={c}"));
            }
            for (model, result) in &response.model_results {
                if let Some(p) = result.probability.filter(|p| !unit(*p)) {
                    offenders.push(format!("{model}.probability={p}"));
                }
            }
            if response.status == ProbeStatus::Success && response.probability.is_none() {
                offenders.push("probability=missing".to_string());
            }
            if offenders.is_empty() {
                Ok(())
            } else {
                Err(format!("scores outside [0, 1]: {}", offenders.join(", ")))
            }
        }
        Invariant::FieldsPresent { paths } => {
            let missing = paths
                .iter()
                .filter(|p| response.field(p).is_none())
                .map(String::as_str)
                .collect::<Vec<_>>();
            if missing.is_empty() {
                Ok(())
            } else {
                Err(format!("missing field(s): {}", missing.join(", ")))
            }
        }
        Invariant::CountAtLeast { path, minimum } => {
            match response.field(path).and_then(Value::as_f64) {
                Some(v) if v >= *minimum => Ok(()),
                Some(v) => Err(format!("{path} = {v}, expected >= {minimum}")),
                None => Err(format!("{path} missing or non-numeric, expected >= {minimum}")),
            }
        }
    }
}
