// SPDX-License-Identifier: Apache-2.0

//! Wire body normalization. Pure; no I/O.

use std::collections::BTreeMap;
use std::time::Duration;

use bijux_screen_model::{Endpoint, ModelResult, ProbeStatus, Response};
use serde_json::Value;

/// Builds the normalized response for one answered exchange.
///
/// Missing or malformed scoring fields stay `None`; the engine reports them
/// as a structural defect rather than a transport error.
#[must_use]
pub fn normalize(endpoint: Endpoint, code: u16, body: &[u8], elapsed: Duration) -> Response {
    let mut response = Response::new(ProbeStatus::from_http(code), code, elapsed);
    let Ok(json) = serde_json::from_slice::<Value>(body) else {
        return response;
    };
    let (pred_key, prob_key, conf_key) = match endpoint {
        Endpoint::Complete => ("final_prediction", "final_probability", "confidence_score"),
        _ => ("prediction", "probability", "confidence"),
    };
    response.prediction = json.get(pred_key).and_then(binary_label);
    response.probability = json.get(prob_key).and_then(Value::as_f64);
    response.confidence = json.get(conf_key).and_then(Value::as_f64);
    if let Some(models) = json.get("model_results").and_then(Value::as_object) {
        response.model_results = models
            .iter()
            .map(|(name, entry)| (name.clone(), model_result(entry)))
            .collect::<BTreeMap<_, _>>();
    }
    response.body = Some(json);
    response
}

fn binary_label(value: &Value) -> Option<u8> {
    match value {
        Value::Bool(b) => Some(u8::from(*b)),
        Value::Number(n) => match (n.as_u64(), n.as_f64()) {
            (Some(0), _) => Some(0),
            (Some(1), _) => Some(1),
            (None, Some(f)) if f == 0.0 => Some(0),
            (None, Some(f)) if f == 1.0 => Some(1),
            _ => None,
        },
        _ => None,
    }
}

fn model_result(entry: &Value) -> ModelResult {
    ModelResult {
        probability: entry.get("probability").and_then(Value::as_f64),
        prediction: entry.get("prediction").and_then(binary_label),
        weights: entry.get("weights").and_then(Value::as_array).and_then(|xs| {
            xs.iter().map(Value::as_f64).collect::<Option<Vec<_>>>()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bijux_screen_model::ENSEMBLE_MODEL;

    #[test]
    fn behavioral_body_normalizes_scores_and_models() {
        let body = br#"{"prediction":1,"probability":0.91,"confidence":0.82,
            "model_results":{"random_forest":{"probability":0.9},
            "pso":{"probability":0.91,"prediction":1,"weights":[0.5,0.3,0.2]}}}"#;
        let r = normalize(Endpoint::Behavioral, 200, body, Duration::from_millis(12));
        assert_eq!(r.status, ProbeStatus::Success);
        assert_eq!(r.prediction, Some(1));
        assert_eq!(r.probability, Some(0.91));
        assert_eq!(r.confidence, Some(0.82));
        let pso = r.model_results.get(ENSEMBLE_MODEL).cloned().unwrap_or_default();
        assert_eq!(pso.weights, Some(vec![0.5, 0.3, 0.2]));
        assert_eq!(r.model_results["random_forest"].weights, None);
    }

    #[test]
    fn complete_body_maps_final_fields() {
        let body = br#"{"final_prediction":0,"final_probability":0.12,"confidence_score":0.7,
            "stages_completed":3,"explanation":{"overall_result":"low"}}"#;
        let r = normalize(Endpoint::Complete, 200, body, Duration::ZERO);
        assert_eq!(r.prediction, Some(0));
        assert_eq!(r.probability, Some(0.12));
        assert_eq!(r.confidence, Some(0.7));
        assert!(r.field("explanation.overall_result").is_some());
    }

    #[test]
    fn malformed_bodies_leave_scoring_fields_empty() {
        let r = normalize(Endpoint::Behavioral, 200, b"not json", Duration::ZERO);
        assert_eq!(r.status, ProbeStatus::Success);
        assert!(r.body.is_none());
        assert_eq!(r.structural_gaps(), vec!["prediction", "probability"]);

        let r = normalize(
            Endpoint::Behavioral,
            200,
            br#"{"prediction":2,"probability":0.4}"#,
            Duration::ZERO,
        );
        assert_eq!(r.prediction, None);
    }

    #[test]
    fn status_codes_classify_without_a_body() {
        assert_eq!(
            normalize(Endpoint::EyeTracking, 501, b"", Duration::ZERO).status,
            ProbeStatus::ServiceUnavailable
        );
        assert_eq!(
            normalize(Endpoint::Behavioral, 422, br#"{"detail":"bad"}"#, Duration::ZERO).status,
            ProbeStatus::ClientError
        );
    }
}
