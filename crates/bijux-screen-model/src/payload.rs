// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declared semantic type of a payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Numeric score in `[0, 1]`, or an array / map of such scores.
    BoundedScore,
    /// Finite continuous measurement.
    Measurement,
    /// Categorical code such as a sex marker.
    Categorical,
    /// Free-form identifier such as a session id.
    Identifier,
}

impl FieldKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BoundedScore => "bounded_score",
            Self::Measurement => "measurement",
            Self::Categorical => "categorical",
            Self::Identifier => "identifier",
        }
    }

    fn check(self, value: &Value) -> Result<(), String> {
        match self {
            Self::BoundedScore => match value {
                Value::Array(items) if !items.is_empty() => {
                    items.iter().try_for_each(|v| self.check(v))
                }
                Value::Object(items) if !items.is_empty() => {
                    items.values().try_for_each(|v| self.check(v))
                }
                _ => match value.as_f64() {
                    Some(v) if (0.0..=1.0).contains(&v) => Ok(()),
                    Some(v) => Err(format!("score {v} outside [0, 1]")),
                    None => Err(format!("expected numeric score, got {value}")),
                },
            },
            Self::Measurement => match value.as_f64() {
                Some(v) if v.is_finite() => Ok(()),
                _ => Err(format!("expected finite measurement, got {value}")),
            },
            Self::Categorical | Self::Identifier => match value.as_str() {
                Some(v) if !v.trim().is_empty() => Ok(()),
                _ => Err(format!("expected non-empty string, got {value}")),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayloadField {
    pub kind: FieldKind,
    pub value: Value,
}

/// Named request fields sent to an assessment endpoint.
///
/// Values are raw JSON so that negative scenarios can carry inputs that break
/// their declared kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, PayloadField>);

impl Payload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, kind: FieldKind, value: impl Into<Value>) -> Self {
        self.0.insert(
            name.to_string(),
            PayloadField {
                kind,
                value: value.into(),
            },
        );
        self
    }

    #[must_use]
    pub fn score(self, name: &str, value: f64) -> Self {
        self.with(name, FieldKind::BoundedScore, value)
    }

    #[must_use]
    pub fn measurement(self, name: &str, value: f64) -> Self {
        self.with(name, FieldKind::Measurement, value)
    }

    #[must_use]
    pub fn categorical(self, name: &str, value: &str) -> Self {
        self.with(name, FieldKind::Categorical, value)
    }

    #[must_use]
    pub fn identifier(self, name: &str, value: &str) -> Self {
        self.with(name, FieldKind::Identifier, value)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PayloadField> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wire body: a flat JSON object of field name to value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (name, field) in &self.0 {
            out.insert(name.clone(), field.value.clone());
        }
        Value::Object(out)
    }

    /// Fields whose value breaks the declared kind, as `name: reason`.
    #[must_use]
    pub fn kind_violations(&self) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|(name, field)| {
                field
                    .kind
                    .check(&field.value)
                    .err()
                    .map(|reason| format!("{name} ({}): {reason}", field.kind.as_str()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_body_is_flat_object() {
        let payload = Payload::new()
            .score("A1_Score", 1.0)
            .measurement("age", 25.0)
            .categorical("gender", "m");
        assert_eq!(
            payload.to_json(),
            json!({"A1_Score": 1.0, "age": 25.0, "gender": "m"})
        );
        assert_eq!(payload.len(), 3);
    }

    #[test]
    fn kind_violations_report_each_broken_field() {
        let payload = Payload::new()
            .score("A1_Score", 1.5)
            .with("A2_Score", FieldKind::BoundedScore, "invalid")
            .with("age", FieldKind::Measurement, "not_number")
            .categorical("gender", "m");
        let violations = payload.kind_violations();
        assert_eq!(violations.len(), 3);
        assert!(violations[0].starts_with("A1_Score (bounded_score): score 1.5"));
        assert!(violations[1].contains("expected numeric score"));
        assert!(violations[2].starts_with("age (measurement)"));
    }

    #[test]
    fn conforming_payload_has_no_violations() {
        let payload = Payload::new()
            .score("A1_Score", 0.0)
            .score("A2_Score", 1.0)
            .identifier("session_id", "validation_session_1")
            .with("facial_features", FieldKind::BoundedScore, vec![0.2; 128])
            .with(
                "emotion_scores",
                FieldKind::BoundedScore,
                json!({"happy": 0.4, "neutral": 0.5, "sad": 0.1}),
            );
        assert!(payload.kind_violations().is_empty());

        let nested =
            Payload::new().with("emotion_scores", FieldKind::BoundedScore, json!({"happy": 1.4}));
        assert_eq!(nested.kind_violations().len(), 1);
    }
}
