// SPDX-License-Identifier: Apache-2.0

//! Built-in suites.

use bijux_screen_model::{Endpoint, FieldKind, Invariant, Payload, ProbeStatus, Relation, Scenario};
use serde_json::json;

use crate::suite::Suite;

pub const SUITE_NAMES: [&str; 4] = ["validation", "inversion", "compatibility", "profiles"];

/// Weight-sum tolerance for the ensemble entry.
const WEIGHT_TOLERANCE: f64 = 0.1;

#[must_use]
pub fn suite(name: &str, session_id: &str) -> Option<Suite> {
    match name {
        "validation" => Some(validation(session_id)),
        "inversion" => Some(inversion(session_id)),
        "compatibility" => Some(compatibility(session_id)),
        "profiles" => Some(profiles()),
        _ => None,
    }
}

/// Ten indicator scores plus subject age and sex code.
#[must_use]
pub fn behavioral_payload(scores: [f64; 10], age: f64, gender: &str) -> Payload {
    scores
        .iter()
        .enumerate()
        .fold(Payload::new(), |payload, (idx, score)| {
            payload.score(&format!("A{}_Score", idx + 1), *score)
        })
        .measurement("age", age)
        .categorical("gender", gender)
}

/// Gaze, fixation, saccade and pupil measurements, in wire order.
#[must_use]
pub fn eye_tracking_payload(values: [f64; 9]) -> Payload {
    const FIELDS: [&str; 9] = [
        "fixation_count",
        "mean_saccade",
        "max_saccade",
        "std_saccade",
        "mean_x",
        "mean_y",
        "std_x",
        "std_y",
        "mean_pupil",
    ];
    FIELDS
        .iter()
        .zip(values)
        .fold(Payload::new(), |payload, (name, value)| payload.measurement(name, value))
}

fn session_payload(session_id: &str) -> Payload {
    Payload::new().identifier("session_id", session_id)
}

fn uniform(score: f64) -> [f64; 10] {
    [score; 10]
}

fn scored(name: &str, endpoint: Endpoint, payload: Payload) -> Scenario {
    Scenario::new(name, endpoint, payload)
        .invariant(Invariant::PredictionMatchesProbability)
        .invariant(Invariant::WeightsNormalized {
            tolerance: WEIGHT_TOLERANCE,
        })
}

fn status(allowed: &[ProbeStatus]) -> Invariant {
    Invariant::StatusOneOf {
        allowed: allowed.to_vec(),
    }
}

fn above(threshold: f64) -> Invariant {
    Invariant::ProbabilityAbove { threshold }
}

fn below(threshold: f64) -> Invariant {
    Invariant::ProbabilityBelow { threshold }
}

fn names(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| (*s).to_string()).collect()
}

fn polarity(high: &[&str], low: &[&str]) -> Relation {
    Relation::Polarity {
        high: names(high),
        low: names(low),
    }
}

fn eye_normal() -> [f64; 9] {
    [120.0, 25.0, 45.0, 8.0, 512.0, 384.0, 50.0, 40.0, 3.5]
}

fn eye_abnormal() -> [f64; 9] {
    [45.0, 65.0, 120.0, 25.0, 200.0, 150.0, 150.0, 120.0, 2.8]
}

fn complete(name: &str, session_id: &str, fields: &[&str]) -> Scenario {
    Scenario::new(name, Endpoint::Complete, session_payload(session_id))
        .invariant(status(&[ProbeStatus::Success]))
        .invariant(Invariant::PredictionMatchesProbability)
        .invariant(Invariant::FieldsPresent {
            paths: names(fields),
        })
}

fn validation(session_id: &str) -> Suite {
    Suite::new("validation")
        .scenario(
            scored(
                "behavioral_high_indicators",
                Endpoint::Behavioral,
                behavioral_payload(uniform(1.0), 25.0, "m"),
            )
            .invariant(above(0.8))
            .critical(),
        )
        .scenario(
            scored(
                "behavioral_low_indicators",
                Endpoint::Behavioral,
                behavioral_payload(uniform(0.0), 30.0, "f"),
            )
            .invariant(below(0.2))
            .critical(),
        )
        .scenario(scored(
            "behavioral_neutral_indicators",
            Endpoint::Behavioral,
            behavioral_payload(uniform(0.5), 28.0, "m"),
        ))
        .scenario(scored(
            "eye_tracking_normal",
            Endpoint::EyeTracking,
            eye_tracking_payload(eye_normal()),
        ))
        .scenario(scored(
            "eye_tracking_abnormal",
            Endpoint::EyeTracking,
            eye_tracking_payload(eye_abnormal()),
        ))
        .scenario(
            Scenario::new("health", Endpoint::Health, Payload::new())
                .invariant(status(&[ProbeStatus::Success])),
        )
        .scenario(
            Scenario::new(
                "behavioral_smoke",
                Endpoint::Behavioral,
                behavioral_payload(uniform(0.5), 25.0, "m"),
            )
            .invariant(status(&[ProbeStatus::Success])),
        )
        .scenario(complete("complete_session", session_id, &["stages_completed"]))
        .relation(polarity(
            &["behavioral_high_indicators"],
            &["behavioral_low_indicators"],
        ))
        .relation(Relation::Monotonic {
            low: "behavioral_low_indicators".to_string(),
            neutral: "behavioral_neutral_indicators".to_string(),
            high: "behavioral_high_indicators".to_string(),
        })
        .relation(Relation::Variation {
            first: "eye_tracking_normal".to_string(),
            second: "eye_tracking_abnormal".to_string(),
            min_margin: 0.1,
        })
}

fn inversion(session_id: &str) -> Suite {
    Suite::new("inversion")
        .scenario(
            scored(
                "high_indicators",
                Endpoint::Behavioral,
                behavioral_payload(uniform(1.0), 25.0, "m"),
            )
            .invariant(above(0.5))
            .critical(),
        )
        .scenario(
            scored(
                "low_indicators",
                Endpoint::Behavioral,
                behavioral_payload(uniform(0.0), 25.0, "f"),
            )
            .invariant(below(0.5))
            .critical(),
        )
        .scenario(
            scored(
                "mixed_neutral",
                Endpoint::Behavioral,
                behavioral_payload([0.5, 0.0, 1.0, 0.5, 1.0, 0.5, 0.0, 0.5, 1.0, 0.5], 30.0, "m"),
            )
            .invariant(Invariant::ProbabilityBetween { low: 0.1, high: 0.9 }),
        )
        .scenario(scored(
            "eye_tracking_asd_pattern",
            Endpoint::EyeTracking,
            eye_tracking_payload([120.0, 25.0, 45.0, 8.0, 400.0, 200.0, 150.0, 120.0, 3.0]),
        ))
        .scenario(complete(
            "complete_integration",
            session_id,
            &["stage_results", "explanation.overall_result"],
        ))
        .scenarios(
            Scenario::new(
                "stability",
                Endpoint::Behavioral,
                behavioral_payload([0.5, 1.0, 0.0, 0.5, 1.0, 0.0, 0.5, 1.0, 0.0, 0.5], 28.0, "f"),
            )
            .invariant(status(&[ProbeStatus::Success]))
            .invariant(Invariant::ResponseTimeUnder { seconds: 5.0 })
            .repeated(3),
        )
        .relation(polarity(&["high_indicators"], &["low_indicators"]))
}

fn compatibility(session_id: &str) -> Suite {
    let consistency = scored(
        "consistency",
        Endpoint::Behavioral,
        behavioral_payload([1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0], 30.0, "m"),
    )
    .repeated(5);
    let consistency_names = consistency.iter().map(|s| s.name.clone()).collect();
    let range = |name: &str, scores: [f64; 10]| {
        scored(name, Endpoint::Behavioral, behavioral_payload(scores, 25.0, "f"))
            .invariant(Invariant::ScoresInUnitRange)
    };
    let negative = |name: &str, payload: Payload| {
        Scenario::new(name, Endpoint::Behavioral, payload)
            .invariant(status(&[ProbeStatus::ClientError]))
    };
    Suite::new("compatibility")
        .scenarios(consistency)
        .scenario(range("range_high", uniform(1.0)).invariant(above(0.6)))
        .scenario(range("range_low", uniform(0.0)).invariant(below(0.4)))
        .scenario(range(
            "range_mixed",
            [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0],
        ))
        .scenarios(
            scored(
                "pso_stability",
                Endpoint::Behavioral,
                behavioral_payload([0.5, 1.0, 0.5, 0.0, 1.0, 0.5, 0.0, 0.5, 1.0, 0.5], 28.0, "m"),
            )
            .invariant(Invariant::ResponseTimeUnder { seconds: 15.0 })
            .repeated(3),
        )
        .scenario(
            scored(
                "eye_tracking_structure",
                Endpoint::EyeTracking,
                eye_tracking_payload([85.0, 42.5, 95.2, 18.7, 640.0, 480.0, 120.5, 90.3, 3.8]),
            )
            .invariant(Invariant::FieldsPresent {
                paths: names(&["prediction", "probability", "confidence", "model_results"]),
            }),
        )
        .scenario(
            Scenario::new(
                "facial_analysis",
                Endpoint::FacialAnalysis,
                Payload::new()
                    .with("facial_features", FieldKind::BoundedScore, vec![0.2; 128])
                    .with(
                        "emotion_scores",
                        FieldKind::BoundedScore,
                        json!({"happy": 0.4, "neutral": 0.5, "sad": 0.1}),
                    )
                    .with(
                        "attention_patterns",
                        FieldKind::BoundedScore,
                        json!({"attention_to_faces": 0.3, "attention_to_objects": 0.7}),
                    ),
            )
            .invariant(status(&[ProbeStatus::Success]))
            .invariant(Invariant::ScoresInUnitRange),
        )
        .scenario(complete("complete_pipeline", session_id, &["stages_completed"]))
        .scenario(negative(
            "invalid_score_range",
            Payload::new()
                .score("A1_Score", 1.5)
                .measurement("age", 25.0)
                .categorical("gender", "m"),
        ))
        .scenario(negative(
            "missing_required_fields",
            Payload::new().score("A1_Score", 1.0),
        ))
        .scenario(negative(
            "invalid_data_types",
            Payload::new()
                .with("A1_Score", FieldKind::BoundedScore, "invalid")
                .with("age", FieldKind::Measurement, "not_number")
                .categorical("gender", "m"),
        ))
        .scenario(scored(
            "neutral_all",
            Endpoint::Behavioral,
            behavioral_payload(uniform(0.5), 28.0, "f"),
        ))
        .scenario(scored(
            "neutral_mixed_extremes",
            Endpoint::Behavioral,
            behavioral_payload([0.0, 0.5, 1.0, 0.5, 0.0, 1.0, 0.5, 0.0, 0.5, 1.0], 28.0, "f"),
        ))
        .scenario(
            Scenario::new("health", Endpoint::Health, Payload::new())
                .invariant(status(&[ProbeStatus::Success]))
                .invariant(Invariant::ResponseTimeUnder { seconds: 5.0 })
                .invariant(Invariant::CountAtLeast {
                    path: "models_loaded".to_string(),
                    minimum: 4.0,
                }),
        )
        .scenario(
            Scenario::new("api_root", Endpoint::ApiRoot, Payload::new())
                .invariant(status(&[ProbeStatus::Success]))
                .invariant(Invariant::FieldsPresent {
                    paths: names(&["message", "version", "status", "stages"]),
                }),
        )
        .scenario(
            Scenario::new(
                "response_time",
                Endpoint::Behavioral,
                behavioral_payload([1.0, 0.5, 1.0, 0.0, 1.0, 0.5, 0.0, 0.5, 1.0, 0.0], 27.0, "f"),
            )
            .invariant(status(&[ProbeStatus::Success]))
            .invariant(Invariant::ResponseTimeUnder { seconds: 15.0 }),
        )
        .relation(Relation::Consistency {
            members: consistency_names,
            max_variance: 0.01,
        })
}

fn profiles() -> Suite {
    let profile = |name: &str, scores: [f64; 10], age: f64, gender: &str, expected: Invariant| {
        scored(name, Endpoint::Behavioral, behavioral_payload(scores, age, gender))
            .invariant(expected)
    };
    Suite::new("profiles")
        .scenario(profile("profile_all_high", uniform(1.0), 25.0, "m", above(0.7)))
        .scenario(profile("profile_all_low", uniform(0.0), 30.0, "f", below(0.3)))
        .scenario(profile(
            "profile_all_neutral",
            uniform(0.5),
            28.0,
            "m",
            Invariant::ProbabilityBetween { low: 0.3, high: 0.7 },
        ))
        .scenario(profile(
            "profile_mixed_high",
            [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            22.0,
            "f",
            above(0.7),
        ))
        .scenario(profile(
            "profile_mixed_low",
            [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            35.0,
            "m",
            below(0.6),
        ))
        .relation(polarity(
            &["profile_all_high", "profile_mixed_high"],
            &["profile_all_low", "profile_mixed_low"],
        ))
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::suite::validate_suite;
    use bijux_screen_model::Severity;

    #[test]
    fn every_builtin_suite_validates() {
        for name in SUITE_NAMES {
            let suite = suite(name, "validation_session_1").expect("known suite");
            validate_suite(&suite).expect("builtin suite is valid");
        }
        assert!(suite("nightly", "s").is_none());
    }

    #[test]
    fn canonical_pair_is_critical_with_strict_thresholds() {
        let suite = suite("validation", "s").expect("validation suite");
        let high = &suite.scenarios[0];
        assert_eq!(high.severity, Severity::Critical);
        assert!(high.invariants.contains(&Invariant::ProbabilityAbove { threshold: 0.8 }));
        assert_eq!(
            high.payload.to_json(),
            json!({"A1_Score": 1.0, "A2_Score": 1.0, "A3_Score": 1.0, "A4_Score": 1.0,
                   "A5_Score": 1.0, "A6_Score": 1.0, "A7_Score": 1.0, "A8_Score": 1.0,
                   "A9_Score": 1.0, "A10_Score": 1.0, "age": 25.0, "gender": "m"})
        );
        assert_eq!(suite.relations[0].check(), "polarity");
    }

    #[test]
    fn inversion_suite_uses_the_decision_boundary() {
        let suite = suite("inversion", "s").expect("inversion suite");
        assert!(suite.scenarios[0]
            .invariants
            .contains(&Invariant::ProbabilityAbove { threshold: 0.5 }));
    }

    #[test]
    fn negative_scenarios_expect_client_errors() {
        let suite = suite("compatibility", "s").expect("compatibility suite");
        let negatives = suite
            .scenarios
            .iter()
            .filter(|s| s.is_negative())
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            negatives,
            vec!["invalid_score_range", "missing_required_fields", "invalid_data_types"]
        );
    }

    #[test]
    fn complete_scenarios_carry_the_session_id() {
        let suite = suite("validation", "validation_session_42").expect("validation suite");
        let complete = suite
            .scenarios
            .iter()
            .find(|s| s.endpoint == Endpoint::Complete)
            .expect("complete scenario");
        assert_eq!(
            complete.payload.to_json(),
            json!({"session_id": "validation_session_42"})
        );
    }
}
