// SPDX-License-Identifier: Apache-2.0

//! Relational checks over a finished run. Reads results only; never probes.

use bijux_screen_model::{Finding, FindingOutcome, Relation, Run, ScenarioResult};
use tracing::{info, warn};

#[must_use]
pub fn analyze(run: &Run, relations: &[Relation]) -> Vec<Finding> {
    relations
        .iter()
        .map(|relation| {
            let finding = evaluate_relation(run, relation);
            match finding.outcome {
                FindingOutcome::Violated => warn!(
                    check = finding.check.as_str(),
                    severity = finding.severity.as_str(),
                    message = finding.message.as_str(),
                    "relation violated"
                ),
                _ => info!(
                    check = finding.check.as_str(),
                    outcome = finding.outcome.as_str(),
                    "relation evaluated"
                ),
            }
            finding
        })
        .collect()
}

fn evaluate_relation(run: &Run, relation: &Relation) -> Finding {
    let scenarios = relation
        .members()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let verdict = match relation {
        Relation::Polarity { high, low } => polarity(run, high, low),
        Relation::Monotonic { low, neutral, high } => monotonic(run, low, neutral, high),
        Relation::Variation {
            first,
            second,
            min_margin,
        } => variation(run, first, second, *min_margin),
        Relation::Consistency {
            members,
            max_variance,
        } => consistency(run, members, *max_variance),
    };
    let (outcome, message, observed, capability_missing) = match verdict {
        Ok((true, message, observed)) => (FindingOutcome::Holds, message, observed, false),
        Ok((false, message, observed)) => (FindingOutcome::Violated, message, observed, false),
        Err(undecided) => (
            FindingOutcome::Inconclusive,
            undecided.message,
            Vec::new(),
            undecided.capability_missing,
        ),
    };
    Finding {
        check: relation.check().to_string(),
        severity: relation.severity(),
        outcome,
        message,
        scenarios,
        observed,
        capability_missing,
    }
}

/// Why a relation could not be decided.
#[derive(Debug)]
struct Undecided {
    message: String,
    capability_missing: bool,
}

impl From<String> for Undecided {
    fn from(message: String) -> Self {
        Self {
            message,
            capability_missing: false,
        }
    }
}

/// `(holds, message, observed values)`, or the reason it cannot be decided.
type Verdict = Result<(bool, String, Vec<f64>), Undecided>;

fn member<'a>(run: &'a Run, name: &str) -> Result<&'a ScenarioResult, Undecided> {
    let result = run
        .result(name)
        .ok_or_else(|| format!("scenario `{name}` was not executed"))?;
    if result.is_unavailable() {
        return Err(Undecided {
            message: format!("scenario `{name}` hit an unavailable capability"),
            capability_missing: true,
        });
    }
    Ok(result)
}

fn probability_of(run: &Run, name: &str) -> Result<f64, Undecided> {
    member(run, name)?
        .probability()
        .ok_or_else(|| format!("scenario `{name}` produced no probability").into())
}

fn mean_of(run: &Run, names: &[String]) -> Result<f64, Undecided> {
    let values = names
        .iter()
        .map(|n| probability_of(run, n))
        .collect::<Result<Vec<_>, _>>()?;
    if values.is_empty() {
        return Err("empty scenario group".to_string().into());
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

fn polarity(run: &Run, high: &[String], low: &[String]) -> Verdict {
    let h = mean_of(run, high)?;
    let l = mean_of(run, low)?;
    let message = if h > l {
        format!("high-indicator probability {h:.6} exceeds low-indicator probability {l:.6}")
    } else {
        format!(
            "polarity inverted: high-indicator probability {h:.6} <= low-indicator probability {l:.6}"
        )
    };
    Ok((h > l, message, vec![h, l]))
}

fn monotonic(run: &Run, low: &str, neutral: &str, high: &str) -> Verdict {
    let l = probability_of(run, low)?;
    let n = probability_of(run, neutral)?;
    let h = probability_of(run, high)?;
    let holds = l <= n && n <= h;
    let message = format!(
        "ordering low {l:.6} <= neutral {n:.6} <= high {h:.6} {}",
        if holds { "holds" } else { "broken" }
    );
    Ok((holds, message, vec![l, n, h]))
}

fn variation(run: &Run, first: &str, second: &str, min_margin: f64) -> Verdict {
    let a = probability_of(run, first)?;
    let b = probability_of(run, second)?;
    let diff = (a - b).abs();
    let holds = diff > min_margin;
    let message = if holds {
        format!("`{first}` and `{second}` differ by {diff:.6} (> {min_margin})")
    } else {
        format!(
            "`{first}` and `{second}` differ by only {diff:.6}, expected > {min_margin}: service does not discriminate"
        )
    };
    Ok((holds, message, vec![a, b]))
}

fn consistency(run: &Run, members: &[String], max_variance: f64) -> Verdict {
    let mut probabilities = Vec::with_capacity(members.len());
    let mut predictions = Vec::with_capacity(members.len());
    for name in members {
        let result = member(run, name)?;
        let response = result
            .response
            .as_ref()
            .ok_or_else(|| format!("scenario `{name}` has no response"))?;
        probabilities.push(
            response
                .probability
                .ok_or_else(|| format!("scenario `{name}` produced no probability"))?,
        );
        predictions.push(
            response
                .prediction
                .ok_or_else(|| format!("scenario `{name}` produced no prediction"))?,
        );
    }
    let n = probabilities.len() as f64;
    let mean = probabilities.iter().sum::<f64>() / n;
    let variance = probabilities.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    let same_label = predictions.windows(2).all(|w| w[0] == w[1]);
    let holds = same_label && variance < max_variance;
    let message = match (same_label, variance < max_variance) {
        (true, true) => format!(
            "{} repeats agree: variance {variance:.8} < {max_variance}",
            members.len()
        ),
        (false, _) => format!("repeated identical payloads produced predictions {predictions:?}"),
        (true, false) => format!(
            "repeated identical payloads vary: variance {variance:.8}, expected < {max_variance}"
        ),
    };
    Ok((holds, message, probabilities))
}
