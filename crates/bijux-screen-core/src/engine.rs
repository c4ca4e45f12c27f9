// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bijux_screen_adapters::ProbeClient;
use bijux_screen_model::{
    DefectClass, InvariantOutcome, ProbeStatus, Response, Run, Scenario, ScenarioResult,
    TransportFailure, TransportKind, RESPONSE_STRUCTURE,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::evaluator::{evaluate_all, structure_outcome};
use crate::reporter::is_critical_failure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum probes in flight. `1` runs scenarios sequentially.
    pub concurrency: usize,
    /// Timeout handed to the probe client for each request.
    pub probe_timeout: Duration,
    /// Hard ceiling around one scenario's probe, retries included.
    pub scenario_deadline: Duration,
    pub fail_fast: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        let probe_timeout = Duration::from_secs(15);
        Self {
            concurrency: 1,
            probe_timeout,
            scenario_deadline: probe_timeout + Duration::from_secs(1),
            fail_fast: false,
        }
    }
}

/// Shared stop flag. Tripped by the caller (Ctrl-C) or by fail-fast.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trip(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Engine {
    probe: Arc<dyn ProbeClient>,
    options: RunOptions,
    abort: AbortSignal,
}

enum Slot {
    Pending,
    Done(ScenarioResult),
    Skipped,
}

impl Engine {
    #[must_use]
    pub fn new(probe: Arc<dyn ProbeClient>, options: RunOptions) -> Self {
        Self {
            probe,
            options,
            abort: AbortSignal::new(),
        }
    }

    #[must_use]
    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    /// Executes every scenario and returns the run in submission order.
    pub async fn run(&self, scenarios: Vec<Scenario>) -> Run {
        let started = Instant::now();
        let scenarios = scenarios.into_iter().map(Arc::new).collect::<Vec<_>>();
        info!(
            scenarios = scenarios.len(),
            concurrency = self.options.concurrency,
            backend = self.probe.backend_tag(),
            "run started"
        );
        let slots = if self.options.concurrency <= 1 {
            self.run_sequential(&scenarios).await
        } else {
            self.run_concurrent(&scenarios).await
        };

        let mut results = Vec::with_capacity(slots.len());
        let mut skipped = Vec::new();
        for (scenario, slot) in scenarios.iter().zip(slots) {
            match slot {
                Slot::Done(result) => results.push(result),
                Slot::Skipped => skipped.push(scenario.name.clone()),
                Slot::Pending => {
                    let failure = TransportFailure::new(
                        TransportKind::Request,
                        "probe task terminated abnormally",
                    );
                    results.push(transport_result(Arc::clone(scenario), failure));
                }
            }
        }
        let aborted = self.abort.is_tripped();
        if aborted {
            warn!(skipped = skipped.len(), "run aborted before completion");
        }
        Run {
            results,
            findings: Vec::new(),
            aborted,
            skipped,
            elapsed: started.elapsed(),
        }
    }

    async fn run_sequential(&self, scenarios: &[Arc<Scenario>]) -> Vec<Slot> {
        let mut slots = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            if self.abort.is_tripped() {
                slots.push(Slot::Skipped);
                continue;
            }
            let probe = Arc::clone(&self.probe);
            let result = execute_scenario(probe, Arc::clone(scenario), &self.options).await;
            self.observe(&result);
            slots.push(Slot::Done(result));
        }
        slots
    }

    async fn run_concurrent(&self, scenarios: &[Arc<Scenario>]) -> Vec<Slot> {
        let permits = Arc::new(Semaphore::new(self.options.concurrency));
        let mut tasks = JoinSet::new();
        for (idx, scenario) in scenarios.iter().enumerate() {
            let permits = Arc::clone(&permits);
            let probe = Arc::clone(&self.probe);
            let scenario = Arc::clone(scenario);
            let options = self.options.clone();
            let abort = self.abort.clone();
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (idx, None);
                };
                if abort.is_tripped() {
                    return (idx, None);
                }
                (idx, Some(execute_scenario(probe, scenario, &options).await))
            });
        }

        // Single insertion point: only this loop writes into `slots`.
        let mut slots = scenarios.iter().map(|_| Slot::Pending).collect::<Vec<_>>();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Some(result))) => {
                    self.observe(&result);
                    slots[idx] = Slot::Done(result);
                }
                Ok((idx, None)) => slots[idx] = Slot::Skipped,
                Err(err) => warn!(error = %err, "scenario task failed"),
            }
        }
        slots
    }

    fn observe(&self, result: &ScenarioResult) {
        if result.passed {
            info!(
                scenario = result.name(),
                status = result.status().as_str(),
                note = result.note.as_deref().unwrap_or(""),
                "scenario passed"
            );
        } else {
            warn!(
                scenario = result.name(),
                status = result.status().as_str(),
                defect = result.defect.map_or("", |d| d.as_str()),
                message = %result.failure_message().unwrap_or_default(),
                "scenario failed"
            );
        }
        if self.options.fail_fast && is_critical_failure(result) {
            warn!(scenario = result.name(), "critical failure, aborting run");
            self.abort.trip();
        }
    }
}

/// Probes one scenario and judges the answer. Never panics on service behavior.
pub async fn execute_scenario(
    probe: Arc<dyn ProbeClient>,
    scenario: Arc<Scenario>,
    options: &RunOptions,
) -> ScenarioResult {
    let answered = tokio::time::timeout(
        options.scenario_deadline,
        probe.probe(scenario.endpoint, &scenario.payload, options.probe_timeout),
    )
    .await;
    match answered {
        Ok(Ok(response)) => judge(scenario, response),
        Ok(Err(failure)) => transport_result(scenario, failure),
        Err(_) => transport_result(
            scenario,
            TransportFailure::new(
                TransportKind::Timeout,
                format!(
                    "no answer within {}ms",
                    options.scenario_deadline.as_millis()
                ),
            ),
        ),
    }
}

fn transport_result(scenario: Arc<Scenario>, failure: TransportFailure) -> ScenarioResult {
    ScenarioResult {
        scenario,
        response: None,
        outcomes: vec![InvariantOutcome::fail("transport", failure.to_string())],
        transport: Some(failure),
        passed: false,
        defect: Some(DefectClass::TransportError),
        note: None,
    }
}

fn judge(scenario: Arc<Scenario>, response: Response) -> ScenarioResult {
    if response.status == ProbeStatus::ServiceUnavailable {
        let note = format!(
            "{} capability not deployed (HTTP {}); counted as pass",
            scenario.endpoint, response.http_status
        );
        return ScenarioResult {
            scenario,
            response: Some(response),
            transport: None,
            outcomes: Vec::new(),
            passed: true,
            defect: Some(DefectClass::ServiceUnavailable),
            note: Some(note),
        };
    }

    let mut outcomes = Vec::with_capacity(scenario.invariants.len() + 1);
    if response.status == ProbeStatus::Success && scenario.endpoint.is_scoring() {
        outcomes.push(structure_outcome(&response));
    }
    outcomes.extend(evaluate_all(&scenario.invariants, &response));
    let passed = outcomes.iter().all(|o| o.passed);

    let structural = outcomes
        .iter()
        .any(|o| o.invariant == RESPONSE_STRUCTURE && !o.passed);
    let defect = if passed {
        None
    } else if structural {
        Some(DefectClass::StructuralDefect)
    } else if response.status == ProbeStatus::ClientError && !scenario.is_negative() {
        Some(DefectClass::ClientError)
    } else {
        Some(DefectClass::InvariantViolation)
    };
    ScenarioResult {
        scenario,
        response: Some(response),
        transport: None,
        outcomes,
        passed,
        defect,
        note: None,
    }
}
