//! Health evaluation engine
//!
//! [`HealthAggregator`] runs every registered probe once per evaluation, in
//! registration order, and folds the outcomes into one [`Status`]:
//!
//! - a probe whose `should_run` declines is skipped and records nothing
//! - a probe reporting unhealthy downgrades the result to `UNHEALTHY`
//! - a probe that errors, panics or times out records `false` and sets
//!   `FAILED`, which no later probe can undo
//!
//! With no probes registered, or all of them skipped, the result is
//! `HEALTHY`.

use schema::Status;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::{Outcomes, Parameters, Probe, ProbeError, ProbeId};

/// Ordered collection of probes, built once at startup
#[derive(Default)]
pub struct ProbeRegistry {
    probes: Vec<Arc<dyn Probe>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a probe and return the handle its outcome will be recorded under
    pub fn register(&mut self, probe: Arc<dyn Probe>) -> ProbeId {
        let id = ProbeId(self.probes.len());
        debug!("registered health probe {} as {}", probe.name(), id);
        self.probes.push(probe);
        id
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Name of the probe registered under `id`
    pub fn name(&self, id: ProbeId) -> Option<&str> {
        self.probes.get(id.0).map(|probe| probe.name())
    }

    /// Probe names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.probes.iter().map(|probe| probe.name())
    }
}

impl std::fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.probes.iter().map(|probe| probe.name()))
            .finish()
    }
}

/// Everything one evaluation produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub status: Status,
    /// Outcomes of the probes that ran (or faulted), keyed by handle
    pub outcomes: Outcomes,
    /// Probes whose `should_run` declined, in registration order
    pub skipped: Vec<ProbeId>,
}

/// Runs the registered probes and reduces their outcomes to a [`Status`]
///
/// Evaluations share no mutable state, so one aggregator can serve
/// concurrent callers.
#[derive(Debug)]
pub struct HealthAggregator {
    registry: ProbeRegistry,
    probe_timeout: Option<Duration>,
}

impl HealthAggregator {
    pub fn new(registry: ProbeRegistry) -> Self {
        Self {
            registry,
            probe_timeout: None,
        }
    }

    /// Bound every `is_healthy` call; a probe exceeding `limit` counts as failed
    #[must_use]
    pub fn with_probe_timeout(mut self, limit: Duration) -> Self {
        self.probe_timeout = Some(limit);
        self
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Evaluate all probes and return the overall status
    pub async fn evaluate(&self, parameters: &Parameters) -> Status {
        self.evaluate_detailed(parameters).await.status
    }

    /// Evaluate all probes, keeping the per-probe outcomes
    pub async fn evaluate_detailed(&self, parameters: &Parameters) -> Evaluation {
        let parameters = Arc::new(parameters.clone());
        let mut status = Status::Healthy;
        let mut outcomes = Outcomes::default();
        let mut skipped = Vec::new();

        for (index, probe) in self.registry.probes.iter().enumerate() {
            let id = ProbeId(index);
            let name = probe.name();

            let should_run = catch_unwind(AssertUnwindSafe(|| probe.should_run(&outcomes)))
                .unwrap_or_else(|payload| Err(ProbeError::Panicked(panic_message(payload))));

            let result = match should_run {
                Ok(false) => {
                    info!("Skipping health check: {}", name);
                    skipped.push(id);
                    continue;
                }
                Ok(true) => self.run_probe(probe, &parameters).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(true) => {
                    debug!("Health check passed: {}", name);
                    outcomes.record(id, true);
                }
                Ok(false) => {
                    warn!("Health check FAILED: {}", name);
                    outcomes.record(id, false);
                    status = status.worst(Status::Unhealthy);
                }
                Err(e) => {
                    error!("Exception during health check {}: {}", name, e);
                    outcomes.record(id, false);
                    status = Status::Failed;
                }
            }
        }

        Evaluation {
            status,
            outcomes,
            skipped,
        }
    }

    /// Run one probe in its own task so a panic surfaces as an error
    ///
    /// The task is aborted if this future is dropped before it completes.
    async fn run_probe(
        &self,
        probe: &Arc<dyn Probe>,
        parameters: &Arc<Parameters>,
    ) -> Result<bool, ProbeError> {
        let probe = Arc::clone(probe);
        let parameters = Arc::clone(parameters);
        let mut task = AbortOnDrop(tokio::spawn(async move {
            probe.is_healthy(&parameters).await
        }));

        let joined = match self.probe_timeout {
            Some(limit) => match timeout(limit, &mut task.0).await {
                Ok(joined) => joined,
                Err(_elapsed) => return Err(ProbeError::Timeout(limit)),
            },
            None => (&mut task.0).await,
        };

        match joined {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => Err(ProbeError::Panicked(panic_message(
                join_error.into_panic(),
            ))),
            Err(join_error) => Err(ProbeError::Check(join_error.to_string())),
        }
    }
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
