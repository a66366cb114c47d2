//! Core types and traits for health checking

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{ProbeError, Parameters};

/// Opaque handle identifying one registered probe
///
/// Handles are issued by [`ProbeRegistry::register`](super::ProbeRegistry::register)
/// in registration order. Two registrations of the same probe type get
/// different handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProbeId(pub(crate) usize);

impl ProbeId {
    /// Position of the probe in registration order
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ProbeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "probe#{}", self.0)
    }
}

/// Outcomes recorded so far during one evaluation
///
/// Probes only ever see this through a shared reference; recording is
/// reserved to the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcomes {
    entries: BTreeMap<ProbeId, bool>,
}

impl Outcomes {
    /// The recorded result for `id`, if that probe has run
    pub fn get(&self, id: ProbeId) -> Option<bool> {
        self.entries.get(&id).copied()
    }

    /// Whether `id` ran and reported unhealthy (or failed)
    pub fn is_unhealthy(&self, id: ProbeId) -> bool {
        self.get(id) == Some(false)
    }

    pub fn contains(&self, id: ProbeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded outcomes in registration order
    pub fn iter(&self) -> impl Iterator<Item = (ProbeId, bool)> + '_ {
        self.entries.iter().map(|(id, healthy)| (*id, *healthy))
    }

    pub(crate) fn record(&mut self, id: ProbeId, healthy: bool) {
        self.entries.insert(id, healthy);
    }
}

/// Trait for health check implementations
///
/// A probe tests one subsystem. Returning `Ok(false)` is the ordinary way to
/// report an unhealthy subsystem; `Err` is reserved for faults that prevent
/// the check from completing. Implementations must be safe to call from
/// concurrent evaluations and should bound any blocking they do.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Name used in log output
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Decide whether to run, given the outcomes of probes evaluated earlier
    /// in the same pass
    fn should_run(&self, _prior: &Outcomes) -> Result<bool, ProbeError> {
        Ok(true)
    }

    /// Execute the health check
    async fn is_healthy(&self, parameters: &Parameters) -> Result<bool, ProbeError>;
}

/// Strip the module path and generic arguments from a type name
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Runs `inner` only when the `prerequisite` probe did not report unhealthy
///
/// A prerequisite that was skipped, or has not run yet, does not block the
/// inner probe.
#[derive(Debug, Clone)]
pub struct RequiresHealthy<P> {
    inner: P,
    prerequisite: ProbeId,
}

impl<P> RequiresHealthy<P> {
    pub fn new(inner: P, prerequisite: ProbeId) -> Self {
        Self {
            inner,
            prerequisite,
        }
    }

    pub fn prerequisite(&self) -> ProbeId {
        self.prerequisite
    }
}

#[async_trait]
impl<P: Probe> Probe for RequiresHealthy<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn should_run(&self, prior: &Outcomes) -> Result<bool, ProbeError> {
        if prior.is_unhealthy(self.prerequisite) {
            return Ok(false);
        }
        self.inner.should_run(prior)
    }

    async fn is_healthy(&self, parameters: &Parameters) -> Result<bool, ProbeError> {
        self.inner.is_healthy(parameters).await
    }
}
