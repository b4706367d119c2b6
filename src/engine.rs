use std::sync::{Arc, RwLock};
#[cfg(feature = "observability")]
use std::time::Instant;

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::AciError;
use crate::filters::FilterContext;
use crate::loader;
#[cfg(feature = "observability")]
use crate::metrics::{self, EvaluationStats, StageTimings};
use crate::pipeline::{reduce, run_stages};
use crate::schema::{BasicSchema, SchemaLookup};
use crate::scoping::{self, RoleFilter};
use crate::types::{
    AciTuple, Decision, Dn, EvaluationContext, SnapshotVersion, Subentry, Verdict,
};

/// An immutable, versioned view of every subentry known to the engine.
#[derive(Debug)]
pub struct AciSnapshot {
    subentries: Vec<Subentry>,
    version: SnapshotVersion,
}

impl AciSnapshot {
    fn build(subentries: Vec<Subentry>, generation: u64) -> Result<Self, AciError> {
        loader::ensure_unique(&subentries)?;
        let hash = loader::fingerprint(&subentries)?;
        Ok(Self {
            subentries,
            version: SnapshotVersion { hash, generation },
        })
    }

    pub fn subentries(&self) -> &[Subentry] {
        &self.subentries
    }

    pub fn version(&self) -> &SnapshotVersion {
        &self.version
    }

    pub fn get(&self, uuid: &str) -> Option<&Subentry> {
        self.subentries.iter().find(|s| s.uuid() == uuid)
    }
}

/// The access control decision engine. Cloneable and thread-safe; clones
/// share the same subentry set.
///
/// Every evaluation works on the snapshot current when it started.
/// Administrative changes build a new snapshot and swap it in, so an
/// evaluation never sees a half-applied change.
#[derive(Clone)]
pub struct AciEngine {
    inner: Arc<RwLock<Arc<AciSnapshot>>>,
    schema: Arc<dyn SchemaLookup>,
    config: EngineConfig,
}

impl AciEngine {
    pub fn new(subentries: Vec<Subentry>) -> Result<Self, AciError> {
        let snapshot = AciSnapshot::build(subentries, 1)?;
        info!(
            event = "Snapshot",
            phase = "Initialized",
            subentries = snapshot.subentries.len(),
            hash = %snapshot.version.hash
        );
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
            schema: Arc::new(BasicSchema::new()),
            config: EngineConfig::default(),
        })
    }

    pub fn new_from_json(text: &str) -> Result<Self, AciError> {
        Self::new(loader::parse_subentries(text)?)
    }

    /// Use `schema` to resolve attribute ids instead of the built-in core
    /// registry.
    pub fn with_schema(mut self, schema: Arc<dyn SchemaLookup>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn current_snapshot(&self) -> Result<Arc<AciSnapshot>, AciError> {
        Ok(Arc::clone(&*self.inner.read()?))
    }

    pub fn current_version(&self) -> Result<SnapshotVersion, AciError> {
        Ok(self.current_snapshot()?.version.clone())
    }

    pub fn subentries(&self) -> Result<Vec<Subentry>, AciError> {
        Ok(self.current_snapshot()?.subentries.clone())
    }

    /// The ACI tuples that govern `target` before any filtering.
    pub fn candidates_for(&self, target: &Dn) -> Result<Vec<AciTuple>, AciError> {
        let snapshot = self.current_snapshot()?;
        Ok(scoping::candidates(target, &snapshot.subentries)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// The subentries of a role family whose scope covers `target`.
    pub fn subentries_for(
        &self,
        target: &Dn,
        filter: RoleFilter,
    ) -> Result<Vec<Subentry>, AciError> {
        let snapshot = self.current_snapshot()?;
        Ok(scoping::subentries_for(target, &snapshot.subentries, filter)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Decide a request and report the tuples that decided it.
    pub fn evaluate(&self, request: &EvaluationContext) -> Result<Decision, AciError> {
        #[cfg(feature = "observability")]
        let started = Instant::now();
        #[cfg(feature = "observability")]
        let mut timings = StageTimings::default();

        request.validate()?;
        debug!(
            event = "Evaluate",
            phase = "Request",
            user = %request.user_name,
            entry = %request.entry_name,
            scope = %request.scope,
            attribute = request.attribute_id.as_deref().unwrap_or(""),
            operations = request.micro_operations.iter().join(",")
        );

        let snapshot = self.current_snapshot()?;
        let candidates = scoping::candidates(&request.entry_name, &snapshot.subentries)?;
        let candidate_count = candidates.len();
        debug!(
            event = "Evaluate",
            phase = "Candidates",
            candidates = candidate_count,
            generation = snapshot.version.generation
        );

        let ctx = FilterContext::new(request, self.schema.as_ref());
        let survivors = run_stages(candidates, &ctx, |_stage, _remaining, _elapsed| {
            #[cfg(feature = "observability")]
            timings.record(_stage, _elapsed);
        })?;

        let verdict = reduce(&survivors);
        debug!(
            event = "Evaluate",
            phase = "Result",
            verdict = %verdict,
            survivors = survivors.len()
        );

        #[cfg(feature = "observability")]
        {
            let duration = started.elapsed();
            timings.total_ms = duration.as_secs_f64() * 1_000.0;
            metrics::record_evaluation(
                EvaluationStats {
                    duration,
                    verdict,
                    user: request.user_name.to_string(),
                    entry: request.entry_name.to_string(),
                    candidates: candidate_count,
                    survivors: survivors.len(),
                },
                &timings,
            );
        }

        Ok(Decision {
            verdict,
            tuples: survivors.into_iter().cloned().collect(),
            version: snapshot.version.clone(),
        })
    }

    /// Decide a request. With `EngineConfig::fail_closed` set, errors are
    /// reported as `Deny`. `NoApplicableRule` is reported as
    /// `EngineConfig::no_rule_verdict`.
    pub fn decide(&self, request: &EvaluationContext) -> Result<Verdict, AciError> {
        self.raw_verdict(request).map(|verdict| self.substitute_no_rule(verdict))
    }

    /// Decide a request, turning any error into `Deny`.
    pub fn decide_fail_closed(&self, request: &EvaluationContext) -> Verdict {
        self.evaluate(request)
            .map(|decision| self.substitute_no_rule(decision.verdict))
            .unwrap_or_else(|err| Self::deny_on_error(request, &err))
    }

    fn raw_verdict(&self, request: &EvaluationContext) -> Result<Verdict, AciError> {
        match self.evaluate(request) {
            Ok(decision) => Ok(decision.verdict),
            Err(err) if self.config.fail_closed => Ok(Self::deny_on_error(request, &err)),
            Err(err) => Err(err),
        }
    }

    fn substitute_no_rule(&self, verdict: Verdict) -> Verdict {
        match verdict {
            Verdict::NoApplicableRule => self.config.no_rule_verdict,
            verdict => verdict,
        }
    }

    fn deny_on_error(request: &EvaluationContext, err: &AciError) -> Verdict {
        warn!(
            event = "Evaluate",
            phase = "FailClosed",
            user = %request.user_name,
            entry = %request.entry_name,
            error = %err
        );
        Verdict::Deny
    }

    /// `Ok(())` on `Grant`, otherwise `InsufficientAccessRights`. A request no
    /// rule addresses is rejected whatever `no_rule_verdict` says.
    pub fn check(&self, request: &EvaluationContext) -> Result<(), AciError> {
        match self.raw_verdict(request)? {
            Verdict::Grant => Ok(()),
            verdict => Err(AciError::InsufficientAccessRights(format!(
                "{} on '{}' for '{}': {verdict}",
                request.micro_operations.iter().join(","),
                request.entry_name,
                request.user_name
            ))),
        }
    }

    /// Replace every subentry at once.
    pub fn reload(&self, subentries: Vec<Subentry>) -> Result<SnapshotVersion, AciError> {
        self.update("Reload", move |_| Ok(subentries))
    }

    pub fn reload_from_json(&self, text: &str) -> Result<SnapshotVersion, AciError> {
        self.reload(loader::parse_subentries(text)?)
    }

    pub fn add_subentry(&self, subentry: Subentry) -> Result<SnapshotVersion, AciError> {
        self.update("AddSubentry", move |current| {
            let mut next = current.to_vec();
            next.push(subentry);
            Ok(next)
        })
    }

    pub fn remove_subentry(&self, uuid: &str) -> Result<SnapshotVersion, AciError> {
        self.update("RemoveSubentry", |current| {
            if !current.iter().any(|s| s.uuid() == uuid) {
                return Err(AciError::SubentryNotFound(uuid.to_string()));
            }
            Ok(current.iter().filter(|s| s.uuid() != uuid).cloned().collect())
        })
    }

    /// Swap in a new version of the subentry with the same uuid.
    pub fn replace_subentry(&self, subentry: Subentry) -> Result<SnapshotVersion, AciError> {
        self.update("ReplaceSubentry", move |current| {
            let Some(position) = current.iter().position(|s| s.uuid() == subentry.uuid()) else {
                return Err(AciError::SubentryNotFound(subentry.uuid().to_string()));
            };
            let mut next = current.to_vec();
            next[position] = subentry;
            Ok(next)
        })
    }

    fn update<F>(&self, change: &str, apply: F) -> Result<SnapshotVersion, AciError>
    where
        F: FnOnce(&[Subentry]) -> Result<Vec<Subentry>, AciError>,
    {
        let mut guard = self.inner.write()?;
        let next = apply(&guard.subentries)?;
        let snapshot = AciSnapshot::build(next, guard.version.generation + 1)?;
        let version = snapshot.version.clone();
        info!(
            event = "Snapshot",
            phase = change,
            subentries = snapshot.subentries.len(),
            generation = version.generation,
            hash = %version.hash
        );
        #[cfg(feature = "observability")]
        metrics::record_reload(version.generation, snapshot.subentries.len());
        *guard = Arc::new(snapshot);
        Ok(version)
    }
}

#[cfg(test)]
mod tests;
