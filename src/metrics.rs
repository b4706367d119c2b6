//! Backend-agnostic metrics via a pluggable sink.
//!
//! **Note:** only compiled with the `observability` feature.
//!
//! Implement [`MetricsSink`] and install it once with [`set_sink`]; until then
//! events are dropped.
//!
//! ```ignore
//! use aci_core::metrics::{EvaluationStats, MetricsSink, ReloadStats};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! struct Denials(AtomicU64);
//!
//! impl MetricsSink for Denials {
//!     fn on_evaluation(&self, stats: &EvaluationStats) {
//!         if !stats.verdict.is_grant() {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn on_reload(&self, _stats: &ReloadStats) {}
//! }
//!
//! aci_core::metrics::set_sink(Arc::new(Denials(AtomicU64::new(0))));
//! ```

use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime};
use tracing::warn;

use crate::pipeline::Stage;
use crate::types::Verdict;

/// One completed evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationStats {
    /// Wall-clock time from request validation to verdict.
    pub duration: Duration,
    pub verdict: Verdict,
    /// Requester name.
    pub user: String,
    /// Target entry name.
    pub entry: String,
    /// Tuples collected from the subentries in scope.
    pub candidates: usize,
    /// Tuples left after the last stage.
    pub survivors: usize,
}

/// Time spent in each pipeline stage that ran, in milliseconds.
///
/// Stages skipped because an earlier one left nothing are absent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageTimings {
    pub stages: Vec<(Stage, f64)>,
    pub total_ms: f64,
}

impl StageTimings {
    pub(crate) fn record(&mut self, stage: Stage, elapsed: Duration) {
        self.stages.push((stage, elapsed.as_secs_f64() * 1_000.0));
    }

    pub fn stage_ms(&self, stage: Stage) -> Option<f64> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, ms)| *ms)
    }

    /// Time not attributed to any stage (scoping, reduction, bookkeeping).
    pub fn overhead_ms(&self) -> f64 {
        self.total_ms - self.stages.iter().map(|(_, ms)| ms).sum::<f64>()
    }
}

/// One completed administrative change.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadStats {
    pub reload_time: SystemTime,
    /// Generation of the snapshot now in effect.
    pub generation: u64,
    /// Subentries in the new snapshot.
    pub subentries: usize,
}

/// Consumer of evaluation and reload metrics.
///
/// Called synchronously on the evaluation path and possibly from many
/// threads at once: implementations must be cheap and thread-safe.
pub trait MetricsSink: Send + Sync {
    fn on_evaluation(&self, stats: &EvaluationStats);

    fn on_reload(&self, stats: &ReloadStats);

    /// Per-stage breakdown of an evaluation. Ignored unless overridden.
    fn on_evaluation_phases(&self, _stats: &EvaluationStats, _timings: &StageTimings) {}
}

static SINK: OnceLock<Arc<dyn MetricsSink>> = OnceLock::new();

/// Install the process-wide sink. Only the first call takes effect; events
/// recorded before it are dropped.
pub fn set_sink(sink: Arc<dyn MetricsSink>) {
    if SINK.set(sink).is_err() {
        warn!(
            "Metrics sink was already initialized. Ignoring subsequent set_sink call."
        );
    }
}

pub(crate) fn record_evaluation(stats: EvaluationStats, timings: &StageTimings) {
    if let Some(sink) = SINK.get() {
        sink.on_evaluation(&stats);
        sink.on_evaluation_phases(&stats, timings);
    }
}

pub(crate) fn record_reload(generation: u64, subentries: usize) {
    if let Some(sink) = SINK.get() {
        sink.on_reload(&ReloadStats {
            reload_time: SystemTime::now(),
            generation,
            subentries,
        });
    }
}
