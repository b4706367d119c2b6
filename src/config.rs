use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::Verdict;

/// Engine behaviour that embedders may tune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct EngineConfig {
    /// Report evaluation errors from `decide` as `Deny` instead of `Err`.
    pub fail_closed: bool,
    /// What `decide` reports when no tuple survives the pipeline. `evaluate`
    /// and `check` always see `NoApplicableRule`.
    pub no_rule_verdict: Verdict,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fail_closed: false,
            no_rule_verdict: Verdict::NoApplicableRule,
        }
    }
}

impl EngineConfig {
    pub fn fail_closed(mut self, fail_closed: bool) -> Self {
        self.fail_closed = fail_closed;
        self
    }

    pub fn no_rule_verdict(mut self, verdict: Verdict) -> Self {
        self.no_rule_verdict = verdict;
        self
    }
}
