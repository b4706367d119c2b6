//! Authorization verdicts and decisions with snapshot metadata.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use strum_macros::EnumString;
use utoipa::ToSchema;

use super::aci_tuple::AciTuple;

/// The outcome of reducing the surviving tuples.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Grant,
    Deny,
    /// No rule addressed the request. Callers treat this as a denial unless
    /// they run with a default-grant policy of their own.
    #[default]
    NoApplicableRule,
}

impl Verdict {
    pub fn is_grant(&self) -> bool {
        matches!(self, Verdict::Grant)
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Verdict::Grant => write!(f, "Grant"),
            Verdict::Deny => write!(f, "Deny"),
            Verdict::NoApplicableRule => write!(f, "NoApplicableRule"),
        }
    }
}

/// Version metadata for the subentry snapshot used during an evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub struct SnapshotVersion {
    /// SHA-256 of the canonical form of the subentry set.
    pub hash: String,
    /// Incremented on every administrative change to the engine.
    pub generation: u64,
}

impl Display for SnapshotVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} #{}", self.hash, self.generation)
    }
}

/// A verdict together with the tuples that produced it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    /// The tuples that survived every filter stage.
    pub tuples: Vec<AciTuple>,
    pub version: SnapshotVersion,
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}(hash={}; tuples={})",
            self.verdict,
            self.version.hash,
            self.tuples.len()
        )
    }
}
