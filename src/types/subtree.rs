//! Subtree specifications: the scope predicates of administrative subentries.

use std::collections::BTreeSet;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::AciError;

use super::dn::Dn;

/// A predicate deciding whether an entry falls under a policy scope.
///
/// `matches` must be total over names: an entry outside the scope is
/// `Ok(false)`. An `Err` means the predicate itself is unusable (malformed or
/// its backing collaborator failed) and must not be read as "out of scope".
pub trait ScopePredicate: Debug + Send + Sync {
    fn matches(&self, dn: &Dn) -> Result<bool, AciError>;
}

/// A subtree specification with an absolute base.
///
/// `minimum`/`maximum` bound the depth below `base` (a `maximum` of 0 means
/// unbounded). `chop_before` names, relative to `base`, are excluded together
/// with their subordinates; `chop_after` names keep the named entry but exclude
/// its subordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubtreeSpecification {
    #[serde(default)]
    pub base: Dn,
    #[serde(default)]
    pub minimum: u32,
    #[serde(default)]
    pub maximum: u32,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub chop_before: BTreeSet<Dn>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub chop_after: BTreeSet<Dn>,
}

impl SubtreeSpecification {
    /// The whole subtree rooted at `base`, base entry included.
    pub fn new(base: Dn) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    pub fn with_minimum(mut self, minimum: u32) -> Self {
        self.minimum = minimum;
        self
    }

    pub fn with_maximum(mut self, maximum: u32) -> Self {
        self.maximum = maximum;
        self
    }

    pub fn with_chop_before(mut self, relative: Dn) -> Self {
        self.chop_before.insert(relative);
        self
    }

    pub fn with_chop_after(mut self, relative: Dn) -> Self {
        self.chop_after.insert(relative);
        self
    }

    pub fn validate(&self) -> Result<(), AciError> {
        if self.maximum != 0 && self.maximum < self.minimum {
            return Err(AciError::Configuration(format!(
                "subtree specification for '{}' has maximum {} below minimum {}",
                self.base, self.maximum, self.minimum
            )));
        }
        if let Some(chop) = self
            .chop_before
            .iter()
            .chain(self.chop_after.iter())
            .find(|chop| chop.is_root())
        {
            return Err(AciError::Configuration(format!(
                "subtree specification for '{}' has an empty chop name '{chop}'",
                self.base
            )));
        }
        Ok(())
    }
}

impl ScopePredicate for SubtreeSpecification {
    fn matches(&self, dn: &Dn) -> Result<bool, AciError> {
        self.validate()?;

        let Some(depth) = dn.depth_below(&self.base) else {
            return Ok(false);
        };
        let depth = depth as u64;
        if depth < u64::from(self.minimum) {
            return Ok(false);
        }
        if self.maximum != 0 && depth > u64::from(self.maximum) {
            return Ok(false);
        }

        for chop in &self.chop_before {
            if dn.is_descendant_or_self(&chop.concat(&self.base)) {
                return Ok(false);
            }
        }
        for chop in &self.chop_after {
            if dn.is_descendant_of(&chop.concat(&self.base)) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
