//! Whom an ACI tuple applies to.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumDiscriminants, EnumIter};

use crate::error::AciError;

use super::auth_level::AuthenticationLevel;
use super::context::EvaluationContext;
use super::dn::Dn;
use super::subtree::{ScopePredicate, SubtreeSpecification};

/// The user-class variants of an ACI tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumDiscriminants)]
#[strum_discriminants(name(UserClassKind), derive(Display, EnumIter, Hash))]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum UserClass {
    AllUsers,
    /// The requester is the target entry itself.
    ThisEntry,
    Name(BTreeSet<Dn>),
    UserGroup(BTreeSet<Dn>),
    Subtree(BTreeSet<SubtreeSpecification>),
    /// Any requester authenticated at or above the level.
    AuthenticationLevel(AuthenticationLevel),
}

impl UserClass {
    pub fn kind(&self) -> UserClassKind {
        UserClassKind::from(self)
    }

    pub fn names<I: IntoIterator<Item = Dn>>(names: I) -> Self {
        UserClass::Name(names.into_iter().collect())
    }

    pub fn groups<I: IntoIterator<Item = Dn>>(groups: I) -> Self {
        UserClass::UserGroup(groups.into_iter().collect())
    }

    pub fn subtrees<I: IntoIterator<Item = SubtreeSpecification>>(specs: I) -> Self {
        UserClass::Subtree(specs.into_iter().collect())
    }

    /// Specificity rank, most specific first. `AllUsers` has none.
    pub fn specificity_tier(&self) -> Option<u8> {
        match self {
            UserClass::Name(_) | UserClass::ThisEntry => Some(0),
            UserClass::UserGroup(_) => Some(1),
            UserClass::Subtree(_) => Some(2),
            UserClass::AuthenticationLevel(_) => Some(3),
            UserClass::AllUsers => None,
        }
    }

    /// Does this class describe the requester of `ctx`?
    pub fn describes(&self, ctx: &EvaluationContext) -> Result<bool, AciError> {
        match self {
            UserClass::AllUsers => Ok(true),
            UserClass::ThisEntry => Ok(ctx.user_name == ctx.entry_name),
            UserClass::Name(names) => Ok(names.contains(&ctx.user_name)),
            UserClass::UserGroup(groups) => {
                Ok(ctx.user_groups.iter().any(|g| groups.contains(g)))
            }
            UserClass::Subtree(specs) => {
                for spec in specs {
                    if spec.matches(&ctx.user_name)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            UserClass::AuthenticationLevel(level) => {
                Ok(ctx.authentication_level.satisfies(*level))
            }
        }
    }

    pub fn validate(&self) -> Result<(), AciError> {
        let empty = match self {
            UserClass::Name(names) => names.is_empty(),
            UserClass::UserGroup(groups) => groups.is_empty(),
            UserClass::Subtree(specs) => {
                for spec in specs {
                    spec.validate()?;
                }
                specs.is_empty()
            }
            _ => false,
        };
        if empty {
            return Err(AciError::Configuration(format!(
                "user class '{}' names nobody",
                self.kind()
            )));
        }
        Ok(())
    }
}
