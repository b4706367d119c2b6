//! Administrative scoping: which subentries, and so which ACI tuples, govern an
//! entry.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::error::AciError;
use crate::types::{AciTuple, Dn, Subentry};

/// The role families a subentry can be listed under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoleFilter {
    AccessControl,
    CollectiveAttribute,
    Subschema,
    TriggerExecution,
}

impl RoleFilter {
    pub fn accepts(&self, subentry: &Subentry) -> bool {
        match self {
            RoleFilter::AccessControl => subentry.is_access_control_admin_role(),
            RoleFilter::CollectiveAttribute => subentry.is_collective_admin_role(),
            RoleFilter::Subschema => subentry.is_schema_admin_role(),
            RoleFilter::TriggerExecution => subentry.is_triggers_admin_role(),
        }
    }

    /// The operational attribute that lists the governing subentries of an
    /// entry for this role family.
    pub fn operational_attribute(&self) -> &'static str {
        match self {
            RoleFilter::AccessControl => "accessControlSubentries",
            RoleFilter::CollectiveAttribute => "collectiveAttributeSubentries",
            RoleFilter::Subschema => "subschemaSubentry",
            RoleFilter::TriggerExecution => "triggerExecutionSubentries",
        }
    }
}

/// Subentries of the given role family whose scope covers `target`.
///
/// A scope that cannot be evaluated is an error, never a silent miss.
pub fn subentries_for<'s>(
    target: &Dn,
    subentries: &'s [Subentry],
    filter: RoleFilter,
) -> Result<Vec<&'s Subentry>, AciError> {
    let mut matched = Vec::new();
    for subentry in subentries {
        if !filter.accepts(subentry) {
            continue;
        }
        if covers(subentry, target)? {
            matched.push(subentry);
        }
    }
    Ok(matched)
}

/// Every ACI tuple from access-control subentries whose scope covers `target`.
pub fn candidates<'s>(target: &Dn, subentries: &'s [Subentry]) -> Result<Vec<&'s AciTuple>, AciError> {
    Ok(subentries_for(target, subentries, RoleFilter::AccessControl)?
        .into_iter()
        .flat_map(|subentry| subentry.tuples().iter())
        .collect())
}

fn covers(subentry: &Subentry, target: &Dn) -> Result<bool, AciError> {
    subentry.scope().matches(target).map_err(|err| match err {
        AciError::Configuration(msg) => {
            AciError::Configuration(format!("scope of {subentry}: {msg}"))
        }
        other => other,
    })
}
