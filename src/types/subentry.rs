//! Subentries: the operational view of an administrative point's policy.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AciError;

use super::aci_tuple::AciTuple;
use super::administrative_role::AdministrativeRole;
use super::subtree::{ScopePredicate, SubtreeSpecification};

/// A subentry: one scope predicate shared by all of its administrative roles,
/// plus the ACI tuples expanded from its `prescriptiveACI` values.
///
/// Subentries are values. Changing roles, scope or tuples produces a new
/// subentry, which the engine publishes through a snapshot swap.
#[derive(Debug, Clone)]
pub struct Subentry {
    scope: Arc<dyn ScopePredicate>,
    roles: BTreeSet<AdministrativeRole>,
    uuid: String,
    name: String,
    tuples: Arc<[AciTuple]>,
}

impl Subentry {
    /// Create a subentry with a freshly assigned uuid and no tuples.
    pub fn new<I>(
        name: impl Into<String>,
        scope: Arc<dyn ScopePredicate>,
        roles: I,
    ) -> Result<Self, AciError>
    where
        I: IntoIterator<Item = AdministrativeRole>,
    {
        let name = name.into();
        let roles = Self::check_roles(&name, roles.into_iter().collect())?;
        Ok(Self {
            scope,
            roles,
            uuid: Uuid::new_v4().to_string(),
            name,
            tuples: Arc::from(Vec::new()),
        })
    }

    fn check_roles(
        name: &str,
        roles: BTreeSet<AdministrativeRole>,
    ) -> Result<BTreeSet<AdministrativeRole>, AciError> {
        if roles.is_empty() {
            return Err(AciError::Configuration(format!(
                "subentry '{name}' has no administrative roles"
            )));
        }
        Ok(roles)
    }

    /// Use a uuid assigned elsewhere (e.g. the entry's `entryUUID`).
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    pub fn with_tuples<I: IntoIterator<Item = AciTuple>>(mut self, tuples: I) -> Self {
        self.tuples = tuples.into_iter().collect();
        self
    }

    pub fn scope(&self) -> &dyn ScopePredicate {
        self.scope.as_ref()
    }

    pub fn roles(&self) -> &BTreeSet<AdministrativeRole> {
        &self.roles
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tuples(&self) -> &[AciTuple] {
        &self.tuples
    }

    pub fn has_role(&self, role: AdministrativeRole) -> bool {
        self.roles.contains(&role)
    }

    /// Specific or inner access-control area.
    pub fn is_access_control_admin_role(&self) -> bool {
        self.roles.iter().any(AdministrativeRole::is_access_control)
    }

    pub fn is_collective_admin_role(&self) -> bool {
        self.has_role(AdministrativeRole::CollectiveAttribute)
    }

    pub fn is_schema_admin_role(&self) -> bool {
        self.has_role(AdministrativeRole::SubSchema)
    }

    pub fn is_triggers_admin_role(&self) -> bool {
        self.has_role(AdministrativeRole::TriggerExecution)
    }

    pub fn is_autonomous(&self) -> bool {
        self.has_role(AdministrativeRole::AutonomousArea)
    }

    /// Replace the whole role set.
    pub fn replace_roles<I>(&self, roles: I) -> Result<Self, AciError>
    where
        I: IntoIterator<Item = AdministrativeRole>,
    {
        let roles = Self::check_roles(&self.name, roles.into_iter().collect())?;
        Ok(Self {
            roles,
            ..self.clone()
        })
    }

    pub fn replace_scope(&self, scope: Arc<dyn ScopePredicate>) -> Self {
        Self {
            scope,
            ..self.clone()
        }
    }

    pub fn replace_tuples<I: IntoIterator<Item = AciTuple>>(&self, tuples: I) -> Self {
        self.clone().with_tuples(tuples)
    }

    pub fn rename(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

impl Display for Subentry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Subentry: {}-{}[{}]",
            self.name,
            self.uuid,
            self.roles.iter().join(", ")
        )
    }
}

/// The serialized form of a subentry whose scope is a built-in
/// [`SubtreeSpecification`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubentryDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub roles: BTreeSet<AdministrativeRole>,
    pub scope: SubtreeSpecification,
    #[serde(default)]
    pub tuples: Vec<AciTuple>,
}

impl TryFrom<SubentryDocument> for Subentry {
    type Error = AciError;

    fn try_from(doc: SubentryDocument) -> Result<Self, Self::Error> {
        doc.scope.validate()?;
        let subentry = Subentry::new(doc.name, Arc::new(doc.scope), doc.roles)?
            .with_tuples(doc.tuples);
        Ok(match doc.uuid {
            Some(uuid) => subentry.with_uuid(uuid),
            None => subentry,
        })
    }
}
