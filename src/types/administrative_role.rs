//! Administrative roles an administrative point can hold.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::AciError;

/// The role of an administrative area, as carried by the `administrativeRole`
/// attribute of an administrative point.
///
/// Parsing accepts the LDAP attribute values (case-insensitive) and the X.501
/// OIDs. The specific and inner variants of the collective-attribute and
/// trigger-execution areas collapse into a single role each.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum AdministrativeRole {
    #[strum(to_string = "autonomousArea", serialize = "2.5.23.1")]
    AutonomousArea,
    #[strum(to_string = "accessControlSpecificArea", serialize = "2.5.23.2")]
    AccessControlSpecificArea,
    #[strum(to_string = "accessControlInnerArea", serialize = "2.5.23.3")]
    AccessControlInnerArea,
    #[strum(
        to_string = "collectiveAttributeSpecificArea",
        serialize = "collectiveAttributeInnerArea",
        serialize = "2.5.23.5",
        serialize = "2.5.23.6"
    )]
    CollectiveAttribute,
    #[strum(to_string = "subschemaAdminSpecificArea", serialize = "2.5.23.4")]
    SubSchema,
    #[strum(
        to_string = "triggerExecutionSpecificArea",
        serialize = "triggerExecutionInnerArea"
    )]
    TriggerExecution,
}

impl AdministrativeRole {
    /// Roles that make a subentry contribute ACI tuples.
    pub fn is_access_control(&self) -> bool {
        matches!(
            self,
            AdministrativeRole::AccessControlSpecificArea
                | AdministrativeRole::AccessControlInnerArea
        )
    }
}

impl TryFrom<String> for AdministrativeRole {
    type Error = AciError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AdministrativeRole::from_str(value.trim()).map_err(|_| {
            AciError::Configuration(format!("unknown administrative role '{value}'"))
        })
    }
}

impl From<AdministrativeRole> for String {
    fn from(role: AdministrativeRole) -> Self {
        role.to_string()
    }
}
