//! Data model for administrative subentries and ACI evaluation.
//!
//! Canonical string forms:
//! - Dn: `cn=alice,ou=people,dc=example`, stored with lowercased attribute
//!   types and case-folded values so equal names compare equal
//! - MicroOperation: the X.501 camelCase tag, e.g. `read`, `returnDN`
//! - AdministrativeRole: the LDAP name, e.g. `accessControlSpecificArea`,
//!   or its OID on input
//!
//! Tuples, subentries and contexts are immutable once built. Builders and
//! serde entry points validate their invariants and report violations as
//! [`crate::AciError::Configuration`].

mod aci_tuple;
mod administrative_role;
mod attributes;
mod auth_level;
mod context;
mod decision;
mod dn;
mod micro_operation;
mod protected_item;
mod subentry;
mod subtree;
mod user_class;

pub use aci_tuple::{AciTuple, AciTupleBuilder};
pub use administrative_role::AdministrativeRole;
pub use attributes::{Attributes, values_match};
pub use auth_level::AuthenticationLevel;
pub use context::{EvaluationContext, EvaluationContextBuilder, OperationScope};
pub use decision::{Decision, SnapshotVersion, Verdict};
pub use dn::{DistinguishedName, Dn, dn};
pub use micro_operation::{MicroOperation, parse_micro_operations};
pub use protected_item::{
    AttributeValueAssertion, EntryFilter, MaxValueCountItem, ProtectedItem, ProtectedItemKind,
    Refinement, RestrictedByItem,
};
pub use subentry::{Subentry, SubentryDocument};
pub use subtree::{ScopePredicate, SubtreeSpecification};
pub use user_class::{UserClass, UserClassKind};
