//! Checker implementations

pub mod acl;
pub mod attributes;
pub mod completion;
pub mod data_values;
pub mod existence;
pub mod geometry;
pub mod references;
pub mod username;

#[cfg(test)]
pub(crate) mod test_support;

pub use acl::{DeleteAclCheck, WriteAclCheck};
pub use attributes::AttributeValueCheck;
pub use completion::UncompleteAuthCheck;
pub use data_values::DataValueCheck;
pub use existence::ExistenceCheck;
pub use geometry::GeometryCheck;
pub use references::{OrgUnitCheck, ProgramCheck, ProgramStageCheck, TrackedEntityTypeCheck};
pub use username::UsernameValueCheck;
