//! Conversion between import records and persisted entities
//!
//! Converters are pure: they read the [`PreheatContext`] and return new
//! entities, never touching storage. An entity already present in the
//! preheat keeps its identity and creation audit fields; only the mutable
//! content and the last-updated fields are refreshed.
//!
//! # Modules
//!
//! - [`event`] - Events and their data values
//! - [`enrollment`] - Enrollments and their attribute values
//! - [`tracked_entity`] - Tracked entities and their attribute values

pub mod enrollment;
pub mod event;
pub mod tracked_entity;

pub use enrollment::EnrollmentConverter;
pub use event::EventConverter;
pub use tracked_entity::TrackedEntityConverter;

use crate::core::preheat::PreheatContext;
use crate::domain::entities::{TrackedEntityAttributeValue, UserInfoSnapshot, FALLBACK_USERNAME};
use crate::domain::ids::{IdScheme, Uid};
use crate::domain::records::Attribute;
use chrono::{DateTime, Utc};

/// Two-way conversion between an external record and its persisted form
pub trait TrackerConverter<External, Internal> {
    /// Persisted entity back to its external form
    fn to(&self, internal: &Internal) -> External;

    /// Order-preserving batch form of [`TrackerConverter::to`]
    fn to_all(&self, internals: &[Internal]) -> Vec<External> {
        internals.iter().map(|internal| self.to(internal)).collect()
    }

    /// Converts a record, reusing the existing entity from the preheat if any
    ///
    /// Returns `None` when a required reference does not resolve.
    fn from(&self, preheat: &PreheatContext, external: &External) -> Option<Internal>;

    /// Converts a record on top of an explicit existing entity
    fn from_existing(
        &self,
        preheat: &PreheatContext,
        existing: Option<&Internal>,
        external: &External,
    ) -> Option<Internal>;

    /// Order-preserving batch form of [`TrackerConverter::from`]
    fn from_all(&self, preheat: &PreheatContext, externals: &[External]) -> Vec<Option<Internal>> {
        externals
            .iter()
            .map(|external| self.from(preheat, external))
            .collect()
    }
}

/// Identifier for a new entity: the client's uid when usable, else a fresh one
pub(crate) fn new_entity_uid(preheat: &PreheatContext, client_uid: Option<&str>) -> Uid {
    let uid_scheme = preheat.import_options().id_schemes.id_scheme == IdScheme::Uid;
    client_uid
        .filter(|uid| uid_scheme && Uid::is_valid_format(uid))
        .and_then(|uid| Uid::new(uid).ok())
        .unwrap_or_else(Uid::generate)
}

/// Stored-by value: the record's own, else the acting user, else the fallback
pub(crate) fn resolve_stored_by(preheat: &PreheatContext, record_value: Option<&str>) -> String {
    record_value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| preheat.import_options().username())
        .unwrap_or(FALLBACK_USERNAME)
        .to_string()
}

pub(crate) fn acting_user(preheat: &PreheatContext) -> Option<UserInfoSnapshot> {
    preheat.user().map(UserInfoSnapshot::from_user)
}

/// Merges submitted attributes into the stored values
///
/// Blank values remove the stored value; unknown attributes are skipped.
/// Values not mentioned are kept.
pub(crate) fn merge_attribute_values(
    preheat: &PreheatContext,
    mut stored: Vec<TrackedEntityAttributeValue>,
    submitted: &[Attribute],
    stored_by: &str,
    now: DateTime<Utc>,
) -> Vec<TrackedEntityAttributeValue> {
    for attribute in submitted {
        let Some(definition) = preheat.attribute(&attribute.attribute) else {
            continue;
        };
        let position = stored.iter().position(|v| v.attribute == definition.uid);
        let Some(value) = attribute.non_blank_value() else {
            if let Some(position) = position {
                stored.remove(position);
            }
            continue;
        };
        let value_stored_by = resolve_stored_by_or(attribute.stored_by.as_deref(), stored_by);

        match position {
            Some(position) => {
                let current = &mut stored[position];
                if current.value != value {
                    current.value = value.to_string();
                    current.stored_by = value_stored_by;
                    current.last_updated = now;
                }
            }
            None => stored.push(TrackedEntityAttributeValue {
                attribute: definition.uid.clone(),
                value: value.to_string(),
                stored_by: value_stored_by,
                created: now,
                last_updated: now,
            }),
        }
    }
    stored
}

/// A value's own stored-by, else the owning record's
pub(crate) fn resolve_stored_by_or(own: Option<&str>, parent: &str) -> String {
    own.map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(parent)
        .to_string()
}
