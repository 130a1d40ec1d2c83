//! Tracked entity conversion

use super::{acting_user, merge_attribute_values, new_entity_uid, resolve_stored_by, TrackerConverter};
use crate::core::preheat::PreheatContext;
use crate::domain::entities::StoredTrackedEntity;
use crate::domain::records::{Attribute, TrackedEntity};
use chrono::Utc;

/// Converts between [`TrackedEntity`] and [`StoredTrackedEntity`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TrackedEntityConverter;

impl TrackerConverter<TrackedEntity, StoredTrackedEntity> for TrackedEntityConverter {
    fn to(&self, internal: &StoredTrackedEntity) -> TrackedEntity {
        TrackedEntity {
            tracked_entity: Some(internal.uid.to_string()),
            tracked_entity_type: internal.tracked_entity_type.to_string(),
            org_unit: internal.organisation_unit.to_string(),
            inactive: internal.inactive,
            potential_duplicate: internal.potential_duplicate,
            stored_by: Some(internal.stored_by.clone()),
            geometry: internal.geometry.clone(),
            created_at_client: internal.created_at_client,
            updated_at_client: internal.last_updated_at_client,
            attributes: internal
                .attribute_values
                .iter()
                .map(|v| Attribute {
                    attribute: v.attribute.to_string(),
                    value: Some(v.value.clone()),
                    stored_by: Some(v.stored_by.clone()),
                })
                .collect(),
        }
    }

    fn from(
        &self,
        preheat: &PreheatContext,
        external: &TrackedEntity,
    ) -> Option<StoredTrackedEntity> {
        let existing = external
            .tracked_entity
            .as_deref()
            .and_then(|uid| preheat.existing_tracked_entity(uid));
        self.from_existing(preheat, existing, external)
    }

    fn from_existing(
        &self,
        preheat: &PreheatContext,
        existing: Option<&StoredTrackedEntity>,
        external: &TrackedEntity,
    ) -> Option<StoredTrackedEntity> {
        let tracked_entity_type = preheat
            .tracked_entity_type(&external.tracked_entity_type)?
            .uid
            .clone();
        let org_unit = preheat.organisation_unit(&external.org_unit)?.uid.clone();

        let now = Utc::now();
        let stored_by = resolve_stored_by(preheat, external.stored_by.as_deref());
        let user = acting_user(preheat);

        let mut entity = match existing {
            Some(existing) => {
                let mut entity = existing.clone();
                entity.last_updated = now;
                entity.last_updated_by = user;
                entity
            }
            None => StoredTrackedEntity {
                uid: new_entity_uid(preheat, external.tracked_entity.as_deref()),
                tracked_entity_type: tracked_entity_type.clone(),
                organisation_unit: org_unit.clone(),
                inactive: false,
                potential_duplicate: false,
                geometry: None,
                stored_by: stored_by.clone(),
                created: now,
                last_updated: now,
                created_at_client: external.created_at_client,
                last_updated_at_client: None,
                created_by: user.clone(),
                last_updated_by: user,
                deleted: false,
                attribute_values: Vec::new(),
            },
        };

        entity.tracked_entity_type = tracked_entity_type;
        entity.organisation_unit = org_unit;
        entity.inactive = external.inactive;
        entity.potential_duplicate = external.potential_duplicate;
        entity.geometry = external.geometry.clone();
        entity.last_updated_at_client = external.updated_at_client;
        entity.stored_by = stored_by;

        let stored_values = std::mem::take(&mut entity.attribute_values);
        entity.attribute_values = merge_attribute_values(
            preheat,
            stored_values,
            &external.attributes,
            &entity.stored_by,
            now,
        );
        Some(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::checks::test_support::{fixture, fixture_for};
    use crate::domain::entities::FALLBACK_USERNAME;

    fn tracked_entity() -> TrackedEntity {
        TrackedEntity {
            tracked_entity: Some("t1234567890123456789bc".to_string()),
            tracked_entity_type: "tetA".to_string(),
            org_unit: "ouA".to_string(),
            attributes: vec![Attribute::new("attrA", "Jane"), Attribute::new("attrMissing", "x")],
            ..TrackedEntity::default()
        }
    }

    #[test]
    fn test_new_tracked_entity() {
        let fixture = fixture();
        let stored = TrackedEntityConverter
            .from(&fixture.preheat, &tracked_entity())
            .unwrap();

        assert_eq!(stored.uid.as_str(), "t1234567890123456789bc");
        assert_eq!(stored.tracked_entity_type.as_str(), "tetA");
        assert_eq!(stored.attribute_values.len(), 1);
        assert_eq!(stored.attribute_values[0].stored_by, "clerk");
    }

    #[test]
    fn test_system_import_uses_fallback_username() {
        let fixture = fixture_for(None);
        let stored = TrackedEntityConverter
            .from(&fixture.preheat, &tracked_entity())
            .unwrap();
        assert_eq!(stored.stored_by, FALLBACK_USERNAME);
        assert!(stored.created_by.is_none());
    }

    #[test]
    fn test_update_preserves_identity() {
        let fixture = fixture();
        let first = TrackedEntityConverter
            .from(&fixture.preheat, &tracked_entity())
            .unwrap();
        let mut changed = tracked_entity();
        changed.inactive = true;

        let second = TrackedEntityConverter
            .from_existing(&fixture.preheat, Some(&first), &changed)
            .unwrap();

        assert_eq!(second.uid, first.uid);
        assert_eq!(second.created, first.created);
        assert!(second.inactive);
    }

    #[test]
    fn test_unknown_type_is_none() {
        let fixture = fixture();
        let mut unknown = tracked_entity();
        unknown.tracked_entity_type = "tetMissing".to_string();
        assert!(TrackedEntityConverter.from(&fixture.preheat, &unknown).is_none());
    }
}
