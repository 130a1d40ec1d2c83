//! Criteria to query parameter mapping

use super::criteria::TrackedEntityCriteria;
use super::filter::{parse_query_filter, parse_query_item};
use super::params::{
    OrderParam, OrganisationUnitSelectionMode, PagingLimits, TrackedEntityQueryParams,
};
use crate::adapters::access::TrackerAccessManager;
use crate::domain::ids::Uid;
use crate::domain::metadata::{MetadataCatalog, Program, User};
use crate::domain::{IntakeError, Result};
use std::sync::Arc;

/// Built-in columns tracked entities can be ordered by
pub const ORDER_COLUMNS: &[&str] = &[
    "trackedEntity",
    "created",
    "createdAt",
    "createdAtClient",
    "lastUpdated",
    "updatedAt",
    "updatedAtClient",
    "enrolledAt",
    "inactive",
];

/// Maps [`TrackedEntityCriteria`] to [`TrackedEntityQueryParams`]
pub struct CriteriaMapper {
    catalog: Arc<MetadataCatalog>,
    access: Arc<dyn TrackerAccessManager>,
    limits: PagingLimits,
}

impl CriteriaMapper {
    pub fn new(catalog: Arc<MetadataCatalog>, access: Arc<dyn TrackerAccessManager>) -> Self {
        Self {
            catalog,
            access,
            limits: PagingLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: PagingLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Resolves and validates the criteria for the given user
    ///
    /// # Errors
    ///
    /// [`IntakeError::IllegalQuery`] if any referenced program, program stage,
    /// tracked entity type, organisation unit, attribute or order field does
    /// not resolve, or the user may not access a requested organisation unit.
    pub fn map(
        &self,
        criteria: &TrackedEntityCriteria,
        user: Option<&User>,
    ) -> Result<TrackedEntityQueryParams> {
        let program = self.validate_program(criteria)?;

        let attributes = criteria
            .attribute
            .iter()
            .map(|item| parse_query_item(item, &self.catalog))
            .collect::<Result<Vec<_>>>()?;
        let filters = criteria
            .filter
            .iter()
            .map(|item| parse_query_item(item, &self.catalog))
            .collect::<Result<Vec<_>>>()?;

        let mut organisation_units = Vec::new();
        for key in criteria.org_units() {
            let org_unit = self.catalog.organisation_unit(key).ok_or_else(|| {
                IntakeError::IllegalQuery(format!("Organisation unit does not exist: {key}"))
            })?;
            if !self.access.can_access(user, program, org_unit) {
                return Err(IntakeError::IllegalQuery(format!(
                    "User does not have access to organisation unit: {key}"
                )));
            }
            organisation_units.push(org_unit.uid.clone());
        }
        if criteria.ou_mode == Some(OrganisationUnitSelectionMode::Capture) {
            if let Some(user) = user {
                for uid in &user.organisation_units {
                    if !organisation_units.contains(uid) {
                        organisation_units.push(uid.clone());
                    }
                }
            }
        }

        let orders = criteria
            .order
            .as_deref()
            .map(OrderParam::parse_list)
            .unwrap_or_default();
        self.validate_orders(&orders)?;

        let page_size = self.validate_page_size(criteria.page_size)?;
        let page = self.validate_page(criteria.page, page_size)?;

        let params = TrackedEntityQueryParams {
            query: criteria
                .query
                .as_deref()
                .map(parse_query_filter)
                .transpose()?
                .flatten(),
            attributes,
            filters,
            organisation_units,
            organisation_unit_mode: criteria.ou_mode.unwrap_or_default(),
            program: program.map(|p| p.uid.clone()),
            program_stage: self.validate_program_stage(criteria, program)?,
            program_status: criteria.program_status,
            follow_up: criteria.follow_up,
            last_updated_start_date: criteria.last_updated_start_date,
            last_updated_end_date: criteria.last_updated_end_date,
            last_updated_duration: criteria.last_updated_duration.clone(),
            program_enrollment_start_date: criteria
                .program_enrollment_start_date
                .or(criteria.program_start_date),
            program_enrollment_end_date: criteria
                .program_enrollment_end_date
                .or(criteria.program_end_date),
            program_incident_start_date: criteria.program_incident_start_date,
            program_incident_end_date: criteria.program_incident_end_date,
            tracked_entity_type: self.validate_tracked_entity_type(criteria)?,
            tracked_entity_uids: criteria
                .tracked_entities()
                .into_iter()
                .filter_map(|uid| Uid::new(uid).ok())
                .collect(),
            event_status: criteria.event_status,
            event_start_date: criteria.event_start_date,
            event_end_date: criteria.event_end_date,
            potential_duplicate: criteria.potential_duplicate,
            user: user.map(|u| u.uid.clone()),
            skip_meta: criteria.skip_meta,
            page,
            page_size,
            total_pages: criteria.total_pages,
            skip_paging: criteria.skip_paging.unwrap_or(false),
            include_deleted: criteria.include_deleted,
            include_all_attributes: criteria.include_all_attributes,
            orders,
            default_page_size: Some(self.limits.default_page_size),
        };

        tracing::debug!(
            program = ?params.program,
            organisation_units = params.organisation_units.len(),
            attributes = params.attributes.len(),
            filters = params.filters.len(),
            "Mapped tracked entity criteria"
        );
        Ok(params)
    }

    fn validate_program(&self, criteria: &TrackedEntityCriteria) -> Result<Option<&Program>> {
        match criteria.program.as_deref().filter(|p| !p.is_empty()) {
            None => Ok(None),
            Some(key) => self
                .catalog
                .program(key)
                .map(Some)
                .ok_or_else(|| IntakeError::IllegalQuery(format!("Program does not exist: {key}"))),
        }
    }

    fn validate_program_stage(
        &self,
        criteria: &TrackedEntityCriteria,
        program: Option<&Program>,
    ) -> Result<Option<Uid>> {
        let Some(stage) = criteria.program_stage.as_deref() else {
            return Ok(None);
        };
        match program.and_then(|p| p.program_stages.iter().find(|uid| uid.as_str() == stage)) {
            Some(uid) => Ok(Some(uid.clone())),
            None => Err(IntakeError::IllegalQuery(format!(
                "Program does not contain the specified programStage: {stage}"
            ))),
        }
    }

    fn validate_tracked_entity_type(&self, criteria: &TrackedEntityCriteria) -> Result<Option<Uid>> {
        match criteria.tracked_entity_type.as_deref().filter(|t| !t.is_empty()) {
            None => Ok(None),
            Some(key) => self
                .catalog
                .tracked_entity_type(key)
                .map(|tet| Some(tet.uid.clone()))
                .ok_or_else(|| {
                    IntakeError::IllegalQuery(format!("Tracked entity type does not exist: {key}"))
                }),
        }
    }

    fn validate_orders(&self, orders: &[OrderParam]) -> Result<()> {
        match orders.iter().find(|order| {
            !ORDER_COLUMNS.contains(&order.field.as_str())
                && self.catalog.attribute(&order.field).is_none()
        }) {
            Some(order) => Err(IntakeError::IllegalQuery(format!(
                "Invalid order property: {}",
                order.field
            ))),
            None => Ok(()),
        }
    }

    fn validate_page_size(&self, page_size: Option<i64>) -> Result<Option<i64>> {
        match page_size {
            Some(size) if size > self.limits.max_page_size => Err(IntakeError::IllegalQuery(
                format!(
                    "Page size must not exceed {}: {size}",
                    self.limits.max_page_size
                ),
            )),
            other => Ok(other),
        }
    }

    /// The row offset of the page must fit in an `i64`
    fn validate_page(&self, page: Option<i64>, page_size: Option<i64>) -> Result<Option<i64>> {
        let Some(requested) = page.filter(|page| *page > 1) else {
            return Ok(page);
        };
        let size = page_size
            .filter(|size| *size >= 0)
            .unwrap_or(self.limits.default_page_size);
        match (requested - 1).checked_mul(size) {
            Some(_) => Ok(page),
            None => Err(IntakeError::IllegalQuery(format!(
                "Page is out of range for page size {size}: {requested}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::access::DefaultAccessManager;
    use crate::core::query::{QueryOperator, DEFAULT_PAGE_SIZE};
    use crate::core::validation::checks::test_support::{catalog, clerk, uid};
    use chrono::{TimeZone, Utc};

    fn mapper() -> CriteriaMapper {
        let catalog = Arc::new(catalog());
        let access = Arc::new(DefaultAccessManager::new(Arc::clone(&catalog)));
        CriteriaMapper::new(catalog, access)
    }

    #[test]
    fn test_minimal_criteria() {
        let params = mapper()
            .map(&TrackedEntityCriteria::default(), Some(&clerk()))
            .unwrap();
        assert!(params.program.is_none());
        assert!(params.query.is_none());
        assert_eq!(params.page_size_with_default(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.user.as_ref().map(Uid::as_str), Some("uClerk"));
    }

    #[test]
    fn test_resolves_program_and_stage() {
        let criteria = TrackedEntityCriteria {
            program: Some("progA".to_string()),
            program_stage: Some("stagePoint".to_string()),
            query: Some("LIKE:jan".to_string()),
            ..TrackedEntityCriteria::default()
        };
        let params = mapper().map(&criteria, None).unwrap();
        assert_eq!(params.program, Some(uid("progA")));
        assert_eq!(params.program_stage, Some(uid("stagePoint")));
        assert_eq!(params.query.unwrap().operator, QueryOperator::Like);
    }

    #[test]
    fn test_stage_outside_program() {
        let criteria = TrackedEntityCriteria {
            program: Some("progA".to_string()),
            program_stage: Some("stageR".to_string()),
            ..TrackedEntityCriteria::default()
        };
        let err = mapper().map(&criteria, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Program does not contain the specified programStage: stageR"
        );
    }

    #[test]
    fn test_inaccessible_org_unit() {
        let criteria = TrackedEntityCriteria {
            org_unit: Some("ouOther".to_string()),
            ..TrackedEntityCriteria::default()
        };
        let err = mapper().map(&criteria, Some(&clerk())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "User does not have access to organisation unit: ouOther"
        );
    }

    #[test]
    fn test_capture_mode_adds_user_org_units() {
        let criteria = TrackedEntityCriteria {
            org_unit: Some("ouA".to_string()),
            ou_mode: Some(OrganisationUnitSelectionMode::Capture),
            ..TrackedEntityCriteria::default()
        };
        let params = mapper().map(&criteria, Some(&clerk())).unwrap();
        assert_eq!(params.organisation_units, vec![uid("ouA"), uid("root")]);
    }

    #[test]
    fn test_deprecated_enrollment_dates() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let explicit_end = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        let criteria = TrackedEntityCriteria {
            program_start_date: Some(start),
            program_end_date: Some(end),
            program_enrollment_end_date: Some(explicit_end),
            ..TrackedEntityCriteria::default()
        };
        let params = mapper().map(&criteria, None).unwrap();
        assert_eq!(params.program_enrollment_start_date, Some(start));
        assert_eq!(params.program_enrollment_end_date, Some(explicit_end));
    }

    #[test]
    fn test_order_validation() {
        let valid = TrackedEntityCriteria {
            order: Some("created:desc,attrA".to_string()),
            ..TrackedEntityCriteria::default()
        };
        assert_eq!(mapper().map(&valid, None).unwrap().orders.len(), 2);

        let invalid = TrackedEntityCriteria {
            order: Some("shoeSize:asc".to_string()),
            ..TrackedEntityCriteria::default()
        };
        assert_eq!(
            mapper().map(&invalid, None).unwrap_err().to_string(),
            "Invalid order property: shoeSize"
        );
    }

    #[test]
    fn test_page_size_limit() {
        let criteria = TrackedEntityCriteria {
            page_size: Some(5000),
            ..TrackedEntityCriteria::default()
        };
        assert!(mapper().map(&criteria, None).is_err());

        let limited = mapper().with_limits(PagingLimits {
            default_page_size: 25,
            max_page_size: 10_000,
        });
        let params = limited.map(&criteria, None).unwrap();
        assert_eq!(params.page_size_with_default(), 5000);
        let defaults = limited.map(&TrackedEntityCriteria::default(), None).unwrap();
        assert_eq!(defaults.page_size_with_default(), 25);
    }

    #[test]
    fn test_page_offset_must_fit() {
        let huge = TrackedEntityCriteria {
            page: Some(i64::MAX),
            ..TrackedEntityCriteria::default()
        };
        let err = mapper().map(&huge, None).unwrap_err();
        assert!(matches!(err, IntakeError::IllegalQuery(_)));

        let zero_size = TrackedEntityCriteria {
            page: Some(i64::MAX),
            page_size: Some(0),
            ..TrackedEntityCriteria::default()
        };
        assert_eq!(mapper().map(&zero_size, None).unwrap().offset(), 0);

        let last = TrackedEntityCriteria {
            page: Some(i64::MAX / DEFAULT_PAGE_SIZE),
            ..TrackedEntityCriteria::default()
        };
        assert!(mapper().map(&last, None).unwrap().offset() > 0);
    }
}
