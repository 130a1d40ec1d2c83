//! Read-side query mapping
//!
//! Translates client search criteria into validated
//! [`TrackedEntityQueryParams`]. Every reference is resolved against the
//! metadata catalog; anything that does not resolve rejects the whole
//! request with [`IntakeError::IllegalQuery`](crate::domain::IntakeError::IllegalQuery).
//!
//! # Modules
//!
//! - [`filter`] - Query operators, filters and items
//! - [`criteria`] - Client criteria as received
//! - [`params`] - Resolved query parameters and paging
//! - [`mapper`] - Criteria to parameters

pub mod criteria;
pub mod filter;
pub mod mapper;
pub mod params;

pub use criteria::TrackedEntityCriteria;
pub use filter::{parse_query_filter, parse_query_item, QueryFilter, QueryItem, QueryOperator};
pub use mapper::CriteriaMapper;
pub use params::{
    OrderParam, OrganisationUnitSelectionMode, PagingLimits, SortDirection,
    TrackedEntityQueryParams, DEFAULT_PAGE, DEFAULT_PAGE_SIZE,
};
