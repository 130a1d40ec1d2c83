//! USERNAME value check

use crate::core::validation::{Checker, ErrorCode, Outcome, ValidationContext};
use crate::domain::metadata::ValueType;
use crate::domain::records::{Attribute, TrackerRecord};

/// USERNAME-typed values must name a preloaded user
#[derive(Debug, Default, Clone, Copy)]
pub struct UsernameValueCheck;

impl UsernameValueCheck {
    fn username_values<'r>(
        record: &'r TrackerRecord,
        ctx: &ValidationContext<'_>,
    ) -> Vec<&'r str> {
        match record {
            TrackerRecord::Event(ev) => ev
                .data_values
                .iter()
                .filter(|dv| {
                    ctx.preheat
                        .data_element(&dv.data_element)
                        .is_some_and(|de| de.value_type == ValueType::Username)
                })
                .filter_map(|dv| dv.non_blank_value())
                .collect(),
            TrackerRecord::TrackedEntity(te) => Self::attribute_usernames(&te.attributes, ctx),
            TrackerRecord::Enrollment(en) => Self::attribute_usernames(&en.attributes, ctx),
        }
    }

    fn attribute_usernames<'r>(
        attributes: &'r [Attribute],
        ctx: &ValidationContext<'_>,
    ) -> Vec<&'r str> {
        attributes
            .iter()
            .filter(|a| {
                ctx.preheat
                    .attribute(&a.attribute)
                    .is_some_and(|def| def.value_type == ValueType::Username)
            })
            .filter_map(|a| a.non_blank_value())
            .collect()
    }
}

impl Checker for UsernameValueCheck {
    fn name(&self) -> &'static str {
        "username_values"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        match Self::username_values(record, ctx)
            .into_iter()
            .find(|username| ctx.preheat.user_by_username(username).is_none())
        {
            Some(username) => Outcome::error(format!("User name does not exist: {username}"))
                .with_reference(record.reference())
                .with_code(ErrorCode::UsernameNotFound),
            None => Outcome::ok(),
        }
    }
}
