//! Attribute value check

use crate::core::validation::value_type::validate_value;
use crate::core::validation::{Checker, ErrorCode, Outcome, ValidationContext};
use crate::domain::metadata::ValueType;
use crate::domain::records::{Attribute, TrackerRecord};

/// Attributes must be allowed for the record and match their value type
///
/// Tracked entities take their allowed attributes from the tracked entity
/// type, enrollments from the program. Blank values are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeValueCheck;

impl AttributeValueCheck {
    fn check_all<F>(
        &self,
        record: &TrackerRecord,
        ctx: &ValidationContext<'_>,
        attributes: &[Attribute],
        owner: &str,
        allowed: F,
    ) -> Outcome
    where
        F: Fn(&str) -> bool,
    {
        for attribute in attributes {
            let Some(definition) = ctx.preheat.attribute(&attribute.attribute) else {
                return Outcome::error(format!(
                    "Attribute {} is not a valid tracked entity attribute",
                    attribute.attribute
                ))
                .with_reference(record.reference())
                .with_code(ErrorCode::InvalidAttribute);
            };
            if !allowed(&attribute.attribute) {
                return Outcome::error(format!(
                    "Attribute {} is not part of {owner}",
                    attribute.attribute
                ))
                .with_reference(record.reference())
                .with_code(ErrorCode::InvalidAttribute);
            }

            let Some(value) = attribute.non_blank_value() else {
                continue;
            };
            if definition.value_type == ValueType::Username {
                continue;
            }
            if let Err(reason) = validate_value(definition.value_type, value) {
                return Outcome::error(format!(
                    "Value {value} is not valid for attribute {} of type {}: {reason}",
                    definition.uid, definition.value_type
                ))
                .with_reference(record.reference())
                .with_code(ErrorCode::InvalidAttributeValue);
            }
        }
        Outcome::ok()
    }
}

impl Checker for AttributeValueCheck {
    fn name(&self) -> &'static str {
        "attribute_values"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        match record {
            TrackerRecord::Event(_) => Outcome::ok(),
            TrackerRecord::TrackedEntity(te) => {
                let Some(tet) = ctx.preheat.tracked_entity_type(&te.tracked_entity_type) else {
                    return Outcome::ok();
                };
                let owner = format!("tracked entity type {}", tet.uid);
                self.check_all(record, ctx, &te.attributes, &owner, |uid| tet.has_attribute(uid))
            }
            TrackerRecord::Enrollment(en) => {
                let Some(program) = ctx.record_program(record) else {
                    return Outcome::ok();
                };
                let owner = format!("program {}", program.uid);
                self.check_all(record, ctx, &en.attributes, &owner, |uid| {
                    program.has_attribute(uid)
                })
            }
        }
    }
}
