//! Event data value check

use crate::core::validation::value_type::validate_value;
use crate::core::validation::{Checker, ErrorCode, Outcome, ValidationContext};
use crate::domain::metadata::ValueType;
use crate::domain::records::TrackerRecord;

/// Data values must belong to the event's stage and match their value type
///
/// Blank values are not errors; they are skipped and reported as a warning.
/// USERNAME values are left to [`super::UsernameValueCheck`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DataValueCheck;

impl Checker for DataValueCheck {
    fn name(&self) -> &'static str {
        "data_values"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        let TrackerRecord::Event(event) = record else {
            return Outcome::ok();
        };
        let Some(stage) = ctx.event_stage(event) else {
            return Outcome::ok();
        };

        let mut skipped = Vec::new();
        for dv in &event.data_values {
            let Some(data_element) = ctx.preheat.data_element(&dv.data_element) else {
                return Outcome::error(format!(
                    "Data element {} is not a valid data element",
                    dv.data_element
                ))
                .with_reference(record.reference())
                .with_code(ErrorCode::DataElementNotFound);
            };
            if !stage.has_data_element(&dv.data_element) {
                return Outcome::error(format!(
                    "Data element {} is not part of program stage {}",
                    dv.data_element, stage.uid
                ))
                .with_reference(record.reference())
                .with_code(ErrorCode::DataElementNotInStage);
            }

            let Some(value) = dv.non_blank_value() else {
                skipped.push(dv.data_element.as_str());
                continue;
            };
            if data_element.value_type == ValueType::Username {
                continue;
            }
            if let Err(reason) = validate_value(data_element.value_type, value) {
                return Outcome::error(format!(
                    "Value {value} is not valid for data element {} of type {}: {reason}",
                    data_element.uid, data_element.value_type
                ))
                .with_reference(record.reference())
                .with_code(ErrorCode::InvalidDataValue);
            }
        }

        if skipped.is_empty() {
            Outcome::ok()
        } else {
            Outcome::warning(format!(
                "Empty value skipped for data elements: {}",
                skipped.join(", ")
            ))
            .with_reference(record.reference())
        }
    }
}
