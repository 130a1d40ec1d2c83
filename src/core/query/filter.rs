//! Query filters and items
//!
//! A filter is `{operator}:{value}` where the operator defaults to EQ. An
//! item is `{attribute}[:{operator}:{value}]*`.

use crate::domain::ids::Uid;
use crate::domain::metadata::{MetadataCatalog, ValueType};
use crate::domain::{IntakeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the parts of a filter or item
pub const SEPARATOR: char = ':';

/// Comparison applied by a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    Sw,
    Ew,
    In,
    Null,
    Nnull,
    Ilike,
}

impl QueryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Gt => "GT",
            Self::Ge => "GE",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::Like => "LIKE",
            Self::Sw => "SW",
            Self::Ew => "EW",
            Self::In => "IN",
            Self::Null => "NULL",
            Self::Nnull => "NNULL",
            Self::Ilike => "ILIKE",
        }
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QueryOperator {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "EQ" => Ok(Self::Eq),
            "NE" => Ok(Self::Ne),
            "GT" => Ok(Self::Gt),
            "GE" => Ok(Self::Ge),
            "LT" => Ok(Self::Lt),
            "LE" => Ok(Self::Le),
            "LIKE" => Ok(Self::Like),
            "SW" => Ok(Self::Sw),
            "EW" => Ok(Self::Ew),
            "IN" => Ok(Self::In),
            "NULL" => Ok(Self::Null),
            "NNULL" => Ok(Self::Nnull),
            "ILIKE" => Ok(Self::Ilike),
            _ => Err(IntakeError::IllegalQuery(format!(
                "Query operator is not valid: {s}"
            ))),
        }
    }
}

/// Operator and operand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub operator: QueryOperator,
    pub filter: String,
}

impl QueryFilter {
    pub fn new(operator: QueryOperator, filter: impl Into<String>) -> Self {
        Self {
            operator,
            filter: filter.into(),
        }
    }
}

/// Attribute with zero or more filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryItem {
    pub attribute: Uid,
    pub value_type: ValueType,
    pub unique: bool,
    pub filters: Vec<QueryFilter>,
}

/// Parses `{operator}:{value}`, or a bare value meaning EQ
///
/// Returns `Ok(None)` for an empty query.
///
/// # Errors
///
/// [`IntakeError::IllegalQuery`] when the query has more than one separator
/// or an unknown operator.
pub fn parse_query_filter(query: &str) -> Result<Option<QueryFilter>> {
    if query.is_empty() {
        return Ok(None);
    }
    if !query.contains(SEPARATOR) {
        return Ok(Some(QueryFilter::new(QueryOperator::Eq, query)));
    }

    let split: Vec<&str> = query.split(SEPARATOR).collect();
    let [operator, value] = split.as_slice() else {
        return Err(IntakeError::IllegalQuery(format!(
            "Query has invalid format: {query}"
        )));
    };
    Ok(Some(QueryFilter::new(operator.parse()?, *value)))
}

/// Parses `{attribute}[:{operator}:{value}]*` against the known attributes
///
/// # Errors
///
/// [`IntakeError::IllegalQuery`] for an even number of segments, an unknown
/// attribute or an unknown operator.
pub fn parse_query_item(item: &str, catalog: &MetadataCatalog) -> Result<QueryItem> {
    let split: Vec<&str> = item.split(SEPARATOR).collect();
    if split.len() % 2 != 1 {
        return Err(IntakeError::IllegalQuery(format!(
            "Query item or filter is invalid: {item}"
        )));
    }

    let key = split[0];
    let attribute = catalog
        .attribute(key)
        .ok_or_else(|| IntakeError::IllegalQuery(format!("Attribute does not exist: {key}")))?;

    let filters = split[1..]
        .chunks(2)
        .map(|pair| Ok(QueryFilter::new(pair[0].parse()?, pair[1])))
        .collect::<Result<Vec<_>>>()?;

    Ok(QueryItem {
        attribute: attribute.uid.clone(),
        value_type: attribute.value_type,
        unique: attribute.unique,
        filters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metadata::TrackedEntityAttribute;

    fn catalog() -> MetadataCatalog {
        let mut catalog = MetadataCatalog::new();
        catalog.add_attribute(TrackedEntityAttribute::new(
            Uid::new("attrAge").unwrap(),
            ValueType::Integer,
        ));
        catalog
    }

    #[test]
    fn test_operator_case_insensitive() {
        assert_eq!("ilike".parse::<QueryOperator>().unwrap(), QueryOperator::Ilike);
        assert_eq!("Nnull".parse::<QueryOperator>().unwrap(), QueryOperator::Nnull);
        assert!("BETWEEN".parse::<QueryOperator>().is_err());
    }

    #[test]
    fn test_parse_item_with_filters() {
        let item = parse_query_item("attrAge:GT:5:LT:10", &catalog()).unwrap();
        assert_eq!(item.attribute.as_str(), "attrAge");
        assert_eq!(
            item.filters,
            vec![
                QueryFilter::new(QueryOperator::Gt, "5"),
                QueryFilter::new(QueryOperator::Lt, "10"),
            ]
        );
    }

    #[test]
    fn test_parse_item_without_filters() {
        let item = parse_query_item("attrAge", &catalog()).unwrap();
        assert!(item.filters.is_empty());
        assert_eq!(item.value_type, ValueType::Integer);
    }

    #[test]
    fn test_parse_item_even_segments() {
        let err = parse_query_item("attrAge:GT", &catalog()).unwrap_err();
        assert_eq!(err.to_string(), "Query item or filter is invalid: attrAge:GT");
    }

    #[test]
    fn test_parse_item_unknown_attribute() {
        let err = parse_query_item("attrMissing:EQ:1", &catalog()).unwrap_err();
        assert_eq!(err.to_string(), "Attribute does not exist: attrMissing");
    }
}
