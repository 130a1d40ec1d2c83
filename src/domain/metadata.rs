//! Metadata domain model
//!
//! Programs, program stages, organisation units, tracked entity types, data
//! elements, attributes and users. Metadata is read-only for an import; it is
//! loaded into a [`MetadataCatalog`] and copied into the preheat context.

use super::ids::Uid;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Authority that allows a user to reopen a completed event
pub const AUTHORITY_UNCOMPLETE_EVENT: &str = "F_UNCOMPLETE_EVENT";

/// Authority granting every capability
pub const AUTHORITY_ALL: &str = "ALL";

/// Declared value type of a data element or attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Text,
    LongText,
    Letter,
    PhoneNumber,
    Email,
    Boolean,
    TrueOnly,
    Date,
    Datetime,
    Time,
    Number,
    UnitInterval,
    Percentage,
    Integer,
    IntegerPositive,
    IntegerNegative,
    IntegerZeroOrPositive,
    Url,
    FileResource,
    Image,
    Coordinate,
    OrganisationUnit,
    Username,
    Age,
}

impl ValueType {
    /// Whether values of this type reference a stored file resource
    pub fn is_file_type(&self) -> bool {
        matches!(self, Self::FileResource | Self::Image)
    }

    /// Whether values of this type are numeric
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Number
                | Self::UnitInterval
                | Self::Percentage
                | Self::Integer
                | Self::IntegerPositive
                | Self::IntegerNegative
                | Self::IntegerZeroOrPositive
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{self:?}"));
        write!(f, "{name}")
    }
}

/// Geometry feature type declared by a program, stage or tracked entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureType {
    #[default]
    None,
    Point,
    Polygon,
    MultiPolygon,
    Symbol,
}

impl FeatureType {
    /// Geometry type name this feature type accepts
    pub fn value(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Point => "Point",
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
            Self::Symbol => "Symbol",
        }
    }
}

/// Whether a program tracks registered entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramType {
    #[default]
    WithRegistration,
    WithoutRegistration,
}

/// Data element captured by program stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataElement {
    pub uid: Uid,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    pub value_type: ValueType,
}

impl DataElement {
    pub fn new(uid: Uid, value_type: ValueType) -> Self {
        Self {
            name: uid.to_string(),
            uid,
            code: None,
            value_type,
        }
    }

    /// Whether values of this element reference a file resource
    pub fn is_file_type(&self) -> bool {
        self.value_type.is_file_type()
    }
}

/// Attribute attached to tracked entities and enrollments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntityAttribute {
    pub uid: Uid,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub unique: bool,
}

impl TrackedEntityAttribute {
    pub fn new(uid: Uid, value_type: ValueType) -> Self {
        Self {
            name: uid.to_string(),
            uid,
            code: None,
            value_type,
            unique: false,
        }
    }
}

/// Program stage, the template events are captured against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramStage {
    pub uid: Uid,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    pub program: Uid,
    #[serde(default)]
    pub feature_type: FeatureType,
    #[serde(default)]
    pub data_elements: Vec<Uid>,
}

impl ProgramStage {
    pub fn new(uid: Uid, program: Uid) -> Self {
        Self {
            name: uid.to_string(),
            uid,
            code: None,
            program,
            feature_type: FeatureType::None,
            data_elements: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_feature_type(mut self, feature_type: FeatureType) -> Self {
        self.feature_type = feature_type;
        self
    }

    pub fn with_data_element(mut self, data_element: Uid) -> Self {
        self.data_elements.push(data_element);
        self
    }

    /// Whether the stage captures the given data element
    pub fn has_data_element(&self, uid: &str) -> bool {
        self.data_elements.iter().any(|de| de.as_str() == uid)
    }
}

/// Program definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub uid: Uid,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub program_type: ProgramType,
    #[serde(default)]
    pub tracked_entity_type: Option<Uid>,
    #[serde(default)]
    pub program_stages: Vec<Uid>,
    #[serde(default)]
    pub attributes: Vec<Uid>,
    #[serde(default)]
    pub feature_type: FeatureType,
    /// Whether any user may write data for this program
    #[serde(default = "default_true")]
    pub public_data_write: bool,
    /// Users explicitly allowed to write data when public write is off
    #[serde(default)]
    pub data_write_users: Vec<Uid>,
}

impl Program {
    pub fn new(uid: Uid) -> Self {
        Self {
            name: uid.to_string(),
            uid,
            code: None,
            program_type: ProgramType::WithRegistration,
            tracked_entity_type: None,
            program_stages: Vec::new(),
            attributes: Vec::new(),
            feature_type: FeatureType::None,
            public_data_write: true,
            data_write_users: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_stage(mut self, stage: Uid) -> Self {
        self.program_stages.push(stage);
        self
    }

    pub fn with_attribute(mut self, attribute: Uid) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_tracked_entity_type(mut self, tracked_entity_type: Uid) -> Self {
        self.tracked_entity_type = Some(tracked_entity_type);
        self
    }

    /// Restricts data write to the listed users
    pub fn restricted_to(mut self, users: Vec<Uid>) -> Self {
        self.public_data_write = false;
        self.data_write_users = users;
        self
    }

    pub fn has_stage(&self, uid: &str) -> bool {
        self.program_stages.iter().any(|s| s.as_str() == uid)
    }

    pub fn has_attribute(&self, uid: &str) -> bool {
        self.attributes.iter().any(|a| a.as_str() == uid)
    }

    pub fn is_registration(&self) -> bool {
        self.program_type == ProgramType::WithRegistration
    }
}

/// Organisation unit in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationUnit {
    pub uid: Uid,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    /// Materialised path from the root, e.g. `/root/district/facility`
    #[serde(default)]
    pub path: String,
}

impl OrganisationUnit {
    /// Creates a root-level unit whose path is derived from its uid
    pub fn new(uid: Uid) -> Self {
        Self {
            name: uid.to_string(),
            path: format!("/{uid}"),
            uid,
            code: None,
        }
    }

    /// Creates a unit below the given parent
    pub fn child_of(uid: Uid, parent: &OrganisationUnit) -> Self {
        Self {
            name: uid.to_string(),
            path: format!("{}/{uid}", parent.path),
            uid,
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether this unit is the given unit or lies below it
    pub fn is_descendant_of(&self, ancestor: &str) -> bool {
        self.path.split('/').any(|segment| segment == ancestor)
    }
}

/// Type of a tracked entity (person, commodity, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntityType {
    pub uid: Uid,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub feature_type: FeatureType,
    #[serde(default)]
    pub attributes: Vec<Uid>,
}

impl TrackedEntityType {
    pub fn new(uid: Uid) -> Self {
        Self {
            name: uid.to_string(),
            uid,
            code: None,
            feature_type: FeatureType::None,
            attributes: Vec::new(),
        }
    }

    pub fn with_feature_type(mut self, feature_type: FeatureType) -> Self {
        self.feature_type = feature_type;
        self
    }

    pub fn with_attribute(mut self, attribute: Uid) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn has_attribute(&self, uid: &str) -> bool {
        self.attributes.iter().any(|a| a.as_str() == uid)
    }
}

/// User performing or referenced by an import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: Uid,
    pub username: String,
    #[serde(default)]
    pub super_user: bool,
    #[serde(default)]
    pub authorities: HashSet<String>,
    /// Data capture organisation units
    #[serde(default)]
    pub organisation_units: Vec<Uid>,
    /// Search organisation units
    #[serde(default)]
    pub search_organisation_units: Vec<Uid>,
}

impl User {
    pub fn new(uid: Uid, username: impl Into<String>) -> Self {
        Self {
            uid,
            username: username.into(),
            super_user: false,
            authorities: HashSet::new(),
            organisation_units: Vec::new(),
            search_organisation_units: Vec::new(),
        }
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authorities.insert(authority.into());
        self
    }

    pub fn with_organisation_unit(mut self, org_unit: Uid) -> Self {
        self.organisation_units.push(org_unit);
        self
    }

    pub fn as_super_user(mut self) -> Self {
        self.super_user = true;
        self
    }

    /// Whether the user holds super-user rights
    pub fn is_super(&self) -> bool {
        self.super_user || self.authorities.contains(AUTHORITY_ALL)
    }

    /// Whether the user holds the given authority
    pub fn is_authorized(&self, authority: &str) -> bool {
        self.is_super() || self.authorities.contains(authority)
    }
}

fn default_true() -> bool {
    true
}

/// Serialized form of a metadata catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(default)]
    pub program_stages: Vec<ProgramStage>,
    #[serde(default)]
    pub organisation_units: Vec<OrganisationUnit>,
    #[serde(default)]
    pub tracked_entity_types: Vec<TrackedEntityType>,
    #[serde(default)]
    pub data_elements: Vec<DataElement>,
    #[serde(default)]
    pub tracked_entity_attributes: Vec<TrackedEntityAttribute>,
    #[serde(default)]
    pub users: Vec<User>,
}

/// Indexed metadata available to an import or a query
///
/// Every object is reachable by uid; programs, stages and organisation units
/// are also indexed by code, users by username.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "CatalogDocument")]
pub struct MetadataCatalog {
    programs: HashMap<Uid, Program>,
    program_codes: HashMap<String, Uid>,
    program_stages: HashMap<Uid, ProgramStage>,
    program_stage_codes: HashMap<String, Uid>,
    organisation_units: HashMap<Uid, OrganisationUnit>,
    organisation_unit_codes: HashMap<String, Uid>,
    tracked_entity_types: HashMap<Uid, TrackedEntityType>,
    data_elements: HashMap<Uid, DataElement>,
    attributes: HashMap<Uid, TrackedEntityAttribute>,
    users: HashMap<Uid, User>,
    usernames: HashMap<String, Uid>,
}

impl From<CatalogDocument> for MetadataCatalog {
    fn from(document: CatalogDocument) -> Self {
        let mut catalog = Self::default();
        document
            .programs
            .into_iter()
            .for_each(|p| catalog.add_program(p));
        document
            .program_stages
            .into_iter()
            .for_each(|s| catalog.add_program_stage(s));
        document
            .organisation_units
            .into_iter()
            .for_each(|ou| catalog.add_organisation_unit(ou));
        document
            .tracked_entity_types
            .into_iter()
            .for_each(|t| catalog.add_tracked_entity_type(t));
        document
            .data_elements
            .into_iter()
            .for_each(|de| catalog.add_data_element(de));
        document
            .tracked_entity_attributes
            .into_iter()
            .for_each(|a| catalog.add_attribute(a));
        document.users.into_iter().for_each(|u| catalog.add_user(u));
        catalog
    }
}

impl MetadataCatalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_program(&mut self, program: Program) {
        if let Some(code) = &program.code {
            self.program_codes.insert(code.clone(), program.uid.clone());
        }
        self.programs.insert(program.uid.clone(), program);
    }

    pub fn add_program_stage(&mut self, stage: ProgramStage) {
        if let Some(code) = &stage.code {
            self.program_stage_codes
                .insert(code.clone(), stage.uid.clone());
        }
        self.program_stages.insert(stage.uid.clone(), stage);
    }

    pub fn add_organisation_unit(&mut self, org_unit: OrganisationUnit) {
        if let Some(code) = &org_unit.code {
            self.organisation_unit_codes
                .insert(code.clone(), org_unit.uid.clone());
        }
        self.organisation_units.insert(org_unit.uid.clone(), org_unit);
    }

    pub fn add_tracked_entity_type(&mut self, tracked_entity_type: TrackedEntityType) {
        self.tracked_entity_types
            .insert(tracked_entity_type.uid.clone(), tracked_entity_type);
    }

    pub fn add_data_element(&mut self, data_element: DataElement) {
        self.data_elements
            .insert(data_element.uid.clone(), data_element);
    }

    pub fn add_attribute(&mut self, attribute: TrackedEntityAttribute) {
        self.attributes.insert(attribute.uid.clone(), attribute);
    }

    pub fn add_user(&mut self, user: User) {
        self.usernames
            .insert(user.username.clone(), user.uid.clone());
        self.users.insert(user.uid.clone(), user);
    }

    pub fn program(&self, uid: &str) -> Option<&Program> {
        self.programs.get(uid)
    }

    pub fn program_by_code(&self, code: &str) -> Option<&Program> {
        self.program_codes
            .get(code)
            .and_then(|uid| self.programs.get(uid))
    }

    pub fn program_stage(&self, uid: &str) -> Option<&ProgramStage> {
        self.program_stages.get(uid)
    }

    pub fn program_stage_by_code(&self, code: &str) -> Option<&ProgramStage> {
        self.program_stage_codes
            .get(code)
            .and_then(|uid| self.program_stages.get(uid))
    }

    pub fn organisation_unit(&self, uid: &str) -> Option<&OrganisationUnit> {
        self.organisation_units.get(uid)
    }

    pub fn organisation_unit_by_code(&self, code: &str) -> Option<&OrganisationUnit> {
        self.organisation_unit_codes
            .get(code)
            .and_then(|uid| self.organisation_units.get(uid))
    }

    pub fn tracked_entity_type(&self, uid: &str) -> Option<&TrackedEntityType> {
        self.tracked_entity_types.get(uid)
    }

    pub fn data_element(&self, uid: &str) -> Option<&DataElement> {
        self.data_elements.get(uid)
    }

    pub fn attribute(&self, uid: &str) -> Option<&TrackedEntityAttribute> {
        self.attributes.get(uid)
    }

    /// All tracked entity attributes keyed by uid
    pub fn attributes(&self) -> &HashMap<Uid, TrackedEntityAttribute> {
        &self.attributes
    }

    pub fn user(&self, uid: &str) -> Option<&User> {
        self.users.get(uid)
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.usernames
            .get(username)
            .and_then(|uid| self.users.get(uid))
    }

    /// Iterator over every program stage
    pub fn program_stages(&self) -> impl Iterator<Item = &ProgramStage> {
        self.program_stages.values()
    }
}
