//! Domain identifier types with validation
//!
//! This module provides the opaque [`Uid`] newtype used for every tracker and
//! metadata object, and the identifier schemes used to resolve external
//! references against metadata.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Length of a generated record identifier
pub const UID_LENGTH: usize = 22;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALPHANUMERICS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Opaque object identifier
///
/// Metadata identifiers are accepted as-is (any non-blank string without
/// whitespace). Record identifiers supplied by clients must additionally
/// satisfy [`Uid::is_valid_format`].
///
/// # Examples
///
/// ```
/// use intake::domain::ids::Uid;
///
/// let uid = Uid::generate();
/// assert_eq!(uid.as_str().len(), 22);
/// assert!(Uid::is_valid_format(uid.as_str()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(String);

impl Uid {
    /// Creates a new Uid from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(Uid)` if the identifier is non-blank and has no whitespace
    pub fn new(uid: impl Into<String>) -> Result<Self, String> {
        let uid = uid.into();
        if uid.trim().is_empty() {
            return Err("UID cannot be empty".to_string());
        }
        if uid.chars().any(char::is_whitespace) {
            return Err(format!("UID cannot contain whitespace: '{uid}'"));
        }
        Ok(Self(uid))
    }

    /// Generates a fresh 22-character identifier
    ///
    /// The first character is a letter, the remaining ones are alphanumeric.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut uid = String::with_capacity(UID_LENGTH);
        uid.push(LETTERS[rng.gen_range(0..LETTERS.len())] as char);
        for _ in 1..UID_LENGTH {
            uid.push(ALPHANUMERICS[rng.gen_range(0..ALPHANUMERICS.len())] as char);
        }
        Self(uid)
    }

    /// Checks whether a string has the shape of a generated identifier
    pub fn is_valid_format(candidate: &str) -> bool {
        candidate.len() == UID_LENGTH
            && candidate
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
            && candidate.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Uid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Uid {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl AsRef<str> for Uid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Uid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier scheme used to resolve an external reference to metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum IdScheme {
    /// Match on the object UID
    #[default]
    Uid,
    /// Match on the object code
    Code,
    /// Match on the object name
    Name,
    /// Match on the value of the given metadata attribute
    Attribute(String),
}

impl IdScheme {
    /// Returns the canonical lowercase name of the scheme
    pub fn name(&self) -> String {
        match self {
            Self::Uid => "uid".to_string(),
            Self::Code => "code".to_string(),
            Self::Name => "name".to_string(),
            Self::Attribute(uid) => format!("attribute:{uid}"),
        }
    }
}

impl fmt::Display for IdScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for IdScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "uid" => Ok(Self::Uid),
            "code" => Ok(Self::Code),
            "name" => Ok(Self::Name),
            lower if lower.starts_with("attribute:") => {
                let uid = &trimmed["attribute:".len()..];
                if uid.is_empty() {
                    return Err("Attribute id scheme requires an attribute UID".to_string());
                }
                Ok(Self::Attribute(uid.to_string()))
            }
            _ => Err(format!(
                "Invalid id scheme: {s}. Expected 'uid', 'code', 'name' or 'attribute:<uid>'"
            )),
        }
    }
}

/// Identifier schemes for one import
///
/// Per-object overrides fall back to the general scheme when absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdSchemes {
    /// General scheme
    pub id_scheme: IdScheme,
    /// Override for program references
    pub program: Option<IdScheme>,
    /// Override for program stage references
    pub program_stage: Option<IdScheme>,
    /// Override for organisation unit references
    pub org_unit: Option<IdScheme>,
}

impl IdSchemes {
    /// Creates schemes that all use the given scheme
    pub fn new(id_scheme: IdScheme) -> Self {
        Self {
            id_scheme,
            ..Self::default()
        }
    }

    /// Scheme used for program references
    pub fn program_id_scheme(&self) -> &IdScheme {
        self.program.as_ref().unwrap_or(&self.id_scheme)
    }

    /// Scheme used for program stage references
    pub fn program_stage_id_scheme(&self) -> &IdScheme {
        self.program_stage.as_ref().unwrap_or(&self.id_scheme)
    }

    /// Scheme used for organisation unit references
    pub fn org_unit_id_scheme(&self) -> &IdScheme {
        self.org_unit.as_ref().unwrap_or(&self.id_scheme)
    }

    /// Every scheme in effect, general first
    pub fn all(&self) -> Vec<&IdScheme> {
        vec![
            &self.id_scheme,
            self.program_id_scheme(),
            self.program_stage_id_scheme(),
            self.org_unit_id_scheme(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_creation() {
        let uid = Uid::new("stageA").unwrap();
        assert_eq!(uid.as_str(), "stageA");
    }

    #[test]
    fn test_uid_empty_fails() {
        assert!(Uid::new("").is_err());
        assert!(Uid::new("   ").is_err());
        assert!(Uid::new("has space").is_err());
    }

    #[test]
    fn test_uid_generate_shape() {
        for _ in 0..50 {
            let uid = Uid::generate();
            assert!(Uid::is_valid_format(uid.as_str()), "bad uid {uid}");
        }
    }

    #[test]
    fn test_uid_generate_unique() {
        assert_ne!(Uid::generate(), Uid::generate());
    }

    #[test]
    fn test_uid_valid_format() {
        assert!(Uid::is_valid_format("a1234567890123456789bc"));
        assert!(!Uid::is_valid_format("11234567890123456789bc"));
        assert!(!Uid::is_valid_format("short"));
        assert!(!Uid::is_valid_format("a123456789012345678-bc"));
    }

    #[test]
    fn test_uid_serde_rejects_blank() {
        assert!(serde_json::from_str::<Uid>("\"\"").is_err());
        let uid: Uid = serde_json::from_str("\"ouA\"").unwrap();
        assert_eq!(uid.as_str(), "ouA");
    }

    #[test]
    fn test_id_scheme_parse() {
        assert_eq!("UID".parse::<IdScheme>().unwrap(), IdScheme::Uid);
        assert_eq!("code".parse::<IdScheme>().unwrap(), IdScheme::Code);
        assert_eq!(
            "attribute:AbC".parse::<IdScheme>().unwrap(),
            IdScheme::Attribute("AbC".to_string())
        );
        assert!("attribute:".parse::<IdScheme>().is_err());
        assert!("bogus".parse::<IdScheme>().is_err());
    }

    #[test]
    fn test_id_schemes_fallback() {
        let mut schemes = IdSchemes::new(IdScheme::Code);
        assert_eq!(schemes.program_stage_id_scheme(), &IdScheme::Code);
        schemes.program_stage = Some(IdScheme::Uid);
        assert_eq!(schemes.program_stage_id_scheme(), &IdScheme::Uid);
        assert_eq!(schemes.program_id_scheme(), &IdScheme::Code);
    }
}
