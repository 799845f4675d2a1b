//! Per-customer artifacts and their shape rules.
//!
//! A customer directory holds at most one file per [`ArtifactKind`]. The JSON
//! artifacts ([`Wishlist`], [`ReferralRecord`]) can only be built from a value
//! of the right top-level shape, so anything that reaches storage has already
//! been validated.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Errors raised when a JSON payload has the wrong top-level shape.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// A wishlist payload was not a JSON array.
    #[error("wishlist must be a JSON array, got {found}")]
    NotAnArray {
        /// JSON type that was received.
        found: &'static str,
    },
    /// A referral payload was not a JSON object.
    #[error("referral must be a JSON object, got {found}")]
    NotAnObject {
        /// JSON type that was received.
        found: &'static str,
    },
}

/// The artifacts stored for each customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Profile image in the canonical encoding.
    Profile,
    /// Wishlist JSON array.
    Wishlist,
    /// Referral JSON object.
    Referrals,
}

impl ArtifactKind {
    /// Every artifact kind, in storage order.
    pub const ALL: [Self; 3] = [Self::Profile, Self::Wishlist, Self::Referrals];

    /// Fixed file name of this artifact inside a customer directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Profile => "profile.webp",
            Self::Wishlist => "wishlist.json",
            Self::Referrals => "referrals.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Profile => "profile",
            Self::Wishlist => "wishlist",
            Self::Referrals => "referrals",
        };
        f.write_str(name)
    }
}

/// Name of a JSON value's type, for error messages.
const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// An ordered list of opaque wishlist items.
///
/// Items are arbitrary JSON values; only the top-level shape is enforced.
///
/// ```
/// use customer_vault_core::Wishlist;
/// use serde_json::json;
///
/// assert!(Wishlist::try_from(json!([1, "two", {"three": 3}])).is_ok());
/// assert!(Wishlist::try_from(json!({"not": "a list"})).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist(Vec<Value>);

impl Wishlist {
    /// Returns the wishlist items.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.0
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the wishlist has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the wishlist and returns its items.
    #[must_use]
    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Wishlist {
    fn from(items: Vec<Value>) -> Self {
        Self(items)
    }
}

impl TryFrom<Value> for Wishlist {
    type Error = ShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(items) => Ok(Self(items)),
            other => Err(ShapeError::NotAnArray {
                found: json_type_name(&other),
            }),
        }
    }
}

/// A referral record: one JSON object of opaque fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralRecord(Map<String, Value>);

impl ReferralRecord {
    /// Look up a single field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns all fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the record and returns its fields.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ReferralRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for ReferralRecord {
    type Error = ShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(ShapeError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_artifact_file_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            ArtifactKind::ALL.iter().map(|k| k.file_name()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(ArtifactKind::Profile.file_name(), "profile.webp");
        assert_eq!(ArtifactKind::Wishlist.file_name(), "wishlist.json");
        assert_eq!(ArtifactKind::Referrals.file_name(), "referrals.json");
    }

    #[test]
    fn test_wishlist_accepts_arrays() {
        let wishlist = Wishlist::try_from(json!([1, 2, 3])).unwrap();
        assert_eq!(wishlist.len(), 3);
        assert_eq!(wishlist.items()[0], json!(1));

        let empty = Wishlist::try_from(json!([])).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_wishlist_rejects_other_shapes() {
        assert_eq!(
            Wishlist::try_from(json!({"a": 1})),
            Err(ShapeError::NotAnArray { found: "object" })
        );
        assert_eq!(
            Wishlist::try_from(json!("list")),
            Err(ShapeError::NotAnArray { found: "string" })
        );
        assert_eq!(
            Wishlist::try_from(Value::Null),
            Err(ShapeError::NotAnArray { found: "null" })
        );
    }

    #[test]
    fn test_referral_accepts_objects() {
        let record = ReferralRecord::try_from(json!({"code": "FRIEND10", "uses": 2})).unwrap();
        assert_eq!(record.get("code"), Some(&json!("FRIEND10")));
        assert!(!record.is_empty());
    }

    #[test]
    fn test_referral_rejects_other_shapes() {
        assert_eq!(
            ReferralRecord::try_from(json!([1])),
            Err(ShapeError::NotAnObject { found: "array" })
        );
        assert_eq!(
            ReferralRecord::try_from(json!(7)),
            Err(ShapeError::NotAnObject { found: "number" })
        );
    }

    #[test]
    fn test_shape_error_messages() {
        let err = ShapeError::NotAnArray { found: "object" };
        assert_eq!(err.to_string(), "wishlist must be a JSON array, got object");
    }

    #[test]
    fn test_serde_is_transparent() {
        let wishlist = Wishlist::from(vec![json!("a"), json!({"b": true})]);
        assert_eq!(serde_json::to_string(&wishlist).unwrap(), r#"["a",{"b":true}]"#);

        let parsed: ReferralRecord = serde_json::from_str(r#"{"by":"bob"}"#).unwrap();
        assert_eq!(parsed.get("by"), Some(&json!("bob")));
        assert!(serde_json::from_str::<ReferralRecord>("[]").is_err());
    }
}
