//! Entity lifecycle status and its wire representation.
//!
//! Statuses are stored as single-character string codes. The codes are the
//! on-disk representation and must be preserved exactly for compatibility
//! with existing data. The operator layer only defaults an absent status to
//! [`EntityStatus::Active`]; it never enforces transitions between states.

use bson::Bson;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumerated lifecycle state of a stored entity.
///
/// Status is caller-supplied data: the operator layer applies
/// [`EntityStatus::Active`] when a create or upsert leaves it absent, and
/// otherwise passes it through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityStatus {
    #[serde(rename = "A")]
    Active,
    #[serde(rename = "D")]
    Deleted,
    #[serde(rename = "E")]
    Error,
    #[serde(rename = "X")]
    Expired,
    #[serde(rename = "P")]
    Pending,
    #[serde(rename = "R")]
    Running,
    #[serde(rename = "S")]
    Scheduled,
    #[serde(rename = "U")]
    Unverified,
    #[serde(rename = "L")]
    Uploading,
    #[serde(rename = "V")]
    Verified,
}

impl EntityStatus {
    /// Returns the single-character wire code for this status.
    pub fn code(&self) -> &'static str {
        match self {
            EntityStatus::Active => "A",
            EntityStatus::Deleted => "D",
            EntityStatus::Error => "E",
            EntityStatus::Expired => "X",
            EntityStatus::Pending => "P",
            EntityStatus::Running => "R",
            EntityStatus::Scheduled => "S",
            EntityStatus::Unverified => "U",
            EntityStatus::Uploading => "L",
            EntityStatus::Verified => "V",
        }
    }

    /// Parses a wire code back into a status.
    ///
    /// Returns `None` for anything that is not one of the ten known codes.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(EntityStatus::Active),
            "D" => Some(EntityStatus::Deleted),
            "E" => Some(EntityStatus::Error),
            "X" => Some(EntityStatus::Expired),
            "P" => Some(EntityStatus::Pending),
            "R" => Some(EntityStatus::Running),
            "S" => Some(EntityStatus::Scheduled),
            "U" => Some(EntityStatus::Unverified),
            "L" => Some(EntityStatus::Uploading),
            "V" => Some(EntityStatus::Verified),
            _ => None,
        }
    }
}

impl Default for EntityStatus {
    fn default() -> Self {
        EntityStatus::Active
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<EntityStatus> for Bson {
    fn from(status: EntityStatus) -> Bson {
        Bson::String(status.code().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::ser::serialize_to_bson;

    const ALL: [EntityStatus; 10] = [
        EntityStatus::Active,
        EntityStatus::Deleted,
        EntityStatus::Error,
        EntityStatus::Expired,
        EntityStatus::Pending,
        EntityStatus::Running,
        EntityStatus::Scheduled,
        EntityStatus::Unverified,
        EntityStatus::Uploading,
        EntityStatus::Verified,
    ];

    #[test]
    fn wire_codes_are_preserved() {
        let expected = ["A", "D", "E", "X", "P", "R", "S", "U", "L", "V"];
        for (status, code) in ALL.iter().zip(expected) {
            assert_eq!(status.code(), code);
            assert_eq!(
                serialize_to_bson(status).unwrap(),
                Bson::String(code.to_string()),
            );
        }
    }

    #[test]
    fn codes_round_trip() {
        for status in ALL {
            assert_eq!(EntityStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(EntityStatus::from_code("Z"), None);
        assert_eq!(EntityStatus::from_code(""), None);
    }

    #[test]
    fn default_is_active() {
        assert_eq!(EntityStatus::default(), EntityStatus::Active);
    }

    #[test]
    fn converts_into_bson_string() {
        assert_eq!(
            Bson::from(EntityStatus::Deleted),
            Bson::String("D".to_string()),
        );
    }
}
