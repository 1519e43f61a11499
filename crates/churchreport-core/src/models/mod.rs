//! Data models for ChurchTools entities.
//!
//! This module contains the data structures used to represent
//! ChurchTools data:
//!
//! - `ApiPerson`, `Person`, `Child`: raw and enriched person records
//! - `Relationship`: spouse/child links between persons
//! - `GroupMember`: group membership with role
//! - `GroupMeeting`, `MeetingMember`, `Member`: meeting attendance

pub mod group;
pub mod meeting;
pub mod person;

pub use group::GroupMember;
pub use meeting::{GroupMeeting, MeetingMember, MeetingStatistics, Member};
pub use person::{ApiPerson, Child, Person, Relationship, RelationshipKind, Relative, SEX_MALE};

use serde::{Deserialize, Deserializer};

/// ChurchTools is inconsistent about identifier types: `domainIdentifier`
/// arrives as a string, `personId` as a number. Accept both.
pub(crate) fn de_id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

/// Treat an explicit `null` the same as a missing field.
pub(crate) fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
