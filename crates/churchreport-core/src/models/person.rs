use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{de_id_string, de_null_default};

/// `sexId` value ChurchTools uses for male persons. Every other value is
/// treated as female when building family groups.
pub const SEX_MALE: i64 = 1;

/// Stand-in birthdate for children whose birthdate is unknown. Sorting them
/// as if born in 1900 places them with the oldest.
const UNKNOWN_BIRTHDATE: (i32, u32, u32) = (1900, 1, 1);

/// Person as returned by `GET /persons` and `GET /persons/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPerson {
    pub id: i64,
    #[serde(rename = "firstName", default, deserialize_with = "de_null_default")]
    pub first_name: String,
    #[serde(rename = "lastName", default, deserialize_with = "de_null_default")]
    pub last_name: String,
    #[serde(rename = "sexId", default)]
    pub sex_id: Option<i64>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

/// A roster entry after enrichment: formatted birthdate, optional portrait,
/// and the family fields used for grouping and sorting.
///
/// Field names serialize in camelCase because templates address them directly
/// (`{{firstName}}`, `{{allChildren}}`, `{{#familyEnd}}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub sex_id: Option<i64>,
    /// Birthdate exactly as the API delivered it (`YYYY-MM-DD`)
    pub birthday_raw: Option<String>,
    /// Display form `DD.MM.YYYY`, empty when unknown
    pub birthday: String,
    pub birthday_date: Option<NaiveDate>,
    pub age: Option<i32>,
    pub image_url: Option<String>,
    /// Round PNG portrait
    #[serde(default, with = "base64_bytes")]
    pub image: Option<Vec<u8>>,
    pub family_id: String,
    pub family_end: bool,
    pub spouse: Option<String>,
    pub children: Vec<Child>,
    pub all_children: String,
}

impl From<ApiPerson> for Person {
    fn from(api: ApiPerson) -> Self {
        Person {
            id: api.id,
            family_id: api.last_name.clone(),
            first_name: api.first_name,
            last_name: api.last_name,
            sex_id: api.sex_id,
            birthday_raw: api.birthday,
            birthday: String::new(),
            birthday_date: None,
            age: None,
            image_url: api.image_url.filter(|u| !u.is_empty()),
            image: None,
            family_end: false,
            spouse: None,
            children: Vec::new(),
            all_children: String::new(),
        }
    }
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_male(&self) -> bool {
        self.sex_id == Some(SEX_MALE)
    }

    /// Key used to cluster families: `(family_id, sex_id)`.
    pub fn family_key(&self) -> (&str, Option<i64>) {
        (self.family_id.as_str(), self.sex_id)
    }
}

/// A child listed under a parent on the member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub name: String,
    pub birthdate: Option<NaiveDate>,
    pub age: Option<i32>,
    /// `" (12)"` when the age is known, empty otherwise
    pub age_suffix: String,
}

impl Child {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            birthdate: None,
            age: None,
            age_suffix: String::new(),
        }
    }

    pub fn set_birthdate(&mut self, birthdate: NaiveDate, age: i32) {
        self.birthdate = Some(birthdate);
        self.age = Some(age);
        self.age_suffix = format!(" ({})", age);
    }

    fn sort_date(&self) -> NaiveDate {
        let (y, m, d) = UNKNOWN_BIRTHDATE;
        self.birthdate
            .or_else(|| NaiveDate::from_ymd_opt(y, m, d))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Descending by birthdate: the most recently born child first, unknown
    /// birthdates last.
    pub fn cmp_by_birthdate_desc(a: &Child, b: &Child) -> Ordering {
        b.sort_date().cmp(&a.sort_date())
    }
}

impl fmt::Display for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.age_suffix)
    }
}

/// Relationship type as coded by ChurchTools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    Child,
    Spouse,
    Other(i64),
}

impl From<i64> for RelationshipKind {
    fn from(id: i64) -> Self {
        match id {
            1 => RelationshipKind::Child,
            2 => RelationshipKind::Spouse,
            other => RelationshipKind::Other(other),
        }
    }
}

/// One entry of `GET /persons/{id}/relationships`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "relationshipTypeId")]
    pub relationship_type_id: i64,
    pub relative: Relative,
}

impl Relationship {
    pub fn kind(&self) -> RelationshipKind {
        RelationshipKind::from(self.relationship_type_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relative {
    #[serde(rename = "domainIdentifier", deserialize_with = "de_id_string")]
    pub domain_identifier: String,
    #[serde(rename = "apiUrl", default)]
    pub api_url: Option<String>,
    #[serde(rename = "domainAttributes", default)]
    pub domain_attributes: RelativeAttributes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelativeAttributes {
    #[serde(rename = "firstName", default, deserialize_with = "de_null_default")]
    pub first_name: String,
    #[serde(rename = "lastName", default, deserialize_with = "de_null_default")]
    pub last_name: String,
}

/// Portrait bytes travel as base64 so the debug cache stays plain JSON and
/// flat ODF templates can embed them in `<office:binary-data>`.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_str(&STANDARD.encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
