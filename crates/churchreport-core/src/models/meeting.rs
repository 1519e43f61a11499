use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::{de_id_string, de_null_default};

/// Status string ChurchTools reports for attendees
const STATUS_PRESENT: &str = "present";

/// One occurrence of a recurring group gathering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMeeting {
    pub id: i64,
    #[serde(rename = "dateFrom", alias = "date", default, deserialize_with = "de_null_default")]
    pub date_from: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub comment: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub statistics: MeetingStatistics,
    #[serde(rename = "numGuests", default, deserialize_with = "de_null_default")]
    pub num_guests: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MeetingStatistics {
    #[serde(default)]
    pub present: u32,
    #[serde(default)]
    pub absent: u32,
}

impl GroupMeeting {
    /// Non-empty lines of the free-text comment. Organizers note visitors
    /// there, one per line.
    pub fn comment_lines(&self) -> Vec<String> {
        self.comment
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One entry of `GET /groups/{id}/meetings/{meetingId}/members`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingMember {
    pub member: MeetingMemberInfo,
    #[serde(default, deserialize_with = "de_null_default")]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingMemberInfo {
    #[serde(rename = "personId")]
    pub person_id: i64,
    #[serde(rename = "groupTypeRoleId", default)]
    pub group_type_role_id: Option<i64>,
    #[serde(default)]
    pub person: Option<MeetingPerson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingPerson {
    #[serde(rename = "domainIdentifier", deserialize_with = "de_id_string")]
    pub domain_identifier: String,
    #[serde(rename = "domainAttributes", default)]
    pub domain_attributes: super::person::RelativeAttributes,
}

impl MeetingMember {
    pub fn role_id(&self) -> Option<i64> {
        self.member.group_type_role_id
    }

    pub fn to_member(&self) -> Member {
        let (first_name, last_name) = self
            .member
            .person
            .as_ref()
            .map(|p| {
                (
                    p.domain_attributes.first_name.clone(),
                    p.domain_attributes.last_name.clone(),
                )
            })
            .unwrap_or_default();

        Member {
            id: self.member.person_id,
            first_name,
            last_name,
            present: self.status.eq_ignore_ascii_case(STATUS_PRESENT),
            absent_count: None,
        }
    }
}

/// Attendance record for one person at one meeting.
///
/// Identity is the person id alone: equality and hashing ignore names,
/// presence and tallies so records from different weekly snapshots
/// collapse onto the same person.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub present: bool,
    pub absent_count: Option<u32>,
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Member {
    pub fn is_absent(&self) -> bool {
        !self.present
    }

    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// Name order used on reports: last name, then first name, then id
    pub fn cmp_by_name(a: &Member, b: &Member) -> std::cmp::Ordering {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.first_name.cmp(&b.first_name))
            .then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_meeting() {
        let json = r#"{
            "id": 991,
            "groupId": 12,
            "dateFrom": "2022-05-22T08:00:00Z",
            "dateTo": "2022-05-22T10:00:00Z",
            "comment": "Familie Weber\n\nHerr Kunz\n",
            "numGuests": 4,
            "statistics": {"present": 52, "absent": 11, "unsure": 0}
        }"#;
        let meeting: GroupMeeting = serde_json::from_str(json).unwrap();
        assert_eq!(meeting.id, 991);
        assert_eq!(meeting.statistics.present, 52);
        assert_eq!(meeting.statistics.absent, 11);
        assert_eq!(meeting.num_guests, 4);
        assert_eq!(meeting.comment_lines(), vec!["Familie Weber", "Herr Kunz"]);
    }

    #[test]
    fn test_parse_meeting_with_nulls() {
        let json = r#"{"id": 1, "dateFrom": "2022-05-22", "comment": null, "statistics": null, "numGuests": null}"#;
        let meeting: GroupMeeting = serde_json::from_str(json).unwrap();
        assert!(meeting.comment_lines().is_empty());
        assert_eq!(meeting.statistics.present, 0);
        assert_eq!(meeting.num_guests, 0);
    }

    #[test]
    fn test_meeting_member_to_member() {
        let json = r#"{
            "member": {
                "personId": 77,
                "groupTypeRoleId": 16,
                "person": {"domainIdentifier": "77", "domainAttributes": {"firstName": "Jan", "lastName": "Ott"}}
            },
            "status": "absent"
        }"#;
        let mm: MeetingMember = serde_json::from_str(json).unwrap();
        assert_eq!(mm.role_id(), Some(16));
        let member = mm.to_member();
        assert_eq!(member.id, 77);
        assert_eq!(member.display_name(), "Ott, Jan");
        assert!(member.is_absent());
    }

    #[test]
    fn test_member_identity_is_id_only() {
        let a = Member {
            id: 5,
            first_name: "Lea".into(),
            last_name: "Roth".into(),
            present: false,
            absent_count: Some(2),
        };
        let b = Member {
            id: 5,
            first_name: "Lea M.".into(),
            last_name: "Roth".into(),
            present: true,
            absent_count: None,
        };
        assert_eq!(a, b);

        let set: HashSet<Member> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
