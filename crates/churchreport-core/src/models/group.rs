use serde::{Deserialize, Serialize};

/// One entry of `GET /groups/{id}/members`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    #[serde(rename = "personId")]
    pub person_id: i64,
    #[serde(rename = "groupTypeRoleId", default)]
    pub group_type_role_id: Option<i64>,
    #[serde(rename = "groupMemberStatus", default)]
    pub status: Option<String>,
}

impl GroupMember {
    /// True if this membership belongs to `person_id` and, when a role is
    /// requested, carries exactly that role.
    pub fn matches(&self, person_id: i64, role_filter: Option<i64>) -> bool {
        self.person_id == person_id
            && role_filter.map_or(true, |role| self.group_type_role_id == Some(role))
    }
}
