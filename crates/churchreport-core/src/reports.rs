//! Template contexts for the document reports.
//!
//! Field names serialize exactly as the templates address them.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::api::ChurchApi;
use crate::attendance::{
    self, WeeklyAttendance, ABSENCE_THRESHOLD, ATTENDANCE_WEEKS, VISITOR_WEEKS,
};
use crate::birthdays::{birthday_highlight, next_sunday};
use crate::models::{Member, Person};
use crate::utils::format_date;

/// Member list and prayer list
#[derive(Debug, Clone, Serialize)]
pub struct PersonListReport {
    pub persons: Vec<Person>,
}

impl PersonListReport {
    pub fn new(persons: Vec<Person>) -> Self {
        Self { persons }
    }
}

/// Keep persons whose last name lies in `[from, to]`. Plain string
/// comparison, so `to = "K"` excludes "Kraft".
pub fn filter_surname_range(persons: Vec<Person>, from: Option<&str>, to: Option<&str>) -> Vec<Person> {
    persons
        .into_iter()
        .filter(|p| from.map_or(true, |f| p.last_name.as_str() >= f))
        .filter(|p| to.map_or(true, |t| p.last_name.as_str() <= t))
        .collect()
}

/// A member on the check-in form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinPerson {
    #[serde(flatten)]
    pub person: Person,
    pub birthday_highlight: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckinReport {
    pub members: Vec<CheckinPerson>,
    pub regularvisitors: Vec<Person>,
    pub visitors: Vec<Person>,
    /// `DD.MM.YYYY`
    pub nextsunday: String,
}

impl CheckinReport {
    pub fn new(members: Vec<Person>, regular_visitors: Vec<Person>, visitors: Vec<Person>, today: NaiveDate) -> Self {
        let sunday = next_sunday(today);
        let members = members
            .into_iter()
            .map(|person| CheckinPerson {
                birthday_highlight: birthday_highlight(person.birthday_date, sunday),
                person,
            })
            .collect();

        Self {
            members,
            regularvisitors: regular_visitors,
            visitors,
            nextsunday: format_date(sunday),
        }
    }
}

/// Groups the attendance report is built from
#[derive(Debug, Clone, Copy)]
pub struct AttendanceQuery {
    pub members_group: i64,
    pub regular_visitors_group: i64,
    pub regular_visitors_role: Option<i64>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub meeting_date: String,
    pub members_present_count: u32,
    pub members_absent_count: u32,
    pub num_guests: u32,
    pub absent_last_two_sundays: Vec<Member>,
    pub absent_last_eight_weeks: Vec<Member>,
    pub absent_visitors_last_two_sundays: Vec<Member>,
    pub present_regular_visitors: Vec<Member>,
    pub regular_visitors_present_count: u32,
    pub regular_visitors_absent_count: u32,
    /// Visitors noted in the comment of the regular visitors' meeting
    pub present_visitors: Vec<String>,
    /// Visitors noted in either meeting comment
    pub other_visitors: Vec<String>,
}

impl AttendanceReport {
    pub async fn load<A: ChurchApi + ?Sized>(api: &A, query: AttendanceQuery) -> Result<Self> {
        let members =
            WeeklyAttendance::load(api, query.members_group, None, query.date, ATTENDANCE_WEEKS).await?;
        let visitors = WeeklyAttendance::load(
            api,
            query.regular_visitors_group,
            query.regular_visitors_role,
            query.date,
            VISITOR_WEEKS,
        )
        .await?;
        Self::build(query.date, &members, &visitors)
    }

    pub fn build(date: NaiveDate, members: &WeeklyAttendance, visitors: &WeeklyAttendance) -> Result<Self> {
        let members_meeting = members
            .latest()
            .ok_or_else(|| anyhow!("No member attendance loaded"))?;
        let visitors_meeting = visitors
            .latest()
            .ok_or_else(|| anyhow!("No visitor attendance loaded"))?;

        let present_visitors = visitors_meeting.comment_lines();
        let mut other_visitors = members_meeting.comment_lines();
        other_visitors.extend(present_visitors.iter().cloned());

        Ok(Self {
            meeting_date: format_date(date),
            members_present_count: members_meeting.statistics.present,
            members_absent_count: members_meeting.statistics.absent,
            num_guests: members_meeting.num_guests,
            absent_last_two_sundays: attendance::two_weeks_absent(&members.members),
            absent_last_eight_weeks: attendance::frequently_absent(&members.members, ABSENCE_THRESHOLD),
            absent_visitors_last_two_sundays: attendance::two_weeks_absent(&visitors.members),
            present_regular_visitors: attendance::present(visitors.latest_members()),
            regular_visitors_present_count: visitors_meeting.statistics.present,
            regular_visitors_absent_count: visitors_meeting.statistics.absent,
            present_visitors,
            other_visitors,
        })
    }
}
