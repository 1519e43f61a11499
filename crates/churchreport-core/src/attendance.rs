//! Meeting attendance: weekly snapshots and absence streaks.
//!
//! A snapshot is the attendance list of one meeting. Index 0 is the meeting
//! on the report date, index `n` the meeting `n` weeks earlier.

use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::api::ChurchApi;
use crate::models::{GroupMeeting, Member};

/// Weeks of member attendance looked at by the attendance report
pub const ATTENDANCE_WEEKS: usize = 8;

/// Weeks of regular-visitor attendance looked at by the attendance report
pub const VISITOR_WEEKS: usize = 2;

/// Absences within `ATTENDANCE_WEEKS` that put a member on the report
pub const ABSENCE_THRESHOLD: u32 = 4;

/// The meeting of `group_id` taking place on `date`.
///
/// Fails when there is none. Several meetings on one day are unexpected; the
/// first one wins.
pub async fn find_meeting<A: ChurchApi + ?Sized>(
    api: &A,
    group_id: i64,
    date: NaiveDate,
) -> Result<GroupMeeting> {
    let next_day = date + Duration::days(1);
    let mut meetings = api
        .fetch_group_meetings(group_id, date, next_day)
        .await
        .with_context(|| format!("Failed to fetch meetings of group {}", group_id))?;

    if meetings.len() > 1 {
        warn!(group_id, %date, count = meetings.len(), "Several meetings on one day, using the first");
    }
    if meetings.is_empty() {
        return Err(anyhow!("No meeting of group {} on {}", group_id, date));
    }
    Ok(meetings.swap_remove(0))
}

/// Attendance records of a meeting, optionally only those holding `role`.
pub async fn list_meeting_members<A: ChurchApi + ?Sized>(
    api: &A,
    group_id: i64,
    meeting_id: i64,
    role: Option<i64>,
) -> Result<Vec<Member>> {
    let records = api
        .fetch_meeting_members(group_id, meeting_id)
        .await
        .with_context(|| format!("Failed to fetch attendance of meeting {}", meeting_id))?;

    Ok(records
        .iter()
        .filter(|r| role.map_or(true, |wanted| r.role_id() == Some(wanted)))
        .map(|r| r.to_member())
        .collect())
}

/// Consecutive weekly meetings of one group, newest first.
#[derive(Debug, Clone)]
pub struct WeeklyAttendance {
    pub meetings: Vec<GroupMeeting>,
    pub members: Vec<Vec<Member>>,
}

impl WeeklyAttendance {
    /// Load the meetings on `date`, `date - 7`, ... for `weeks` weeks.
    pub async fn load<A: ChurchApi + ?Sized>(
        api: &A,
        group_id: i64,
        role: Option<i64>,
        date: NaiveDate,
        weeks: usize,
    ) -> Result<Self> {
        let mut meetings = Vec::with_capacity(weeks);
        let mut members = Vec::with_capacity(weeks);

        for week in 0..weeks {
            let day = date - Duration::weeks(week as i64);
            let meeting = find_meeting(api, group_id, day).await?;
            let attendance = list_meeting_members(api, group_id, meeting.id, role).await?;
            debug!(group_id, %day, meeting_id = meeting.id, records = attendance.len(), "Loaded attendance");
            meetings.push(meeting);
            members.push(attendance);
        }

        Ok(Self { meetings, members })
    }

    /// Meeting on the report date
    pub fn latest(&self) -> Option<&GroupMeeting> {
        self.meetings.first()
    }

    pub fn latest_members(&self) -> &[Member] {
        self.members.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

fn absentees(snapshot: &[Member]) -> HashSet<&Member> {
    snapshot.iter().filter(|m| m.is_absent()).collect()
}

/// Members absent from both of the two newest meetings, in name order.
///
/// Each snapshot is assumed to hold one record per person.
pub fn two_weeks_absent(snapshots: &[Vec<Member>]) -> Vec<Member> {
    let (Some(this_week), Some(last_week)) = (snapshots.first(), snapshots.get(1)) else {
        return Vec::new();
    };

    let last_week = absentees(last_week);
    let mut both: Vec<Member> = absentees(this_week)
        .intersection(&last_week)
        .map(|m| (*m).clone())
        .collect();
    both.sort_by(Member::cmp_by_name);
    both
}

/// Members absent from at least `threshold` of the given meetings, each with
/// its `absent_count` filled in. Order follows first appearance, newest
/// meeting first.
pub fn frequently_absent(snapshots: &[Vec<Member>], threshold: u32) -> Vec<Member> {
    let mut tallies: Vec<Member> = Vec::new();

    for member in snapshots.iter().flatten().filter(|m| m.is_absent()) {
        match tallies.iter_mut().find(|t| *t == member) {
            Some(tally) => {
                *tally.absent_count.get_or_insert(0) += 1;
            }
            None => {
                let mut first = member.clone();
                first.absent_count = Some(1);
                tallies.push(first);
            }
        }
    }

    tallies.retain(|m| m.absent_count.unwrap_or(0) >= threshold);
    tallies
}

pub fn present(snapshot: &[Member]) -> Vec<Member> {
    snapshot.iter().filter(|m| m.present).cloned().collect()
}
