//! Attendance report for one service.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use tracing::info;

use churchreport_core::render::render_file;
use churchreport_core::reports::{AttendanceQuery, AttendanceReport};
use churchreport_core::utils::parse_api_date;

use super::Session;

#[derive(Args)]
pub struct AttendanceArgs {
    /// Group of church members
    #[arg(long)]
    pub group_members: i64,

    /// Group of regular visitors
    #[arg(long)]
    pub group_regular_visitors: i64,

    /// Only regular visitors with this role
    #[arg(long)]
    pub role_id_regular_visitors: Option<i64>,

    /// Service date, YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    pub date: NaiveDate,

    /// Template file (flat ODT)
    #[arg(long, default_value = "template_attendancereport.fodt")]
    pub template: PathBuf,

    /// Output file
    #[arg(long, default_value = "attendancereport.fodt")]
    pub output: PathBuf,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_api_date(value).map_err(|e| e.to_string())
}

pub async fn run(session: &Session, args: AttendanceArgs) -> Result<()> {
    let query = AttendanceQuery {
        members_group: args.group_members,
        regular_visitors_group: args.group_regular_visitors,
        regular_visitors_role: args.role_id_regular_visitors,
        date: args.date,
    };

    let report = AttendanceReport::load(&session.api, query).await?;
    render_file(&args.template, &args.output, &report)?;
    info!(date = %report.meeting_date, output = %args.output.display(), "Wrote attendance report");
    Ok(())
}
