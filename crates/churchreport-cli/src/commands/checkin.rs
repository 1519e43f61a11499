//! Check-in form for the coming Sunday.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use churchreport_core::render::render_file;
use churchreport_core::reports::CheckinReport;

use super::Session;

#[derive(Args)]
pub struct CheckinArgs {
    /// Group of church members
    #[arg(long)]
    pub group_members: i64,

    /// Group of regular visitors
    #[arg(long)]
    pub group_regular_visitors: i64,

    /// Only regular visitors with this role
    #[arg(long)]
    pub role_id_regular_visitors: Option<i64>,

    /// Group of other visitors
    #[arg(long)]
    pub group_visitors: i64,

    /// Only other visitors with this role
    #[arg(long)]
    pub role_id_visitors: Option<i64>,

    /// Template file (flat ODT)
    #[arg(long, default_value = "template_checkin_form.fodt")]
    pub template: PathBuf,

    /// Output file
    #[arg(long, default_value = "checkinform.fodt")]
    pub output: PathBuf,
}

pub async fn run(session: &Session, args: CheckinArgs) -> Result<()> {
    let members = session.roster(Some(args.group_members), None).await?;
    let regular_visitors = session
        .roster(Some(args.group_regular_visitors), args.role_id_regular_visitors)
        .await?;
    let visitors = session
        .roster(Some(args.group_visitors), args.role_id_visitors)
        .await?;

    let report = CheckinReport::new(members, regular_visitors, visitors, session.today);
    render_file(&args.template, &args.output, &report)?;
    info!(sunday = %report.nextsunday, output = %args.output.display(), "Wrote check-in form");
    Ok(())
}
