//! Console list of this week's birthdays.

use anyhow::Result;
use clap::Args;

use churchreport_core::birthdays::{next_sunday, upcoming_birthdays};

use super::Session;

#[derive(Args)]
pub struct BirthdaysArgs {
    /// Group of church members
    #[arg(long)]
    pub group_members: i64,

    /// Group of regular visitors
    #[arg(long)]
    pub group_regular_visitors: i64,

    /// Only regular visitors with this role
    #[arg(long)]
    pub role_id_regular_visitors: Option<i64>,
}

pub async fn run(session: &Session, args: BirthdaysArgs) -> Result<()> {
    let members = session.roster(Some(args.group_members), None).await?;
    let regular_visitors = session
        .roster(Some(args.group_regular_visitors), args.role_id_regular_visitors)
        .await?;

    let sunday = next_sunday(session.today);
    for line in upcoming_birthdays(members.iter().chain(regular_visitors.iter()), sunday) {
        println!("{}", line);
    }
    Ok(())
}
