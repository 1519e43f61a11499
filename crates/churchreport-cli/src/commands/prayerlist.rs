//! Prayer list document.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use churchreport_core::render::render_file;
use churchreport_core::reports::{filter_surname_range, PersonListReport};

use super::Session;

#[derive(Args)]
pub struct PrayerlistArgs {
    /// Only members of this group
    #[arg(long)]
    pub filter_group: Option<i64>,

    /// Only group members with this role
    #[arg(long, requires = "filter_group")]
    pub role_id: Option<i64>,

    /// Only surnames at or after this (e.g. "A")
    #[arg(long)]
    pub surname_from: Option<String>,

    /// Only surnames at or before this (e.g. "K")
    #[arg(long)]
    pub surname_to: Option<String>,

    /// Template file (flat ODT)
    #[arg(long, default_value = "template_prayerlist.fodt")]
    pub template: PathBuf,

    /// Output file
    #[arg(long, default_value = "gebetsblatt.fodt")]
    pub output: PathBuf,
}

pub async fn run(session: &Session, args: PrayerlistArgs) -> Result<()> {
    let persons = session.roster(args.filter_group, args.role_id).await?;
    let persons = filter_surname_range(persons, args.surname_from.as_deref(), args.surname_to.as_deref());
    let count = persons.len();

    render_file(&args.template, &args.output, &PersonListReport::new(persons))?;
    info!(count, output = %args.output.display(), "Wrote prayer list");
    Ok(())
}
