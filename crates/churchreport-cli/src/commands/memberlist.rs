//! Member list document.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use churchreport_core::enrich::{EnrichOptions, ImageOptions};
use churchreport_core::portrait;
use churchreport_core::render::render_file;
use churchreport_core::reports::PersonListReport;

use super::Session;

#[derive(Args)]
pub struct MemberlistArgs {
    /// Only members of this group
    #[arg(long)]
    pub filter_group: Option<i64>,

    /// Only group members with this role
    #[arg(long, requires = "filter_group")]
    pub role_id: Option<i64>,

    /// Template file (flat ODT)
    #[arg(long, default_value = "template.fodt")]
    pub template: PathBuf,

    /// Output file
    #[arg(long, default_value = "output.fodt")]
    pub output: PathBuf,

    /// Include round profile pictures
    #[arg(long)]
    pub images: bool,

    /// Picture for persons without a photo
    #[arg(long, requires = "images")]
    pub placeholder: Option<PathBuf>,
}

pub async fn run(session: &Session, args: MemberlistArgs) -> Result<()> {
    let mut options = EnrichOptions::new(session.today);
    if args.images {
        options = options.with_images(ImageOptions {
            placeholder: portrait::placeholder(args.placeholder.as_deref())?,
            blur_radius: portrait::DEFAULT_BLUR_RADIUS,
        });
    }

    let persons = session
        .roster_with(args.filter_group, args.role_id, &options)
        .await?;
    let count = persons.len();

    render_file(&args.template, &args.output, &PersonListReport::new(persons))?;
    info!(count, output = %args.output.display(), "Wrote member list");
    Ok(())
}
