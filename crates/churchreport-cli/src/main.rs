//! churchreport - printed reports from ChurchTools data.
//!
//! Usage:
//!   churchreport memberlist [OPTIONS]   Member list with families and children
//!   churchreport prayerlist [OPTIONS]   Prayer list, optionally by surname range
//!   churchreport checkin [OPTIONS]      Check-in form for next Sunday
//!   churchreport attendance [OPTIONS]   Attendance report for one service
//!   churchreport birthdays [OPTIONS]    Birthdays of the week up to next Sunday
//!
//! Credentials are read from `CHURCHTOOLS_DOMAIN` and
//! `CHURCHTOOLS_LOGIN_TOKEN`, optionally via a `.env` file.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{
    attendance::AttendanceArgs, birthdays::BirthdaysArgs, checkin::CheckinArgs, memberlist::MemberlistArgs,
    prayerlist::PrayerlistArgs, GlobalOptions, Session,
};

/// Log filter for `--verbose`; dependencies stay at warn
const VERBOSE_FILTER: &str = "warn,churchreport=debug,churchreport_core=debug";

#[derive(Parser)]
#[command(
    name = "churchreport",
    about = "Generate member lists, attendance reports, prayer lists and check-in forms from ChurchTools",
    version
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Reuse rosters cached by an earlier run and cache new ones
    #[arg(long, global = true)]
    debug_cache: bool,

    /// Directory for the debug cache
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Member list with families, children and optional portraits
    Memberlist(MemberlistArgs),

    /// Prayer list, optionally restricted to a range of surnames
    Prayerlist(PrayerlistArgs),

    /// Check-in form for next Sunday with recent birthdays highlighted
    Checkin(CheckinArgs),

    /// Attendance report for one service with absence streaks
    Attendance(AttendanceArgs),

    /// Print birthdays of the week ending next Sunday
    Birthdays(BirthdaysArgs),
}

/// Initialize the tracing subscriber for logging
fn init_tracing(verbose: bool) {
    // RUST_LOG wins unless --verbose is given
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout is reserved for report output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing(cli.verbose);
    info!("churchreport starting");

    let session = Session::open(&GlobalOptions {
        debug_cache: cli.debug_cache,
        cache_dir: cli.cache_dir,
    })?;

    match cli.command {
        Commands::Memberlist(args) => commands::memberlist::run(&session, args).await,
        Commands::Prayerlist(args) => commands::prayerlist::run(&session, args).await,
        Commands::Checkin(args) => commands::checkin::run(&session, args).await,
        Commands::Attendance(args) => commands::attendance::run(&session, args).await,
        Commands::Birthdays(args) => commands::birthdays::run(&session, args).await,
    }
}
