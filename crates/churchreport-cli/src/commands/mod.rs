//! Report subcommands and the state they share.

pub mod attendance;
pub mod birthdays;
pub mod checkin;
pub mod memberlist;
pub mod prayerlist;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use churchreport_core::cache::CacheManager;
use churchreport_core::enrich::EnrichOptions;
use churchreport_core::models::Person;
use churchreport_core::roster::{self, RosterQuery};
use churchreport_core::{ApiClient, ApiConfig, Config};

/// Flags that apply to every subcommand
pub struct GlobalOptions {
    pub debug_cache: bool,
    pub cache_dir: Option<PathBuf>,
}

/// API client, optional debug cache and the reference date of one run
pub struct Session {
    pub api: ApiClient,
    pub cache: Option<CacheManager>,
    pub today: NaiveDate,
}

impl Session {
    pub fn open(options: &GlobalOptions) -> Result<Self> {
        let api_config = ApiConfig::from_env()?;
        debug!(?api_config, "API configuration");
        let api = ApiClient::new(api_config)?;

        let mut config = Config::from_env();
        config.debug_cache |= options.debug_cache;
        if options.cache_dir.is_some() {
            config.cache_dir = options.cache_dir.clone();
        }

        let cache = if config.debug_cache {
            let dir = config.cache_dir()?;
            info!(dir = %dir.display(), "Debug cache enabled");
            Some(CacheManager::new(dir)?)
        } else {
            None
        };

        Ok(Self {
            api,
            cache,
            today: Local::now().date_naive(),
        })
    }

    /// Enriched, family-sorted roster without portraits
    pub async fn roster(&self, group: Option<i64>, role: Option<i64>) -> Result<Vec<Person>> {
        self.roster_with(group, role, &EnrichOptions::new(self.today)).await
    }

    pub async fn roster_with(&self, group: Option<i64>, role: Option<i64>, options: &EnrichOptions) -> Result<Vec<Person>> {
        let query = RosterQuery { group, role };
        roster::get_persons(&self.api, query, options, self.cache.as_ref()).await
    }
}
