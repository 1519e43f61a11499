use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::Person;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Development cache for enriched rosters, one JSON file per query.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", path.display()))?;
        debug!(path = %path.display(), "Saved cache");
        Ok(())
    }

    /// File stem for a roster query: `persons_12`, `persons_12_role4`,
    /// `persons_all`, with an `_images` suffix when portraits are included
    fn roster_name(group: Option<i64>, role: Option<i64>, images: bool) -> String {
        let mut name = match group {
            Some(g) => format!("persons_{}", g),
            None => "persons_all".to_string(),
        };
        if let Some(r) = role {
            name.push_str(&format!("_role{}", r));
        }
        if images {
            name.push_str("_images");
        }
        name
    }

    // ===== Rosters =====

    pub fn load_roster(
        &self,
        group: Option<i64>,
        role: Option<i64>,
        images: bool,
    ) -> Result<Option<CachedData<Vec<Person>>>> {
        self.load(&Self::roster_name(group, role, images))
    }

    pub fn save_roster(&self, group: Option<i64>, role: Option<i64>, images: bool, persons: &[Person]) -> Result<()> {
        self.save(&Self::roster_name(group, role, images), &persons)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApiPerson;
    use chrono::Duration;

    fn person(id: i64) -> Person {
        Person::from(ApiPerson {
            id,
            first_name: "Hanna".into(),
            last_name: "Specht".into(),
            sex_id: Some(2),
            birthday: Some("1999-09-09".into()),
            image_url: None,
        })
    }

    #[test]
    fn test_cached_data_age_display() {
        let mut cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");

        cached.cached_at = Utc::now() - Duration::minutes(5);
        assert_eq!(cached.age_display(), "5m ago");

        cached.cached_at = Utc::now() - Duration::minutes(130);
        assert_eq!(cached.age_display(), "2h ago");

        cached.cached_at = Utc::now() - Duration::days(3);
        assert_eq!(cached.age_display(), "3d ago");
    }

    #[test]
    fn test_roster_name() {
        assert_eq!(CacheManager::roster_name(Some(12), None, false), "persons_12");
        assert_eq!(CacheManager::roster_name(Some(12), Some(4), false), "persons_12_role4");
        assert_eq!(CacheManager::roster_name(None, None, false), "persons_all");
        assert_eq!(CacheManager::roster_name(Some(12), Some(4), true), "persons_12_role4_images");
    }

    #[test]
    fn test_roster_roundtrip_per_query() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().join("nested")).unwrap();

        assert!(cache.load_roster(Some(1), None, true).unwrap().is_none());

        let mut with_image = person(7);
        with_image.image = Some(vec![1, 2, 3]);
        cache.save_roster(Some(1), None, true, &[with_image, person(8)]).unwrap();

        let loaded = cache.load_roster(Some(1), None, true).unwrap().unwrap();
        assert_eq!(loaded.data.len(), 2);
        assert_eq!(loaded.data[0].image, Some(vec![1, 2, 3]));
        assert_eq!(loaded.data[1].id, 8);

        // Different group, role or portrait setting is a different snapshot
        assert!(cache.load_roster(Some(2), None, true).unwrap().is_none());
        assert!(cache.load_roster(Some(1), Some(3), true).unwrap().is_none());
        assert!(cache.load_roster(Some(1), None, false).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("persons_all.json"), "{not json").unwrap();
        assert!(cache.load_roster(None, None, false).is_err());
    }
}
