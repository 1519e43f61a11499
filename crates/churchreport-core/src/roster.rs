//! Roster pipeline: fetch persons, filter by group and role, enrich, and
//! order by family.

use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::ChurchApi;
use crate::cache::CacheManager;
use crate::enrich::{enrich_person, EnrichOptions};
use crate::family::sort_by_family;
use crate::models::{ApiPerson, GroupMember, Person};

/// Which persons a report is about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterQuery {
    pub group: Option<i64>,
    /// Only meaningful together with `group`
    pub role: Option<i64>,
}

impl RosterQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn group(group: i64) -> Self {
        Self {
            group: Some(group),
            role: None,
        }
    }
}

/// Keep persons that are members of the group; with a role filter the
/// membership must also carry exactly that role. Input order is preserved.
pub fn filter_by_membership(
    persons: Vec<ApiPerson>,
    members: &[GroupMember],
    role: Option<i64>,
) -> Vec<ApiPerson> {
    let wanted: HashSet<i64> = members
        .iter()
        .filter(|m| m.matches(m.person_id, role))
        .map(|m| m.person_id)
        .collect();

    persons.into_iter().filter(|p| wanted.contains(&p.id)).collect()
}

/// All persons, or the members of `query.group` when given.
pub async fn fetch_roster<A: ChurchApi + ?Sized>(api: &A, query: RosterQuery) -> Result<Vec<ApiPerson>> {
    let persons = api.fetch_persons().await.context("Failed to fetch persons")?;

    let Some(group) = query.group else {
        return Ok(persons);
    };

    let members = api
        .fetch_group_members(group)
        .await
        .with_context(|| format!("Failed to fetch members of group {}", group))?;

    let total = persons.len();
    let filtered = filter_by_membership(persons, &members, query.role);
    debug!(group, role = ?query.role, total, kept = filtered.len(), "Filtered roster");
    Ok(filtered)
}

/// Fetch, enrich and family-sort a roster.
///
/// With a cache, a stored snapshot for the same query is returned instead of
/// calling the API, and fresh results are stored afterwards.
pub async fn get_persons<A: ChurchApi + ?Sized>(
    api: &A,
    query: RosterQuery,
    options: &EnrichOptions,
    cache: Option<&CacheManager>,
) -> Result<Vec<Person>> {
    // Rosters with and without portraits are cached separately
    let images = options.images.is_some();

    if let Some(cache) = cache {
        if let Some(cached) = cache.load_roster(query.group, query.role, images)? {
            info!(
                group = ?query.group,
                role = ?query.role,
                age = %cached.age_display(),
                "Using cached roster"
            );
            return Ok(cached.data);
        }
    }

    let raw = fetch_roster(api, query).await?;

    let mut persons = Vec::with_capacity(raw.len());
    for api_person in raw {
        persons.push(enrich_person(api, api_person, options).await?);
    }

    sort_by_family(&mut persons);
    info!(group = ?query.group, count = persons.len(), "Roster ready");

    if let Some(cache) = cache {
        cache.save_roster(query.group, query.role, images, &persons)?;
    }

    Ok(persons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockChurchApi;
    use crate::enrich::ImageOptions;
    use crate::models::person::RelativeAttributes;
    use crate::models::{Relationship, Relative};
    use crate::portrait;
    use chrono::NaiveDate;

    fn api_person(id: i64, first: &str, last: &str, sex: i64) -> ApiPerson {
        ApiPerson {
            id,
            first_name: first.into(),
            last_name: last.into(),
            sex_id: Some(sex),
            birthday: None,
            image_url: None,
        }
    }

    fn member(person_id: i64, role: i64) -> GroupMember {
        GroupMember {
            person_id,
            group_type_role_id: Some(role),
            status: None,
        }
    }

    fn spouse(id: &str, last: &str) -> Relationship {
        Relationship {
            relationship_type_id: 2,
            relative: Relative {
                domain_identifier: id.into(),
                api_url: None,
                domain_attributes: RelativeAttributes {
                    first_name: String::new(),
                    last_name: last.into(),
                },
            },
        }
    }

    fn options() -> EnrichOptions {
        EnrichOptions::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[test]
    fn test_filter_by_membership() {
        let persons = vec![
            api_person(1, "A", "X", 1),
            api_person(2, "B", "X", 1),
            api_person(3, "C", "X", 1),
        ];
        let members = vec![member(3, 10), member(1, 11)];

        let ids: Vec<i64> = filter_by_membership(persons.clone(), &members, None)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);

        let ids: Vec<i64> = filter_by_membership(persons, &members, Some(11))
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_filter_role_must_match_the_same_membership() {
        // Person 1 is in the group, but the role only belongs to person 2
        let persons = vec![api_person(1, "A", "X", 1), api_person(2, "B", "X", 1)];
        let members = vec![member(1, 10), member(2, 11)];
        let kept = filter_by_membership(persons, &members, Some(11));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 2);
    }

    #[tokio::test]
    async fn test_fetch_roster_without_group_returns_everyone() {
        let mut api = MockChurchApi::new();
        api.expect_fetch_persons()
            .returning(|| Ok(vec![api_person(1, "A", "X", 1), api_person(2, "B", "Y", 2)]));
        api.expect_fetch_group_members().never();

        let roster = fetch_roster(&api, RosterQuery::all()).await.unwrap();
        assert_eq!(roster.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_roster_propagates_group_failure() {
        let mut api = MockChurchApi::new();
        api.expect_fetch_persons().returning(|| Ok(vec![api_person(1, "A", "X", 1)]));
        api.expect_fetch_group_members()
            .returning(|_| Err(anyhow::anyhow!("403")));

        assert!(fetch_roster(&api, RosterQuery::group(5)).await.is_err());
    }

    #[tokio::test]
    async fn test_get_persons_filters_enriches_and_sorts() {
        let mut api = MockChurchApi::new();
        api.expect_fetch_persons().returning(|| {
            Ok(vec![
                api_person(20, "Maria", "Huber", 2),
                api_person(99, "Nicht", "Mitglied", 1),
                api_person(4, "Anton", "Zeller", 1),
                api_person(10, "Josef", "Huber", 1),
            ])
        });
        api.expect_fetch_group_members()
            .withf(|g| *g == 7)
            .returning(|_| Ok(vec![member(20, 1), member(4, 1), member(10, 1)]));
        api.expect_fetch_relationships().returning(|id| match id {
            20 => Ok(vec![spouse("10", "Huber")]),
            10 => Ok(vec![spouse("20", "Huber")]),
            _ => Ok(vec![]),
        });

        let persons = get_persons(&api, RosterQuery::group(7), &options(), None)
            .await
            .unwrap();

        let ids: Vec<i64> = persons.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![10, 20, 4]);
        let ends: Vec<bool> = persons.iter().map(|p| p.family_end).collect();
        assert_eq!(ends, vec![false, true, true]);
    }

    #[tokio::test]
    async fn test_get_persons_uses_and_fills_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();

        let mut api = MockChurchApi::new();
        api.expect_fetch_persons()
            .times(1)
            .returning(|| Ok(vec![api_person(1, "A", "X", 1)]));
        api.expect_fetch_relationships().times(1).returning(|_| Ok(vec![]));

        let first = get_persons(&api, RosterQuery::all(), &options(), Some(&cache))
            .await
            .unwrap();
        // Served from the snapshot; the mock would panic on a second fetch
        let second = get_persons(&api, RosterQuery::all(), &options(), Some(&cache))
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second[0].id, first[0].id);
        assert!(dir.path().join("persons_all.json").exists());
    }

    #[tokio::test]
    async fn test_cached_roster_without_portraits_is_not_reused_for_images() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();

        let mut api = MockChurchApi::new();
        api.expect_fetch_persons()
            .times(2)
            .returning(|| Ok(vec![api_person(1, "A", "X", 1)]));
        api.expect_fetch_group_members()
            .times(2)
            .returning(|_| Ok(vec![member(1, 1)]));
        api.expect_fetch_relationships().times(2).returning(|_| Ok(vec![]));
        api.expect_fetch_image().never();

        let plain = get_persons(&api, RosterQuery::group(3), &options(), Some(&cache))
            .await
            .unwrap();
        assert!(plain[0].image.is_none());

        let with_images = options().with_images(ImageOptions {
            placeholder: portrait::placeholder(None).unwrap(),
            blur_radius: portrait::DEFAULT_BLUR_RADIUS,
        });
        let pictured = get_persons(&api, RosterQuery::group(3), &with_images, Some(&cache))
            .await
            .unwrap();
        assert!(pictured[0].image.is_some());

        // Both snapshots now exist side by side
        assert!(dir.path().join("persons_3.json").exists());
        assert!(dir.path().join("persons_3_images.json").exists());
        let cached = get_persons(&api, RosterQuery::group(3), &with_images, Some(&cache))
            .await
            .unwrap();
        assert!(cached[0].image.is_some());
    }
}
