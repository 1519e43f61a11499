//! Person enrichment: birthdate formatting, portraits, family links and
//! children.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::api::ChurchApi;
use crate::family::apply_family_links;
use crate::models::{ApiPerson, Child, Person, Relationship, RelationshipKind};
use crate::portrait;
use crate::utils::{age_on, format_birthdate};

/// Portrait settings; present only when a report prints pictures.
#[derive(Debug, Clone)]
pub struct ImageOptions {
    /// Image used for persons without a photo
    pub placeholder: Vec<u8>,
    pub blur_radius: f32,
}

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Reference date for ages
    pub today: NaiveDate,
    pub images: Option<ImageOptions>,
}

impl EnrichOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self { today, images: None }
    }

    pub fn with_images(mut self, images: ImageOptions) -> Self {
        self.images = Some(images);
        self
    }
}

/// Turn a raw API person into a roster entry.
///
/// A malformed birthdate or a failed relationship lookup aborts. A child
/// whose own record cannot be fetched is still listed, just without age.
pub async fn enrich_person<A: ChurchApi + ?Sized>(
    api: &A,
    api_person: ApiPerson,
    options: &EnrichOptions,
) -> Result<Person> {
    let mut person = Person::from(api_person);

    let (display, date) = format_birthdate(person.birthday_raw.as_deref())
        .with_context(|| format!("Invalid birthdate for {}", person.full_name()))?;
    person.birthday = display;
    person.birthday_date = date;
    person.age = date.map(|d| age_on(d, options.today));

    if let Some(ref images) = options.images {
        person.image = Some(load_portrait(api, &person, images).await?);
    }

    let relationships = api
        .fetch_relationships(person.id)
        .await
        .with_context(|| format!("Failed to fetch relationships of {}", person.full_name()))?;

    apply_family_links(&mut person, &relationships);

    person.children = resolve_children(api, &relationships, options.today).await?;
    person.all_children = person
        .children
        .iter()
        .map(Child::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    debug!(
        person_id = person.id,
        family_id = %person.family_id,
        children = person.children.len(),
        "Enriched person"
    );
    Ok(person)
}

async fn load_portrait<A: ChurchApi + ?Sized>(
    api: &A,
    person: &Person,
    images: &ImageOptions,
) -> Result<Vec<u8>> {
    let source = match person.image_url {
        Some(ref url) => api.fetch_image(url).await?,
        None => images.placeholder.clone(),
    };
    portrait::make_round(&source, images.blur_radius)
        .with_context(|| format!("Failed to process portrait of {}", person.full_name()))
}

/// Children of a person, most recently born first.
async fn resolve_children<A: ChurchApi + ?Sized>(
    api: &A,
    relationships: &[Relationship],
    today: NaiveDate,
) -> Result<Vec<Child>> {
    let mut children = Vec::new();

    for relationship in relationships.iter().filter(|r| r.kind() == RelationshipKind::Child) {
        let relative = &relationship.relative;
        let mut child = Child::new(relative.domain_attributes.first_name.clone());

        match api.fetch_person(&relative.domain_identifier).await {
            Ok(record) => {
                let (_, birthdate) = format_birthdate(record.birthday.as_deref())
                    .with_context(|| format!("Invalid birthdate for child {}", child.name))?;
                if let Some(date) = birthdate {
                    child.set_birthdate(date, age_on(date, today));
                }
            }
            Err(e) => {
                warn!(child_id = %relative.domain_identifier, error = %e, "Could not fetch child record");
            }
        }

        children.push(child);
    }

    children.sort_by(Child::cmp_by_birthdate_desc);
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockChurchApi;
    use crate::models::person::RelativeAttributes;
    use crate::models::Relative;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn api_person(id: i64, first: &str, sex: i64, birthday: Option<&str>) -> ApiPerson {
        ApiPerson {
            id,
            first_name: first.into(),
            last_name: "Kraft".into(),
            sex_id: Some(sex),
            birthday: birthday.map(str::to_string),
            image_url: None,
        }
    }

    fn rel(type_id: i64, id: &str, first: &str) -> Relationship {
        Relationship {
            relationship_type_id: type_id,
            relative: Relative {
                domain_identifier: id.into(),
                api_url: None,
                domain_attributes: RelativeAttributes {
                    first_name: first.into(),
                    last_name: "Kraft".into(),
                },
            },
        }
    }

    #[tokio::test]
    async fn test_enrich_person_with_spouse_and_children() {
        let mut api = MockChurchApi::new();
        api.expect_fetch_relationships()
            .withf(|id| *id == 1)
            .returning(|_| {
                Ok(vec![
                    rel(1, "11", "Lina"),
                    rel(2, "2", "Sara"),
                    rel(1, "12", "Emil"),
                    rel(1, "13", "Noah"),
                ])
            });
        api.expect_fetch_person().returning(|id| match id {
            "11" => Ok(api_person(11, "Lina", 2, Some("2012-06-01"))),
            "12" => Ok(api_person(12, "Emil", 1, Some("2016-02-10"))),
            _ => Err(anyhow::anyhow!("not found")),
        });

        let options = EnrichOptions::new(date(2024, 5, 21));
        let person = enrich_person(&api, api_person(1, "Jonas", 1, Some("1980-05-22")), &options)
            .await
            .unwrap();

        assert_eq!(person.birthday, "22.05.1980");
        assert_eq!(person.age, Some(43));
        assert_eq!(person.family_id, "Kraft-1-2");
        assert!(!person.family_end);
        assert_eq!(person.spouse.as_deref(), Some("2"));
        assert_eq!(person.all_children, "Emil (8), Lina (11), Noah");
        assert_eq!(person.children[2].birthdate, None);
        assert!(person.image.is_none());
    }

    #[tokio::test]
    async fn test_enrich_person_without_relationships() {
        let mut api = MockChurchApi::new();
        api.expect_fetch_relationships().returning(|_| Ok(vec![]));
        api.expect_fetch_person().never();

        let options = EnrichOptions::new(date(2024, 1, 1));
        let person = enrich_person(&api, api_person(3, "Ole", 1, None), &options)
            .await
            .unwrap();

        assert_eq!(person.birthday, "");
        assert_eq!(person.birthday_date, None);
        assert_eq!(person.age, None);
        assert!(person.family_end);
        assert_eq!(person.family_id, "Kraft");
        assert_eq!(person.all_children, "");
    }

    #[tokio::test]
    async fn test_malformed_birthdate_is_fatal() {
        let mut api = MockChurchApi::new();
        api.expect_fetch_relationships().never();

        let options = EnrichOptions::new(date(2024, 1, 1));
        let result = enrich_person(&api, api_person(3, "Ole", 1, Some("1.1.1990")), &options).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_relationship_failure_is_fatal() {
        let mut api = MockChurchApi::new();
        api.expect_fetch_relationships()
            .returning(|_| Err(anyhow::anyhow!("HTTP 500")));

        let options = EnrichOptions::new(date(2024, 1, 1));
        let result = enrich_person(&api, api_person(3, "Ole", 1, None), &options).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_placeholder_used_without_photo_url() {
        let mut api = MockChurchApi::new();
        api.expect_fetch_relationships().returning(|_| Ok(vec![]));
        api.expect_fetch_image().never();

        let options = EnrichOptions::new(date(2024, 1, 1)).with_images(ImageOptions {
            placeholder: portrait::placeholder(None).unwrap(),
            blur_radius: portrait::DEFAULT_BLUR_RADIUS,
        });
        let person = enrich_person(&api, api_person(3, "Ole", 1, None), &options)
            .await
            .unwrap();

        let png = person.image.expect("portrait present");
        assert_eq!(image::guess_format(&png).unwrap(), image::ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_photo_url_is_downloaded() {
        let mut api = MockChurchApi::new();
        api.expect_fetch_relationships().returning(|_| Ok(vec![]));
        api.expect_fetch_image()
            .withf(|url| url == "https://x/p.png")
            .times(1)
            .returning(|_| portrait::placeholder(None));

        let mut raw = api_person(3, "Ole", 1, None);
        raw.image_url = Some("https://x/p.png".into());
        let options = EnrichOptions::new(date(2024, 1, 1)).with_images(ImageOptions {
            placeholder: Vec::new(),
            blur_radius: 0.0,
        });

        let person = enrich_person(&api, raw, &options).await.unwrap();
        assert!(person.image.is_some());
    }
}
