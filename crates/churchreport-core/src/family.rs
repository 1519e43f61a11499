//! Family grouping: spouse linkage, family keys and roster order.
//!
//! Married couples share a `family_id` of the form
//! `{lastName}-{husbandId}-{wifeId}` so both partners sort next to each other,
//! husband first. The partner that renders last in a family block carries
//! `family_end`, which templates use to draw a separator.

use tracing::debug;

use crate::models::{Person, Relationship, RelationshipKind};

/// Build the shared key of a married couple.
pub fn family_id(last_name: &str, husband_id: &str, wife_id: &str) -> String {
    format!("{}-{}-{}", last_name, husband_id, wife_id)
}

/// Reset the family fields of `person` and derive them from its
/// relationships. Children are resolved separately since they need
/// further lookups.
///
/// - no relationships at all: the person closes its own family block
/// - spouse found: shared `family_id`; the wife closes the block
/// - relationships but no spouse: the person closes its own family block
pub fn apply_family_links(person: &mut Person, relationships: &[Relationship]) {
    person.family_id = person.last_name.clone();
    person.family_end = false;
    person.spouse = None;

    for relationship in relationships {
        if relationship.kind() == RelationshipKind::Spouse {
            link_spouse(person, relationship);
        }
    }

    if person.spouse.is_none() {
        person.family_end = true;
    }
}

fn link_spouse(person: &mut Person, relationship: &Relationship) {
    let spouse_id = relationship.relative.domain_identifier.as_str();
    let own_id = person.id.to_string();
    let spouse_last_name = relationship.relative.domain_attributes.last_name.as_str();

    // The husband's last name heads the key so partners with different
    // names still end up in the same family.
    if person.is_male() {
        person.family_id = family_id(&person.last_name, &own_id, spouse_id);
    } else {
        let husband_last_name = if spouse_last_name.is_empty() {
            person.last_name.as_str()
        } else {
            spouse_last_name
        };
        person.family_id = family_id(husband_last_name, spouse_id, &own_id);
        person.family_end = true;
    }

    debug!(person_id = person.id, spouse_id, family_id = %person.family_id, "Linked spouse");
    person.spouse = Some(spouse_id.to_string());
}

/// Stable sort by `(family_id, sex_id)`. Persons with equal keys keep their
/// relative order.
pub fn sort_by_family(persons: &mut [Person]) {
    persons.sort_by(|a, b| a.family_key().cmp(&b.family_key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiPerson, Relative};
    use crate::models::person::RelativeAttributes;

    fn person(id: i64, first: &str, last: &str, sex: i64) -> Person {
        Person::from(ApiPerson {
            id,
            first_name: first.into(),
            last_name: last.into(),
            sex_id: Some(sex),
            birthday: None,
            image_url: None,
        })
    }

    fn relationship(type_id: i64, relative_id: &str, last: &str) -> Relationship {
        Relationship {
            relationship_type_id: type_id,
            relative: Relative {
                domain_identifier: relative_id.into(),
                api_url: None,
                domain_attributes: RelativeAttributes {
                    first_name: "X".into(),
                    last_name: last.into(),
                },
            },
        }
    }

    #[test]
    fn test_spouses_share_family_id() {
        let mut husband = person(10, "Tim", "Vogel", 1);
        let mut wife = person(25, "Ida", "Vogel", 2);

        apply_family_links(&mut husband, &[relationship(2, "25", "Vogel")]);
        apply_family_links(&mut wife, &[relationship(2, "10", "Vogel")]);

        assert_eq!(husband.family_id, "Vogel-10-25");
        assert_eq!(husband.family_id, wife.family_id);
        assert_eq!(husband.spouse.as_deref(), Some("25"));
        assert_eq!(wife.spouse.as_deref(), Some("10"));
    }

    #[test]
    fn test_family_id_orders_by_sex_not_by_number() {
        let mut husband = person(900, "Tim", "Vogel", 1);
        let mut wife = person(3, "Ida", "Vogel", 2);

        apply_family_links(&mut husband, &[relationship(2, "3", "Vogel")]);
        apply_family_links(&mut wife, &[relationship(2, "900", "Vogel")]);

        assert_eq!(husband.family_id, "Vogel-900-3");
        assert_eq!(wife.family_id, "Vogel-900-3");
    }

    #[test]
    fn test_spouses_with_different_last_names_share_family_id() {
        let mut husband = person(1, "Tim", "Vogel", 1);
        let mut wife = person(2, "Ida", "Fink", 2);

        apply_family_links(&mut husband, &[relationship(2, "2", "Fink")]);
        apply_family_links(&mut wife, &[relationship(2, "1", "Vogel")]);

        assert_eq!(husband.family_id, wife.family_id);
    }

    #[test]
    fn test_family_end_only_on_wife() {
        let mut husband = person(10, "Tim", "Vogel", 1);
        let mut wife = person(25, "Ida", "Vogel", 2);

        apply_family_links(&mut husband, &[relationship(2, "25", "Vogel"), relationship(1, "30", "Vogel")]);
        apply_family_links(&mut wife, &[relationship(1, "30", "Vogel"), relationship(2, "10", "Vogel")]);

        assert!(!husband.family_end);
        assert!(wife.family_end);
    }

    #[test]
    fn test_single_persons_end_their_family() {
        let mut alone = person(1, "Max", "Roth", 1);
        apply_family_links(&mut alone, &[]);
        assert!(alone.family_end);
        assert_eq!(alone.family_id, "Roth");
        assert_eq!(alone.spouse, None);

        let mut parent = person(2, "Eva", "Roth", 2);
        apply_family_links(&mut parent, &[relationship(1, "3", "Roth")]);
        assert!(parent.family_end);
        assert_eq!(parent.family_id, "Roth");
    }

    #[test]
    fn test_unknown_sex_takes_wife_slot() {
        let mut p = person(4, "Kim", "Lenz", 0);
        p.sex_id = None;
        apply_family_links(&mut p, &[relationship(2, "8", "Lenz")]);
        assert_eq!(p.family_id, "Lenz-8-4");
        assert!(p.family_end);
    }

    #[test]
    fn test_sort_clusters_families_husband_first() {
        let mut husband = person(10, "Tim", "Vogel", 1);
        let mut wife = person(25, "Ida", "Vogel", 2);
        let mut single = person(5, "Ute", "Vogel", 2);
        let mut other = person(7, "Al", "Adler", 1);
        apply_family_links(&mut husband, &[relationship(2, "25", "Vogel")]);
        apply_family_links(&mut wife, &[relationship(2, "10", "Vogel")]);
        apply_family_links(&mut single, &[]);
        apply_family_links(&mut other, &[]);

        let mut roster = vec![wife, single, husband, other];
        sort_by_family(&mut roster);

        let ids: Vec<i64> = roster.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![7, 5, 10, 25]);
    }

    #[test]
    fn test_sort_is_stable_and_idempotent() {
        let mut a = person(1, "A", "Berg", 1);
        let mut b = person(2, "B", "Berg", 1);
        let mut c = person(3, "C", "Abt", 2);
        for p in [&mut a, &mut b, &mut c] {
            apply_family_links(p, &[]);
        }

        let mut roster = vec![b, a, c];
        sort_by_family(&mut roster);
        let first: Vec<i64> = roster.iter().map(|p| p.id).collect();
        assert_eq!(first, vec![3, 2, 1]);

        sort_by_family(&mut roster);
        let second: Vec<i64> = roster.iter().map(|p| p.id).collect();
        assert_eq!(first, second);
    }
}
