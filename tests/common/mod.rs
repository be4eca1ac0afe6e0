#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use fitcoach::prelude::*;

pub fn person(name: &str, email: &str, sequence: u64) -> Person {
    Person::new(
        Persona::new(
            PersistenceDetails::new(sequence),
            Name::new(name).unwrap(),
            ImageUrl::new(format!("/img/{}.png", name.to_lowercase())).unwrap(),
            None,
        ),
        EmailAddress::new(email).unwrap(),
        LoginContext::new("github", email).unwrap(),
        Roles::single(Role::Member),
    )
}

pub fn coach(name: &str, email: &str) -> Person {
    let mut person = person(name, email, 0);
    person.roles = Roles::from_list([Role::Member, Role::Coach]).unwrap();
    person
}

pub fn business(name: &str, administrators: Vec<Person>, members: Vec<Person>, sequence: u64) -> Business {
    Business::new(
        Persona::new(
            PersistenceDetails::new(sequence),
            Name::new(name).unwrap(),
            ImageUrl::new("https://cdn.example.com/gym.png").unwrap(),
            Some("Strength and conditioning".to_string()),
        ),
        administrators,
        members,
    )
    .unwrap()
}

pub fn cohort(name: &str, business: Business, cohort_type: CohortType) -> Cohort {
    Cohort::new(
        Persona::new(
            PersistenceDetails::new(0),
            Name::new(name).unwrap(),
            ImageUrl::new("/img/cohort.png").unwrap(),
            None,
        ),
        business,
        Utc.with_ymd_and_hms(2024, 1, 8, 6, 0, 0).unwrap(),
        cohort_type,
    )
}

pub fn snatch(catalog: &MeasurementCatalog, subject_key: &str, cohort_key: &str, kg: f64, day: u32) -> Result<Measurement> {
    Measurement::new(
        catalog,
        PersistenceDetails::new(0),
        Quantity::new(kg, Unit::Kilogram)?,
        1,
        Utc.with_ymd_and_hms(2024, 3, day, 7, 30, 0).unwrap(),
        MeasurementType::Snatch,
        subject_key,
        cohort_key,
    )
}

pub async fn stores() -> CoachStores {
    CoachStores::in_memory().await.unwrap()
}

pub async fn count(stores: &CoachStores, collection: &str) -> usize {
    stores.document_store().count(collection).await.unwrap()
}
