use super::persistence::PersistenceDetails;
use super::values::{ImageUrl, Name};

/// Shape shared by people, businesses and cohorts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub persistence_details: PersistenceDetails,
    pub name: Name,
    pub thumbnail_url: ImageUrl,
    pub bio: Option<String>,
}

impl Persona {
    pub fn new(
        persistence_details: PersistenceDetails,
        name: Name,
        thumbnail_url: ImageUrl,
        bio: Option<String>,
    ) -> Self {
        Self {
            persistence_details,
            name,
            thumbnail_url,
            // a blank bio carries no information
            bio: bio.filter(|text| !text.trim().is_empty()),
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.persistence_details.valid_key()
    }
}
