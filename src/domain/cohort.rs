use super::business::Business;
use super::persona::Persona;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CohortType {
    Class,
    Team,
    Personal,
    Program,
}

impl CohortType {
    pub const ALL: [CohortType; 4] = [
        CohortType::Class,
        CohortType::Team,
        CohortType::Personal,
        CohortType::Program,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CohortType::Class => "class",
            CohortType::Team => "team",
            CohortType::Personal => "personal",
            CohortType::Program => "program",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(CohortType::as_str).collect()
    }
}

/// A training group run by exactly one business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohort {
    pub persona: Persona,
    pub business: Business,
    pub creation_timestamp: DateTime<Utc>,
    pub cohort_type: CohortType,
}

impl Cohort {
    pub fn new(
        persona: Persona,
        business: Business,
        creation_timestamp: DateTime<Utc>,
        cohort_type: CohortType,
    ) -> Self {
        Self {
            persona,
            business,
            creation_timestamp,
            cohort_type,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.persona.key()
    }
}
