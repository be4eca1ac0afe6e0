use super::persona::Persona;
use super::person::Person;
use crate::core::{CoachError, Result};

/// A gym or coaching business. Always has at least one administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Business {
    pub persona: Persona,
    administrators: Vec<Person>,
    members: Vec<Person>,
}

impl Business {
    pub fn new(persona: Persona, administrators: Vec<Person>, members: Vec<Person>) -> Result<Self> {
        if administrators.is_empty() {
            return Err(CoachError::invariant(format!(
                "business '{}' must have at least one administrator",
                persona.name
            )));
        }
        Ok(Self {
            persona,
            administrators,
            members,
        })
    }

    pub fn key(&self) -> Option<&str> {
        self.persona.key()
    }

    pub fn administrators(&self) -> &[Person] {
        &self.administrators
    }

    pub fn members(&self) -> &[Person] {
        &self.members
    }

    /// Whether the stored person identified by `person_key` administers this business.
    pub fn is_administrator(&self, person_key: &str) -> bool {
        self.administrators
            .iter()
            .any(|admin| admin.key() == Some(person_key))
    }

    pub fn is_member(&self, person_key: &str) -> bool {
        self.members.iter().any(|member| member.key() == Some(person_key))
    }

    pub fn add_member(&mut self, person: Person) {
        self.members.push(person);
    }

    /// Swaps in the stored versions of people after a cascaded save.
    pub(crate) fn replace_people(&mut self, administrators: Vec<Person>, members: Vec<Person>) {
        self.administrators = administrators;
        self.members = members;
    }
}
