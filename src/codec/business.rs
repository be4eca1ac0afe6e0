use super::{Codec, FieldType, MementoSchema, PersonCodec, build_persona, encode_persona, persona_schema};
use crate::core::{FormatError, Result};
use crate::domain::{Business, Person};
use crate::memento::{BusinessMemento, PersonMemento};

#[derive(Debug, Clone)]
pub struct BusinessCodec {
    people: PersonCodec,
    schema: MementoSchema,
}

impl BusinessCodec {
    pub fn new() -> Self {
        let people = PersonCodec::new();
        let person_schema = people.schema().clone();
        let ids = || FieldType::ArrayOf(Box::new(FieldType::Text));
        let expanded = || FieldType::ArrayOf(Box::new(FieldType::Object(Box::new(person_schema.clone()))));

        let schema = persona_schema()
            .optional("administratorIds", ids())
            .optional("memberIds", ids())
            .optional("administrators", expanded())
            .optional("members", expanded());

        Self { people, schema }
    }

    pub fn people(&self) -> &PersonCodec {
        &self.people
    }

    fn build_people(&self, role: &str, ids: &[String], expanded: Vec<PersonMemento>) -> Result<Vec<Person>> {
        if expanded.is_empty() && !ids.is_empty() {
            return Err(FormatError::single(
                self.family(),
                format!("{role}: {} referenced people were not resolved", ids.len()),
            )
            .into());
        }
        expanded
            .into_iter()
            .map(|memento| self.people.build(memento))
            .collect()
    }
}

impl Default for BusinessCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for BusinessCodec {
    type Entity = Business;
    type Memento = BusinessMemento;

    fn family(&self) -> &'static str {
        "business"
    }

    fn schema(&self) -> &MementoSchema {
        &self.schema
    }

    fn encode(&self, business: &Business) -> BusinessMemento {
        let keys = |people: &[Person]| -> Vec<String> {
            people
                .iter()
                .filter_map(|person| person.key().map(str::to_string))
                .collect()
        };

        BusinessMemento {
            persona: encode_persona(&business.persona),
            administrator_ids: keys(business.administrators()),
            member_ids: keys(business.members()),
            administrators: self.people.encode_many(business.administrators()),
            members: self.people.encode_many(business.members()),
        }
    }

    fn build(&self, memento: BusinessMemento) -> Result<Business> {
        let administrators =
            self.build_people("administrators", &memento.administrator_ids, memento.administrators)?;
        let members = self.build_people("members", &memento.member_ids, memento.members)?;
        Business::new(build_persona(memento.persona)?, administrators, members)
    }
}
