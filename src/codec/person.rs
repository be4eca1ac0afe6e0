use super::{Codec, FieldType, MementoSchema, build_persona, encode_persona, persona_schema};
use crate::core::{CoachError, Result};
use crate::domain::{EmailAddress, LoginContext, Person, Role, Roles};
use crate::memento::{LoginContextMemento, PersonMemento};

#[derive(Debug, Clone)]
pub struct PersonCodec {
    schema: MementoSchema,
}

impl PersonCodec {
    pub fn new() -> Self {
        let login_schema = MementoSchema::object()
            .require("provider", FieldType::Text)
            .require("subject", FieldType::Text);

        let schema = persona_schema()
            .require("email", FieldType::Text)
            .require("loginContext", FieldType::Object(Box::new(login_schema)))
            .require(
                "roles",
                FieldType::ArrayOf(Box::new(FieldType::Enum(Role::names()))),
            );

        Self { schema }
    }
}

impl Default for PersonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for PersonCodec {
    type Entity = Person;
    type Memento = PersonMemento;

    fn family(&self) -> &'static str {
        "person"
    }

    fn schema(&self) -> &MementoSchema {
        &self.schema
    }

    fn encode(&self, person: &Person) -> PersonMemento {
        PersonMemento {
            persona: encode_persona(&person.persona),
            email: person.email.as_str().to_string(),
            login_context: LoginContextMemento {
                provider: person.login_context.provider().to_string(),
                subject: person.login_context.subject().to_string(),
            },
            roles: person.roles.iter().map(|role| role.as_str().to_string()).collect(),
        }
    }

    fn build(&self, memento: PersonMemento) -> Result<Person> {
        let roles = memento
            .roles
            .iter()
            .map(|name| {
                Role::from_name(name)
                    .ok_or_else(|| CoachError::invariant(format!("unknown role '{name}'")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Person::new(
            build_persona(memento.persona)?,
            EmailAddress::new(&memento.email)?,
            LoginContext::new(memento.login_context.provider, memento.login_context.subject)?,
            Roles::from_list(roles)?,
        ))
    }
}
