use super::persona::Persona;
use super::roles::{Role, Roles};
use super::values::{EmailAddress, LoginContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub persona: Persona,
    pub email: EmailAddress,
    pub login_context: LoginContext,
    pub roles: Roles,
}

impl Person {
    pub fn new(
        persona: Persona,
        email: EmailAddress,
        login_context: LoginContext,
        roles: Roles,
    ) -> Self {
        Self {
            persona,
            email,
            login_context,
            roles,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.persona.key()
    }

    pub fn is_coach(&self) -> bool {
        self.roles.contains(Role::Coach)
    }
}
