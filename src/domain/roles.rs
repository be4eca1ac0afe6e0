use crate::core::{CoachError, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Prospect,
    Member,
    Coach,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Prospect, Role::Member, Role::Coach];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Prospect => "prospect",
            Role::Member => "member",
            Role::Coach => "coach",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == name)
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Role::as_str).collect()
    }
}

/// Non-empty set of roles held by a person.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Roles(BTreeSet<Role>);

impl Roles {
    /// Builds the set from an explicit list; a repeated role is a caller bug, not something
    /// to silently collapse.
    pub fn from_list(roles: impl IntoIterator<Item = Role>) -> Result<Self> {
        let mut set = BTreeSet::new();
        for role in roles {
            if !set.insert(role) {
                return Err(CoachError::invariant(format!(
                    "role '{}' listed more than once",
                    role.as_str()
                )));
            }
        }
        if set.is_empty() {
            return Err(CoachError::invariant("a person must hold at least one role"));
        }
        Ok(Self(set))
    }

    pub fn single(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicates_and_empty_sets() {
        assert!(Roles::from_list([Role::Member, Role::Coach]).is_ok());
        assert!(matches!(
            Roles::from_list([Role::Member, Role::Member]),
            Err(CoachError::DomainInvariant(_))
        ));
        assert!(Roles::from_list([]).is_err());
    }

    #[test]
    fn iterates_in_stable_order() {
        let roles = Roles::from_list([Role::Coach, Role::Prospect]).unwrap();
        assert_eq!(roles.iter().collect::<Vec<_>>(), vec![Role::Prospect, Role::Coach]);
    }
}
