use auth_identity::{Role, UnknownRole};
use std::fmt;

use crate::context::AuthContext;

/// A condition an authenticated caller must meet.
pub trait Requirement: Clone + Send + Sync + 'static {
    fn permits(&self, context: &AuthContext) -> bool;

    /// Human-readable form for logs.
    fn describe(&self) -> String;
}

/// Set of roles, any one of which satisfies the requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet {
    bits: u8,
}

const fn bit(role: Role) -> u8 {
    match role {
        Role::Patient => 0b001,
        Role::Doctor => 0b010,
        Role::Admin => 0b100,
    }
}

impl RoleSet {
    #[must_use]
    pub fn of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            bits: roles.into_iter().fold(0, |acc, role| acc | bit(role)),
        }
    }

    #[must_use]
    pub fn all() -> Self {
        Self::of(Role::ALL)
    }

    /// Parses role names case-insensitively.
    ///
    /// # Errors
    ///
    /// [`UnknownRole`] for the first name that is not a role.
    pub fn parse<I, S>(names: I) -> Result<Self, UnknownRole>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles = names
            .into_iter()
            .map(|name| name.as_ref().parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::of(roles))
    }

    #[must_use]
    pub const fn contains(self, role: Role) -> bool {
        self.bits & bit(role) != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Role::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

impl Requirement for RoleSet {
    fn permits(&self, context: &AuthContext) -> bool {
        self.contains(context.role)
    }

    fn describe(&self) -> String {
        format!("any role of {self}")
    }
}
