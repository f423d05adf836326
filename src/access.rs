use crate::{models::Role, token::Identity};

/// Roles allowed to mutate items.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Every authenticated role.
pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::User];

/// Decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// authorize
///
/// `Allow` iff the identity's role is one of `allowed`. Pure: no I/O, no side effects.
pub fn authorize(identity: &Identity, allowed: &[Role]) -> Decision {
    if allowed.contains(&identity.role) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Forbidden
///
/// Returned by [`require`] when the identity's role is not permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forbidden {
    pub role: Role,
}

/// require
///
/// [`authorize`] shaped for `?`.
pub fn require(identity: &Identity, allowed: &[Role]) -> Result<(), Forbidden> {
    match authorize(identity, allowed) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(Forbidden {
            role: identity.role,
        }),
    }
}
