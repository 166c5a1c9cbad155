//! Mutation policy for user records.
//!
//! Pure decisions over freshly loaded actor and target state. Callers must
//! evaluate these before issuing any write.

use crate::{Actor, User};

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The actor may proceed.
    Allow,
    /// The actor must be rejected.
    Deny,
}

impl Decision {
    /// Returns `true` for [`Decision::Allow`].
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

/// Decides whether `actor` may edit profile fields of `target`.
///
/// Root accounts may edit any non-test user. Everyone else may only edit
/// themselves, and test accounts may never edit anything.
#[must_use]
pub fn can_update(actor: &Actor, target: &User) -> Decision {
    let root_on_regular_target = actor.is_root && !target.is_test;
    let self_edit = actor.user_id == target.id && !actor.is_test;

    Decision::from_bool(root_on_regular_target || self_edit)
}

/// Decides whether `actor` may change the admin flag of `target`.
#[must_use]
pub fn can_change_role(actor: &Actor, target: &User) -> Decision {
    Decision::from_bool(actor.is_root && !target.is_root && !target.is_test)
}

/// Decides whether `actor` may delete `target`.
///
/// Root accounts may delete anyone except themselves and other roots;
/// everyone else may only delete themselves.
#[must_use]
pub fn can_delete(actor: &Actor, target: &User) -> Decision {
    if actor.is_root {
        return Decision::from_bool(target.id != actor.user_id && !target.is_root);
    }

    Decision::from_bool(target.id == actor.user_id)
}

/// Decides whether `actor` may read the profile of `target`.
#[must_use]
pub fn can_view(actor: &Actor, target: &User) -> Decision {
    Decision::from_bool(actor.user_id == target.id || actor.is_root || actor.is_admin)
}
