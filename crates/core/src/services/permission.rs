//! Access policies for follow edges.
//!
//! A policy is a plain function value deciding whether a caller may perform
//! an [`Access`] on an (optional) edge. Services pick the policy per
//! operation and call [`enforce`] to turn a denial into the right error.

use followers_common::{AppError, AppResult};
use followers_db::entities::{follow_edge, user};

/// Kind of access requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// List or retrieve.
    Read,
    /// Create or delete.
    Write,
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Policy strategy: `(caller, access, edge) -> Decision`.
pub type Policy = fn(Option<&user::Model>, Access, Option<&follow_edge::Model>) -> Decision;

/// Anyone may read; writes need an authenticated caller.
#[must_use]
pub const fn authenticated_or_read_only(
    caller: Option<&user::Model>,
    access: Access,
    _edge: Option<&follow_edge::Model>,
) -> Decision {
    match (access, caller) {
        (Access::Read, _) | (Access::Write, Some(_)) => Decision::Allow,
        (Access::Write, None) => Decision::Deny,
    }
}

/// Anyone may read; writes need the caller to own the edge.
#[must_use]
pub fn owner_or_read_only(
    caller: Option<&user::Model>,
    access: Access,
    edge: Option<&follow_edge::Model>,
) -> Decision {
    if access == Access::Read {
        return Decision::Allow;
    }

    match (caller, edge) {
        (Some(caller), Some(edge)) if caller.id == edge.owner_id => Decision::Allow,
        _ => Decision::Deny,
    }
}

/// Evaluate a policy, mapping a denial to `Unauthorized` for anonymous
/// callers and `Forbidden` for everyone else.
pub fn enforce(
    policy: Policy,
    caller: Option<&user::Model>,
    access: Access,
    edge: Option<&follow_edge::Model>,
) -> AppResult<()> {
    match policy(caller, access, edge) {
        Decision::Allow => Ok(()),
        Decision::Deny if caller.is_none() => Err(AppError::Unauthorized),
        Decision::Deny => Err(AppError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        )),
    }
}
