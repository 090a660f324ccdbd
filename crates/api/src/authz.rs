//! Role and ownership guards applied by handlers before touching the store.

use devcamper_auth::{Principal, Role, authorize, ensure_owner_or_admin};
use devcamper_core::DocumentId;

use crate::app::errors::ApiResult;
use crate::context::CurrentUser;

pub const PUBLISHERS: &[Role] = &[Role::Publisher, Role::Admin];
pub const REVIEWERS: &[Role] = &[Role::User, Role::Admin];

/// The caller, provided their role is in `allowed`.
pub fn require_role(current: &CurrentUser, allowed: &[Role]) -> ApiResult<Principal> {
    let principal = current.principal();
    authorize(&principal, allowed)?;
    Ok(principal)
}

pub fn require_owner(principal: &Principal, owner: DocumentId, action: &str) -> ApiResult<()> {
    Ok(ensure_owner_or_admin(principal, owner, action)?)
}
