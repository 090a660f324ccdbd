use thiserror::Error;

use devcamper_core::DocumentId;

use crate::Role;

/// The authenticated caller, resolved from a validated token and the stored
/// user record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: DocumentId,
    pub role: Role,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("User role {0} is not authorized to access this route")]
    RoleNotAllowed(Role),

    #[error("User {user_id} is not authorized to {action}")]
    NotOwner { user_id: DocumentId, action: String },
}

/// Route-level role allow-list check.
///
/// - No IO
/// - No panics
pub fn authorize(principal: &Principal, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(AuthzError::RoleNotAllowed(principal.role))
    }
}

/// Record-level check: only the owner or an admin may act.
///
/// `action` completes the sentence "User <id> is not authorized to ...".
pub fn ensure_owner_or_admin(
    principal: &Principal,
    owner: DocumentId,
    action: &str,
) -> Result<(), AuthzError> {
    if principal.role.is_admin() || principal.user_id == owner {
        return Ok(());
    }
    Err(AuthzError::NotOwner {
        user_id: principal.user_id,
        action: action.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: DocumentId::new(),
            role,
        }
    }

    #[test]
    fn role_allow_list() {
        let allowed = [Role::Publisher, Role::Admin];
        assert_eq!(authorize(&principal(Role::Admin), &allowed), Ok(()));
        assert_eq!(authorize(&principal(Role::Publisher), &allowed), Ok(()));

        let err = authorize(&principal(Role::User), &allowed).unwrap_err();
        assert_eq!(err, AuthzError::RoleNotAllowed(Role::User));
        assert_eq!(err.to_string(), "User role user is not authorized to access this route");
    }

    #[test]
    fn owner_or_admin() {
        let owner = principal(Role::Publisher);
        assert!(ensure_owner_or_admin(&owner, owner.user_id, "update this bootcamp").is_ok());
        assert!(ensure_owner_or_admin(&principal(Role::Admin), owner.user_id, "update this bootcamp").is_ok());

        let stranger = principal(Role::Publisher);
        let err = ensure_owner_or_admin(&stranger, owner.user_id, "update this bootcamp").unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("User {} is not authorized to update this bootcamp", stranger.user_id)
        );
    }
}
