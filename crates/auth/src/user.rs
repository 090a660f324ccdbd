//! User accounts.
//!
//! A user document carries credentials (`password`, reset token) that must
//! never leave the store; [`SCHEMA`] marks them hidden so listings and
//! responses strip them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use devcamper_core::validate::is_valid_email;
use devcamper_core::{DocumentId, DomainError, DomainResult, Entity, FieldErrors};
use devcamper_query::Schema;

use crate::Role;
use crate::password::{PasswordError, hash_password, verify_password};
use crate::reset::{ResetToken, hash_reset_token};

pub const MIN_PASSWORD_LEN: usize = 6;

pub const SCHEMA: Schema = Schema {
    collection: "users",
    fields: &["name", "email", "role", "createdAt"],
    hidden: &["password", "resetPasswordToken", "resetPasswordExpire"],
    unique: &[&["email"]],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: DocumentId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    /// Password hash, see [`crate::password`].
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_expire: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> DocumentId {
        self.id
    }
}

impl User {
    pub fn set_password(&mut self, plain: &str) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        check_password(&mut errors, plain);
        errors.finish()?;
        self.password = hash_password(plain)?;
        Ok(())
    }

    pub fn matches_password(&self, plain: &str) -> bool {
        verify_password(plain, &self.password)
    }

    /// Store a fresh reset token's hash and expiry; returns the plain token to
    /// send to the user.
    pub fn issue_reset_token(&mut self, now: DateTime<Utc>, ttl: Duration) -> String {
        let token = ResetToken::generate();
        self.reset_password_token = Some(token.hashed);
        self.reset_password_expire = Some(now + ttl);
        token.plain
    }

    /// Whether `plain` is this user's current, unexpired reset token.
    pub fn reset_token_matches(&self, plain: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_password_token, self.reset_password_expire) {
            (Some(stored), Some(expire)) => expire > now && *stored == hash_reset_token(plain),
            _ => false,
        }
    }

    pub fn clear_reset_token(&mut self) {
        self.reset_password_token = None;
        self.reset_password_expire = None;
    }
}

/// Registration / admin-create payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl NewUser {
    /// Validate and build the user. Self-registration passes
    /// `allow_admin = false`.
    pub fn into_user(self, allow_admin: bool, now: DateTime<Utc>) -> DomainResult<User> {
        let mut errors = FieldErrors::new();
        errors.require_text(&self.name, "Please add a name", None);
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        let role = self.role.unwrap_or_default();
        errors.check(allow_admin || !role.is_admin(), "Please choose a role of user or publisher");
        errors.finish()?;

        Ok(User {
            id: DocumentId::new(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role,
            password: hash_password(&self.password)?,
            reset_password_token: None,
            reset_password_expire: None,
            created_at: now,
        })
    }
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

impl UserChanges {
    pub fn apply(self, user: &mut User) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.require_text(name, "Please add a name", None);
        }
        if let Some(email) = &self.email {
            check_email(&mut errors, email);
        }
        if let Some(password) = &self.password {
            check_password(&mut errors, password);
        }
        errors.finish()?;

        if let Some(name) = self.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = self.email {
            user.email = email.trim().to_string();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(password) = self.password {
            user.password = hash_password(&password)?;
        }
        Ok(())
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.push("Please add an email");
    } else {
        errors.check(is_valid_email(email.trim()), "Please add a valid email");
    }
}

fn check_password(errors: &mut FieldErrors, password: &str) {
    if password.is_empty() {
        errors.push("Please add a password");
    } else {
        errors.check(
            password.chars().count() >= MIN_PASSWORD_LEN,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
}

impl From<PasswordError> for DomainError {
    fn from(err: PasswordError) -> Self {
        DomainError::Internal(err.to_string())
    }
}

/// Reject a login attempt without revealing which half was wrong.
pub fn invalid_credentials() -> DomainError {
    DomainError::unauthorized("Invalid credentials")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(role: Option<Role>) -> NewUser {
        NewUser {
            name: "John Doe".into(),
            email: "john@gmail.com".into(),
            password: "123456".into(),
            role,
        }
    }

    #[test]
    fn registration_hashes_password() {
        let user = registration(Some(Role::Publisher)).into_user(false, Utc::now()).unwrap();
        assert_eq!(user.role, Role::Publisher);
        assert_ne!(user.password, "123456");
        assert!(user.matches_password("123456"));
        assert!(!user.matches_password("654321"));
    }

    #[test]
    fn self_registration_cannot_pick_admin() {
        let err = registration(Some(Role::Admin)).into_user(false, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation(vec!["Please choose a role of user or publisher".into()])
        );
        assert!(registration(Some(Role::Admin)).into_user(true, Utc::now()).is_ok());
    }

    #[test]
    fn validation_reports_every_field() {
        let err = NewUser {
            name: " ".into(),
            email: "nope".into(),
            password: "123".into(),
            role: None,
        }
        .into_user(false, Utc::now())
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please add a name, Please add a valid email, Password must be at least 6 characters"
        );
    }

    #[test]
    fn reset_token_lifecycle() {
        let now = Utc::now();
        let mut user = registration(None).into_user(false, now).unwrap();
        let plain = user.issue_reset_token(now, Duration::minutes(10));

        assert!(user.reset_token_matches(&plain, now + Duration::minutes(9)));
        assert!(!user.reset_token_matches(&plain, now + Duration::minutes(10)));
        assert!(!user.reset_token_matches("forged", now));

        user.clear_reset_token();
        assert!(!user.reset_token_matches(&plain, now));
    }

    #[test]
    fn credentials_are_hidden_and_absent_tokens_not_serialized() {
        let user = registration(None).into_user(false, Utc::now()).unwrap();
        let doc = serde_json::to_value(&user).unwrap();
        assert!(doc.get("resetPasswordToken").is_none());
        assert!(doc.get("createdAt").is_some());
        assert!(SCHEMA.is_hidden("password"));
        assert!(!SCHEMA.is_queryable("resetPasswordToken"));
    }

    #[test]
    fn changes_leave_absent_fields() {
        let mut user = registration(None).into_user(false, Utc::now()).unwrap();
        UserChanges {
            name: Some("Jane".into()),
            ..Default::default()
        }
        .apply(&mut user)
        .unwrap();
        assert_eq!(user.name, "Jane");
        assert_eq!(user.email, "john@gmail.com");
        assert!(user.matches_password("123456"));
    }
}
