//! Authentication types for JWT and login/registration payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::UserId;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: i64,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: UserId, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.into_inner(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_raw(self.sub)
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Registration request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// User email.
    #[validate(length(min = 3, max = 255))]
    pub email: String,
    /// User password.
    pub password: String,
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Profile update payload for the authenticated user.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// New display name.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// New password.
    pub password: Option<String>,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Authenticated user info.
    pub user: UserInfo,
    /// Access token.
    pub access_token: String,
    /// Token scheme to use in the `Authorization` header.
    pub token_type: &'static str,
    /// Token expiration in seconds.
    pub expires_in: i64,
}

/// User info returned in auth responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: UserId,
    /// User email.
    pub email: String,
    /// Display name.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let expires_at = Utc::now() + Duration::hours(1);

        let claims = Claims::new(UserId::from_raw(42), expires_at);

        assert_eq!(claims.sub, 42);
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_claims_user_id_returns_sub() {
        let claims = Claims::new(UserId::from_raw(7), Utc::now() + Duration::hours(1));

        assert_eq!(claims.user_id(), UserId::from_raw(7));
    }

    #[test]
    fn test_update_profile_request_fields_are_optional() {
        let req: UpdateProfileRequest = serde_json::from_str(r#"{"name":"Ana"}"#).unwrap();

        assert_eq!(req.name.as_deref(), Some("Ana"));
        assert!(req.password.is_none());
    }

    #[test]
    fn test_register_request_requires_a_name() {
        let req = RegisterRequest {
            email: "ana@example.com".to_string(),
            password: "long enough".to_string(),
            name: String::new(),
        };

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }
}
