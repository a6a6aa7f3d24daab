use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::validation::validate_not_blank;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

/// Read copy of a backend user account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "super::timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// `POST /auth/login` body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// `POST /auth/login` response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

/// Profile fields a user may change about themselves.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(custom = "validate_not_blank")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(email(message = "Email address is invalid"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Admin-side account creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: UserRole,
}

/// Admin-side account update.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// `PUT /users/{id}/status` response; the backend does not echo the account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusToggle {
    #[serde(default)]
    pub message: Option<String>,
    pub is_active: bool,
}

/// Filters for `GET /users`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UserQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_response_decodes_naive_timestamps() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "abc",
            "token_type": "bearer",
            "user": {
                "id": 1,
                "email": "admin@cellar.test",
                "name": "Admin",
                "role": "admin",
                "is_active": true,
                "created_at": "2024-01-01T00:00:00",
                "updated_at": "2024-05-06T07:08:09.123"
            }
        }))
        .unwrap();
        assert!(token.user.is_admin());
        assert_eq!(token.user.created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");

        // Written back as RFC 3339 and read again unchanged.
        let stored = serde_json::to_value(&token.user).unwrap();
        let again: User = serde_json::from_value(stored).unwrap();
        assert_eq!(again, token.user);
    }

    #[test]
    fn profile_update_checks_provided_fields_only() {
        assert!(ProfileUpdate::default().validate().is_ok());

        let update = ProfileUpdate {
            name: Some("  ".into()),
            email: Some("not-an-address".into()),
        };
        let errors = update.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));

        let update = ProfileUpdate {
            name: Some("Head Sommelier".into()),
            email: Some("head@cellar.test".into()),
        };
        assert!(update.validate().is_ok());
    }
}
