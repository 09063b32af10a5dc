use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for send-verify, resend-verify and forgot-password.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub reset_code: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailRequest {
    #[serde(default)]
    pub new_email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_email_verified: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_email_verified: user.is_email_verified,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Returned by login: message + bearer token, no user payload.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
}

/// Returned by verify-email, reset-password and change-email.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

/// Returned by registration: no token until the email is verified.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_user() -> User {
        let at = datetime!(2026-01-01 12:00:00 UTC);
        User {
            id: Uuid::nil(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            patronymic: "Marie".into(),
            email: "jane@example.com".into(),
            password_hash: "$argon2id$fake".into(),
            phone_number: None,
            avatar: None,
            roles: vec!["student".into()],
            is_email_verified: false,
            email_verification_code: Some("123456".into()),
            email_verification_code_expires: Some(at),
            password_reset_code: None,
            password_reset_code_expires: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn public_user_serializes_camel_case() {
        let user = sample_user();
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(json.contains("jane@example.com"));
        assert!(json.contains("firstName"));
        assert!(json.contains("isEmailVerified"));
    }

    #[test]
    fn user_record_never_serializes_secrets() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("passwordHash"));
        assert!(!json.contains("123456"));
        assert!(!json.contains("emailVerificationCode"));
    }

    #[test]
    fn reset_request_accepts_camel_case_fields() {
        let req: ResetPasswordRequest = serde_json::from_str(
            r#"{"email":"a@x.com","resetCode":"123456","newPassword":"Passw0rd"}"#,
        )
        .unwrap();
        assert_eq!(req.reset_code, "123456");
        assert_eq!(req.new_password, "Passw0rd");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let req: LoginRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(req.email.is_empty());
        assert!(req.password.is_empty());
    }
}
