use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. Secrets and outstanding codes are never
/// serialized into responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub patronymic: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub avatar: Option<String>,
    pub roles: Vec<String>,
    pub is_email_verified: bool,
    #[serde(skip_serializing)]
    pub email_verification_code: Option<String>,
    #[serde(skip_serializing)]
    pub email_verification_code_expires: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub password_reset_code: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_code_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "admin")
    }
}

/// Fields for inserting a new user at registration.
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub patronymic: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone_number: Option<&'a str>,
    pub avatar: Option<&'a str>,
    pub verification_code: &'a str,
    pub verification_code_expires: OffsetDateTime,
}
