use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        codes::{self, CodeError},
        dto::{
            AuthResponse, ChangeEmailRequest, ChangePasswordRequest, EmailRequest, LoginRequest,
            MessageResponse, PublicUser, RegisterResponse, ResetPasswordRequest, TokenResponse,
            VerifyEmailRequest,
        },
        emails,
        extractors::CurrentUser,
        jwt::JwtKeys,
        password,
        repo_types::{NewUser, User},
        validate,
    },
    error::{ApiError, CredentialFailure},
    state::AppState,
};
use axum::extract::FromRef;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/registration", post(registration))
        .route("/auth/send-verify", post(send_verification_email))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/resend-verify", post(resend_verification_code))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/change-password", put(change_password))
        .route("/auth/change-email", put(change_email))
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024)) // 5MB, avatar included
}

// --- registration ---

#[derive(Default)]
struct RegistrationForm {
    first_name: Option<String>,
    last_name: Option<String>,
    patronymic: Option<String>,
    email: Option<String>,
    password: Option<String>,
    phone_number: Option<String>,
    avatar: Option<(String, Bytes)>,
}

async fn read_registration_form(mp: &mut Multipart) -> Result<RegistrationForm, ApiError> {
    let mut form = RegistrationForm::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("avatar") => {
                let file_name = field.file_name().unwrap_or("avatar").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                form.avatar = Some((file_name, data));
            }
            Some(text_field) => {
                let text_field = text_field.to_string();
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                match text_field.as_str() {
                    "firstName" => form.first_name = Some(value),
                    "lastName" => form.last_name = Some(value),
                    "patronymic" => form.patronymic = Some(value),
                    "email" => form.email = Some(value),
                    "password" => form.password = Some(value),
                    "phoneNumber" => form.phone_number = Some(value),
                    _ => {}
                }
            }
            None => {}
        }
    }
    Ok(form)
}

fn required_name(value: Option<String>, field: &str) -> Result<String, ApiError> {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    validate::validate_name(&value)
        .map_err(|msg| ApiError::BadRequest(format!("{field} {msg}")))?;
    Ok(value)
}

async fn discard_avatar(state: &AppState, avatar: &Option<String>) {
    if let Some(name) = avatar {
        if let Err(e) = state.avatars.delete(name).await {
            warn!(error = %e, avatar = %name, "failed to remove orphaned avatar");
        }
    }
}

#[instrument(skip(state, mp))]
pub async fn registration(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let form = read_registration_form(&mut mp).await?;

    let first_name = required_name(form.first_name, "firstName")?;
    let last_name = required_name(form.last_name, "lastName")?;
    let patronymic = required_name(form.patronymic, "patronymic")?;

    let email = validate::normalize_email(form.email.as_deref().unwrap_or_default());
    if !validate::is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    let plain_password = form.password.unwrap_or_default();
    password::validate_strength(&plain_password)
        .map_err(|msg| ApiError::BadRequest(msg.into()))?;

    let phone_number = match form.phone_number.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            validate::normalize_phone(raw).map_err(|msg| ApiError::BadRequest(msg.into()))?,
        ),
        _ => None,
    };

    // The avatar lands on disk before the uniqueness check and is removed
    // again if this attempt fails, so no orphan files accumulate.
    let avatar = match form.avatar {
        Some((file_name, data)) => Some(state.avatars.save(&file_name, data).await?),
        None => None,
    };

    if matches!(User::find_by_email(&state.db, &email).await, Ok(Some(_))) {
        warn!(email = %email, "registration: email already taken");
        discard_avatar(&state, &avatar).await;
        return Err(ApiError::Conflict("This user already exists".into()));
    }

    let password_hash = match password::hash_password(&plain_password) {
        Ok(h) => h,
        Err(e) => {
            discard_avatar(&state, &avatar).await;
            return Err(ApiError::Internal(e));
        }
    };
    let issued = codes::issue();

    let created = User::create(
        &state.db,
        NewUser {
            first_name: &first_name,
            last_name: &last_name,
            patronymic: &patronymic,
            email: &email,
            password_hash: &password_hash,
            phone_number: phone_number.as_deref(),
            avatar: avatar.as_deref(),
            verification_code: &issued.code,
            verification_code_expires: issued.expires_at,
        },
    )
    .await;

    let user = match created {
        Ok(u) => u,
        Err(e) => {
            // Unique-index races surface here as Conflict.
            discard_avatar(&state, &avatar).await;
            return Err(e.into());
        }
    };

    let (subject, body) = emails::verification(&issued.code);
    state.mailer.send(&user.email, subject, &body).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful! A verification code has been sent to your email."
                .into(),
            user: PublicUser::from(&user),
        }),
    ))
}

// --- email verification ---

#[instrument(skip(state, payload))]
pub async fn send_verification_email(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = validate::normalize_email(&payload.email);
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".into()));
    }

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if user.is_email_verified {
        return Err(ApiError::Conflict("Email is already verified".into()));
    }

    let issued = codes::issue();
    User::set_verification_code(&state.db, user.id, &issued.code, issued.expires_at).await?;

    let (subject, body) = emails::verification(&issued.code);
    state.mailer.send(&user.email, subject, &body).await?;

    info!(user_id = %user.id, "verification code sent");
    Ok(Json(MessageResponse {
        message: "A verification code has been sent to your email".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn resend_verification_code(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = validate::normalize_email(&payload.email);
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".into()));
    }

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if user.is_email_verified {
        return Err(ApiError::Conflict("Email is already verified".into()));
    }

    if !codes::resend_available(
        user.email_verification_code_expires,
        OffsetDateTime::now_utc(),
    ) {
        return Err(ApiError::TooManyRequests(
            "You can request a new code in 1 minute".into(),
        ));
    }

    let issued = codes::issue();
    User::set_verification_code(&state.db, user.id, &issued.code, issued.expires_at).await?;

    let (subject, body) = emails::new_verification_code(&issued.code);
    state.mailer.send(&user.email, subject, &body).await?;

    info!(user_id = %user.id, "verification code resent");
    Ok(Json(MessageResponse {
        message: "A new verification code has been sent to your email".into(),
    }))
}

fn map_verification_error(e: CodeError) -> ApiError {
    match e {
        CodeError::Missing => ApiError::InvalidState("Code not found or expired".into()),
        CodeError::Mismatch => ApiError::InvalidCode("Invalid verification code".into()),
        CodeError::Expired => ApiError::Expired("Verification code has expired".into()),
    }
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = validate::normalize_email(&payload.email);
    if email.is_empty() || payload.code.is_empty() {
        return Err(ApiError::BadRequest("Email and code are required".into()));
    }

    let mut user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if user.is_email_verified {
        return Err(ApiError::Conflict("Email is already verified".into()));
    }

    codes::check(
        user.email_verification_code.as_deref(),
        user.email_verification_code_expires,
        &payload.code,
        OffsetDateTime::now_utc(),
    )
    .map_err(map_verification_error)?;

    User::mark_email_verified(&state.db, user.id).await?;
    user.is_email_verified = true;
    user.email_verification_code = None;
    user.email_verification_code_expires = None;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, "email verified");
    Ok(Json(AuthResponse {
        message: "Email verified successfully!".into(),
        token,
        user: PublicUser::from(&user),
    }))
}

// --- login ---

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let email = validate::normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("Not all fields are filled in".into()));
    }

    // Note: verification is not required to log in.
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "login: unknown email");
            ApiError::InvalidCredentials(CredentialFailure::UnknownEmail)
        })?;

    let ok = password::verify_password(&payload.password, &user.password_hash)?;
    if !ok {
        warn!(user_id = %user.id, "login: invalid password");
        return Err(ApiError::InvalidCredentials(
            CredentialFailure::WrongPassword,
        ));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, "user logged in");
    // 201 on success is part of the public contract.
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            message: "You have logged in successfully!".into(),
            token,
        }),
    ))
}

// --- password reset ---

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = validate::normalize_email(&payload.email);
    if email.is_empty() {
        return Err(ApiError::BadRequest("The email field is required".into()));
    }

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let issued = codes::issue();
    User::set_reset_code(&state.db, user.id, &issued.code, issued.expires_at).await?;

    let (subject, body) = emails::password_reset(&issued.code);
    state.mailer.send(&user.email, subject, &body).await?;

    info!(user_id = %user.id, "password reset code sent");
    Ok(Json(MessageResponse {
        message: "A password recovery code has been sent to your email".into(),
    }))
}

fn map_reset_error(e: CodeError) -> ApiError {
    match e {
        CodeError::Missing => ApiError::InvalidState("Code not found or expired".into()),
        CodeError::Mismatch => ApiError::InvalidCode("Invalid password reset code".into()),
        CodeError::Expired => ApiError::Expired("Password reset code has expired".into()),
    }
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = validate::normalize_email(&payload.email);

    let mut missing = Vec::new();
    if email.is_empty() {
        missing.push("email");
    }
    if payload.reset_code.is_empty() {
        missing.push("resetCode");
    }
    if payload.new_password.is_empty() {
        missing.push("newPassword");
    }
    if !missing.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    password::validate_strength(&payload.new_password)
        .map_err(|msg| ApiError::BadRequest(msg.into()))?;

    let mut user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    codes::check(
        user.password_reset_code.as_deref(),
        user.password_reset_code_expires,
        &payload.reset_code,
        OffsetDateTime::now_utc(),
    )
    .map_err(map_reset_error)?;

    let password_hash = password::hash_password(&payload.new_password)?;
    User::reset_password(&state.db, user.id, &password_hash).await?;
    user.password_reset_code = None;
    user.password_reset_code_expires = None;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(AuthResponse {
        message: "Password reset successfully!".into(),
        token,
        user: PublicUser::from(&user),
    }))
}

// --- authenticated account changes ---

#[instrument(skip(state, user, payload))]
pub async fn change_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChangeEmailRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.new_email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    let new_email = validate::normalize_email(&payload.new_email);
    if !validate::is_valid_email(&new_email) {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    let ok = password::verify_password(&payload.password, &user.password_hash)?;
    if !ok {
        return Err(ApiError::InvalidCredentials(
            CredentialFailure::WrongPassword,
        ));
    }

    if User::find_by_email(&state.db, &new_email).await?.is_some() {
        return Err(ApiError::Conflict("This email is already in use".into()));
    }

    // Changing the address always drops verified status.
    let updated = User::update_email(&state.db, user.id, &new_email).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(updated.id, &updated.email)?;

    info!(user_id = %updated.id, "email changed");
    Ok(Json(AuthResponse {
        message: "Email changed successfully".into(),
        token,
        user: PublicUser::from(&updated),
    }))
}

#[instrument(skip(state, user, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    let ok = password::verify_password(&payload.current_password, &user.password_hash)?;
    if !ok {
        return Err(ApiError::InvalidCredentials(
            CredentialFailure::WrongPassword,
        ));
    }

    let password_hash = password::hash_password(&payload.new_password)?;
    User::set_password(&state.db, user.id, &password_hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse {
        message: "Password changed successfully".into(),
    }))
}
