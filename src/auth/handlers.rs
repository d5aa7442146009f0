use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, MessageResponse, PublicUser, RefreshRequest,
            RegisterRequest, TokenForm, VerifyEmailRequest,
        },
        jwt::{AuthUser, JwtKeys},
        password::{check_strength, hash_password, verify_password},
        repo_types::{NewUser, User, VerifyOutcome},
        services::{generate_verification_code, is_valid_email, normalize_email, sanitize_input},
    },
    error::AppError,
    extract::{AppForm, AppJson},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/verify", post(verify_email))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/token", post(token))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        token_type: "bearer",
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    check_strength(&payload.password)?;

    if state.accounts.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let new = NewUser {
        password_hash: hash_password(&payload.password)?,
        name: sanitize_input(payload.name.as_deref()),
        code: generate_verification_code(),
        code_expires_at: OffsetDateTime::now_utc()
            + Duration::minutes(state.config.verification_ttl_minutes),
        email,
    };

    // lost a race with a concurrent registration
    let Some(user) = state.accounts.create_unverified(&new).await? else {
        warn!(email = %new.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    };

    // No mailer: the code is delivered through the log.
    info!(user_id = %user.id, email = %user.email, verification_code = %new.code, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&payload.email);
    match state
        .accounts
        .consume_verification(&email, &payload.code, OffsetDateTime::now_utc())
        .await?
    {
        VerifyOutcome::Verified => {
            info!(%email, "email verified");
            Ok(Json(MessageResponse {
                message: "Email verified".into(),
            }))
        }
        VerifyOutcome::InvalidCode => {
            warn!(%email, "invalid or expired verification code");
            Err(AppError::validation("Invalid or expired verification code"))
        }
        VerifyOutcome::UnknownUser => Err(AppError::not_found("User")),
    }
}

async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<User, AppError> {
    let email = normalize_email(email);
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let Some(user) = state.accounts.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(invalid());
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(invalid());
    }
    if !user.email_verified {
        warn!(%email, user_id = %user.id, "login before email verification");
        return Err(AppError::Unauthorized("Email not verified".into()));
    }
    Ok(user)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = authenticate(&state, &payload.email, &payload.password).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

/// OAuth2 password grant used by form-based clients.
#[instrument(skip(state, form))]
pub async fn token(
    State(state): State<AppState>,
    AppForm(form): AppForm<TokenForm>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = authenticate(&state, &form.username, &form.password).await?;
    info!(user_id = %user.id, "token issued");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let claims = JwtKeys::from_ref(&state)
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            AppError::Unauthorized("Invalid refresh token".into())
        })?;

    let user = state.accounts.find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state.accounts.find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    Ok(Json(user.into()))
}
