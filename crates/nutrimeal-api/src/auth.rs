use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use tracing::{error, info, warn};
use uuid::Uuid;

use nutrimeal_db::Database;
use nutrimeal_types::api::{Claims, LoginRequest, LoginResponse, SignupRequest, SignupResponse};
use nutrimeal_types::models::Role;

use crate::error::{ApiError, AppJson};
use crate::generate::RecipeGenerator;
use crate::store::blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub store_timeout: Duration,
    pub generator: RecipeGenerator,
    pub pdf_font_dir: PathBuf,
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = non_blank(req.username, "username")?;
    let email = non_blank(req.email, "email")?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::invalid("password is required"))?;

    let password_hash = hash_password(password).await?;

    let user_id = blocking(&state, move |db| {
        db.create_user(&username, &email, &password_hash, Role::User)
    })
    .await?;

    Ok(Json(SignupResponse {
        user_id,
        message: "Signup successful!".into(),
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = non_blank(req.username, "username")?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::invalid("password is required"))?;

    let lookup = username.clone();
    let user = blocking(&state, move |db| db.get_user_by_username(&lookup)).await?;

    // Same error whether the account is missing or the password is wrong.
    let Some(user) = user else {
        warn!("Login failed for unknown user");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(password, user.password.clone()).await? {
        warn!("Login failed for '{}'", user.username);
        return Err(ApiError::InvalidCredentials);
    }

    let user_id: Uuid = user.id.parse().map_err(|_| ApiError::Internal)?;
    let role: Role = user.role.parse().map_err(|_| ApiError::Internal)?;

    let token = create_token(&state.jwt_secret, state.token_ttl, user_id, &user.username, role)
        .map_err(|e| {
            error!("Token signing failed: {}", e);
            ApiError::Internal
        })?;

    info!("'{}' logged in", user.username);
    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        role,
        token,
    }))
}

/// Salted Argon2id hash, computed on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal
    })?
    .map_err(|e| {
        error!("Password hashing failed: {}", e);
        ApiError::Internal
    })
}

pub async fn verify_password(password: String, stored_hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&stored_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal
    })
}

pub fn create_token(
    secret: &str,
    ttl: chrono::Duration,
    user_id: Uuid,
    username: &str,
    role: Role,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Checks signature and expiry.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

fn non_blank(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::invalid(format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_verifies_only_the_original_password() {
        let hash = hash_password("secret1".into()).await.unwrap();
        assert!(!hash.contains("secret1"));
        assert!(verify_password("secret1".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".into(), hash).await.unwrap());
    }

    #[test]
    fn token_roundtrip_carries_role() {
        let id = Uuid::new_v4();
        let token = create_token("s3cret", chrono::Duration::hours(1), id, "root", Role::Admin).unwrap();

        let claims = decode_token("s3cret", &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Admin);

        assert!(decode_token("other", &token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = create_token(
            "s3cret",
            chrono::Duration::hours(-2),
            Uuid::new_v4(),
            "alice",
            Role::User,
        )
        .unwrap();
        assert!(decode_token("s3cret", &token).is_err());
    }
}
