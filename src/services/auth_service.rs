use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::JwtSettings;
use crate::database::{EntityStore, StoreError};
use crate::models::{User, UserChanges};
use crate::utils::{too_long, AppError, ValidationErrors, BLANK, MAX_NAME_LENGTH, REQUIRED};

const MIN_PASSWORD_LENGTH: usize = 5;

// Custo baixo nos testes para não gastar segundos em cada hash
const HASH_COST: u32 = if cfg!(test) { 4 } else { DEFAULT_COST };

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id (hex)
    pub email: String,
    pub name: String,
    pub iat: usize, // issued at
    pub exp: usize, // expiration
    pub jti: String, // JWT ID
    pub aud: String, // audience
    pub iss: String, // issuer
}

impl Claims {
    pub fn user_id(&self) -> Result<ObjectId, AppError> {
        ObjectId::parse_str(&self.sub).map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateMeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct UserInfo {
    pub email: String,
    pub name: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            email: user.email,
            name: user.name,
        }
    }
}

/// Normaliza o email: só o domínio vai para minúsculas
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn clean_email(errors: &mut ValidationErrors, email: Option<&str>) -> Option<String> {
    let email = match email.map(str::trim) {
        None => {
            errors.add("email", REQUIRED);
            return None;
        }
        Some("") => {
            errors.add("email", BLANK);
            return None;
        }
        Some(email) => email,
    };

    let valid = email
        .rsplit_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));

    if !valid {
        errors.add("email", "Enter a valid email address.");
        return None;
    }
    if email.chars().count() > MAX_NAME_LENGTH {
        errors.add("email", too_long(MAX_NAME_LENGTH));
        return None;
    }

    Some(normalize_email(email))
}

fn clean_password(errors: &mut ValidationErrors, password: Option<&str>) -> Option<String> {
    match password {
        None => {
            errors.add("password", REQUIRED);
            None
        }
        Some(p) if p.chars().count() < MIN_PASSWORD_LENGTH => {
            errors.add(
                "password",
                format!("Ensure this field has at least {} characters.", MIN_PASSWORD_LENGTH),
            );
            None
        }
        Some(p) => Some(p.to_string()),
    }
}

fn clean_display_name(errors: &mut ValidationErrors, name: &str) -> Option<String> {
    let name = name.trim();
    if name.chars().count() > MAX_NAME_LENGTH {
        errors.add("name", too_long(MAX_NAME_LENGTH));
        return None;
    }
    Some(name.to_string())
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash_with_cost(password, HASH_COST)
}

// Falha de hash é erro do servidor, nunca do cliente
fn hash_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

// Generate JWT token
pub fn generate_jwt(user: &User, settings: &JwtSettings) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_hex(),
        email: user.email.clone(),
        name: user.name.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(settings.ttl_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: settings.audience.clone(),
        iss: settings.issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str, settings: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[settings.audience.as_str()]);

    let mut issuers = HashSet::new();
    issuers.insert(settings.issuer.clone());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

// User registration
pub async fn register(store: &dyn EntityStore, request: &RegisterRequest) -> Result<UserInfo, AppError> {
    let mut errors = ValidationErrors::new();
    let email = clean_email(&mut errors, request.email.as_deref());
    let password = clean_password(&mut errors, request.password.as_deref());
    let name = clean_display_name(&mut errors, request.name.as_deref().unwrap_or_default());
    errors.into_result()?;

    let (Some(email), Some(password), Some(name)) = (email, password, name) else {
        return Err(AppError::InvalidRequest("Invalid registration payload".to_string()));
    };

    let duplicate = || {
        let mut errors = ValidationErrors::new();
        errors.add("email", "user with this email already exists.");
        AppError::Validation(errors)
    };

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(duplicate());
    }

    let user = User {
        id: ObjectId::new(),
        email,
        password: hash_password(&password)?,
        name,
        is_active: true,
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
    };

    let user = match store.insert_user(user).await {
        Ok(user) => user,
        Err(StoreError::Conflict(_)) => return Err(duplicate()),
        Err(e) => return Err(e.into()),
    };

    log::info!("✅ User registered successfully: {}", user.email);

    Ok(user.into())
}

// User login
pub async fn login(
    store: &dyn EntityStore,
    settings: &JwtSettings,
    request: &LoginRequest,
) -> Result<TokenResponse, AppError> {
    let mut errors = ValidationErrors::new();
    if request.email.trim().is_empty() {
        errors.add("email", BLANK);
    }
    if request.password.is_empty() {
        errors.add("password", BLANK);
    }
    errors.into_result()?;

    let invalid = || AppError::InvalidRequest("Unable to authenticate with provided credentials".to_string());

    let user = store
        .find_user_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(invalid)?;

    let valid = verify(&request.password, &user.password).map_err(|e| {
        log::warn!("Password verification error for {}: {}", user.email, e);
        invalid()
    })?;

    if !valid || !user.is_active {
        return Err(invalid());
    }

    Ok(TokenResponse {
        token: generate_jwt(&user, settings)?,
    })
}

// Get current user
pub async fn get_current_user(store: &dyn EntityStore, user_id: ObjectId) -> Result<UserInfo, AppError> {
    store
        .find_user(user_id)
        .await?
        .map(UserInfo::from)
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
}

pub async fn update_current_user(
    store: &dyn EntityStore,
    user_id: ObjectId,
    request: &UpdateMeRequest,
) -> Result<UserInfo, AppError> {
    let mut errors = ValidationErrors::new();
    let name = match &request.name {
        Some(name) => clean_display_name(&mut errors, name),
        None => None,
    };
    let password = match &request.password {
        Some(password) => clean_password(&mut errors, Some(password)),
        None => None,
    };
    errors.into_result()?;

    let changes = UserChanges {
        name,
        password: password.as_deref().map(hash_password).transpose()?,
    };

    store
        .update_user(user_id, changes)
        .await?
        .map(UserInfo::from)
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
}
