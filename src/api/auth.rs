use actix_web::{web, HttpResponse};

use crate::config::JwtSettings;
use crate::database::EntityStore;
use crate::services::auth_service::{
    self, Claims, LoginRequest, RegisterRequest, TokenResponse, UpdateMeRequest, UserInfo,
};
use crate::utils::AppError;

#[utoipa::path(
    post,
    path = "/api/user/create",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserInfo),
        (status = 400, description = "Invalid payload or email already registered")
    )
)]
pub async fn create_user(
    store: web::Data<dyn EntityStore>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /user/create - email: {}", request.email.as_deref().unwrap_or("N/A"));

    let user = auth_service::register(store.get_ref(), &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "user": user
    })))
}

#[utoipa::path(
    post,
    path = "/api/user/token",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Unable to authenticate with provided credentials")
    )
)]
pub async fn create_token(
    store: web::Data<dyn EntityStore>,
    settings: web::Data<JwtSettings>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /user/token - email: {}", request.email);

    let response = auth_service::login(store.get_ref(), &settings, &request)
        .await
        .inspect_err(|e| log::warn!("❌ Login failed: {} - {}", request.email, e))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "token": response.token
    })))
}

#[utoipa::path(
    get,
    path = "/api/user/me",
    tag = "Users",
    responses(
        (status = 200, description = "Authenticated user", body = UserInfo),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    user: web::ReqData<Claims>,
    store: web::Data<dyn EntityStore>,
) -> Result<HttpResponse, AppError> {
    let info = auth_service::get_current_user(store.get_ref(), user.user_id()?).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": info
    })))
}

#[utoipa::path(
    patch,
    path = "/api/user/me",
    tag = "Users",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "User updated", body = UserInfo),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    user: web::ReqData<Claims>,
    store: web::Data<dyn EntityStore>,
    request: web::Json<UpdateMeRequest>,
) -> Result<HttpResponse, AppError> {
    let info = auth_service::update_current_user(store.get_ref(), user.user_id()?, &request).await?;
    log::info!("✏️  User {} updated profile", info.email);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": info
    })))
}
