use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Recipe Service API",
        version = "1.0.0",
        description = "Recipe, tag and ingredient management.\n\n**Authentication:** every `/api/recipe` endpoint requires a JWT Bearer token obtained from `/api/user/token`.\n\nTag and ingredient endpoints (`/api/recipe/tags`, `/api/recipe/ingredients`) list, rename (PUT/PATCH `{\"name\"}`) and delete the caller's records."
    ),
    paths(
        // Users
        crate::api::auth::create_user,
        crate::api::auth::create_token,
        crate::api::auth::get_me,
        crate::api::auth::update_me,

        // Recipes
        crate::api::recipes::list_recipes,
        crate::api::recipes::create_recipe,
        crate::api::recipes::get_recipe,
        crate::api::recipes::replace_recipe,
        crate::api::recipes::patch_recipe,
        crate::api::recipes::delete_recipe,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            // Users
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::UpdateMeRequest,
            crate::services::auth_service::TokenResponse,
            crate::services::auth_service::UserInfo,

            // Recipes
            crate::models::RecipePayload,
            crate::models::RecipeListItem,
            crate::models::RecipeResponse,
            crate::models::Descriptor,
            crate::models::AttributeResponse,
            crate::models::UpdateAttributeRequest,

            // Health
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Users", description = "Registration, token issuing and profile of the authenticated user."),
        (name = "Recipes", description = "Recipes owned by the authenticated user, with nested tags and ingredients."),
        (name = "Health", description = "Service and store status."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
