pub mod attributes;
pub mod auth;
pub mod health;
pub mod recipes;
pub mod swagger;

use actix_web::{middleware::NormalizePath, web};
use mongodb::bson::oid::ObjectId;

use crate::middleware::AuthMiddleware;
use crate::utils::AppError;
use attributes::{IngredientEndpoint, TagEndpoint};

/// Id de rota inválido é tratado como registro inexistente
pub fn parse_id(raw: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::NotFound(format!("{} not found", what)))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("❌ Malformed JSON body: {}", err);
        AppError::InvalidRequest(err.to_string()).into()
    })
}

/// Tabela de rotas, compartilhada entre o servidor e os testes.
/// Barra final é opcional dentro dos escopos `/api/*`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Users: registration, token and profile
        .service(
            web::scope("/api/user")
                .wrap(NormalizePath::trim())
                .route("/create", web::post().to(auth::create_user))
                .route("/token", web::post().to(auth::create_token))
                .service(
                    web::resource("/me")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(auth::get_me))
                        .route(web::put().to(auth::update_me))
                        .route(web::patch().to(auth::update_me)),
                ),
        )
        // Recipes, tags and ingredients - Requires JWT
        .service(
            web::scope("/api/recipe")
                .wrap(AuthMiddleware)
                .wrap(NormalizePath::trim())
                .service(
                    web::resource("/recipes")
                        .route(web::get().to(recipes::list_recipes))
                        .route(web::post().to(recipes::create_recipe)),
                )
                .service(
                    web::resource("/recipes/{id}")
                        .route(web::get().to(recipes::get_recipe))
                        .route(web::put().to(recipes::replace_recipe))
                        .route(web::patch().to(recipes::patch_recipe))
                        .route(web::delete().to(recipes::delete_recipe)),
                )
                .service(web::resource("/tags").route(web::get().to(attributes::list_attributes::<TagEndpoint>)))
                .service(
                    web::resource("/tags/{id}")
                        .route(web::put().to(attributes::update_attribute::<TagEndpoint>))
                        .route(web::patch().to(attributes::update_attribute::<TagEndpoint>))
                        .route(web::delete().to(attributes::delete_attribute::<TagEndpoint>)),
                )
                .service(
                    web::resource("/ingredients")
                        .route(web::get().to(attributes::list_attributes::<IngredientEndpoint>)),
                )
                .service(
                    web::resource("/ingredients/{id}")
                        .route(web::put().to(attributes::update_attribute::<IngredientEndpoint>))
                        .route(web::patch().to(attributes::update_attribute::<IngredientEndpoint>))
                        .route(web::delete().to(attributes::delete_attribute::<IngredientEndpoint>)),
                ),
        );
}

#[cfg(test)]
pub(crate) mod test_support {
    use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
    use std::sync::Arc;

    use crate::config::JwtSettings;
    use crate::database::{EntityStore, MemoryStore};
    use crate::models::User;
    use crate::services::auth_service;

    /// Sobe o App completo sobre o `MemoryStore` do contexto
    macro_rules! test_app {
        ($ctx:expr) => {
            actix_web::test::init_service(
                actix_web::App::new()
                    .app_data(actix_web::web::Data::from($ctx.dyn_store()))
                    .app_data(actix_web::web::Data::new($ctx.settings.clone()))
                    .configure($crate::api::configure),
            )
            .await
        };
    }
    pub(crate) use test_app;

    pub struct TestContext {
        pub store: Arc<MemoryStore>,
        pub settings: JwtSettings,
    }

    impl TestContext {
        pub fn new() -> Self {
            Self {
                store: Arc::new(MemoryStore::new()),
                settings: JwtSettings::default(),
            }
        }

        pub fn dyn_store(&self) -> Arc<dyn EntityStore> {
            self.store.clone()
        }

        /// Cria um usuário direto no store e devolve (id, header Authorization)
        pub async fn user(&self, email: &str) -> (ObjectId, String) {
            let user = User {
                id: ObjectId::new(),
                email: email.to_string(),
                password: auth_service::hash_password("password123").unwrap(),
                name: "Test".to_string(),
                is_active: true,
                created_at: Some(BsonDateTime::now()),
                updated_at: None,
            };
            let user = self.store.insert_user(user).await.unwrap();
            let token = auth_service::generate_jwt(&user, &self.settings).unwrap();
            (user.id, format!("Bearer {}", token))
        }
    }
}
