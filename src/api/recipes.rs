use actix_web::{web, HttpResponse};

use super::parse_id;
use crate::database::EntityStore;
use crate::models::{RecipeListItem, RecipePayload, RecipeResponse};
use crate::services::auth_service::Claims;
use crate::services::recipe_service::{self, WriteMode};
use crate::utils::AppError;

/// GET /api/recipe/recipes - Lista as receitas do usuário (mais recentes primeiro)
#[utoipa::path(
    get,
    path = "/api/recipe/recipes",
    tag = "Recipes",
    responses(
        (status = 200, description = "Caller's recipes, newest first", body = [RecipeListItem]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_recipes(
    user: web::ReqData<Claims>,
    store: web::Data<dyn EntityStore>,
) -> Result<HttpResponse, AppError> {
    let owner = user.user_id()?;

    let recipes: Vec<RecipeListItem> = recipe_service::list_recipes(store.get_ref(), owner)
        .await?
        .into_iter()
        .map(RecipeListItem::from)
        .collect();
    let total = recipes.len();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "recipes": recipes,
        "total": total
    })))
}

/// POST /api/recipe/recipes - Cria receita com tags/ingredientes embutidos
#[utoipa::path(
    post,
    path = "/api/recipe/recipes",
    tag = "Recipes",
    request_body = RecipePayload,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_recipe(
    user: web::ReqData<Claims>,
    body: web::Json<RecipePayload>,
    store: web::Data<dyn EntityStore>,
) -> Result<HttpResponse, AppError> {
    let owner = user.user_id()?;

    let view = recipe_service::create_recipe(store.get_ref(), owner, &body).await?;
    log::info!("✅ Recipe {} created by {}", view.recipe.id, user.email);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "recipe": RecipeResponse::from(view)
    })))
}

/// GET /api/recipe/recipes/{id}
#[utoipa::path(
    get,
    path = "/api/recipe/recipes/{id}",
    tag = "Recipes",
    params(("id" = String, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_recipe(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    store: web::Data<dyn EntityStore>,
) -> Result<HttpResponse, AppError> {
    let owner = user.user_id()?;
    let id = parse_id(&path, "Recipe")?;

    let view = recipe_service::get_recipe(store.get_ref(), owner, id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "recipe": RecipeResponse::from(view)
    })))
}

async fn write_recipe(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    body: web::Json<RecipePayload>,
    store: web::Data<dyn EntityStore>,
    mode: WriteMode,
) -> Result<HttpResponse, AppError> {
    let owner = user.user_id()?;
    let id = parse_id(&path, "Recipe")?;

    let view = recipe_service::update_recipe(store.get_ref(), owner, id, &body, mode).await?;
    log::info!("✏️  Recipe {} updated ({:?})", id, mode);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "recipe": RecipeResponse::from(view)
    })))
}

/// PUT /api/recipe/recipes/{id} - Atualização completa
#[utoipa::path(
    put,
    path = "/api/recipe/recipes/{id}",
    tag = "Recipes",
    params(("id" = String, Path, description = "Recipe id")),
    request_body = RecipePayload,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn replace_recipe(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    body: web::Json<RecipePayload>,
    store: web::Data<dyn EntityStore>,
) -> Result<HttpResponse, AppError> {
    write_recipe(user, path, body, store, WriteMode::Full).await
}

/// PATCH /api/recipe/recipes/{id} - Atualização parcial
#[utoipa::path(
    patch,
    path = "/api/recipe/recipes/{id}",
    tag = "Recipes",
    params(("id" = String, Path, description = "Recipe id")),
    request_body = RecipePayload,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn patch_recipe(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    body: web::Json<RecipePayload>,
    store: web::Data<dyn EntityStore>,
) -> Result<HttpResponse, AppError> {
    write_recipe(user, path, body, store, WriteMode::Partial).await
}

/// DELETE /api/recipe/recipes/{id}
#[utoipa::path(
    delete,
    path = "/api/recipe/recipes/{id}",
    tag = "Recipes",
    params(("id" = String, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_recipe(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    store: web::Data<dyn EntityStore>,
) -> Result<HttpResponse, AppError> {
    let owner = user.user_id()?;
    let id = parse_id(&path, "Recipe")?;

    recipe_service::delete_recipe(store.get_ref(), owner, id).await?;
    log::info!("🗑️  Recipe {} deleted", id);

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::api::test_support::{test_app, TestContext};
    use crate::database::EntityStore;
    use crate::models::AttributeKind;

    const RECIPES_URL: &str = "/api/recipe/recipes/";

    fn detail_url(id: &str) -> String {
        format!("/api/recipe/recipes/{}/", id)
    }

    fn sample() -> Value {
        json!({
            "title": "recipeTestTitle",
            "time_minutes": 5,
            "price": "5.50",
            "description": "Description test",
            "link": "http://example.com/recipe"
        })
    }

    fn tag_names(recipe: &Value) -> Vec<String> {
        let mut names: Vec<String> = recipe["tags"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        names.sort();
        names
    }

    #[actix_rt::test]
    async fn test_auth_required() {
        let ctx = TestContext::new();
        let app = test_app!(ctx);

        let req = test::TestRequest::get().uri(RECIPES_URL).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri(RECIPES_URL)
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_create_and_list_limited_to_user() {
        let ctx = TestContext::new();
        let (owner, token) = ctx.user("user@example.com").await;
        let (_, other_token) = ctx.user("other@example.com").await;
        let app = test_app!(ctx);

        for auth in [&token, &token, &other_token] {
            let req = test::TestRequest::post()
                .uri(RECIPES_URL)
                .insert_header(("Authorization", auth.as_str()))
                .set_json(sample())
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri(RECIPES_URL)
            .insert_header(("Authorization", token.as_str()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["total"], 2);
        let items = body["recipes"].as_array().unwrap();
        assert!(items[0]["description"].is_null());
        assert_eq!(items[0]["price"], "5.50");

        let stored: Vec<String> = ctx
            .store
            .list_recipes(owner)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id.to_hex())
            .collect();
        let listed: Vec<String> = items.iter().map(|r| r["id"].as_str().unwrap().to_string()).collect();
        assert_eq!(listed, stored);
    }

    #[actix_rt::test]
    async fn test_create_with_existing_and_new_tags() {
        let ctx = TestContext::new();
        let (owner, token) = ctx.user("user@example.com").await;
        let existing = ctx.store.insert_attribute(AttributeKind::Tag, owner, "tag1").await.unwrap();
        let app = test_app!(ctx);

        let mut payload = sample();
        payload["tags"] = json!([{ "name": "tag1" }, { "name": "tag2" }]);
        payload["ingredients"] = json!([{ "name": "pepper" }]);

        let req = test::TestRequest::post()
            .uri(RECIPES_URL)
            .insert_header(("Authorization", token.as_str()))
            .set_json(payload)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(res).await;
        let recipe = &body["recipe"];
        assert_eq!(tag_names(recipe), vec!["tag1", "tag2"]);
        assert!(recipe["tags"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t["id"] == existing.id.to_hex()));
        assert_eq!(recipe["ingredients"][0]["name"], "pepper");
        assert_eq!(ctx.store.list_attributes(AttributeKind::Tag, owner).await.unwrap().len(), 2);
    }

    #[actix_rt::test]
    async fn test_existing_ingredient_reused_per_user() {
        let ctx = TestContext::new();
        let (owner, token) = ctx.user("user@example.com").await;
        let (other, other_token) = ctx.user("other@example.com").await;
        ctx.store.insert_attribute(AttributeKind::Ingredient, owner, "pepper").await.unwrap();
        let app = test_app!(ctx);

        let mut payload = sample();
        payload["ingredients"] = json!([{ "name": "pepper" }]);

        for auth in [&token, &other_token] {
            let req = test::TestRequest::post()
                .uri(RECIPES_URL)
                .insert_header(("Authorization", auth.as_str()))
                .set_json(payload.clone())
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let mine = ctx.store.list_attributes(AttributeKind::Ingredient, owner).await.unwrap();
        let theirs = ctx.store.list_attributes(AttributeKind::Ingredient, other).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(theirs.len(), 1);
        assert_ne!(mine[0].id, theirs[0].id);
    }

    #[actix_rt::test]
    async fn test_patch_tags_replace_and_clear() {
        let ctx = TestContext::new();
        let (_, token) = ctx.user("user@example.com").await;
        let app = test_app!(ctx);

        let mut payload = sample();
        payload["tags"] = json!([{ "name": "A" }, { "name": "B" }]);
        let req = test::TestRequest::post()
            .uri(RECIPES_URL)
            .insert_header(("Authorization", token.as_str()))
            .set_json(payload)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["recipe"]["id"].as_str().unwrap().to_string();

        let patch = |value: Value| {
            test::TestRequest::patch()
                .uri(&detail_url(&id))
                .insert_header(("Authorization", token.as_str()))
                .set_json(value)
                .to_request()
        };

        let body: Value = test::call_and_read_body_json(&app, patch(json!({ "title": "updated title" }))).await;
        assert_eq!(body["recipe"]["title"], "updated title");
        assert_eq!(body["recipe"]["description"], "Description test");
        assert_eq!(tag_names(&body["recipe"]), vec!["A", "B"]);

        let body: Value = test::call_and_read_body_json(&app, patch(json!({ "tags": [{ "name": "C" }] }))).await;
        assert_eq!(tag_names(&body["recipe"]), vec!["C"]);

        let body: Value = test::call_and_read_body_json(&app, patch(json!({ "tags": [] }))).await;
        assert!(body["recipe"]["tags"].as_array().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_full_update_and_owner_unchanged() {
        let ctx = TestContext::new();
        let (owner, token) = ctx.user("user@example.com").await;
        let (other, _) = ctx.user("t@example.com").await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri(RECIPES_URL)
            .insert_header(("Authorization", token.as_str()))
            .set_json(sample())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["recipe"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::put()
            .uri(&detail_url(&id))
            .insert_header(("Authorization", token.as_str()))
            .set_json(json!({
                "title": "updatedTitle",
                "time_minutes": 10,
                "price": 10.2,
                "description": "Updated Description test",
                "link": "http://updatedexample.com/recipe",
                "user": other.to_hex()
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["recipe"]["price"], "10.20");
        assert_eq!(body["recipe"]["time_minutes"], 10);

        let recipe_id = crate::api::parse_id(&id, "Recipe").unwrap();
        let stored = ctx.store.find_recipe(owner, recipe_id).await.unwrap().unwrap();
        assert_eq!(stored.user_id, owner);
        assert_eq!(stored.title, "updatedTitle");

        // PUT sem os campos obrigatórios
        let req = test::TestRequest::put()
            .uri(&detail_url(&id))
            .insert_header(("Authorization", token.as_str()))
            .set_json(json!({ "title": "only title" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert!(body["fields"]["price"].is_array());
    }

    #[actix_rt::test]
    async fn test_other_users_recipe_is_not_found() {
        let ctx = TestContext::new();
        let (owner, owner_token) = ctx.user("owner@example.com").await;
        let (_, token) = ctx.user("user@example.com").await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri(RECIPES_URL)
            .insert_header(("Authorization", owner_token.as_str()))
            .set_json(sample())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["recipe"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&detail_url(&id))
            .insert_header(("Authorization", token.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::patch()
            .uri(&detail_url(&id))
            .insert_header(("Authorization", token.as_str()))
            .set_json(json!({ "title": "hijacked" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete()
            .uri(&detail_url(&id))
            .insert_header(("Authorization", token.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let recipe_id = crate::api::parse_id(&id, "Recipe").unwrap();
        let stored = ctx.store.find_recipe(owner, recipe_id).await.unwrap().unwrap();
        assert_eq!(stored.title, "recipeTestTitle");

        // Id malformado se comporta como inexistente
        let req = test::TestRequest::get()
            .uri(&detail_url("not-an-id"))
            .insert_header(("Authorization", token.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_delete_recipe() {
        let ctx = TestContext::new();
        let (owner, token) = ctx.user("user@example.com").await;
        let app = test_app!(ctx);

        let req = test::TestRequest::post()
            .uri(RECIPES_URL)
            .insert_header(("Authorization", token.as_str()))
            .set_json(sample())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["recipe"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::delete()
            .uri(&detail_url(&id))
            .insert_header(("Authorization", token.as_str()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
        assert!(ctx.store.list_recipes(owner).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_invalid_payloads_rejected() {
        let ctx = TestContext::new();
        let (owner, token) = ctx.user("user@example.com").await;
        let app = test_app!(ctx);

        let mut payload = sample();
        payload["tags"] = json!([{ "name": "" }]);
        let req = test::TestRequest::post()
            .uri(RECIPES_URL)
            .insert_header(("Authorization", token.as_str()))
            .set_json(payload)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
        assert!(body["fields"]["tags[0].name"].is_array());

        let mut payload = sample();
        payload["title"] = Value::Null;
        payload["tags"] = Value::Null;
        let req = test::TestRequest::post()
            .uri(RECIPES_URL)
            .insert_header(("Authorization", token.as_str()))
            .set_json(payload)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["fields"]["title"][0], "This field may not be null.");
        assert_eq!(body["fields"]["tags"][0], "This field may not be null.");

        let req = test::TestRequest::post()
            .uri(RECIPES_URL)
            .insert_header(("Authorization", token.as_str()))
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        assert!(ctx.store.list_recipes(owner).await.unwrap().is_empty());
    }
}
