use actix_web::{web, HttpResponse};

use super::parse_id;
use crate::database::EntityStore;
use crate::models::{AttributeKind, AttributeResponse, UpdateAttributeRequest};
use crate::services::attribute_service;
use crate::services::auth_service::Claims;
use crate::utils::AppError;

/// Endpoints de tags e ingredientes compartilham os mesmos handlers;
/// cada tipo só define o tipo de atributo e as chaves do envelope JSON.
pub trait AttributeEndpoint: 'static {
    const KIND: AttributeKind;
    const ITEM_KEY: &'static str;
    const LIST_KEY: &'static str;
}

pub struct TagEndpoint;

impl AttributeEndpoint for TagEndpoint {
    const KIND: AttributeKind = AttributeKind::Tag;
    const ITEM_KEY: &'static str = "tag";
    const LIST_KEY: &'static str = "tags";
}

pub struct IngredientEndpoint;

impl AttributeEndpoint for IngredientEndpoint {
    const KIND: AttributeKind = AttributeKind::Ingredient;
    const ITEM_KEY: &'static str = "ingredient";
    const LIST_KEY: &'static str = "ingredients";
}

/// GET /api/recipe/{tags|ingredients} - Ordenado por nome (decrescente)
pub async fn list_attributes<E: AttributeEndpoint>(
    user: web::ReqData<Claims>,
    store: web::Data<dyn EntityStore>,
) -> Result<HttpResponse, AppError> {
    let owner = user.user_id()?;

    let items: Vec<AttributeResponse> = attribute_service::list_attributes(store.get_ref(), E::KIND, owner)
        .await?
        .into_iter()
        .map(AttributeResponse::from)
        .collect();
    let total = items.len();

    let mut response = serde_json::json!({ "success": true, "total": total });
    response[E::LIST_KEY] = serde_json::json!(items);

    Ok(HttpResponse::Ok().json(response))
}

/// PUT/PATCH /api/recipe/{tags|ingredients}/{id} - Renomeia
pub async fn update_attribute<E: AttributeEndpoint>(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    body: web::Json<UpdateAttributeRequest>,
    store: web::Data<dyn EntityStore>,
) -> Result<HttpResponse, AppError> {
    let owner = user.user_id()?;
    let id = parse_id(&path, &capitalized(E::KIND))?;

    let attribute =
        attribute_service::rename_attribute(store.get_ref(), E::KIND, owner, id, body.name.as_deref()).await?;
    log::info!("✏️  {} {} renamed to '{}'", E::KIND, id, attribute.name);

    let mut response = serde_json::json!({ "success": true });
    response[E::ITEM_KEY] = serde_json::json!(AttributeResponse::from(attribute));

    Ok(HttpResponse::Ok().json(response))
}

/// DELETE /api/recipe/{tags|ingredients}/{id} - Também remove das receitas
pub async fn delete_attribute<E: AttributeEndpoint>(
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    store: web::Data<dyn EntityStore>,
) -> Result<HttpResponse, AppError> {
    let owner = user.user_id()?;
    let id = parse_id(&path, &capitalized(E::KIND))?;

    attribute_service::delete_attribute(store.get_ref(), E::KIND, owner, id).await?;
    log::info!("🗑️  {} {} deleted", E::KIND, id);

    Ok(HttpResponse::NoContent().finish())
}

fn capitalized(kind: AttributeKind) -> String {
    let name = kind.to_string();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}
