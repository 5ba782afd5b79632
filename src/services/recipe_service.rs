use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;

use super::attribute_service::{clean_descriptors, reconcile};
use crate::database::EntityStore;
use crate::models::{Attribute, AttributeKind, Descriptor, Price, Recipe, RecipeChanges, RecipePayload, RecipeView};
use crate::utils::{clean_name, too_long, AppError, ValidationErrors, MAX_NAME_LENGTH, NULL, REQUIRED};

/// PUT exige os campos obrigatórios, PATCH não
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Full,
    Partial,
}

/// Payload validado, pronto para escrita
#[derive(Debug, Default)]
struct CleanRecipe {
    title: Option<String>,
    time_minutes: Option<i32>,
    price: Option<Price>,
    link: Option<String>,
    description: Option<String>,
    image: Option<Option<String>>,
    tags: Option<Vec<String>>,
    ingredients: Option<Vec<String>>,
}

fn clean_payload(payload: &RecipePayload, mode: WriteMode) -> Result<CleanRecipe, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut clean = CleanRecipe::default();
    let require = mode == WriteMode::Full;

    match &payload.title {
        Some(Some(title)) => clean.title = clean_name(&mut errors, "title", title),
        Some(None) => errors.add("title", NULL),
        None if require => errors.add("title", REQUIRED),
        None => {}
    }

    match payload.time_minutes {
        Some(Some(minutes)) if minutes < 1 => {
            errors.add("time_minutes", "Ensure this value is greater than or equal to 1.")
        }
        Some(Some(minutes)) => match i32::try_from(minutes) {
            Ok(minutes) => clean.time_minutes = Some(minutes),
            Err(_) => errors.add(
                "time_minutes",
                format!("Ensure this value is less than or equal to {}.", i32::MAX),
            ),
        },
        Some(None) => errors.add("time_minutes", NULL),
        None if require => errors.add("time_minutes", REQUIRED),
        None => {}
    }

    match &payload.price {
        Some(Some(input)) => match input.parse() {
            Ok(price) => clean.price = Some(price),
            Err(message) => errors.add("price", message),
        },
        Some(None) => errors.add("price", NULL),
        None if require => errors.add("price", REQUIRED),
        None => {}
    }

    if let Some(link) = &payload.link {
        let link = link.trim();
        if link.chars().count() > MAX_NAME_LENGTH {
            errors.add("link", too_long(MAX_NAME_LENGTH));
        } else {
            clean.link = Some(link.to_string());
        }
    }

    if let Some(description) = &payload.description {
        clean.description = Some(description.trim().to_string());
    }

    if let Some(image) = &payload.image {
        let image = image.trim();
        clean.image = Some((!image.is_empty()).then(|| image.to_string()));
    }

    clean.tags = clean_descriptor_field("tags", payload.tags.as_ref(), &mut errors);
    clean.ingredients = clean_descriptor_field("ingredients", payload.ingredients.as_ref(), &mut errors);

    errors.into_result()?;
    Ok(clean)
}

/// `None` mantém o conjunto atual; `null` explícito é rejeitado
fn clean_descriptor_field(
    field: &str,
    descriptors: Option<&Option<Vec<Descriptor>>>,
    errors: &mut ValidationErrors,
) -> Option<Vec<String>> {
    match descriptors {
        Some(Some(descriptors)) => Some(clean_descriptors(field, descriptors, errors)),
        Some(None) => {
            errors.add(field, NULL);
            None
        }
        None => None,
    }
}

fn ids(attributes: &[Attribute]) -> Vec<ObjectId> {
    attributes.iter().map(|a| a.id).collect()
}

async fn reconcile_optional(
    store: &dyn EntityStore,
    kind: AttributeKind,
    owner: ObjectId,
    names: Option<&Vec<String>>,
) -> Result<Option<Vec<ObjectId>>, AppError> {
    match names {
        Some(names) => Ok(Some(ids(&reconcile(store, kind, owner, names).await?))),
        None => Ok(None),
    }
}

/// Carrega tags e ingredientes de várias receitas com uma consulta por tipo
async fn load_views(
    store: &dyn EntityStore,
    owner: ObjectId,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeView>, AppError> {
    let mut by_kind: HashMap<AttributeKind, HashMap<ObjectId, Attribute>> = HashMap::new();

    for kind in [AttributeKind::Tag, AttributeKind::Ingredient] {
        let mut wanted: Vec<ObjectId> = recipes
            .iter()
            .flat_map(|r| r.attribute_ids(kind).iter().copied())
            .collect();
        wanted.sort();
        wanted.dedup();

        let found = store.find_attributes(kind, owner, &wanted).await?;
        by_kind.insert(kind, found.into_iter().map(|a| (a.id, a)).collect());
    }

    let pick = |kind: AttributeKind, recipe: &Recipe| -> Vec<Attribute> {
        let known = &by_kind[&kind];
        recipe
            .attribute_ids(kind)
            .iter()
            .filter_map(|id| known.get(id).cloned())
            .collect()
    };

    Ok(recipes
        .into_iter()
        .map(|recipe| RecipeView {
            tags: pick(AttributeKind::Tag, &recipe),
            ingredients: pick(AttributeKind::Ingredient, &recipe),
            recipe,
        })
        .collect())
}

async fn load_view(store: &dyn EntityStore, owner: ObjectId, recipe: Recipe) -> Result<RecipeView, AppError> {
    load_views(store, owner, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))
}

/// Cria a receita com o usuário autenticado como dono.
///
/// Tudo é validado antes da primeira escrita; a receita e seus conjuntos de
/// atributos são gravados num único insert.
pub async fn create_recipe(
    store: &dyn EntityStore,
    owner: ObjectId,
    payload: &RecipePayload,
) -> Result<RecipeView, AppError> {
    let clean = clean_payload(payload, WriteMode::Full)?;

    let tags = reconcile(store, AttributeKind::Tag, owner, clean.tags.as_deref().unwrap_or_default()).await?;
    let ingredients = reconcile(
        store,
        AttributeKind::Ingredient,
        owner,
        clean.ingredients.as_deref().unwrap_or_default(),
    )
    .await?;

    let now = chrono::Utc::now().timestamp();
    let recipe = Recipe {
        id: ObjectId::new(),
        user_id: owner,
        title: clean.title.unwrap_or_default(),
        time_minutes: clean.time_minutes.unwrap_or_default(),
        price: clean.price.unwrap_or_default(),
        link: clean.link.unwrap_or_default(),
        description: clean.description.unwrap_or_default(),
        image: clean.image.flatten(),
        tag_ids: ids(&tags),
        ingredient_ids: ids(&ingredients),
        created_at: now,
        updated_at: now,
    };

    let recipe = store.insert_recipe(recipe).await?;

    Ok(RecipeView {
        recipe,
        tags,
        ingredients,
    })
}

/// Atualiza campos escalares e, quando presentes no payload, substitui os
/// conjuntos de tags/ingredientes. O dono nunca muda.
pub async fn update_recipe(
    store: &dyn EntityStore,
    owner: ObjectId,
    id: ObjectId,
    payload: &RecipePayload,
    mode: WriteMode,
) -> Result<RecipeView, AppError> {
    let clean = clean_payload(payload, mode)?;

    // Sem registro do dono, nada é criado
    if store.find_recipe(owner, id).await?.is_none() {
        return Err(AppError::NotFound("Recipe not found".to_string()));
    }

    let tag_ids = reconcile_optional(store, AttributeKind::Tag, owner, clean.tags.as_ref()).await?;
    let ingredient_ids = reconcile_optional(store, AttributeKind::Ingredient, owner, clean.ingredients.as_ref()).await?;

    let changes = RecipeChanges {
        title: clean.title,
        time_minutes: clean.time_minutes,
        price: clean.price,
        link: clean.link,
        description: clean.description,
        image: clean.image,
        tag_ids,
        ingredient_ids,
        updated_at: chrono::Utc::now().timestamp(),
    };

    let recipe = store
        .update_recipe(owner, id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    load_view(store, owner, recipe).await
}

pub async fn get_recipe(store: &dyn EntityStore, owner: ObjectId, id: ObjectId) -> Result<RecipeView, AppError> {
    let recipe = store
        .find_recipe(owner, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    load_view(store, owner, recipe).await
}

pub async fn list_recipes(store: &dyn EntityStore, owner: ObjectId) -> Result<Vec<RecipeView>, AppError> {
    let recipes = store.list_recipes(owner).await?;
    load_views(store, owner, recipes).await
}

pub async fn delete_recipe(store: &dyn EntityStore, owner: ObjectId, id: ObjectId) -> Result<(), AppError> {
    if store.delete_recipe(owner, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound("Recipe not found".to_string()))
    }
}
