use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};

use super::attribute::{Attribute, AttributeKind, AttributeResponse, Descriptor};
use super::price::{Price, PriceInput};

/// Receita (armazenada no MongoDB)
///
/// Tags e ingredientes ficam embutidos como listas de ids, então qualquer
/// escrita na receita troca campos escalares e conjuntos de uma vez só.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// Dono da receita, nunca muda depois da criação
    pub user_id: ObjectId,

    pub title: String,

    /// Tempo de preparo em minutos
    pub time_minutes: i32,

    pub price: Price,

    #[serde(default)]
    pub link: String,

    #[serde(default)]
    pub description: String,

    /// Referência opaca para a imagem (o armazenamento é externo)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<String>,

    #[serde(default)]
    pub tag_ids: Vec<ObjectId>,

    #[serde(default)]
    pub ingredient_ids: Vec<ObjectId>,

    /// Timestamp de criação (Unix timestamp)
    pub created_at: i64,

    /// Timestamp de última atualização
    pub updated_at: i64,
}

impl Recipe {
    pub fn attribute_ids(&self, kind: AttributeKind) -> &[ObjectId] {
        match kind {
            AttributeKind::Tag => &self.tag_ids,
            AttributeKind::Ingredient => &self.ingredient_ids,
        }
    }

    pub fn attribute_ids_mut(&mut self, kind: AttributeKind) -> &mut Vec<ObjectId> {
        match kind {
            AttributeKind::Tag => &mut self.tag_ids,
            AttributeKind::Ingredient => &mut self.ingredient_ids,
        }
    }
}

/// Alterações já validadas, aplicadas numa única escrita
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` remove a imagem
    pub image: Option<Option<String>>,
    pub tag_ids: Option<Vec<ObjectId>>,
    pub ingredient_ids: Option<Vec<ObjectId>>,
    pub updated_at: i64,
}

impl RecipeChanges {
    pub fn apply(&self, recipe: &mut Recipe) {
        if let Some(title) = &self.title {
            recipe.title = title.clone();
        }
        if let Some(time_minutes) = self.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(price) = self.price {
            recipe.price = price;
        }
        if let Some(link) = &self.link {
            recipe.link = link.clone();
        }
        if let Some(description) = &self.description {
            recipe.description = description.clone();
        }
        if let Some(image) = &self.image {
            recipe.image = image.clone();
        }
        if let Some(tag_ids) = &self.tag_ids {
            recipe.tag_ids = tag_ids.clone();
        }
        if let Some(ingredient_ids) = &self.ingredient_ids {
            recipe.ingredient_ids = ingredient_ids.clone();
        }
        recipe.updated_at = self.updated_at;
    }
}

/// Distingue chave ausente (`None`) de `null` explícito (`Some(None)`)
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Payload de criação/atualização de receita.
///
/// Chaves desconhecidas (inclusive `user`) são ignoradas. `tags` ausente
/// deixa o conjunto atual intacto; `tags: []` limpa o conjunto. Nos campos
/// com `Option<Option<_>>`, `null` explícito é erro de validação.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct RecipePayload {
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>)]
    pub time_minutes: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, example = "5.50")]
    pub price: Option<Option<PriceInput>>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Vec<Descriptor>>)]
    pub tags: Option<Option<Vec<Descriptor>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Vec<Descriptor>>)]
    pub ingredients: Option<Option<Vec<Descriptor>>>,
}

/// Item compacto usado na listagem
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RecipeListItem {
    pub id: String,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.50")]
    pub price: Price,
    pub link: String,
    pub tags: Vec<AttributeResponse>,
    pub ingredients: Vec<AttributeResponse>,
}

/// Receita completa (detalhe, criação e atualização)
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RecipeResponse {
    pub id: String,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.50")]
    pub price: Price,
    pub link: String,
    pub description: String,
    pub image: Option<String>,
    pub tags: Vec<AttributeResponse>,
    pub ingredients: Vec<AttributeResponse>,
}

/// Receita junto dos atributos já resolvidos
#[derive(Debug, Clone)]
pub struct RecipeView {
    pub recipe: Recipe,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
}

impl From<RecipeView> for RecipeListItem {
    fn from(view: RecipeView) -> Self {
        RecipeListItem {
            id: view.recipe.id.to_hex(),
            title: view.recipe.title,
            time_minutes: view.recipe.time_minutes,
            price: view.recipe.price,
            link: view.recipe.link,
            tags: view.tags.into_iter().map(AttributeResponse::from).collect(),
            ingredients: view.ingredients.into_iter().map(AttributeResponse::from).collect(),
        }
    }
}

impl From<RecipeView> for RecipeResponse {
    fn from(view: RecipeView) -> Self {
        RecipeResponse {
            id: view.recipe.id.to_hex(),
            title: view.recipe.title,
            time_minutes: view.recipe.time_minutes,
            price: view.recipe.price,
            link: view.recipe.link,
            description: view.recipe.description,
            image: view.recipe.image,
            tags: view.tags.into_iter().map(AttributeResponse::from).collect(),
            ingredients: view.ingredients.into_iter().map(AttributeResponse::from).collect(),
        }
    }
}
