use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tipos de atributo que uma receita pode carregar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    pub fn collection(&self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }

    /// Campo do documento da receita que guarda os ids deste tipo
    pub fn recipe_field(&self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag_ids",
            AttributeKind::Ingredient => "ingredient_ids",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Tag => write!(f, "tag"),
            AttributeKind::Ingredient => write!(f, "ingredient"),
        }
    }
}

/// Tag ou ingrediente; (user_id, name) é único por tipo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub name: String,
}

/// `{name}` vindo do payload de uma receita
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct Descriptor {
    #[serde(default)]
    pub name: Option<String>,
}

impl Descriptor {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateAttributeRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AttributeResponse {
    pub id: String,
    pub name: String,
}

impl From<Attribute> for AttributeResponse {
    fn from(attribute: Attribute) -> Self {
        AttributeResponse {
            id: attribute.id.to_hex(),
            name: attribute.name,
        }
    }
}
