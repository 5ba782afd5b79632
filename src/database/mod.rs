mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::fmt;

use crate::models::{Attribute, AttributeKind, Recipe, RecipeChanges, User, UserChanges};

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Violação de unicidade (email do usuário, (dono, nome) de atributo)
    Conflict(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            StoreError::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistência de usuários, receitas, tags e ingredientes.
///
/// Toda consulta de receita ou atributo é filtrada pelo dono: um registro de
/// outro usuário se comporta exatamente como um registro inexistente.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    // ==================== USERS ====================

    /// Falha com `Conflict` se o email já existe
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;
    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn update_user(&self, id: ObjectId, changes: UserChanges) -> Result<Option<User>, StoreError>;

    // ==================== RECIPES ====================

    async fn insert_recipe(&self, recipe: Recipe) -> Result<Recipe, StoreError>;
    async fn find_recipe(&self, owner: ObjectId, id: ObjectId) -> Result<Option<Recipe>, StoreError>;
    /// Receitas do dono, id decrescente
    async fn list_recipes(&self, owner: ObjectId) -> Result<Vec<Recipe>, StoreError>;
    /// Aplica todas as alterações numa única operação atômica
    async fn update_recipe(
        &self,
        owner: ObjectId,
        id: ObjectId,
        changes: RecipeChanges,
    ) -> Result<Option<Recipe>, StoreError>;
    async fn delete_recipe(&self, owner: ObjectId, id: ObjectId) -> Result<bool, StoreError>;

    // ==================== ATTRIBUTES ====================

    async fn find_attribute(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        name: &str,
    ) -> Result<Option<Attribute>, StoreError>;
    /// Falha com `Conflict` se (dono, nome) já existe
    async fn insert_attribute(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        name: &str,
    ) -> Result<Attribute, StoreError>;
    /// Busca por ids; ids de outro dono ou inexistentes são omitidos
    async fn find_attributes(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        ids: &[ObjectId],
    ) -> Result<Vec<Attribute>, StoreError>;
    /// Atributos do dono, nome decrescente
    async fn list_attributes(&self, kind: AttributeKind, owner: ObjectId) -> Result<Vec<Attribute>, StoreError>;
    async fn rename_attribute(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        id: ObjectId,
        name: &str,
    ) -> Result<Option<Attribute>, StoreError>;
    /// Remove o registro e o desvincula de todas as receitas do dono
    async fn delete_attribute(&self, kind: AttributeKind, owner: ObjectId, id: ObjectId) -> Result<bool, StoreError>;
}
