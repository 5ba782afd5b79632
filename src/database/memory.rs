use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{EntityStore, StoreError};
use crate::models::{Attribute, AttributeKind, Recipe, RecipeChanges, User, UserChanges};

#[derive(Default)]
struct Tables {
    users: HashMap<ObjectId, User>,
    recipes: HashMap<ObjectId, Recipe>,
    tags: HashMap<ObjectId, Attribute>,
    ingredients: HashMap<ObjectId, Attribute>,
}

impl Tables {
    fn attributes(&self, kind: AttributeKind) -> &HashMap<ObjectId, Attribute> {
        match kind {
            AttributeKind::Tag => &self.tags,
            AttributeKind::Ingredient => &self.ingredients,
        }
    }

    fn attributes_mut(&mut self, kind: AttributeKind) -> &mut HashMap<ObjectId, Attribute> {
        match kind {
            AttributeKind::Tag => &mut self.tags,
            AttributeKind::Ingredient => &mut self.ingredients,
        }
    }

    fn name_taken(&self, kind: AttributeKind, owner: ObjectId, name: &str, except: Option<ObjectId>) -> bool {
        self.attributes(kind)
            .values()
            .any(|a| a.user_id == owner && a.name == name && Some(a.id) != except)
    }
}

/// Store em memória com as mesmas garantias de unicidade do MongoDB.
///
/// Cada operação roda inteira sob o lock, então as escritas são atômicas.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("user with this email already exists".to_string()));
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: ObjectId, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;

        Ok(tables.users.get_mut(&id).map(|user| {
            changes.apply(user);
            user.clone()
        }))
    }

    async fn insert_recipe(&self, recipe: Recipe) -> Result<Recipe, StoreError> {
        self.tables.write().await.recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn find_recipe(&self, owner: ObjectId, id: ObjectId) -> Result<Option<Recipe>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.recipes.get(&id).filter(|r| r.user_id == owner).cloned())
    }

    async fn list_recipes(&self, owner: ObjectId) -> Result<Vec<Recipe>, StoreError> {
        let tables = self.tables.read().await;

        let mut recipes: Vec<Recipe> = tables
            .recipes
            .values()
            .filter(|r| r.user_id == owner)
            .cloned()
            .collect();
        recipes.sort_by(|a, b| b.id.cmp(&a.id));

        Ok(recipes)
    }

    async fn update_recipe(
        &self,
        owner: ObjectId,
        id: ObjectId,
        changes: RecipeChanges,
    ) -> Result<Option<Recipe>, StoreError> {
        let mut tables = self.tables.write().await;

        Ok(tables
            .recipes
            .get_mut(&id)
            .filter(|r| r.user_id == owner)
            .map(|recipe| {
                changes.apply(recipe);
                recipe.clone()
            }))
    }

    async fn delete_recipe(&self, owner: ObjectId, id: ObjectId) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;

        match tables.recipes.get(&id) {
            Some(recipe) if recipe.user_id == owner => {
                tables.recipes.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_attribute(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        name: &str,
    ) -> Result<Option<Attribute>, StoreError> {
        let tables = self.tables.read().await;

        Ok(tables
            .attributes(kind)
            .values()
            .find(|a| a.user_id == owner && a.name == name)
            .cloned())
    }

    async fn insert_attribute(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        name: &str,
    ) -> Result<Attribute, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.name_taken(kind, owner, name, None) {
            return Err(StoreError::Conflict(format!("{} '{}' already exists", kind, name)));
        }

        let attribute = Attribute {
            id: ObjectId::new(),
            user_id: owner,
            name: name.to_string(),
        };
        tables.attributes_mut(kind).insert(attribute.id, attribute.clone());

        Ok(attribute)
    }

    async fn find_attributes(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        ids: &[ObjectId],
    ) -> Result<Vec<Attribute>, StoreError> {
        let tables = self.tables.read().await;
        let attributes = tables.attributes(kind);

        Ok(ids
            .iter()
            .filter_map(|id| attributes.get(id))
            .filter(|a| a.user_id == owner)
            .cloned()
            .collect())
    }

    async fn list_attributes(&self, kind: AttributeKind, owner: ObjectId) -> Result<Vec<Attribute>, StoreError> {
        let tables = self.tables.read().await;

        let mut attributes: Vec<Attribute> = tables
            .attributes(kind)
            .values()
            .filter(|a| a.user_id == owner)
            .cloned()
            .collect();
        attributes.sort_by(|a, b| b.name.cmp(&a.name));

        Ok(attributes)
    }

    async fn rename_attribute(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        id: ObjectId,
        name: &str,
    ) -> Result<Option<Attribute>, StoreError> {
        let mut tables = self.tables.write().await;

        let owned = tables
            .attributes(kind)
            .get(&id)
            .is_some_and(|a| a.user_id == owner);
        if !owned {
            return Ok(None);
        }

        if tables.name_taken(kind, owner, name, Some(id)) {
            return Err(StoreError::Conflict(format!("{} '{}' already exists", kind, name)));
        }

        Ok(tables.attributes_mut(kind).get_mut(&id).map(|attribute| {
            attribute.name = name.to_string();
            attribute.clone()
        }))
    }

    async fn delete_attribute(&self, kind: AttributeKind, owner: ObjectId, id: ObjectId) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;

        let owned = tables
            .attributes(kind)
            .get(&id)
            .is_some_and(|a| a.user_id == owner);
        if !owned {
            return Ok(false);
        }

        tables.attributes_mut(kind).remove(&id);
        for recipe in tables.recipes.values_mut().filter(|r| r.user_id == owner) {
            recipe.attribute_ids_mut(kind).retain(|attached| *attached != id);
        }

        Ok(true)
    }
}
