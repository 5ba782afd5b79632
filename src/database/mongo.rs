use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};

use super::{EntityStore, StoreError};
use crate::models::{Attribute, AttributeKind, Recipe, RecipeChanges, User, UserChanges};

const DUPLICATE_KEY: i32 = 11000;
const DEFAULT_DATABASE: &str = "recipes";

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn new(uri: &str) -> Result<Self, StoreError> {
        let mut client_options = ClientOptions::parse(uri)
            .await
            .map_err(backend)?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let db_name = database_name(&client_options);
        let client = Client::with_options(client_options).map_err(backend)?;

        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await.map_err(backend)?;

        let store = Self { db };
        store.ensure_indexes().await?;

        Ok(store)
    }

    /// Cria os índices únicos que garantem email e (dono, nome) sem duplicatas
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();

        let users_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(unique())
            .build();
        self.users().create_index(users_index).await.map_err(backend)?;
        log::info!("   ✅ Index ready: users(email) unique");

        for kind in [AttributeKind::Tag, AttributeKind::Ingredient] {
            let index = IndexModel::builder()
                .keys(doc! { "user_id": 1, "name": 1 })
                .options(unique())
                .build();
            self.attributes(kind).create_index(index).await.map_err(backend)?;
            log::info!("   ✅ Index ready: {}(user_id, name) unique", kind.collection());
        }

        let recipes_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "_id": -1 })
            .build();

        match self.recipes().create_index(recipes_index).await {
            Ok(_) => log::info!("   ✅ Index ready: recipes(user_id, _id)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn recipes(&self) -> Collection<Recipe> {
        self.db.collection("recipes")
    }

    fn attributes(&self, kind: AttributeKind) -> Collection<Attribute> {
        self.db.collection(kind.collection())
    }
}

/// Database do path da URI (`mongodb://host/<db>`), ou "recipes" sem path
fn database_name(options: &ClientOptions) -> String {
    options
        .default_database
        .clone()
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
}

fn backend(e: mongodb::error::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Traduz a violação de índice único em `Conflict`
fn write_error(e: mongodb::error::Error, what: &str) -> StoreError {
    if is_duplicate_key(&e) {
        StoreError::Conflict(format!("{} already exists", what))
    } else {
        backend(e)
    }
}

fn set_document(changes: &RecipeChanges) -> Document {
    let mut set = doc! { "updated_at": changes.updated_at };

    if let Some(title) = &changes.title {
        set.insert("title", title.as_str());
    }
    if let Some(time_minutes) = changes.time_minutes {
        set.insert("time_minutes", time_minutes);
    }
    if let Some(price) = changes.price {
        set.insert("price", price.to_string());
    }
    if let Some(link) = &changes.link {
        set.insert("link", link.as_str());
    }
    if let Some(description) = &changes.description {
        set.insert("description", description.as_str());
    }
    if let Some(image) = &changes.image {
        let value = match image {
            Some(image) => Bson::String(image.clone()),
            None => Bson::Null,
        };
        set.insert("image", value);
    }
    if let Some(tag_ids) = &changes.tag_ids {
        set.insert("tag_ids", tag_ids.clone());
    }
    if let Some(ingredient_ids) = &changes.ingredient_ids {
        set.insert("ingredient_ids", ingredient_ids.clone());
    }

    set
}

#[async_trait]
impl EntityStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await.map_err(backend)?;
        Ok(())
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        self.users()
            .insert_one(&user)
            .await
            .map_err(|e| write_error(e, "user with this email"))?;
        Ok(user)
    }

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        self.users().find_one(doc! { "_id": id }).await.map_err(backend)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.users().find_one(doc! { "email": email }).await.map_err(backend)
    }

    async fn update_user(&self, id: ObjectId, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut set = doc! { "updated_at": mongodb::bson::DateTime::now() };
        if let Some(name) = changes.name {
            set.insert("name", name);
        }
        if let Some(password) = changes.password {
            set.insert("password", password);
        }

        self.users()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend)
    }

    async fn insert_recipe(&self, recipe: Recipe) -> Result<Recipe, StoreError> {
        self.recipes().insert_one(&recipe).await.map_err(backend)?;
        Ok(recipe)
    }

    async fn find_recipe(&self, owner: ObjectId, id: ObjectId) -> Result<Option<Recipe>, StoreError> {
        self.recipes()
            .find_one(doc! { "_id": id, "user_id": owner })
            .await
            .map_err(backend)
    }

    async fn list_recipes(&self, owner: ObjectId) -> Result<Vec<Recipe>, StoreError> {
        let cursor = self
            .recipes()
            .find(doc! { "user_id": owner })
            .sort(doc! { "_id": -1 })
            .await
            .map_err(backend)?;

        cursor.try_collect().await.map_err(backend)
    }

    async fn update_recipe(
        &self,
        owner: ObjectId,
        id: ObjectId,
        changes: RecipeChanges,
    ) -> Result<Option<Recipe>, StoreError> {
        self.recipes()
            .find_one_and_update(
                doc! { "_id": id, "user_id": owner },
                doc! { "$set": set_document(&changes) },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend)
    }

    async fn delete_recipe(&self, owner: ObjectId, id: ObjectId) -> Result<bool, StoreError> {
        let result = self
            .recipes()
            .delete_one(doc! { "_id": id, "user_id": owner })
            .await
            .map_err(backend)?;

        Ok(result.deleted_count > 0)
    }

    async fn find_attribute(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        name: &str,
    ) -> Result<Option<Attribute>, StoreError> {
        self.attributes(kind)
            .find_one(doc! { "user_id": owner, "name": name })
            .await
            .map_err(backend)
    }

    async fn insert_attribute(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        name: &str,
    ) -> Result<Attribute, StoreError> {
        let attribute = Attribute {
            id: ObjectId::new(),
            user_id: owner,
            name: name.to_string(),
        };

        self.attributes(kind)
            .insert_one(&attribute)
            .await
            .map_err(|e| write_error(e, &format!("{} '{}'", kind, name)))?;

        Ok(attribute)
    }

    async fn find_attributes(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        ids: &[ObjectId],
    ) -> Result<Vec<Attribute>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .attributes(kind)
            .find(doc! { "_id": { "$in": ids.to_vec() }, "user_id": owner })
            .await
            .map_err(backend)?;

        cursor.try_collect().await.map_err(backend)
    }

    async fn list_attributes(&self, kind: AttributeKind, owner: ObjectId) -> Result<Vec<Attribute>, StoreError> {
        let cursor = self
            .attributes(kind)
            .find(doc! { "user_id": owner })
            .sort(doc! { "name": -1 })
            .await
            .map_err(backend)?;

        cursor.try_collect().await.map_err(backend)
    }

    async fn rename_attribute(
        &self,
        kind: AttributeKind,
        owner: ObjectId,
        id: ObjectId,
        name: &str,
    ) -> Result<Option<Attribute>, StoreError> {
        self.attributes(kind)
            .find_one_and_update(
                doc! { "_id": id, "user_id": owner },
                doc! { "$set": { "name": name } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| write_error(e, &format!("{} '{}'", kind, name)))
    }

    async fn delete_attribute(&self, kind: AttributeKind, owner: ObjectId, id: ObjectId) -> Result<bool, StoreError> {
        let result = self
            .attributes(kind)
            .delete_one(doc! { "_id": id, "user_id": owner })
            .await
            .map_err(backend)?;

        if result.deleted_count == 0 {
            return Ok(false);
        }

        let mut pull = Document::new();
        pull.insert(kind.recipe_field(), id);

        self.recipes()
            .update_many(doc! { "user_id": owner }, doc! { "$pull": pull })
            .await
            .map_err(backend)?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Price;

    #[test]
    fn test_set_document_only_touches_present_fields() {
        let changes = RecipeChanges {
            title: Some("Soup".to_string()),
            tag_ids: Some(vec![]),
            updated_at: 42,
            ..Default::default()
        };

        let set = set_document(&changes);
        assert_eq!(set.get_str("title").unwrap(), "Soup");
        assert_eq!(set.get_i64("updated_at").unwrap(), 42);
        assert!(set.get_array("tag_ids").unwrap().is_empty());
        assert!(!set.contains_key("ingredient_ids"));
        assert!(!set.contains_key("price"));
        assert!(!set.contains_key("user_id"));
    }

    #[test]
    fn test_set_document_price_and_image() {
        let changes = RecipeChanges {
            price: Some(Price::from_cents(550)),
            image: Some(None),
            ..Default::default()
        };

        let set = set_document(&changes);
        assert_eq!(set.get_str("price").unwrap(), "5.50");
        assert_eq!(set.get("image"), Some(&Bson::Null));
    }

    #[tokio::test]
    async fn test_database_name_from_uri() {
        let cases = [
            ("mongodb://mongo", "recipes"),
            ("mongodb://h1,h2", "recipes"),
            ("mongodb://localhost:27017/kitchen", "kitchen"),
            ("mongodb://user:pass@h1:27017,h2:27017/kitchen?replicaSet=rs0", "kitchen"),
        ];

        for (uri, expected) in cases {
            let options = ClientOptions::parse(uri).await.unwrap();
            assert_eq!(database_name(&options), expected, "{}", uri);
        }
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_attribute_uniqueness() {
        dotenv::dotenv().ok();

        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/recipes_test".to_string());
        let store = MongoStore::new(&uri).await.unwrap();
        let owner = ObjectId::new();

        store.insert_attribute(AttributeKind::Tag, owner, "vegan").await.unwrap();
        let second = store.insert_attribute(AttributeKind::Tag, owner, "vegan").await;
        assert!(matches!(second, Err(StoreError::Conflict(_))));

        let other = store.insert_attribute(AttributeKind::Tag, ObjectId::new(), "vegan").await;
        assert!(other.is_ok());
    }
}
