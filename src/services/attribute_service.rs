use mongodb::bson::oid::ObjectId;

use crate::database::{EntityStore, StoreError};
use crate::models::{Attribute, AttributeKind, Descriptor};
use crate::utils::{clean_name, AppError, ValidationErrors, REQUIRED};

const RESOLVE_ATTEMPTS: usize = 3;

/// Valida uma lista de descritores e devolve os nomes limpos, sem repetição.
///
/// Os erros vão para `errors` com a chave `<field>[<i>].name`; a ordem da
/// primeira ocorrência de cada nome é preservada.
pub fn clean_descriptors(field: &str, descriptors: &[Descriptor], errors: &mut ValidationErrors) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(descriptors.len());

    for (index, descriptor) in descriptors.iter().enumerate() {
        let key = format!("{}[{}].name", field, index);

        let Some(raw) = descriptor.name.as_deref() else {
            errors.add(key, REQUIRED);
            continue;
        };

        if let Some(name) = clean_name(errors, &key, raw) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    names
}

/// Resolve um nome em um registro do dono, criando-o se preciso.
///
/// Se outra requisição criar o mesmo (dono, nome) entre a busca e a inserção,
/// o índice único rejeita a segunda inserção e a busca é refeita. Se o
/// vencedor sumir antes dessa busca, a inserção é tentada de novo.
pub async fn resolve(
    store: &dyn EntityStore,
    kind: AttributeKind,
    owner: ObjectId,
    name: &str,
) -> Result<Attribute, AppError> {
    for attempt in 1..=RESOLVE_ATTEMPTS {
        if let Some(existing) = store.find_attribute(kind, owner, name).await? {
            return Ok(existing);
        }

        match store.insert_attribute(kind, owner, name).await {
            Ok(created) => {
                log::debug!("➕ Created {} '{}' for user {}", kind, name, owner);
                return Ok(created);
            }
            Err(StoreError::Conflict(_)) => {
                log::warn!(
                    "⚠️  Concurrent creation of {} '{}' for user {} (attempt {}), reusing winner",
                    kind,
                    name,
                    owner,
                    attempt
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(format!(
        "{} '{}' could not be resolved after {} attempts",
        kind, name, RESOLVE_ATTEMPTS
    )))
}

/// Resolve nomes já validados; o resultado tem um registro por nome.
pub async fn reconcile(
    store: &dyn EntityStore,
    kind: AttributeKind,
    owner: ObjectId,
    names: &[String],
) -> Result<Vec<Attribute>, AppError> {
    let mut resolved = Vec::with_capacity(names.len());

    for name in names {
        let attribute = resolve(store, kind, owner, name).await?;
        if !resolved.iter().any(|a: &Attribute| a.id == attribute.id) {
            resolved.push(attribute);
        }
    }

    Ok(resolved)
}

pub async fn list_attributes(
    store: &dyn EntityStore,
    kind: AttributeKind,
    owner: ObjectId,
) -> Result<Vec<Attribute>, AppError> {
    Ok(store.list_attributes(kind, owner).await?)
}

pub async fn rename_attribute(
    store: &dyn EntityStore,
    kind: AttributeKind,
    owner: ObjectId,
    id: ObjectId,
    name: Option<&str>,
) -> Result<Attribute, AppError> {
    let mut errors = ValidationErrors::new();
    let name = match name {
        Some(raw) => clean_name(&mut errors, "name", raw),
        None => {
            errors.add("name", REQUIRED);
            None
        }
    };
    errors.into_result()?;

    let name = name.unwrap_or_default();
    store
        .rename_attribute(kind, owner, id, &name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", kind)))
}

pub async fn delete_attribute(
    store: &dyn EntityStore,
    kind: AttributeKind,
    owner: ObjectId,
    id: ObjectId,
) -> Result<(), AppError> {
    if store.delete_attribute(kind, owner, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("{} not found", kind)))
    }
}
