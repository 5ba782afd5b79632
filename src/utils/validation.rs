use serde::Serialize;
use std::collections::BTreeMap;

/// Limite de tamanho dos campos de texto curtos (título, link, nomes)
pub const MAX_NAME_LENGTH: usize = 255;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NULL: &str = "This field may not be null.";

/// Erros de validação agrupados por campo
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Converte em `Err` quando há pelo menos um erro registrado
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

/// Valida um campo de texto curto obrigatório e devolve o valor já aparado.
///
/// Espaços nas extremidades são removidos antes da checagem, então `"  "`
/// conta como vazio.
pub fn clean_name(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
) -> Option<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        errors.add(field, BLANK);
        return None;
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        errors.add(field, too_long(MAX_NAME_LENGTH));
        return None;
    }

    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_trims() {
        let mut errors = ValidationErrors::new();
        assert_eq!(clean_name(&mut errors, "name", "  vegan "), Some("vegan".to_string()));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_clean_name_rejects_blank_and_long() {
        let mut errors = ValidationErrors::new();
        assert_eq!(clean_name(&mut errors, "a", "   "), None);
        assert_eq!(clean_name(&mut errors, "b", &"x".repeat(MAX_NAME_LENGTH + 1)), None);

        assert_eq!(errors.get("a"), Some(&[BLANK.to_string()][..]));
        assert_eq!(errors.get("b"), Some(&[too_long(MAX_NAME_LENGTH)][..]));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_clean_name_accepts_max_length() {
        let mut errors = ValidationErrors::new();
        let name = "x".repeat(MAX_NAME_LENGTH);
        assert_eq!(clean_name(&mut errors, "name", &name), Some(name));
        assert!(errors.into_result().is_ok());
    }
}
