use std::env;
use std::str::FromStr;

use crate::utils::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::Config(format!(
                "Invalid STORE_BACKEND: {}. Supported: mongodb, memory",
                other
            ))),
        }
    }
}

/// Parâmetros de emissão e validação dos JWT
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: "default-secret-change-me".to_string(),
            issuer: "recipe-service".to_string(),
            audience: "recipe-api".to_string(),
            ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub jwt: JwtSettings,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de lookup (testável sem tocar no ambiente)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let defaults = JwtSettings::default();

        let port = parse("PORT", &var("PORT", "8000"))?;
        let store_backend: StoreBackend = var("STORE_BACKEND", "mongodb").parse()?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        if store_backend == StoreBackend::MongoDb && database_url.is_none() {
            return Err(AppError::Config(
                "DATABASE_URL must be set when STORE_BACKEND=mongodb".to_string(),
            ));
        }

        let ttl_hours: i64 = parse("JWT_TTL_HOURS", &var("JWT_TTL_HOURS", &defaults.ttl_hours.to_string()))?;
        if ttl_hours <= 0 {
            return Err(AppError::Config("JWT_TTL_HOURS must be positive".to_string()));
        }

        let cors_origins = var("CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port,
            store_backend,
            database_url,
            jwt: JwtSettings {
                secret: var("JWT_SECRET", &defaults.secret),
                issuer: var("JWT_ISSUER", &defaults.issuer),
                audience: var("JWT_AUDIENCE", &defaults.audience),
                ttl_hours,
            },
            cors_origins,
        })
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_memory_backend() {
        let config = config(&[("STORE_BACKEND", "memory")]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.jwt.ttl_hours, 24);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000".to_string()]);
    }

    #[test]
    fn test_mongodb_requires_database_url() {
        assert!(matches!(config(&[]), Err(AppError::Config(_))));

        let config = config(&[("DATABASE_URL", "mongodb://localhost:27017/recipes")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::MongoDb);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config(&[("STORE_BACKEND", "memory"), ("PORT", "http")]).is_err());
        assert!(config(&[("STORE_BACKEND", "sqlite")]).is_err());
        assert!(config(&[("STORE_BACKEND", "memory"), ("JWT_TTL_HOURS", "0")]).is_err());
    }

    #[test]
    fn test_cors_origins_split() {
        let config = config(&[
            ("STORE_BACKEND", "memory"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
        ])
        .unwrap();

        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }
}
