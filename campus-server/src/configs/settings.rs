use std::env;
use std::net::IpAddr;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::configs::normalize_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub migration_path: Option<String>,
    pub clean_start: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDb {
    pub url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Document store backend, selected by the `backend` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum Store {
    Sqlite(Database),
    Couchdb(CouchDb),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub store: Store,
    pub auth: Auth,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let mut settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(
                Environment::with_prefix("CAMPUS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        if let Store::Sqlite(database) = &mut settings.store {
            if let Some(migrate) = &database.migration_path {
                database.migration_path = if Path::new(migrate).is_dir() {
                    let migrate_path = normalize_path(migrate)
                        .map_err(|e| ConfigError::Message(e.to_string()))?
                        .to_string_lossy()
                        .to_string();

                    Some(migrate_path)
                } else {
                    None
                };
            }
        }

        settings.validate()?;

        Ok(settings)
    }

    /// Checks every recognized option once, so the rest of the server can
    /// rely on them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .host
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::Message(format!("server.host: {e}")))?;

        if self.server.port == 0 {
            return Err(ConfigError::Message("server.port must not be 0".into()));
        }

        if self.auth.secret.trim().is_empty() {
            return Err(ConfigError::Message("auth.secret must not be empty".into()));
        }

        if self.auth.expiration == 0 {
            return Err(ConfigError::Message("auth.expiration must not be 0".into()));
        }

        match &self.store {
            Store::Sqlite(database) => {
                if database.url.trim().is_empty() {
                    return Err(ConfigError::Message("store.url must not be empty".into()));
                }
            }
            Store::Couchdb(couch) => {
                reqwest::Url::parse(&couch.url)
                    .map_err(|e| ConfigError::Message(format!("store.url: {e}")))?;

                if couch.database.trim().is_empty() {
                    return Err(ConfigError::Message(
                        "store.database must not be empty".into(),
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Settings {
        Settings {
            server: Server {
                host: "127.0.0.1".into(),
                port: 3000,
            },
            logger: Logger {
                level: "info".into(),
            },
            store: Store::Sqlite(Database {
                migration_path: None,
                clean_start: true,
                url: "sqlite::memory:".into(),
            }),
            auth: Auth {
                secret: "secret".into(),
                expiration: 3600,
            },
        }
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = sample();
        settings.server.host = "localhost:3000".into();
        assert!(settings.validate().is_err());

        let mut settings = sample();
        settings.auth.secret = "  ".into();
        assert!(settings.validate().is_err());

        let mut settings = sample();
        settings.store = Store::Couchdb(CouchDb {
            url: "not a url".into(),
            database: "campus".into(),
            username: None,
            password: None,
        });
        assert!(settings.validate().is_err());

        let mut settings = sample();
        settings.store = Store::Couchdb(CouchDb {
            url: "http://127.0.0.1:5984".into(),
            database: "".into(),
            username: None,
            password: None,
        });
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_store_is_tagged_by_backend() {
        let store: Store = serde_json::from_value(serde_json::json!({
            "backend": "couchdb",
            "url": "http://127.0.0.1:5984",
            "database": "campus"
        }))
        .unwrap();

        assert!(matches!(store, Store::Couchdb(ref couch) if couch.database == "campus"));
    }
}
