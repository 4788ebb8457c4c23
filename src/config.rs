use log::{error, info};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::mongodb::ensure_indexes_exist;

/// Database used when `db_name` is not configured.
pub const DEFAULT_DB_NAME: &str = "polls";

/// Configuration for the database, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables.
#[derive(Debug, Deserialize)]
pub struct DbConfig {
    // secrets
    db_uri: String,
    // non-secrets
    #[serde(default = "default_db_name")]
    db_name: String,
}

impl DbConfig {
    /// Connection string for the MongoDB deployment.
    pub fn db_uri(&self) -> &str {
        &self.db_uri
    }

    /// Name of the database holding the questions and options.
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

fn default_db_name() -> String {
    DEFAULT_DB_NAME.to_string()
}

/// A fairing that loads the MongoDB config, connects to the database,
/// ensures the indexes exist, and places both a `Client` and a `Database`
/// into managed state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(config.db_uri()).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(config.db_name());

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to set up database indexes: {e}");
            return Err(rocket);
        }
        info!("...database {} online!", config.db_name());

        // Manage the state.
        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::{providers::Serialized, Figment};

    use super::*;

    #[test]
    fn db_name_defaults() {
        let figment = Figment::new().merge(Serialized::default("db_uri", "mongodb://db:27017"));
        let config: DbConfig = figment.extract().unwrap();
        assert_eq!(config.db_uri(), "mongodb://db:27017");
        assert_eq!(config.db_name(), DEFAULT_DB_NAME);
    }

    #[test]
    fn db_uri_required() {
        let figment = Figment::new().merge(Serialized::default("db_name", "elsewhere"));
        assert!(figment.extract::<DbConfig>().is_err());
    }
}
