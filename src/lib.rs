#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::api::API_BASE;
use crate::config::DatabaseFairing;
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

/// Assemble the server. The database connection is made on ignition.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(DatabaseFairing)
        .mount(API_BASE, api::routes())
        .register("/", api::catchers())
}

/// Get a client for the database named by `db_uri` in the config.
#[cfg(test)]
async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .unwrap_or_else(|e| panic!("Could not connect to database at \"{db_uri}\": {e}"))
}

/// Get the name of the database to use.
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
fn database() -> String {
    let random: u32 = rand::random();
    format!("test{random}")
}

/// Assemble the server around an existing database connection.
#[cfg(test)]
async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let db = client.database(db_name);
    model::mongodb::ensure_indexes_exist(&db).await.unwrap();

    rocket::build()
        .attach(LoggerFairing)
        .mount(API_BASE, api::routes())
        .register("/", api::catchers())
        .manage(client)
        .manage(db)
}
