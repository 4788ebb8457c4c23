use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};

use crate::model::api::envelope::{Envelope, ExistingId};

mod common;
pub mod options;
pub mod questions;

/// Where the API routes are mounted.
pub const API_BASE: &str = "/api/v1";

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(questions::routes());
    routes.extend(options::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// Anything that never reached a handler still gets an envelope.
#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> (Status, Json<Envelope<ExistingId>>) {
    let message = status.reason().unwrap_or("Unknown error");
    (status, Json(Envelope::failure(message, Vec::new())))
}
