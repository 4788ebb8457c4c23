use log::{error, warn};
use mongodb::error::Error as DbError;
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use thiserror::Error;

use crate::logging::RequestId;
use crate::model::{
    api::envelope::{Envelope, ExistingId},
    mongodb::Id,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Message sent in place of any server-side failure detail.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{message}: {id}")]
    AlreadyExists { message: String, id: Id },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidInput(_) => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::AlreadyExists { .. } => Status::Unauthorized,
            Self::Db(_) | Self::Internal(_) => Status::InternalServerError,
        }
    }

    /// The message shown to the client. Server-side details stay in the logs.
    pub fn public_message(&self) -> &str {
        match self {
            Self::InvalidInput(msg) | Self::NotFound(msg) => msg.as_str(),
            Self::AlreadyExists { message, .. } => message.as_str(),
            Self::Db(_) | Self::Internal(_) => INTERNAL_ERROR_MESSAGE,
        }
    }

    /// Any entity the client should be pointed at.
    fn data(&self) -> Vec<ExistingId> {
        match self {
            Self::AlreadyExists { id, .. } => vec![ExistingId { id: (*id).into() }],
            _ => Vec::new(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let id = req.local_cache(RequestId::next);
        let status = self.status();
        match status.class() {
            StatusClass::ServerError => error!("req{id} failed: {self}"),
            _ => warn!("req{id} rejected: {self}"),
        }

        let envelope = Envelope::failure(self.public_message(), self.data());
        (status, Json(envelope)).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_statuses() {
        assert_eq!(
            Error::InvalidInput("Title is required".to_string()).status(),
            Status::BadRequest
        );
        assert_eq!(
            Error::NotFound("Invalid option ID".to_string()).status(),
            Status::NotFound
        );
        let exists = Error::AlreadyExists {
            message: "Question already exists".to_string(),
            id: Id::new(),
        };
        assert_eq!(exists.status(), Status::Unauthorized);
        assert_eq!(
            Error::Internal("boom".to_string()).status(),
            Status::InternalServerError
        );
    }

    #[test]
    fn internal_details_hidden() {
        let err = Error::Internal("collection exploded".to_string());
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);
        assert!(err.data().is_empty());
    }

    #[test]
    fn duplicate_carries_id() {
        let id = Id::new();
        let err = Error::AlreadyExists {
            message: "Question already exists".to_string(),
            id,
        };
        assert_eq!(err.public_message(), "Question already exists");
        assert_eq!(err.data(), vec![ExistingId { id: id.into() }]);
    }
}
