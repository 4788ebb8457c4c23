use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};

use super::id::ApiId;

/// Whether the operation described by an [`Envelope`] went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Successful,
    Failure,
}

/// The uniform body of every response: a human-readable message, an outcome,
/// and zero or one items of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: String,
    pub status: EnvelopeStatus,
    pub data: Vec<T>,
}

impl<T> Envelope<T> {
    pub fn successful(message: impl Into<String>, data: Vec<T>) -> Self {
        Self {
            message: message.into(),
            status: EnvelopeStatus::Successful,
            data,
        }
    }

    pub fn failure(message: impl Into<String>, data: Vec<T>) -> Self {
        Self {
            message: message.into(),
            status: EnvelopeStatus::Failure,
            data,
        }
    }
}

/// Data attached to a failure that refers to an existing entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingId {
    pub id: ApiId,
}

/// A successful response: an envelope and the status code to send it with.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: Status,
    envelope: Envelope<T>,
}

impl<T> ApiResponse<T> {
    /// 200 with a single item.
    pub fn ok(message: impl Into<String>, item: T) -> Self {
        Self {
            status: Status::Ok,
            envelope: Envelope::successful(message, vec![item]),
        }
    }

    /// 201 with the newly created item.
    pub fn created(message: impl Into<String>, item: T) -> Self {
        Self {
            status: Status::Created,
            envelope: Envelope::successful(message, vec![item]),
        }
    }
}

impl ApiResponse<()> {
    /// 200 with no data.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            envelope: Envelope::successful(message, Vec::new()),
        }
    }
}

impl<'r, 'o: 'r, T: Serialize> Responder<'r, 'o> for ApiResponse<T> {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        (self.status, Json(self.envelope)).respond_to(req)
    }
}
