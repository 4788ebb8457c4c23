//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Every response body is wrapped in an [`envelope::Envelope`].

pub mod envelope;
pub mod id;
pub mod option;
pub mod question;
