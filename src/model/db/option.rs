use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::api::API_BASE;
use crate::model::mongodb::Id;

/// Core option data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOptionCore {
    /// Display text.
    pub text: String,
    /// The question this option belongs to.
    pub question_id: Id,
    /// Relative path at which a vote for this option can be cast.
    /// Only missing between inserting the option and recording its ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_to_vote: Option<String>,
    /// Number of votes cast so far.
    pub votes: u32,
}

impl PollOptionCore {
    /// Create a new option for the given question, with no votes.
    pub fn new(question_id: Id, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            question_id,
            link_to_vote: None,
            votes: 0,
        }
    }
}

/// An option without an ID.
pub type NewPollOption = PollOptionCore;

/// An answer option from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub option: PollOptionCore,
}

impl PollOption {
    /// Attach a freshly-assigned ID to a new option.
    pub fn from_new(id: Id, option: NewPollOption) -> Self {
        Self { id, option }
    }

    /// The voting path for the option with the given ID.
    pub fn vote_link(id: Id) -> String {
        format!("{API_BASE}/options/{id}/add_vote")
    }
}

impl Deref for PollOption {
    type Target = PollOptionCore;

    fn deref(&self) -> &Self::Target {
        &self.option
    }
}

impl DerefMut for PollOption {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.option
    }
}

/// An option as read back for display under its question, without the
/// redundant `question_id`. Must be read with [`OptionSummary::projection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSummary {
    #[serde(rename = "_id")]
    pub id: Id,
    pub text: String,
    #[serde(default)]
    pub link_to_vote: Option<String>,
    pub votes: u32,
}

impl OptionSummary {
    /// Projection that drops the back-reference to the owning question.
    pub fn projection() -> mongodb::bson::Document {
        mongodb::bson::doc! { "question_id": 0 }
    }
}
