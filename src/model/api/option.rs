use serde::{Deserialize, Serialize};

use crate::model::db::option::{OptionSummary, PollOption};

use super::id::ApiId;

/// Body of an option creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub text: Option<String>,
}

impl OptionSpec {
    /// The option text, if any was actually given.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

/// A full option, including the question it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDescription {
    pub id: ApiId,
    pub text: String,
    pub question_id: ApiId,
    pub link_to_vote: Option<String>,
    pub votes: u32,
}

impl From<PollOption> for OptionDescription {
    fn from(option: PollOption) -> Self {
        Self {
            id: option.id.into(),
            text: option.option.text,
            question_id: option.option.question_id.into(),
            link_to_vote: option.option.link_to_vote,
            votes: option.option.votes,
        }
    }
}

/// An option listed under its question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSummaryDescription {
    pub id: ApiId,
    pub text: String,
    pub link_to_vote: Option<String>,
    pub votes: u32,
}

impl From<OptionSummary> for OptionSummaryDescription {
    fn from(option: OptionSummary) -> Self {
        Self {
            id: option.id.into(),
            text: option.text,
            link_to_vote: option.link_to_vote,
            votes: option.votes,
        }
    }
}
