use mongodb::bson::doc;

use crate::error::{Error, Result};
use crate::model::{
    db::{option::PollOption, question::Question},
    mongodb::{Coll, Id},
};

/// Parse a path segment as an ID. A malformed ID can never resolve, so it is
/// reported exactly like a well-formed one that doesn't.
pub fn parse_id(raw: &str, not_found: &str) -> Result<Id> {
    raw.parse::<Id>()
        .map_err(|_| Error::NotFound(not_found.to_string()))
}

/// Return a Question from the database by its ID.
pub async fn question_by_id(
    question_id: Id,
    questions: &Coll<Question>,
    not_found: &str,
) -> Result<Question> {
    questions
        .find_one(question_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::NotFound(not_found.to_string()))
}

/// Return a Question from the database by its exact title, if there is one.
pub async fn question_by_title(title: &str, questions: &Coll<Question>) -> Result<Option<Question>> {
    let filter = doc! {
        "title": title,
    };
    Ok(questions.find_one(filter, None).await?)
}

/// Return an Option from the database by its ID.
pub async fn option_by_id(
    option_id: Id,
    options: &Coll<PollOption>,
    not_found: &str,
) -> Result<PollOption> {
    options
        .find_one(option_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::NotFound(not_found.to_string()))
}
