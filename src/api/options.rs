use log::{error, info};
use mongodb::{
    bson::doc,
    error::Error as DbError,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use rocket::{serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        envelope::ApiResponse,
        option::{OptionDescription, OptionSpec},
    },
    db::{
        option::{NewPollOption, PollOption},
        question::Question,
    },
    mongodb::{Coll, Id},
};

use super::common::{option_by_id, parse_id, question_by_id};

const MISSING_CREATE_INPUT: &str = "Missing Question ID or option text";
const INVALID_QUESTION_ID: &str = "Invalid Question ID";
const MISSING_OPTION_ID: &str = "Missing option ID";
const INVALID_OPTION_ID: &str = "Invalid option ID";

pub fn routes() -> Vec<Route> {
    routes![
        create_option,
        create_option_without_id,
        delete_option,
        delete_option_without_id,
        add_vote,
        add_vote_without_id,
    ]
}

/// Create an option under a question.
///
/// Three writes happen in a fixed order: insert the option, record its vote
/// link, then append it to the question. None of them are rolled back if a
/// later one fails; the option ID is logged so it can be cleaned up.
#[post("/options/<question_id>/create", data = "<spec>")]
async fn create_option(
    question_id: &str,
    spec: Option<Json<OptionSpec>>,
    questions: Coll<Question>,
    new_options: Coll<NewPollOption>,
    options: Coll<PollOption>,
) -> Result<ApiResponse<OptionDescription>> {
    let text = spec
        .as_deref()
        .and_then(OptionSpec::text)
        .ok_or_else(|| Error::InvalidInput(MISSING_CREATE_INPUT.to_string()))?;
    let question_id = parse_id(question_id, INVALID_QUESTION_ID)?;
    let question = question_by_id(question_id, &questions, INVALID_QUESTION_ID).await?;

    // Insert the option.
    let mut option = NewPollOption::new(question.id, text);
    let id: Id = new_options
        .insert_one(&option, None)
        .await?
        .inserted_id
        .as_object_id()
        .ok_or_else(|| Error::Internal("Inserted option has no ObjectId".to_string()))?
        .into();

    // Record where to vote for it.
    let link = PollOption::vote_link(id);
    let update = doc! {
        "$set": {
            "link_to_vote": link.as_str(),
        }
    };
    options
        .update_one(id.as_doc(), update, None)
        .await
        .map_err(|e| dangling(id, question.id, e))?;
    option.link_to_vote = Some(link);

    // Attach it to the question.
    let update = doc! {
        "$push": {
            "options": id,
        }
    };
    let result = questions
        .update_one(question.id.as_doc(), update, None)
        .await
        .map_err(|e| dangling(id, question.id, e))?;
    if result.matched_count == 0 {
        error!("Option {id} left dangling: question {} was deleted mid-create", question.id);
        return Err(Error::Internal(format!(
            "Question {} disappeared while adding option {id}",
            question.id
        )));
    }

    info!("Created option {id} for question {}", question.id);
    let option = PollOption::from_new(id, option);
    Ok(ApiResponse::created("Option created", option.into()))
}

#[post("/options/create")]
fn create_option_without_id() -> Error {
    Error::InvalidInput(MISSING_CREATE_INPUT.to_string())
}

/// Delete an option. The question's reference goes first, so a failure in
/// between leaves an unreferenced option rather than a reference to nothing.
#[delete("/options/<option_id>/delete")]
async fn delete_option(
    option_id: &str,
    options: Coll<PollOption>,
    questions: Coll<Question>,
) -> Result<ApiResponse<()>> {
    let option_id = parse_id(option_id, INVALID_OPTION_ID)?;
    let option = option_by_id(option_id, &options, INVALID_OPTION_ID).await?;

    let update = doc! {
        "$pull": {
            "options": option.id,
        }
    };
    questions
        .update_one(option.question_id.as_doc(), update, None)
        .await?;
    options.delete_one(option.id.as_doc(), None).await?;

    info!("Deleted option {option_id} of question {}", option.question_id);
    Ok(ApiResponse::done("Option deleted"))
}

#[delete("/options/delete")]
fn delete_option_without_id() -> Error {
    Error::InvalidInput(MISSING_OPTION_ID.to_string())
}

/// Cast one vote. The increment happens inside the database, so concurrent
/// votes are never lost.
#[get("/options/<option_id>/add_vote")]
async fn add_vote(
    option_id: &str,
    options: Coll<PollOption>,
) -> Result<ApiResponse<OptionDescription>> {
    let option_id = parse_id(option_id, INVALID_OPTION_ID)?;

    let update = doc! {
        "$inc": {
            "votes": 1,
        }
    };
    let find_options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let option = options
        .find_one_and_update(option_id.as_doc(), update, find_options)
        .await?
        .ok_or_else(|| Error::NotFound(INVALID_OPTION_ID.to_string()))?;

    Ok(ApiResponse::ok("Vote incremented", option.into()))
}

#[get("/options/add_vote")]
fn add_vote_without_id() -> Error {
    Error::InvalidInput(MISSING_OPTION_ID.to_string())
}

/// Raise the alarm about a partially-created option.
fn dangling(option_id: Id, question_id: Id, err: DbError) -> Error {
    error!("Option {option_id} left dangling under question {question_id}: {err}");
    Error::Db(err)
}
