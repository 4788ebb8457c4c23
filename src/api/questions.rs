use std::collections::HashMap;

use log::{debug, info, warn};
use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        envelope::ApiResponse,
        question::{QuestionDescription, QuestionDetails, QuestionSpec},
    },
    db::{
        option::{OptionSummary, PollOption},
        question::{NewQuestion, Question},
    },
    mongodb::{errors::is_duplicate_key_error, Coll, Id},
};

use super::common::{parse_id, question_by_id, question_by_title};

const TITLE_REQUIRED: &str = "Title is required";
const QUESTION_EXISTS: &str = "Question already exists";
const EMPTY_QUESTION_ID: &str = "Empty Question id";
const INVALID_QUESTION_ID: &str = "Invalid Question id";

pub fn routes() -> Vec<Route> {
    routes![
        create_question,
        delete_question,
        delete_question_without_id,
        get_question,
        get_question_without_id,
    ]
}

#[post("/questions", data = "<spec>")]
async fn create_question(
    spec: Option<Json<QuestionSpec>>,
    questions: Coll<Question>,
    new_questions: Coll<NewQuestion>,
) -> Result<ApiResponse<QuestionDescription>> {
    let title = spec
        .as_deref()
        .and_then(QuestionSpec::title)
        .ok_or_else(|| Error::InvalidInput(TITLE_REQUIRED.to_string()))?;

    // Refuse duplicates, pointing the caller at the original.
    if let Some(existing) = question_by_title(title, &questions).await? {
        return Err(already_exists(existing.id));
    }

    // The unique index catches anyone who got in since the lookup.
    let question = NewQuestion::new(title);
    let result = new_questions.insert_one(&question, None).await;
    if is_duplicate_key_error(result.as_ref()) {
        warn!("Lost race creating question {title:?}");
        let existing = question_by_title(title, &questions).await?.ok_or_else(|| {
            Error::Internal(format!("Duplicate question {title:?} vanished"))
        })?;
        return Err(already_exists(existing.id));
    }
    let id: Id = result?
        .inserted_id
        .as_object_id()
        .ok_or_else(|| Error::Internal("Inserted question has no ObjectId".to_string()))?
        .into();

    info!("Created question {id}");
    let question = Question::from_new(id, question);
    Ok(ApiResponse::ok("Question created", question.into()))
}

#[delete("/questions/<question_id>")]
async fn delete_question(
    question_id: &str,
    questions: Coll<Question>,
    options: Coll<PollOption>,
) -> Result<ApiResponse<()>> {
    let question_id = parse_id(question_id, INVALID_QUESTION_ID)?;
    let question = question_by_id(question_id, &questions, INVALID_QUESTION_ID).await?;

    // Options first, then the question. Ids that no longer resolve are harmless.
    let filter = doc! {
        "_id": {
            "$in": question.options.clone(),
        }
    };
    let deleted = options.delete_many(filter, None).await?.deleted_count;
    debug!("Deleted {deleted} options of question {question_id}");

    questions.delete_one(question_id.as_doc(), None).await?;
    info!("Deleted question {question_id}");
    Ok(ApiResponse::done("Question deleted"))
}

#[delete("/questions")]
fn delete_question_without_id() -> Error {
    Error::InvalidInput(EMPTY_QUESTION_ID.to_string())
}

#[get("/questions/<question_id>")]
async fn get_question(
    question_id: &str,
    questions: Coll<Question>,
    options: Coll<OptionSummary>,
) -> Result<ApiResponse<QuestionDetails>> {
    let question_id = parse_id(question_id, INVALID_QUESTION_ID)?;
    let question = question_by_id(question_id, &questions, INVALID_QUESTION_ID).await?;

    // Fetch every option in one go, then lay them out in the question's order.
    let filter = doc! {
        "_id": {
            "$in": question.options.clone(),
        }
    };
    let find_options = FindOptions::builder()
        .projection(OptionSummary::projection())
        .build();
    let mut found: HashMap<Id, OptionSummary> = options
        .find(filter, find_options)
        .await?
        .map_ok(|option| (option.id, option))
        .try_collect()
        .await?;
    let expanded = question
        .options
        .iter()
        .filter_map(|id| found.remove(id))
        .map(Into::into)
        .collect();

    let details = QuestionDetails {
        id: question.id.into(),
        title: question.question.title,
        options: expanded,
    };
    Ok(ApiResponse::ok("Question fetched", details))
}

#[get("/questions")]
fn get_question_without_id() -> Error {
    Error::InvalidInput(EMPTY_QUESTION_ID.to_string())
}

fn already_exists(id: Id) -> Error {
    Error::AlreadyExists {
        message: QUESTION_EXISTS.to_string(),
        id,
    }
}

#[cfg(test)]
mod tests {
    use mongodb::{bson::Document, Database};
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::serde_json::{self, json},
    };

    use crate::api::{
        testing::{at, envelope_of},
        API_BASE,
    };
    use crate::model::{
        api::{
            envelope::{Envelope, EnvelopeStatus, ExistingId},
            id::ApiId,
            option::{OptionDescription, OptionSpec},
        },
        db::option::NewPollOption,
        mongodb::MongoCollection,
    };

    use super::*;

    #[backend_test]
    async fn create_question(client: Client, questions: Coll<Question>) {
        let spec = QuestionSpec::example();
        let response = post_question(&client, &spec).await;
        assert_eq!(response.status(), Status::Ok);
        let envelope: Envelope<QuestionDescription> = envelope_of(response).await;
        assert_eq!(envelope.message, "Question created");
        assert_eq!(envelope.status, EnvelopeStatus::Successful);
        assert_eq!(envelope.data.len(), 1);
        let created = &envelope.data[0];
        assert_eq!(Some(&created.title), spec.title.as_ref());
        assert!(created.options.is_empty());

        // Ensure it is present in the DB.
        let stored = questions
            .find_one(created.id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, created.title);
        assert!(stored.options.is_empty());
    }

    #[backend_test]
    async fn create_duplicate_question(client: Client, db: Database) {
        let original = create_question_for_spec(&client, &QuestionSpec::example()).await;

        let response = post_question(&client, &QuestionSpec::example()).await;
        assert_eq!(response.status(), Status::Unauthorized);
        let envelope: Envelope<ExistingId> = envelope_of(response).await;
        assert_eq!(
            envelope,
            Envelope::failure(QUESTION_EXISTS, vec![ExistingId { id: original.id }])
        );

        // Ensure no second record was made.
        let filter = doc! { "title": original.title.as_str() };
        assert_eq!(count_matches::<Question>(&db, filter).await, 1);
    }

    #[backend_test]
    async fn create_question_missing_title(client: Client, db: Database) {
        // No title field.
        let response = client
            .post(at(uri!(create_question)))
            .header(ContentType::JSON)
            .body(json!({}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let envelope: Envelope<ExistingId> = envelope_of(response).await;
        assert_eq!(envelope, Envelope::failure(TITLE_REQUIRED, Vec::new()));

        // Empty title.
        let spec = QuestionSpec {
            title: Some(String::new()),
        };
        let response = post_question(&client, &spec).await;
        assert_eq!(response.status(), Status::BadRequest);

        // No body at all.
        let response = client.post(at(uri!(create_question))).dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);

        assert_eq!(count_matches::<Question>(&db, doc! {}).await, 0);
    }

    #[backend_test]
    async fn get_question_expands_options(client: Client, db: Database) {
        let question = create_question_for_spec(&client, &QuestionSpec::example()).await;
        let red = create_option(&client, question.id, &OptionSpec::example()).await;
        let blue = create_option(&client, question.id, &OptionSpec::example2()).await;

        let response = client
            .get(at(uri!(get_question(question.id.to_string()))))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        // The back-reference must not appear in the expanded options.
        let raw: Envelope<serde_json::Value> = envelope_of(response).await;
        assert_eq!(raw.message, "Question fetched");
        let raw_options = raw.data[0]["options"].as_array().unwrap();
        assert!(raw_options.iter().all(|o| o.get("question_id").is_none()));

        let details: QuestionDetails = serde_json::from_value(raw.data[0].clone()).unwrap();
        assert_eq!(details.id, question.id);
        assert_eq!(details.title, question.title);
        let texts: Vec<&str> = details.options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["Red", "Blue"]);
        assert_eq!(details.options[0].id, red.id);
        assert_eq!(details.options[1].id, blue.id);
        for option in &details.options {
            assert_eq!(option.votes, 0);
            assert!(option.link_to_vote.as_ref().unwrap().ends_with("/add_vote"));
        }

        // Options that have gone missing are skipped.
        Coll::<PollOption>::from_db(&db)
            .delete_one(red.id.as_doc(), None)
            .await
            .unwrap();
        let details = get_details(&client, question.id.to_string()).await;
        assert_eq!(details.options.len(), 1);
        assert_eq!(details.options[0].id, blue.id);
    }

    #[backend_test]
    async fn get_question_bad_ids(client: Client) {
        // Well-formed but unknown.
        let response = client
            .get(at(uri!(get_question(Id::new().to_string()))))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
        let envelope: Envelope<ExistingId> = envelope_of(response).await;
        assert_eq!(envelope, Envelope::failure(INVALID_QUESTION_ID, Vec::new()));

        // Malformed.
        let response = client
            .get(at(uri!(get_question("64a"))))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);

        // Missing.
        let response = client
            .get(at(uri!(get_question_without_id)))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let envelope: Envelope<ExistingId> = envelope_of(response).await;
        assert_eq!(envelope, Envelope::failure(EMPTY_QUESTION_ID, Vec::new()));
    }

    #[backend_test]
    async fn delete_question_cascades(client: Client, db: Database) {
        let question = create_question_for_spec(&client, &QuestionSpec::example()).await;
        let red = create_option(&client, question.id, &OptionSpec::example()).await;
        let blue = create_option(&client, question.id, &OptionSpec::example2()).await;

        // An option of another question must survive.
        let other = create_question_for_spec(&client, &QuestionSpec::example2()).await;
        let survivor = create_option(&client, other.id, &OptionSpec::example()).await;

        let response = client
            .delete(at(uri!(delete_question(question.id.to_string()))))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let envelope: Envelope<()> = envelope_of(response).await;
        assert_eq!(envelope, Envelope::successful("Question deleted", Vec::new()));

        assert_eq!(count_matches::<Question>(&db, question.id.as_doc()).await, 0);
        for option in [&red, &blue] {
            assert_eq!(count_matches::<PollOption>(&db, option.id.as_doc()).await, 0);
            let vote_link = option.link_to_vote.clone().unwrap();
            let response = client.get(vote_link).dispatch().await;
            assert_eq!(response.status(), Status::NotFound);
        }
        assert_eq!(count_matches::<PollOption>(&db, survivor.id.as_doc()).await, 1);

        // Deleting again finds nothing.
        let response = client
            .delete(at(uri!(delete_question(question.id.to_string()))))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[backend_test]
    async fn delete_question_with_dangling_reference(client: Client, db: Database) {
        // A reference to an option that no longer exists doesn't block the delete.
        let question = create_question_for_spec(&client, &QuestionSpec::example()).await;
        let update = doc! { "$push": { "options": Id::new() } };
        Coll::<Question>::from_db(&db)
            .update_one(question.id.as_doc(), update, None)
            .await
            .unwrap();

        let response = client
            .delete(at(uri!(delete_question(question.id.to_string()))))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(count_matches::<Question>(&db, doc! {}).await, 0);
    }

    #[backend_test]
    async fn delete_question_missing_id(client: Client, new_options: Coll<NewPollOption>) {
        // Something to (not) delete.
        let orphan = NewPollOption::new(Id::new(), "Orphan");
        new_options.insert_one(&orphan, None).await.unwrap();

        let response = client
            .delete(at(uri!(delete_question_without_id)))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(new_options.count_documents(None, None).await.unwrap(), 1);
    }

    async fn post_question<'c>(client: &'c Client, spec: &QuestionSpec) -> LocalResponse<'c> {
        client
            .post(at(uri!(create_question)))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await
    }

    async fn create_question_for_spec(client: &Client, spec: &QuestionSpec) -> QuestionDescription {
        let response = post_question(client, spec).await;
        assert_eq!(response.status(), Status::Ok);
        let mut envelope: Envelope<QuestionDescription> = envelope_of(response).await;
        envelope.data.pop().unwrap()
    }

    async fn create_option(client: &Client, question_id: ApiId, spec: &OptionSpec) -> OptionDescription {
        let response = client
            .post(format!("{API_BASE}/options/{question_id}/create"))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let mut envelope: Envelope<OptionDescription> = envelope_of(response).await;
        envelope.data.pop().unwrap()
    }

    async fn get_details(client: &Client, question_id: String) -> QuestionDetails {
        let response = client
            .get(at(uri!(get_question(question_id))))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let mut envelope: Envelope<QuestionDetails> = envelope_of(response).await;
        envelope.data.pop().unwrap()
    }

    async fn count_matches<T: MongoCollection>(db: &Database, filter: Document) -> u64 {
        Coll::<T>::from_db(db)
            .count_documents(filter, None)
            .await
            .unwrap()
    }
}
