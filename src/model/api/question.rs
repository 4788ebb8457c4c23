use serde::{Deserialize, Serialize};

use crate::model::db::question::Question;

use super::{id::ApiId, option::OptionSummaryDescription};

/// Body of a question creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub title: Option<String>,
}

impl QuestionSpec {
    /// The title, if one was actually given.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|title| !title.is_empty())
    }
}

/// A question as returned on creation: options are bare IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDescription {
    pub id: ApiId,
    pub title: String,
    pub options: Vec<ApiId>,
}

impl From<Question> for QuestionDescription {
    fn from(question: Question) -> Self {
        Self {
            id: question.id.into(),
            title: question.question.title,
            options: question
                .question
                .options
                .into_iter()
                .map(ApiId::from)
                .collect(),
        }
    }
}

/// A question with its options expanded in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDetails {
    pub id: ApiId,
    pub title: String,
    pub options: Vec<OptionSummaryDescription>,
}

#[cfg(test)]
mod examples {
    use super::*;

    impl QuestionSpec {
        pub fn example() -> Self {
            Self {
                title: Some("What is your favourite colour?".to_string()),
            }
        }

        pub fn example2() -> Self {
            Self {
                title: Some("Which day suits the meetup?".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_title_is_missing() {
        assert_eq!(QuestionSpec::default().title(), None);
        let blank = QuestionSpec {
            title: Some(String::new()),
        };
        assert_eq!(blank.title(), None);
        assert_eq!(
            QuestionSpec::example().title(),
            Some("What is your favourite colour?")
        );
    }
}
