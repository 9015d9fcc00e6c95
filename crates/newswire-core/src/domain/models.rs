use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

/// Normalized article handed to consumers regardless of backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedArticle {
    pub id: u64,
    pub title: String,
    pub date: UtcDateTime,
    pub excerpt: String,
    pub image: Option<String>,
    pub category: String,
    pub slug: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u32>,
}

/// Normalized reader comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub post_id: u64,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    pub content: String,
    pub date: UtcDateTime,
}

/// Validated input for posting a new comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSubmission {
    pub post_id: u64,
    pub name: String,
    pub email: String,
    pub content: String,
    pub url: Option<String>,
}

impl CommentSubmission {
    pub fn new(
        post_id: u64,
        name: impl Into<String>,
        email: impl Into<String>,
        content: impl Into<String>,
        url: Option<String>,
    ) -> Result<Self, ValidationError> {
        if post_id == 0 {
            return Err(ValidationError::InvalidPostId);
        }

        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(ValidationError::EmptyCommentAuthor);
        }

        let content = content.into().trim().to_owned();
        if content.is_empty() {
            return Err(ValidationError::EmptyCommentContent);
        }

        let email = email.into().trim().to_owned();
        if !is_plausible_email(&email) {
            return Err(ValidationError::InvalidEmail { value: email });
        }

        let url = url
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        Ok(Self {
            post_id,
            name,
            email,
            content,
            url,
        })
    }
}

fn is_plausible_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_trims_fields_and_drops_blank_url() {
        let submission = CommentSubmission::new(
            12,
            "  Ada ",
            "ada@example.test",
            " Nice piece. ",
            Some(String::from("   ")),
        )
        .expect("valid submission");

        assert_eq!(submission.name, "Ada");
        assert_eq!(submission.content, "Nice piece.");
        assert_eq!(submission.url, None);
    }

    #[test]
    fn submission_rejects_missing_fields() {
        assert_eq!(
            CommentSubmission::new(0, "Ada", "ada@example.test", "hi", None),
            Err(ValidationError::InvalidPostId)
        );
        assert_eq!(
            CommentSubmission::new(1, " ", "ada@example.test", "hi", None),
            Err(ValidationError::EmptyCommentAuthor)
        );
        assert_eq!(
            CommentSubmission::new(1, "Ada", "ada@example.test", "", None),
            Err(ValidationError::EmptyCommentContent)
        );
        assert!(matches!(
            CommentSubmission::new(1, "Ada", "not-an-email", "hi", None),
            Err(ValidationError::InvalidEmail { .. })
        ));
    }

    #[test]
    fn article_omits_absent_optional_fields_in_json() {
        let article = FormattedArticle {
            id: 1,
            title: String::from("Headline"),
            date: UtcDateTime::parse("2024-01-01T00:00:00Z").expect("valid"),
            excerpt: String::from("Summary"),
            image: None,
            category: String::from("News"),
            slug: String::from("headline"),
            link: String::from("https://example.test/headline"),
            content: None,
            author: None,
            comment_count: None,
        };

        let json = serde_json::to_value(&article).expect("serializes");
        assert!(json.get("content").is_none());
        assert_eq!(json["date"], "2024-01-01T00:00:00Z");
        assert!(json["image"].is_null());
    }
}
