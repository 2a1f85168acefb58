//! Discourse API data types.
//!
//! Only the fields the sync engine reads are declared, so unrelated API
//! changes do not break deserialization.

use serde::{Deserialize, Serialize};

/// A forum category, from `GET /categories.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ForumCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A forum topic as listed in category pages and search results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ForumTopic {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// One page of a category's topic list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPage {
    pub topics: Vec<ForumTopic>,
    /// Size of a full page as reported by the forum.
    pub per_page: usize,
}

impl TopicPage {
    /// A page shorter than `per_page` is the last one.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.topics.len() < self.per_page
    }
}

/// A topic about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDraft {
    pub title: String,
    pub raw: String,
    pub category_id: i64,
}

/// Result of a topic creation attempt.
///
/// Creation never returns `Err`; every failure is classified here so the
/// reconciler can keep going with the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateTopicOutcome {
    /// The topic was created.
    Created(ForumTopic),
    /// A topic with the same title already exists.
    Conflict { message: String },
    /// Any other failure. `status` is `None` for transport errors.
    Failed {
        status: Option<u16>,
        message: String,
    },
}

// ---------- Wire formats ----------

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesResponse {
    pub category_list: CategoryList,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryList {
    #[serde(default)]
    pub categories: Vec<ForumCategory>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryTopicsResponse {
    pub topic_list: TopicList,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopicList {
    #[serde(default)]
    pub topics: Vec<ForumTopic>,
    #[serde(default)]
    pub per_page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub topics: Vec<ForumTopic>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreatePostRequest<'a> {
    pub title: &'a str,
    pub raw: &'a str,
    pub category: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatePostResponse {
    pub topic_id: i64,
    pub topic_slug: String,
}

/// Discourse error body: `{"errors": [...], "error_type": "...", "extras": {...}}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub error_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_page_is_last_when_short() {
        let topic = ForumTopic {
            id: 1,
            slug: "t1a01".to_string(),
            title: "T1A01 - Question".to_string(),
            category_id: Some(5),
        };
        let full = TopicPage {
            topics: vec![topic.clone(); 30],
            per_page: 30,
        };
        let short = TopicPage {
            topics: vec![topic],
            per_page: 30,
        };
        assert!(!full.is_last());
        assert!(short.is_last());
    }

    #[test]
    fn deserializes_category_topics_without_per_page() {
        let body = serde_json::json!({
            "topic_list": {
                "topics": [
                    {"id": 7, "slug": "g2b03-what-is", "title": "G2B03 - What is", "category_id": 6, "posts_count": 3}
                ]
            }
        });
        let parsed: CategoryTopicsResponse =
            serde_json::from_value(body).expect("topic list should parse");
        assert_eq!(parsed.topic_list.per_page, None);
        assert_eq!(parsed.topic_list.topics[0].id, 7);
        assert_eq!(parsed.topic_list.topics[0].category_id, Some(6));
    }

    #[test]
    fn create_post_request_uses_discourse_field_names() {
        let req = CreatePostRequest {
            title: "T1A01 - Q",
            raw: "body",
            category: 5,
        };
        let value = serde_json::to_value(&req).expect("request should serialize");
        assert_eq!(
            value,
            serde_json::json!({"title": "T1A01 - Q", "raw": "body", "category": 5})
        );
    }

    #[test]
    fn error_response_tolerates_missing_fields() {
        let parsed: ErrorResponse =
            serde_json::from_str(r#"{"errors":["Title has already been used"]}"#)
                .expect("error body should parse");
        assert_eq!(parsed.errors, vec!["Title has already been used"]);
        assert!(parsed.error_type.is_none());
    }
}
