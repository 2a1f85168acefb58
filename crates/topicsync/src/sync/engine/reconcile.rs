//! Create one question's topic, or find the one that already exists.

use crate::forum::{CreateTopicOutcome, ForumApi, ForumCategory, ForumTopic, TopicDraft};
use crate::question::Question;
use crate::topic::{extract_question_id_from_title, format_topic_body, format_topic_title};

/// Forum-side result for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created(ForumTopic),
    /// The title was taken; this is the topic that holds it.
    Linked(ForumTopic),
    Failed(String),
}

/// Render the draft topic for a question.
pub fn draft_for(question: &Question, category: &ForumCategory) -> TopicDraft {
    TopicDraft {
        title: format_topic_title(&question.display_name, &question.question),
        raw: format_topic_body(question),
        category_id: category.id,
    }
}

/// Pick the search hit holding `title`.
///
/// Exact titles beat display-name matches; within each, hits already in
/// the target category come first.
fn find_conflicting_topic(
    topics: Vec<ForumTopic>,
    title: &str,
    display_name: &str,
    category_id: i64,
) -> Option<ForumTopic> {
    topics
        .into_iter()
        .filter_map(|topic| {
            let exact = topic.title == title;
            if !exact && extract_question_id_from_title(&topic.title) != Some(display_name) {
                return None;
            }
            let in_category = topic.category_id == Some(category_id);
            Some(((!exact, !in_category), topic))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, topic)| topic)
}

/// Create the topic for `question` in `category`.
///
/// A duplicate-title conflict is resolved by searching for the existing
/// topic. Failures are returned as values so the batch can continue.
pub async fn reconcile_question<F: ForumApi + ?Sized>(
    forum: &F,
    question: &Question,
    category: &ForumCategory,
) -> ReconcileOutcome {
    let draft = draft_for(question, category);

    match forum.create_topic(&draft).await {
        CreateTopicOutcome::Created(topic) => ReconcileOutcome::Created(topic),
        CreateTopicOutcome::Failed { status, message } => {
            let message = match status {
                Some(status) => format!("HTTP {}: {}", status, message),
                None => message,
            };
            ReconcileOutcome::Failed(message)
        }
        CreateTopicOutcome::Conflict { message } => {
            tracing::debug!(
                question_id = %question.display_name,
                %message,
                "Topic title already taken, searching for existing topic"
            );

            let query = format!("{} in:title", question.display_name);
            match forum.search_topics(&query).await {
                Ok(topics) => {
                    match find_conflicting_topic(
                        topics,
                        &draft.title,
                        &question.display_name,
                        category.id,
                    ) {
                        Some(topic) => {
                            if topic.title != draft.title {
                                tracing::warn!(
                                    question_id = %question.display_name,
                                    topic_id = topic.id,
                                    title = %topic.title,
                                    "Linking topic whose title differs from the rendered title"
                                );
                            }
                            ReconcileOutcome::Linked(topic)
                        }
                        None => ReconcileOutcome::Failed(format!(
                            "Topic already exists but was not found by search: {}",
                            message
                        )),
                    }
                }
                Err(e) => ReconcileOutcome::Failed(format!(
                    "Topic already exists but search failed: {}",
                    e
                )),
            }
        }
    }
}
