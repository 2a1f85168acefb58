//! Discourse webhook handling.
//!
//! Edits to the first post of a question topic flow back into the
//! question's `explanation`. Only the text under the `## Explanation`
//! heading is read; the rest of the post is ignored.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::repository::{QuestionStore, RepositoryError};
use crate::topic::EXPLANATION_PLACEHOLDER;

type HmacSha256 = Hmac<Sha256>;

pub const EVENT_TYPE_HEADER: &str = "X-Discourse-Event-Type";
pub const EVENT_HEADER: &str = "X-Discourse-Event";
pub const SIGNATURE_HEADER: &str = "X-Discourse-Event-Signature";

const SIGNATURE_PREFIX: &str = "sha256=";
const EXPLANATION_HEADING: &str = "## Explanation";
const SECTION_RULE: &str = "---";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Database error: {0}")]
    Store(#[from] RepositoryError),
}

impl WebhookError {
    pub fn status_code(&self) -> u16 {
        match self {
            WebhookError::InvalidSignature => 401,
            WebhookError::MalformedPayload(_) => 400,
            WebhookError::Store(_) => 500,
        }
    }
}

/// Result of an accepted webhook, serialized with a `status` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WebhookOutcome {
    Ignored {
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    Updated {
        question_id: String,
        previous_length: usize,
        explanation_length: usize,
    },
    #[serde(rename_all = "camelCase")]
    Unchanged { question_id: String },
}

impl WebhookOutcome {
    fn ignored(reason: impl Into<String>) -> Self {
        WebhookOutcome::Ignored {
            reason: reason.into(),
        }
    }
}

/// The webhook headers the handler reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookHeaders<'a> {
    pub event_type: Option<&'a str>,
    pub event: Option<&'a str>,
    pub signature: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    post: Option<PostPayload>,
}

#[derive(Debug, Deserialize)]
struct PostPayload {
    topic_id: i64,
    post_number: i64,
    #[serde(default)]
    raw: String,
}

fn mac(secret: &str) -> Option<HmacSha256> {
    if secret.is_empty() {
        return None;
    }
    <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).ok()
}

/// `sha256=<hex>` signature of `body`, as Discourse sends it.
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = mac(secret)?;
    mac.update(body);
    Some(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Check a `sha256=<hex>` signature in constant time.
///
/// An empty secret never verifies.
pub fn verify_signature(secret: &str, signature: Option<&str>, body: &[u8]) -> bool {
    let Some(hex_sig) = signature.and_then(|s| s.trim().strip_prefix(SIGNATURE_PREFIX)) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Some(mut mac) = mac(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Text under the `## Explanation` heading, up to the next `---` rule.
///
/// Returns `None` when the section is missing or empty.
pub fn extract_explanation(raw: &str) -> Option<String> {
    let mut lines = raw.lines();
    lines.find(|line| line.trim() == EXPLANATION_HEADING)?;

    let section: Vec<&str> = lines
        .take_while(|line| line.trim() != SECTION_RULE)
        .collect();
    let text = section.join("\n").trim().to_string();

    (!text.is_empty()).then_some(text)
}

/// Verify, filter and apply one webhook delivery.
///
/// # Errors
///
/// `InvalidSignature` for a missing or wrong signature, `MalformedPayload`
/// when a post event body cannot be parsed, and `Store` when the lookup or
/// the write fails.
pub async fn handle_webhook<S: QuestionStore + ?Sized>(
    store: &S,
    secret: &str,
    headers: WebhookHeaders<'_>,
    body: &[u8],
) -> Result<WebhookOutcome, WebhookError> {
    if !verify_signature(secret, headers.signature, body) {
        tracing::warn!("Rejected webhook with invalid signature");
        return Err(WebhookError::InvalidSignature);
    }

    if headers.event_type != Some("post") {
        return Ok(WebhookOutcome::ignored(format!(
            "event type '{}' is not handled",
            headers.event_type.unwrap_or_default()
        )));
    }
    if headers.event != Some("post_edited") {
        return Ok(WebhookOutcome::ignored(format!(
            "event '{}' is not handled",
            headers.event.unwrap_or_default()
        )));
    }

    let payload: WebhookPayload = serde_json::from_slice(body)
        .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
    let post = payload
        .post
        .ok_or_else(|| WebhookError::MalformedPayload("missing 'post'".to_string()))?;

    if post.post_number != 1 {
        return Ok(WebhookOutcome::ignored("not the first post of the topic"));
    }

    let Some(question) = store.find_by_topic_id(post.topic_id).await? else {
        return Ok(WebhookOutcome::ignored(format!(
            "no question linked to topic {}",
            post.topic_id
        )));
    };

    let Some(explanation) = extract_explanation(&post.raw) else {
        return Ok(WebhookOutcome::ignored("post has no explanation section"));
    };
    if explanation == EXPLANATION_PLACEHOLDER {
        return Ok(WebhookOutcome::ignored("explanation has not been written yet"));
    }

    let previous = question.explanation.as_deref().unwrap_or_default();
    if previous.trim() == explanation {
        tracing::debug!(question_id = %question.display_name, "Explanation unchanged");
        return Ok(WebhookOutcome::Unchanged {
            question_id: question.display_name,
        });
    }

    store.update_explanation(question.id, &explanation).await?;
    tracing::info!(
        question_id = %question.display_name,
        topic_id = post.topic_id,
        "Updated explanation from forum edit"
    );

    Ok(WebhookOutcome::Updated {
        previous_length: previous.chars().count(),
        explanation_length: explanation.chars().count(),
        question_id: question.display_name,
    })
}
