//! Topic title and body rendering.
//!
//! The title is the only link between a question and its forum topic, so
//! [`format_topic_title`] and [`extract_question_id_from_title`] must stay
//! in agreement.

use std::sync::LazyLock;

use regex::Regex;

use crate::question::Question;

/// Discourse rejects titles longer than this.
pub const MAX_TITLE_LENGTH: usize = 250;

const ELLIPSIS: &str = "...";

/// Shown when a question has no explanation yet.
pub const EXPLANATION_PLACEHOLDER: &str = "No explanation has been written for this question yet. Help your fellow hams by suggesting one in the replies!";

const TOPIC_FOOTER: &str =
    "_This topic was automatically created to facilitate community discussion._";

static TITLE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([TGE]\d[A-Z]\d{2})\s*-").expect("title id regex should compile")
});

/// Render `"{display_name} - {question}"`, truncating the question text so
/// the whole title fits in [`MAX_TITLE_LENGTH`] characters.
#[must_use]
pub fn format_topic_title(display_name: &str, question: &str) -> String {
    let prefix = format!("{} - ", display_name);
    let full_len = prefix.chars().count() + question.chars().count();
    if full_len <= MAX_TITLE_LENGTH {
        return format!("{}{}", prefix, question);
    }

    let available = MAX_TITLE_LENGTH.saturating_sub(prefix.chars().count() + ELLIPSIS.len());
    let truncated: String = question.chars().take(available).collect();
    format!("{}{}{}", prefix, truncated, ELLIPSIS)
}

/// Display name at the start of a topic title, if the title follows the
/// `"{display_name} - ..."` convention.
#[must_use]
pub fn extract_question_id_from_title(title: &str) -> Option<&str> {
    TITLE_ID_RE
        .captures(title)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Letter for a zero-based answer index.
#[must_use]
pub fn correct_answer_letter(index: i32) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|&i| i < 26)
        .map(|i| char::from(b'A' + i))
}

/// Render the markdown body of a question's topic.
#[must_use]
pub fn format_topic_body(question: &Question) -> String {
    let mut body = String::new();

    body.push_str("## Question\n");
    body.push_str(&question.question);
    body.push_str("\n\n## Answer Options\n");
    for (i, option) in question.options.iter().enumerate() {
        let letter = correct_answer_letter(i as i32).unwrap_or('?');
        body.push_str(&format!("- **{})** {}\n", letter, option));
    }

    let correct = correct_answer_letter(question.correct_answer).unwrap_or('?');
    body.push_str(&format!("\n**Correct Answer: {}**\n\n---\n\n", correct));

    let explanation = question
        .explanation
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(EXPLANATION_PLACEHOLDER);
    body.push_str("## Explanation\n");
    body.push_str(explanation);
    body.push_str("\n\n---\n");
    body.push_str(TOPIC_FOOTER);

    body
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
#[must_use]
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut preview: String = text.chars().take(max_chars).collect();
    preview.push_str(ELLIPSIS);
    preview
}
