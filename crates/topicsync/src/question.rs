//! Question domain types.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use crate::entity::question;

/// Amateur radio license tier. Each tier has its own question pool and
/// its own forum category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    Technician,
    General,
    Extra,
}

impl LicenseTier {
    /// All tiers, in pool order.
    pub const ALL: [LicenseTier; 3] = [
        LicenseTier::Technician,
        LicenseTier::General,
        LicenseTier::Extra,
    ];

    /// Leading letter of every display name in this tier's pool.
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            LicenseTier::Technician => 'T',
            LicenseTier::General => 'G',
            LicenseTier::Extra => 'E',
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LicenseTier::Technician => "technician",
            LicenseTier::General => "general",
            LicenseTier::Extra => "extra",
        }
    }

    /// Tier encoded in a display name such as `G2B03`.
    #[must_use]
    pub fn from_display_name(display_name: &str) -> Option<Self> {
        match display_name.chars().next()? {
            'T' => Some(LicenseTier::Technician),
            'G' => Some(LicenseTier::General),
            'E' => Some(LicenseTier::Extra),
            _ => None,
        }
    }
}

impl fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "technician" => Ok(LicenseTier::Technician),
            "general" => Ok(LicenseTier::General),
            "extra" => Ok(LicenseTier::Extra),
            other => Err(format!(
                "unknown license '{}': expected technician, general or extra",
                other
            )),
        }
    }
}

/// A question as the sync path sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: Uuid,
    pub display_name: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: i32,
    pub explanation: Option<String>,
    pub forum_url: Option<String>,
}

impl Question {
    #[must_use]
    pub fn tier(&self) -> Option<LicenseTier> {
        LicenseTier::from_display_name(&self.display_name)
    }
}

impl From<question::Model> for Question {
    fn from(model: question::Model) -> Self {
        let options = match model.options {
            serde_json::Value::Array(values) => values
                .into_iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            id: model.id,
            display_name: model.display_name,
            question: model.question,
            options,
            correct_answer: model.correct_answer,
            explanation: model.explanation,
            forum_url: model.forum_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::sync_status::DiscourseSyncStatus;

    #[test]
    fn tier_from_display_name() {
        assert_eq!(
            LicenseTier::from_display_name("T1A01"),
            Some(LicenseTier::Technician)
        );
        assert_eq!(
            LicenseTier::from_display_name("G2B03"),
            Some(LicenseTier::General)
        );
        assert_eq!(LicenseTier::from_display_name("E9H12"), Some(LicenseTier::Extra));
        assert_eq!(LicenseTier::from_display_name("A1A01"), None);
        assert_eq!(LicenseTier::from_display_name(""), None);
    }

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("General".parse::<LicenseTier>(), Ok(LicenseTier::General));
        assert_eq!("extra".parse::<LicenseTier>(), Ok(LicenseTier::Extra));
        assert!("novice".parse::<LicenseTier>().is_err());
    }

    #[test]
    fn tier_serializes_lowercase() {
        let json = serde_json::to_string(&LicenseTier::Technician).expect("serialize");
        assert_eq!(json, "\"technician\"");
    }

    #[test]
    fn question_from_model_reads_options() {
        let model = question::Model {
            id: Uuid::new_v4(),
            display_name: "T1A01".to_string(),
            question: "What is the purpose?".to_string(),
            options: serde_json::json!(["A", "B", "C", "D"]),
            correct_answer: 2,
            explanation: None,
            forum_url: None,
            discourse_sync_status: DiscourseSyncStatus::Unsynced,
            discourse_sync_at: None,
            discourse_sync_error: None,
        };

        let q = Question::from(model);
        assert_eq!(q.options, vec!["A", "B", "C", "D"]);
        assert_eq!(q.tier(), Some(LicenseTier::Technician));
    }
}
