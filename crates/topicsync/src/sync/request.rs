//! Inbound sync action.

use serde::Deserialize;

use super::error::SyncError;
use crate::question::LicenseTier;

/// What a call should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Create topics for the next batch.
    Sync,
    /// Report what a sync would do, with no writes.
    DryRun,
}

impl SyncAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncAction::Sync => "sync",
            SyncAction::DryRun => "dry-run",
        }
    }
}

/// A validated sync request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub action: SyncAction,
    /// Restrict the run to one tier; `None` means all three.
    pub license: Option<LicenseTier>,
    /// Requested batch size, clamped by the engine.
    pub batch_size: Option<i64>,
}

impl SyncRequest {
    /// Validate raw request fields.
    ///
    /// # Errors
    ///
    /// `InvalidAction` or `InvalidLicense` for unknown values.
    pub fn parse(
        action: &str,
        license: Option<&str>,
        batch_size: Option<i64>,
    ) -> Result<Self, SyncError> {
        let action = match action {
            "sync" => SyncAction::Sync,
            "dry-run" => SyncAction::DryRun,
            other => return Err(SyncError::InvalidAction(other.to_string())),
        };

        let license = license
            .filter(|l| !l.is_empty())
            .map(|l| {
                l.parse::<LicenseTier>()
                    .map_err(|_| SyncError::InvalidLicense(l.to_string()))
            })
            .transpose()?;

        Ok(Self {
            action,
            license,
            batch_size,
        })
    }

    /// In-scope tiers, in pool order.
    pub fn tiers(&self) -> Vec<LicenseTier> {
        match self.license {
            Some(tier) => vec![tier],
            None => LicenseTier::ALL.to_vec(),
        }
    }
}

/// JSON body of an inbound action: `{action, license?, batchSize?}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequestBody {
    pub action: String,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub batch_size: Option<i64>,
}

impl TryFrom<SyncRequestBody> for SyncRequest {
    type Error = SyncError;

    fn try_from(body: SyncRequestBody) -> Result<Self, Self::Error> {
        SyncRequest::parse(&body.action, body.license.as_deref(), body.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        let req = SyncRequest::parse("sync", None, Some(10)).expect("valid request");
        assert_eq!(req.action, SyncAction::Sync);
        assert_eq!(req.batch_size, Some(10));
        assert_eq!(req.tiers(), LicenseTier::ALL.to_vec());

        let req = SyncRequest::parse("dry-run", Some("general"), None).expect("valid request");
        assert_eq!(req.action, SyncAction::DryRun);
        assert_eq!(req.tiers(), vec![LicenseTier::General]);
    }

    #[test]
    fn rejects_unknown_action() {
        let err = SyncRequest::parse("delete", None, None).expect_err("unknown action");
        assert!(matches!(err, SyncError::InvalidAction(a) if a == "delete"));
    }

    #[test]
    fn rejects_unknown_license() {
        let err = SyncRequest::parse("sync", Some("novice"), None).expect_err("unknown license");
        assert!(matches!(err, SyncError::InvalidLicense(l) if l == "novice"));
    }

    #[test]
    fn empty_license_means_all_tiers() {
        let req = SyncRequest::parse("sync", Some(""), None).expect("valid request");
        assert_eq!(req.license, None);
    }

    #[test]
    fn body_uses_camel_case() {
        let body: SyncRequestBody = serde_json::from_value(serde_json::json!({
            "action": "sync",
            "license": "extra",
            "batchSize": 25
        }))
        .expect("body should parse");

        let req = SyncRequest::try_from(body).expect("valid request");
        assert_eq!(req.license, Some(LicenseTier::Extra));
        assert_eq!(req.batch_size, Some(25));
    }
}
