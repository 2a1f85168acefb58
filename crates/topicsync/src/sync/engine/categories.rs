//! Map license tiers to forum categories.

use std::collections::BTreeMap;

use crate::forum::{ForumApi, ForumCategory};
use crate::question::LicenseTier;
use crate::sync::error::SyncError;
use crate::sync::progress::{ProgressCallback, SyncProgress, emit};
use crate::sync::types::CategoryNames;

/// The forum category for each in-scope tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCategories {
    by_tier: BTreeMap<LicenseTier, ForumCategory>,
}

impl ResolvedCategories {
    pub fn get(&self, tier: LicenseTier) -> Option<&ForumCategory> {
        self.by_tier.get(&tier)
    }

    /// Tiers and categories in pool order.
    pub fn iter(&self) -> impl Iterator<Item = (LicenseTier, &ForumCategory)> {
        self.by_tier.iter().map(|(tier, cat)| (*tier, cat))
    }

    pub fn len(&self) -> usize {
        self.by_tier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tier.is_empty()
    }
}

fn matches_name(category: &ForumCategory, wanted: &str) -> bool {
    category.name.eq_ignore_ascii_case(wanted) || category.slug.eq_ignore_ascii_case(wanted)
}

/// Pick the configured category for every tier.
///
/// # Errors
///
/// `MissingCategories` naming every tier whose category was not found.
pub fn match_categories(
    categories: &[ForumCategory],
    names: &CategoryNames,
    tiers: &[LicenseTier],
) -> Result<ResolvedCategories, SyncError> {
    let mut resolved = ResolvedCategories::default();
    let mut missing = Vec::new();

    for &tier in tiers {
        let wanted = names.for_tier(tier);
        match categories.iter().find(|c| matches_name(c, wanted)) {
            Some(category) => {
                resolved.by_tier.insert(tier, category.clone());
            }
            None => missing.push(wanted.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(SyncError::MissingCategories { missing });
    }
    Ok(resolved)
}

/// Fetch the category list and resolve every tier.
///
/// All three tiers must resolve even when the run is scoped to one.
pub async fn resolve_categories<F: ForumApi + ?Sized>(
    forum: &F,
    names: &CategoryNames,
    on_progress: Option<&ProgressCallback>,
) -> Result<ResolvedCategories, SyncError> {
    emit(on_progress, SyncProgress::ResolvingCategories);

    let categories = forum.list_categories().await?;
    let resolved = match_categories(&categories, names, &LicenseTier::ALL)?;

    tracing::debug!(
        categories = categories.len(),
        resolved = resolved.len(),
        "Resolved forum categories"
    );
    emit(
        on_progress,
        SyncProgress::CategoriesResolved {
            count: resolved.len(),
        },
    );
    Ok(resolved)
}
