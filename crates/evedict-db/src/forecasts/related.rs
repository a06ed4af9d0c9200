use std::collections::HashMap;

use evedict_core::{ForecastCategory, RelatedForecast};
use sqlx::PgPool;
use uuid::Uuid;

use super::types::RelatedForecastRow;
use crate::DbError;

/// Find up to `limit` approved forecasts related to forecast `id`.
///
/// Candidates come from two sets: forecasts sharing at least one of `tags`
/// (`matched_by_tag = true`) and forecasts in `category` (`false`). Both
/// exclude `id` itself and unapproved forecasts. The merged list is ranked
/// by [`rank_related`], so a tag match always outranks a category match
/// regardless of recency.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure or if a stored category
/// is unknown.
pub async fn get_related_forecasts(
    pool: &PgPool,
    id: Uuid,
    tags: &[String],
    category: ForecastCategory,
    limit: i64,
) -> Result<Vec<RelatedForecast>, DbError> {
    let Ok(wanted) = usize::try_from(limit) else {
        return Ok(Vec::new());
    };
    if wanted == 0 {
        return Ok(Vec::new());
    }

    // The category branch over-fetches so that overlap with tag matches
    // cannot starve the final list.
    let candidates = sqlx::query_as::<_, RelatedForecastRow>(
        "(SELECT DISTINCT f.id, f.headline, f.summary, f.image_url, f.category, f.captured_at, \
                 TRUE AS matched_by_tag \
            FROM forecasts f \
            JOIN forecast_tags ft ON ft.forecast_id = f.id \
            JOIN tags t ON t.id = ft.tag_id \
           WHERE t.name = ANY($2) AND f.id <> $1 AND f.is_approved \
           ORDER BY f.captured_at DESC \
           LIMIT $4) \
         UNION ALL \
         (SELECT f.id, f.headline, f.summary, f.image_url, f.category, f.captured_at, \
                 FALSE AS matched_by_tag \
            FROM forecasts f \
           WHERE f.category = $3 AND f.id <> $1 AND f.is_approved \
           ORDER BY f.captured_at DESC \
           LIMIT $4 * 2)",
    )
    .bind(id)
    .bind(tags)
    .bind(category.as_str())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rank_related(candidates, wanted)
        .into_iter()
        .map(RelatedForecast::try_from)
        .collect()
}

/// Deduplicate related-forecast candidates by id and order them.
///
/// A forecast found by both tag and category keeps the tag flag. Ordering is
/// tag matches first, then newest first, with id as a final tie-break. The
/// result holds at most `limit` entries.
#[must_use]
pub fn rank_related(candidates: Vec<RelatedForecastRow>, limit: usize) -> Vec<RelatedForecastRow> {
    let mut by_id: HashMap<Uuid, RelatedForecastRow> = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        match by_id.get_mut(&candidate.id) {
            Some(existing) => existing.matched_by_tag |= candidate.matched_by_tag,
            None => {
                by_id.insert(candidate.id, candidate);
            }
        }
    }

    let mut ranked: Vec<RelatedForecastRow> = by_id.into_values().collect();
    ranked.sort_by(|a, b| {
        b.matched_by_tag
            .cmp(&a.matched_by_tag)
            .then_with(|| b.captured_at.cmp(&a.captured_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(limit);
    ranked
}
