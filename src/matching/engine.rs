//! Match ranking on top of the vector store.
//!
//! The engine owns the ranking pipeline: load the subject's embedding,
//! normalize it, over-fetch a nearest-neighbour pool, then apply the relaxed
//! profile filters and truncate. The store behind it is a trait so ranking
//! semantics can be tested without a live database.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use tracing::warn;

use crate::errors::Result;
use crate::errors::VibeMatchError;
use crate::matching::vector::RawEmbedding;
use crate::models::CandidateMeta;
use crate::models::MatchCandidate;
use crate::models::Profile;

/// How many candidates to fetch per requested result. Filtering happens
/// after the ANN query, so the pool is padded to survive disqualifications.
pub const DEFAULT_OVERSAMPLE: usize = 3;

/// Source of embeddings and candidates. Implemented by the Postgres-backed
/// [`Database`](crate::database::Database) and by in-memory fakes in tests.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Load the stored embedding for a profile, in whatever raw shape the
    /// writer left it. Returns `Ok(None)` when the profile is missing or has
    /// no embedding; `Err` is reserved for retrieval failures.
    async fn raw_embedding(&self, profile_id: &str) -> Result<Option<RawEmbedding>>;

    /// Derive the relaxed match filters from a profile's own attributes.
    async fn match_filters(&self, profile_id: &str) -> Result<MatchFilters>;

    /// Nearest-neighbour candidates for a normalized embedding, excluding
    /// the given profile, at most `pool_size` of them, ordered by descending
    /// similarity.
    async fn nearest(
        &self,
        embedding: &[f64],
        exclude_profile_id: &str,
        pool_size: usize,
    ) -> Result<Vec<MatchCandidate>>;
}

/// The subject's own attributes, used to narrow the candidate pool.
///
/// Every field is optional and every comparison is relaxed: an attribute
/// that is unset on either side never disqualifies a candidate. Blank
/// strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilters {
    /// Desired connection type, matched by case-insensitive containment
    pub connection: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl MatchFilters {
    /// Build filters from a subject's stored profile: connection comes from
    /// their onboarding answers, location from the profile columns.
    #[must_use]
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            connection: profile.answer("connection").map(str::to_string),
            city: nonblank(profile.city.as_deref()),
            state: nonblank(profile.state.as_deref()),
            country: nonblank(profile.country.as_deref()),
        }
    }

    /// Whether a candidate survives all four relaxed checks.
    ///
    /// Connection uses substring containment (the candidate's intent must
    /// contain the subject's), location fields use equality. All
    /// comparisons are case-insensitive.
    #[must_use]
    pub fn admits(&self, meta: &CandidateMeta) -> bool {
        containment_passes(self.connection.as_deref(), meta.connection_intent.as_deref())
            && equality_passes(self.city.as_deref(), meta.city.as_deref())
            && equality_passes(self.state.as_deref(), meta.state.as_deref())
            && equality_passes(self.country.as_deref(), meta.country.as_deref())
    }

    /// True when no attribute is configured, so every candidate passes.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        nonblank(self.connection.as_deref()).is_none()
            && nonblank(self.city.as_deref()).is_none()
            && nonblank(self.state.as_deref()).is_none()
            && nonblank(self.country.as_deref()).is_none()
    }
}

fn nonblank(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn equality_passes(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match (nonblank(wanted), nonblank(actual)) {
        (Some(w), Some(a)) => a.to_lowercase() == w.to_lowercase(),
        // Either side unset: the attribute cannot disqualify
        _ => true,
    }
}

fn containment_passes(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match (nonblank(wanted), nonblank(actual)) {
        (Some(w), Some(a)) => a.to_lowercase().contains(&w.to_lowercase()),
        _ => true,
    }
}

/// Ranks match candidates for a subject user against a candidate store.
pub struct MatchEngine<S: CandidateStore> {
    store: Arc<S>,
    oversample: usize,
}

impl<S: CandidateStore> MatchEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_oversample(store, DEFAULT_OVERSAMPLE)
    }

    /// Create an engine with a custom oversample factor. Values below 1 are
    /// clamped so the pool can never be smaller than the requested limit.
    pub fn with_oversample(store: Arc<S>, oversample: usize) -> Self {
        Self {
            store,
            oversample: oversample.max(1),
        }
    }

    /// Rank candidates for `user_id` using filters derived from their own
    /// profile. This is what the matches endpoint calls.
    pub async fn rank_for_user(
        &self,
        user_id: &str,
        limit: usize,
        global: bool,
    ) -> Result<Vec<MatchCandidate>> {
        let filters = if global {
            // Global mode ignores filters entirely, so skip the lookup
            MatchFilters::default()
        } else {
            self.store.match_filters(user_id).await?
        };
        self.rank(user_id, limit, &filters, global).await
    }

    /// Rank candidates for `user_id` with explicit filters.
    ///
    /// Fails with [`VibeMatchError::NoEmbedding`] when the subject has no
    /// usable embedding, [`VibeMatchError::EmbeddingUnavailable`] when the
    /// embedding could not be read, and passes through
    /// [`VibeMatchError::StoreUnavailable`] from the nearest query.
    pub async fn rank(
        &self,
        user_id: &str,
        limit: usize,
        filters: &MatchFilters,
        global: bool,
    ) -> Result<Vec<MatchCandidate>> {
        debug!("Ranking matches for {user_id} (limit: {limit}, global: {global})");

        let Some(raw) = self.store.raw_embedding(user_id).await? else {
            return Err(VibeMatchError::NoEmbedding(user_id.to_string()));
        };

        // Present but unparseable is its own failure; callers treat both the
        // same but the distinction matters for diagnostics.
        let embedding = raw.normalize();
        if embedding.is_empty() {
            warn!("Stored embedding for {user_id} normalized to nothing");
            return Err(VibeMatchError::EmbeddingUnavailable(user_id.to_string()));
        }

        let pool_size = limit.saturating_mul(self.oversample);
        let pool = self.store.nearest(&embedding, user_id, pool_size).await?;
        debug!(
            "Fetched {} candidates for {user_id} (pool size: {pool_size})",
            pool.len()
        );

        // The store is asked to exclude the subject, but a candidate row for
        // the subject is dropped here too in case it slips through.
        let candidates = pool.into_iter().filter(|c| c.profile_id != user_id);

        let ranked: Vec<MatchCandidate> = if global {
            candidates.take(limit).collect()
        } else {
            candidates
                .filter(|c| filters.admits(&c.meta))
                .take(limit)
                .collect()
        };

        debug!("Ranked {} matches for {user_id}", ranked.len());
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(
        connection: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> CandidateMeta {
        CandidateMeta {
            connection_intent: connection.map(str::to_string),
            city: city.map(str::to_string),
            state: state.map(str::to_string),
            country: country.map(str::to_string),
        }
    }

    fn filters(
        connection: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> MatchFilters {
        MatchFilters {
            connection: connection.map(str::to_string),
            city: city.map(str::to_string),
            state: state.map(str::to_string),
            country: country.map(str::to_string),
        }
    }

    #[test]
    fn test_unconstrained_filters_admit_everyone() {
        let f = MatchFilters::default();
        assert!(f.is_unconstrained());
        assert!(f.admits(&meta(Some("friendship"), Some("Denver"), None, None)));
        assert!(f.admits(&meta(None, None, None, None)));
    }

    #[test]
    fn test_city_equality_is_case_insensitive() {
        let f = filters(None, Some("Chicago"), None, None);
        assert!(f.admits(&meta(None, Some("chicago"), None, None)));
        assert!(f.admits(&meta(None, Some("CHICAGO"), None, None)));
        assert!(!f.admits(&meta(None, Some("Denver"), None, None)));
    }

    #[test]
    fn test_absent_candidate_attribute_never_disqualifies() {
        let f = filters(Some("friendship"), Some("Chicago"), Some("IL"), Some("USA"));
        assert!(f.admits(&meta(None, None, None, None)));
    }

    #[test]
    fn test_absent_filter_attribute_never_disqualifies() {
        let f = filters(None, None, None, Some("USA"));
        assert!(f.admits(&meta(Some("anything"), Some("anywhere"), None, Some("usa"))));
        assert!(!f.admits(&meta(None, None, None, Some("Canada"))));
    }

    #[test]
    fn test_connection_uses_substring_containment() {
        let f = filters(Some("friend"), None, None, None);
        assert!(f.admits(&meta(Some("deep friendship"), None, None, None)));
        assert!(f.admits(&meta(Some("FRIENDS first"), None, None, None)));
        assert!(!f.admits(&meta(Some("romance"), None, None, None)));
    }

    #[test]
    fn test_containment_direction_is_candidate_contains_subject() {
        // Subject wants the longer phrase; a candidate with only the short
        // word does not contain it.
        let f = filters(Some("deep friendship"), None, None, None);
        assert!(!f.admits(&meta(Some("friendship"), None, None, None)));
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let f = filters(Some("friend"), Some("Chicago"), None, None);
        // Connection matches but city does not
        assert!(!f.admits(&meta(Some("friendship"), Some("Denver"), None, None)));
        // City matches but connection does not
        assert!(!f.admits(&meta(Some("romance"), Some("Chicago"), None, None)));
        assert!(f.admits(&meta(Some("friendship"), Some("Chicago"), None, None)));
    }

    #[test]
    fn test_blank_strings_count_as_unset() {
        let f = filters(Some(""), Some("   "), None, None);
        assert!(f.is_unconstrained());
        assert!(f.admits(&meta(Some("romance"), Some("Denver"), None, None)));

        let f = filters(None, Some("Chicago"), None, None);
        assert!(f.admits(&meta(None, Some(""), None, None)));
    }

    #[test]
    fn test_from_profile_pulls_connection_from_answers() {
        let profile = Profile {
            id: "u_ab12cd34".to_string(),
            name: None,
            age: None,
            photo_url: None,
            vibe_bio: None,
            enriched_profile: None,
            answers: serde_json::json!({"connection": "deep friendship"}),
            city: Some("Chicago".to_string()),
            state: Some("IL".to_string()),
            country: Some(" ".to_string()),
            lat: None,
            lon: None,
            updated_at: chrono::Utc::now(),
        };
        let f = MatchFilters::from_profile(&profile);
        assert_eq!(f.connection.as_deref(), Some("deep friendship"));
        assert_eq!(f.city.as_deref(), Some("Chicago"));
        assert_eq!(f.state.as_deref(), Some("IL"));
        assert_eq!(f.country, None);
    }
}
