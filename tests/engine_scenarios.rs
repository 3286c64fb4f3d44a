//! End-to-end ranking scenarios against an in-memory candidate store.
//!
//! These exercise the full rank pipeline (embedding load, normalization,
//! pool fetch, filtering, truncation) without a live Postgres instance.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use vibematch::matching::CandidateStore;
use vibematch::matching::MatchEngine;
use vibematch::matching::MatchFilters;
use vibematch::matching::RawEmbedding;
use vibematch::models::CandidateDisplay;
use vibematch::models::CandidateMeta;
use vibematch::models::MatchCandidate;
use vibematch::Result;
use vibematch::VibeMatchError;

/// In-memory stand-in for the Postgres-backed store. Holds one subject
/// embedding plus a pre-ranked candidate list and records the pool size the
/// engine asks for.
struct FakeStore {
    embedding: Option<RawEmbedding>,
    filters: MatchFilters,
    candidates: Vec<MatchCandidate>,
    store_down: bool,
    requested_pool: Mutex<Option<usize>>,
}

impl FakeStore {
    fn new(embedding: Option<RawEmbedding>, candidates: Vec<MatchCandidate>) -> Self {
        Self {
            embedding,
            filters: MatchFilters::default(),
            candidates,
            store_down: false,
            requested_pool: Mutex::new(None),
        }
    }

    fn with_filters(mut self, filters: MatchFilters) -> Self {
        self.filters = filters;
        self
    }

    fn down(mut self) -> Self {
        self.store_down = true;
        self
    }
}

#[async_trait]
impl CandidateStore for FakeStore {
    async fn raw_embedding(&self, _profile_id: &str) -> Result<Option<RawEmbedding>> {
        Ok(self.embedding.clone())
    }

    async fn match_filters(&self, _profile_id: &str) -> Result<MatchFilters> {
        Ok(self.filters.clone())
    }

    async fn nearest(
        &self,
        _embedding: &[f64],
        exclude_profile_id: &str,
        pool_size: usize,
    ) -> Result<Vec<MatchCandidate>> {
        if self.store_down {
            return Err(VibeMatchError::StoreUnavailable(
                "nearest query timed out".to_string(),
            ));
        }
        *self.requested_pool.lock().unwrap() = Some(pool_size);
        Ok(self
            .candidates
            .iter()
            .filter(|c| c.profile_id != exclude_profile_id)
            .take(pool_size)
            .cloned()
            .collect())
    }
}

fn candidate(
    id: &str,
    similarity: f64,
    connection: Option<&str>,
    city: Option<&str>,
) -> MatchCandidate {
    MatchCandidate {
        profile_id: id.to_string(),
        similarity,
        meta: CandidateMeta {
            connection_intent: connection.map(str::to_string),
            city: city.map(str::to_string),
            state: None,
            country: None,
        },
        display: CandidateDisplay::default(),
    }
}

fn filters(connection: Option<&str>, city: Option<&str>) -> MatchFilters {
    MatchFilters {
        connection: connection.map(str::to_string),
        city: city.map(str::to_string),
        state: None,
        country: None,
    }
}

fn subject_embedding() -> Option<RawEmbedding> {
    Some(RawEmbedding::Sequence(vec![0.1, 0.2, 0.3]))
}

fn ids(candidates: &[MatchCandidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.profile_id.as_str()).collect()
}

/// Nine-candidate pool: six in Chicago or location-less, three in Denver.
/// Pre-ranked by descending similarity, the way the store returns them.
fn mixed_city_pool() -> Vec<MatchCandidate> {
    vec![
        candidate("u_chi00001", 0.95, None, Some("Chicago")),
        candidate("u_den00001", 0.94, None, Some("Denver")),
        candidate("u_chi00002", 0.93, None, Some("Chicago")),
        candidate("u_none0001", 0.92, None, None),
        candidate("u_den00002", 0.91, None, Some("Denver")),
        candidate("u_chi00003", 0.90, None, Some("Chicago")),
        candidate("u_none0002", 0.89, None, None),
        candidate("u_den00003", 0.88, None, Some("Denver")),
        candidate("u_chi00004", 0.87, None, Some("chicago")),
    ]
}

#[tokio::test]
async fn subject_never_appears_in_own_results() {
    let mut pool = mixed_city_pool();
    pool.insert(0, candidate("u_subject1", 1.0, None, Some("Chicago")));
    let store = Arc::new(FakeStore::new(subject_embedding(), pool));
    let engine = MatchEngine::new(store);

    let ranked = engine
        .rank("u_subject1", 20, &MatchFilters::default(), false)
        .await
        .unwrap();

    assert!(ranked.iter().all(|c| c.profile_id != "u_subject1"));
    assert_eq!(ranked.len(), 9);
}

#[tokio::test]
async fn results_never_exceed_limit() {
    let store = Arc::new(FakeStore::new(subject_embedding(), mixed_city_pool()));
    let engine = MatchEngine::new(store);

    let ranked = engine
        .rank("u_subject1", 4, &MatchFilters::default(), false)
        .await
        .unwrap();

    assert_eq!(ranked.len(), 4);
    // Best-first order is preserved through filtering
    assert_eq!(
        ids(&ranked),
        vec!["u_chi00001", "u_den00001", "u_chi00002", "u_none0001"]
    );
}

#[tokio::test]
async fn city_filter_keeps_matching_and_unset_candidates() {
    let store = Arc::new(FakeStore::new(subject_embedding(), mixed_city_pool()));
    let engine = MatchEngine::new(store);

    let ranked = engine
        .rank("u_subject1", 5, &filters(None, Some("Chicago")), false)
        .await
        .unwrap();

    // Denver candidates are disqualified; Chicago (any case) and
    // location-less candidates survive, truncated to the limit.
    assert_eq!(
        ids(&ranked),
        vec![
            "u_chi00001",
            "u_chi00002",
            "u_none0001",
            "u_chi00003",
            "u_none0002"
        ]
    );
}

#[tokio::test]
async fn global_mode_bypasses_contradictory_filters() {
    let store = Arc::new(FakeStore::new(subject_embedding(), mixed_city_pool()));
    let engine = MatchEngine::new(store);

    // These filters would admit nobody
    let impossible = filters(Some("no such intent"), Some("Nowhere"));
    let ranked = engine.rank("u_subject1", 5, &impossible, true).await.unwrap();

    // Global mode returns the first `limit` raw neighbours untouched
    assert_eq!(
        ids(&ranked),
        vec![
            "u_chi00001",
            "u_den00001",
            "u_chi00002",
            "u_none0001",
            "u_den00002"
        ]
    );
}

#[tokio::test]
async fn connection_filter_uses_case_insensitive_containment() {
    let pool = vec![
        candidate("u_a0000001", 0.95, Some("Deep FRIENDSHIP and more"), None),
        candidate("u_b0000001", 0.90, Some("romance"), None),
        candidate("u_c0000001", 0.85, None, None),
    ];
    let store = Arc::new(FakeStore::new(subject_embedding(), pool));
    let engine = MatchEngine::new(store);

    let ranked = engine
        .rank("u_subject1", 10, &filters(Some("friendship"), None), false)
        .await
        .unwrap();

    // The containing intent and the unset intent pass; "romance" does not
    assert_eq!(ids(&ranked), vec!["u_a0000001", "u_c0000001"]);
}

#[tokio::test]
async fn pool_is_oversampled_relative_to_limit() {
    let store = Arc::new(FakeStore::new(subject_embedding(), mixed_city_pool()));
    let engine = MatchEngine::with_oversample(store.clone(), 3);

    engine
        .rank("u_subject1", 5, &MatchFilters::default(), false)
        .await
        .unwrap();

    assert_eq!(*store.requested_pool.lock().unwrap(), Some(15));
}

#[tokio::test]
async fn rank_for_user_pulls_filters_from_store() {
    let store = Arc::new(
        FakeStore::new(subject_embedding(), mixed_city_pool())
            .with_filters(filters(None, Some("Denver"))),
    );
    let engine = MatchEngine::new(store);

    let ranked = engine.rank_for_user("u_subject1", 10, false).await.unwrap();

    assert_eq!(
        ids(&ranked),
        vec![
            "u_den00001",
            "u_none0001",
            "u_den00002",
            "u_none0002",
            "u_den00003"
        ]
    );
}

#[tokio::test]
async fn missing_embedding_is_a_no_embedding_error() {
    let store = Arc::new(FakeStore::new(None, mixed_city_pool()));
    let engine = MatchEngine::new(store);

    let err = engine
        .rank("u_subject1", 5, &MatchFilters::default(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, VibeMatchError::NoEmbedding(id) if id == "u_subject1"));
}

#[tokio::test]
async fn unparseable_embedding_is_embedding_unavailable() {
    let garbage = RawEmbedding::DelimitedText("not, numbers, at, all".to_string());
    let store = Arc::new(FakeStore::new(Some(garbage), mixed_city_pool()));
    let engine = MatchEngine::new(store);

    let err = engine
        .rank("u_subject1", 5, &MatchFilters::default(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, VibeMatchError::EmbeddingUnavailable(_)));
}

#[tokio::test]
async fn store_timeout_surfaces_as_store_unavailable() {
    let store = Arc::new(FakeStore::new(subject_embedding(), mixed_city_pool()).down());
    let engine = MatchEngine::new(store);

    let err = engine
        .rank("u_subject1", 5, &MatchFilters::default(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, VibeMatchError::StoreUnavailable(_)));
}

#[tokio::test]
async fn partially_parseable_text_embedding_still_ranks() {
    // Three of four tokens parse; the vector is usable and ranking proceeds
    let raw = RawEmbedding::DelimitedText("[0.1, 0.2, NaN, 0.4]".to_string());
    assert_eq!(raw.clone().normalize().len(), 3);

    let store = Arc::new(FakeStore::new(Some(raw), mixed_city_pool()));
    let engine = MatchEngine::new(store);

    let ranked = engine
        .rank("u_subject1", 3, &MatchFilters::default(), false)
        .await
        .unwrap();
    assert_eq!(ranked.len(), 3);
}

#[tokio::test]
async fn zero_survivors_is_an_empty_result_not_an_error() {
    let pool = vec![
        candidate("u_den00001", 0.9, None, Some("Denver")),
        candidate("u_den00002", 0.8, None, Some("Denver")),
    ];
    let store = Arc::new(FakeStore::new(subject_embedding(), pool));
    let engine = MatchEngine::new(store);

    let ranked = engine
        .rank("u_subject1", 5, &filters(None, Some("Chicago")), false)
        .await
        .unwrap();
    assert!(ranked.is_empty());
}
