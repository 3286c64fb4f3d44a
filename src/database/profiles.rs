//! Profile persistence and the nearest-neighbour query primitive.
//!
//! Profiles are written as whole documents: an upsert replaces every column
//! in one statement, so an embedding is never half-written. Reads leave the
//! embedding column out except for the dedicated raw-embedding fetch used by
//! the ranking path.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use tracing::debug;
use tracing::warn;

use super::Database;
use crate::errors::Result;
use crate::errors::VibeMatchError;
use crate::matching::sanitize_vector;
use crate::matching::CandidateStore;
use crate::matching::MatchFilters;
use crate::matching::RawEmbedding;
use crate::models::answer_str;
use crate::models::CandidateDisplay;
use crate::models::CandidateMeta;
use crate::models::MatchCandidate;
use crate::models::Profile;
use crate::models::UpsertProfile;

/// A profile that still needs an embedding, as returned by the backfill scan.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BackfillCandidate {
    pub id: String,
    pub enriched_profile: Option<String>,
}

impl Database {
    /// Insert or replace a profile document.
    ///
    /// Every column travels in one statement so the write is all-or-nothing;
    /// in particular the embedding can never be partially stored.
    pub async fn upsert_profile(&self, profile: &UpsertProfile) -> Result<()> {
        let embedding = profile
            .embedding
            .as_ref()
            .map(|e| pgvector::Vector::from(e.clone()));

        sqlx::query(
            r"
            INSERT INTO profiles (
                id, name, age, photo_url, vibe_bio, enriched_profile,
                answers, city, state, country, lat, lon, embedding, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                age = EXCLUDED.age,
                photo_url = EXCLUDED.photo_url,
                vibe_bio = EXCLUDED.vibe_bio,
                enriched_profile = EXCLUDED.enriched_profile,
                answers = EXCLUDED.answers,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                country = EXCLUDED.country,
                lat = EXCLUDED.lat,
                lon = EXCLUDED.lon,
                embedding = EXCLUDED.embedding,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(profile.age)
        .bind(&profile.photo_url)
        .bind(&profile.vibe_bio)
        .bind(&profile.enriched_profile)
        .bind(&profile.answers)
        .bind(&profile.city)
        .bind(&profile.state)
        .bind(&profile.country)
        .bind(profile.lat)
        .bind(profile.lon)
        .bind(embedding)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!("Upserted profile {}", profile.id);
        Ok(())
    }

    /// Fetch a profile by id, excluding the embedding column.
    pub async fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r"
            SELECT id, name, age, photo_url, vibe_bio, enriched_profile,
                   answers, city, state, country, lat, lon, updated_at
            FROM profiles
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Fetch several profiles at once (embedding excluded). Missing ids are
    /// simply absent from the result.
    pub async fn get_profiles(&self, ids: &[String]) -> Result<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(
            r"
            SELECT id, name, age, photo_url, vibe_bio, enriched_profile,
                   answers, city, state, country, lat, lon, updated_at
            FROM profiles
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    /// Fetch a pair of profiles, failing when either is missing. Both LLM
    /// content paths need the two sides together.
    pub async fn get_profile_pair(&self, a: &str, b: &str) -> Result<(Profile, Profile)> {
        let ids = vec![a.to_string(), b.to_string()];
        let mut profiles = self.get_profiles(&ids).await?;

        let pos_a = profiles
            .iter()
            .position(|p| p.id == a)
            .ok_or_else(|| VibeMatchError::ProfileNotFound(a.to_string()))?;
        let first = profiles.swap_remove(pos_a);
        let second = profiles
            .into_iter()
            .find(|p| p.id == b)
            .ok_or_else(|| VibeMatchError::ProfileNotFound(b.to_string()))?;

        Ok((first, second))
    }

    /// Fetch the stored embedding in its raw textual representation.
    ///
    /// The column is read back as text so the normalization layer owns the
    /// parsing, the same path legacy rows written as strings or jsonb maps
    /// go through. `Ok(None)` means no profile or no embedding.
    pub async fn raw_profile_embedding(&self, id: &str) -> Result<Option<RawEmbedding>> {
        let row = sqlx::query(
            r"
            SELECT embedding::text AS embedding
            FROM profiles
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let text: Option<String> = row.try_get("embedding")?;
        Ok(text.map(RawEmbedding::DelimitedText))
    }

    /// Nearest-neighbour profiles for a query vector, ordered by descending
    /// cosine similarity.
    ///
    /// This is the `match_profiles` primitive: the vector is sanitized to
    /// finite values, the subject is excluded server-side, and the whole
    /// query runs under the configured deadline. Transport, query, and
    /// deadline failures all surface as [`VibeMatchError::StoreUnavailable`];
    /// retrying is the caller's decision.
    pub async fn nearest_profiles(
        &self,
        embedding: &[f64],
        exclude_id: &str,
        pool_size: usize,
    ) -> Result<Vec<MatchCandidate>> {
        let sanitized = sanitize_vector(embedding);
        if sanitized.is_empty() {
            return Err(VibeMatchError::StoreUnavailable(
                "query vector has no finite values".to_string(),
            ));
        }

        let query_vector =
            pgvector::Vector::from(sanitized.iter().map(|v| *v as f32).collect::<Vec<f32>>());

        let query = sqlx::query(
            r"
            SELECT id, name, age, photo_url, vibe_bio, answers,
                   city, state, country,
                   1 - (embedding <=> $1::vector) AS similarity
            FROM profiles
            WHERE embedding IS NOT NULL
                AND id <> $2
            ORDER BY embedding <=> $1::vector
            LIMIT $3
            ",
        )
        .bind(query_vector)
        .bind(exclude_id)
        .bind(pool_size as i64)
        .fetch_all(&self.pool);

        let rows = tokio::time::timeout(self.query_timeout, query)
            .await
            .map_err(|_| {
                warn!(
                    "Nearest-neighbour query for {exclude_id} exceeded {:?}",
                    self.query_timeout
                );
                VibeMatchError::StoreUnavailable(format!(
                    "nearest-neighbour query timed out after {:?}",
                    self.query_timeout
                ))
            })?
            .map_err(|e| VibeMatchError::StoreUnavailable(e.to_string()))?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let answers: serde_json::Value = row.try_get("answers")?;
            candidates.push(MatchCandidate {
                profile_id: row.try_get("id")?,
                similarity: row.try_get::<f64, _>("similarity")?,
                meta: CandidateMeta {
                    connection_intent: answer_str(&answers, "connection").map(str::to_string),
                    city: row.try_get("city")?,
                    state: row.try_get("state")?,
                    country: row.try_get("country")?,
                },
                display: CandidateDisplay {
                    name: row.try_get("name")?,
                    age: row.try_get("age")?,
                    photo_url: row.try_get("photo_url")?,
                    vibe_bio: row.try_get("vibe_bio")?,
                },
            });
        }

        debug!(
            "Nearest query returned {} candidates (pool size {pool_size})",
            candidates.len()
        );
        Ok(candidates)
    }

    /// Profiles with no stored embedding, for the backfill command.
    pub async fn profiles_missing_embedding(&self) -> Result<Vec<BackfillCandidate>> {
        let candidates = sqlx::query_as::<_, BackfillCandidate>(
            r"
            SELECT id, enriched_profile
            FROM profiles
            WHERE embedding IS NULL
            ORDER BY updated_at
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(candidates)
    }

    /// Store a freshly computed embedding for an existing profile.
    pub async fn set_profile_embedding(&self, id: &str, embedding: Vec<f32>) -> Result<()> {
        sqlx::query(
            r"
            UPDATE profiles
            SET embedding = $2, updated_at = $3
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(pgvector::Vector::from(embedding))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CandidateStore for Database {
    async fn raw_embedding(&self, profile_id: &str) -> Result<Option<RawEmbedding>> {
        self.raw_profile_embedding(profile_id).await
    }

    async fn match_filters(&self, profile_id: &str) -> Result<MatchFilters> {
        let profile = self
            .get_profile(profile_id)
            .await?
            .ok_or_else(|| VibeMatchError::ProfileNotFound(profile_id.to_string()))?;
        Ok(MatchFilters::from_profile(&profile))
    }

    async fn nearest(
        &self,
        embedding: &[f64],
        exclude_profile_id: &str,
        pool_size: usize,
    ) -> Result<Vec<MatchCandidate>> {
        self.nearest_profiles(embedding, exclude_profile_id, pool_size)
            .await
    }
}
