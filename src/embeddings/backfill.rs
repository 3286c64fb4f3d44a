//! Backfill embeddings for profiles that were stored without one

use std::sync::Arc;

use tracing::info;
use tracing::warn;

use super::service::EmbeddingService;
use crate::database::Database;
use crate::errors::Result;

/// Outcome counters for one backfill run
#[derive(Debug, Default)]
pub struct BackfillStats {
    pub total_profiles: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Re-embed every profile whose embedding column is NULL.
///
/// Profiles without enriched text are skipped, not failed: there is nothing
/// to embed until the user finishes onboarding again.
pub async fn backfill_embeddings(
    db: Arc<Database>,
    embedding_service: Arc<EmbeddingService>,
) -> Result<BackfillStats> {
    info!("Starting embeddings backfill");

    let mut stats = BackfillStats::default();

    let candidates = db.profiles_missing_embedding().await?;
    stats.total_profiles = candidates.len();
    info!("Found {} profiles without embeddings", candidates.len());

    for candidate in candidates {
        let Some(text) = candidate
            .enriched_profile
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            stats.skipped += 1;
            continue;
        };

        match embedding_service.generate(text).await {
            Ok(embedding) => match db.set_profile_embedding(&candidate.id, embedding).await {
                Ok(()) => stats.updated += 1,
                Err(e) => {
                    warn!("Failed to store embedding for {}: {}", candidate.id, e);
                    stats.failed += 1;
                }
            },
            Err(e) => {
                warn!("Failed to embed profile {}: {}", candidate.id, e);
                stats.failed += 1;
            }
        }

        // Small delay between calls to avoid rate limiting
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }

    info!(
        "Backfill complete: {} updated, {} skipped, {} failed",
        stats.updated, stats.skipped, stats.failed
    );
    Ok(stats)
}
