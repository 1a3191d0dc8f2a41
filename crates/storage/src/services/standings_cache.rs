//! Two-tier read of club standings: cached ledger first, recomputation on a miss.
//!
//! Reads never write. Refreshing the cache is the separate [`rebuild_club_standings`] step.

use std::future::Future;

use async_trait::async_trait;

use super::club_standings::assemble_club_standings;
use crate::dto::standings::{CacheRun, ClubContribution, ClubStandingRow};
use crate::error::{Result, StorageError};

#[async_trait]
pub trait StandingsCache: Send + Sync {
    /// The cached ledger for a series, or `None` when nothing has been stored.
    async fn try_load(&self, series_id: i64) -> Result<Option<Vec<ClubContribution>>>;

    /// Replaces everything cached for the series in one step.
    async fn replace(&self, series_id: i64, ledger: &[ClubContribution]) -> Result<CacheRun>;
}

/// Serves club standings from the cache, recomputing when the cache is empty or failing.
///
/// A failing cache is logged and never surfaces to the caller.
pub async fn club_standings_cached<C, F, Fut>(
    cache: &C,
    series_id: i64,
    compute: F,
) -> Result<Vec<ClubStandingRow>>
where
    C: StandingsCache + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<ClubContribution>>>,
{
    StorageError::check_series_id(series_id)?;

    match cache.try_load(series_id).await {
        Ok(Some(ledger)) if !ledger.is_empty() => {
            tracing::debug!("Serving club standings for series {} from cache", series_id);
            return Ok(assemble_club_standings(&ledger));
        }
        Ok(_) => {
            tracing::debug!("Club standings cache miss for series {}", series_id);
        }
        Err(e) => {
            tracing::warn!(
                "Standings cache unavailable for series {}, recomputing: {}",
                series_id,
                e
            );
        }
    }

    let ledger = compute().await?;
    Ok(assemble_club_standings(&ledger))
}

/// Stores a freshly computed ledger, replacing the previous one wholesale.
pub async fn rebuild_club_standings<C>(
    cache: &C,
    series_id: i64,
    ledger: &[ClubContribution],
) -> Result<CacheRun>
where
    C: StandingsCache + ?Sized,
{
    StorageError::check_series_id(series_id)?;

    if let Some(stray) = ledger.iter().find(|c| c.series_id != series_id) {
        return Err(StorageError::InvalidInput(format!(
            "ledger entry for series {} passed to rebuild of series {}",
            stray.series_id, series_id
        )));
    }

    let run = cache.replace(series_id, ledger).await?;
    tracing::info!(
        "Rebuilt club standings cache for series {}: {} contributions (run {})",
        series_id,
        run.contribution_count,
        run.run_id
    );

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultSnapshot;
    use crate::services::club_standings::{build_club_ledger, compute_club_standings};
    use crate::services::fixtures::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;
    use uuid::Uuid;

    #[derive(Default)]
    struct InMemoryStandingsCache {
        entries: RwLock<HashMap<i64, (CacheRun, Vec<ClubContribution>)>>,
    }

    impl InMemoryStandingsCache {
        fn new() -> Self {
            Self::default()
        }

        async fn last_run(&self, series_id: i64) -> Option<CacheRun> {
            let entries = self.entries.read().await;
            entries.get(&series_id).map(|(run, _)| run.clone())
        }
    }

    #[async_trait]
    impl StandingsCache for InMemoryStandingsCache {
        async fn try_load(&self, series_id: i64) -> Result<Option<Vec<ClubContribution>>> {
            let entries = self.entries.read().await;
            Ok(entries.get(&series_id).map(|(_, ledger)| ledger.clone()))
        }

        async fn replace(&self, series_id: i64, ledger: &[ClubContribution]) -> Result<CacheRun> {
            let run = CacheRun {
                series_id,
                run_id: Uuid::new_v4(),
                computed_at: chrono::Utc::now().naive_utc(),
                contribution_count: ledger.len() as i64,
            };

            let mut entries = self.entries.write().await;
            entries.insert(series_id, (run.clone(), ledger.to_vec()));

            Ok(run)
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl StandingsCache for BrokenCache {
        async fn try_load(&self, _series_id: i64) -> Result<Option<Vec<ClubContribution>>> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn replace(&self, _series_id: i64, _ledger: &[ClubContribution]) -> Result<CacheRun> {
            Err(StorageError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn snapshot() -> ResultSnapshot {
        ResultSnapshot {
            series: vec![series(1, None)],
            events: vec![
                event(11, Some(1), date(2025, 5, 1)),
                event(12, Some(1), date(2025, 6, 1)),
            ],
            classes: vec![scoring_class(5, "Elite"), scoring_class(6, "Junior")],
            clubs: vec![club(1, "CK Uni"), club(2, "IK Hakarps")],
            riders: vec![
                rider(100, "Ann", "A", Some(1)),
                rider(101, "Bea", "B", Some(1)),
                rider(102, "Cia", "C", Some(2)),
                rider(103, "Dan", "D", Some(2)),
            ],
            results: vec![
                finished(1, 100, 11, 5, rust_decimal::Decimal::new(1005, 1)),
                finished(2, 101, 11, 5, pts(75)),
                finished(3, 102, 11, 5, pts(90)),
                finished(4, 103, 12, 6, pts(40)),
                finished(5, 100, 12, 5, pts(55)),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cached_and_fresh_runs_are_identical() {
        let snapshot = snapshot();
        let cache = InMemoryStandingsCache::new();

        let fresh = compute_club_standings(&snapshot, 1).unwrap();

        let ledger = build_club_ledger(&snapshot, 1).unwrap();
        rebuild_club_standings(&cache, 1, &ledger).await.unwrap();

        let cached = club_standings_cached(&cache, 1, || async {
            Err(StorageError::InvalidInput("cache hit must not recompute".to_string()))
        })
        .await
        .unwrap();

        assert_eq!(cached, fresh);
        assert_eq!(
            serde_json::to_string(&cached).unwrap(),
            serde_json::to_string(&fresh).unwrap()
        );
    }

    #[tokio::test]
    async fn test_miss_recomputes_without_writing() {
        let snapshot = snapshot();
        let cache = InMemoryStandingsCache::new();

        let standings = club_standings_cached(&cache, 1, || async {
            build_club_ledger(&snapshot, 1)
        })
        .await
        .unwrap();

        assert_eq!(standings, compute_club_standings(&snapshot, 1).unwrap());
        assert!(cache.try_load(1).await.unwrap().is_none());
        assert!(cache.last_run(1).await.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_cache_falls_back() {
        let snapshot = snapshot();

        let standings = club_standings_cached(&BrokenCache, 1, || async {
            build_club_ledger(&snapshot, 1)
        })
        .await
        .unwrap();

        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].club_id, 1);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_ledger() {
        let snapshot = snapshot();
        let cache = InMemoryStandingsCache::new();

        let ledger = build_club_ledger(&snapshot, 1).unwrap();
        let first = rebuild_club_standings(&cache, 1, &ledger).await.unwrap();
        let second = rebuild_club_standings(&cache, 1, &ledger[..1]).await.unwrap();

        assert_ne!(first.run_id, second.run_id);
        assert_eq!(cache.try_load(1).await.unwrap().unwrap().len(), 1);
        assert_eq!(cache.last_run(1).await, Some(second));
    }

    #[tokio::test]
    async fn test_rebuild_rejects_foreign_rows() {
        let snapshot = snapshot();
        let cache = InMemoryStandingsCache::new();
        let ledger = build_club_ledger(&snapshot, 1).unwrap();

        assert!(matches!(
            rebuild_club_standings(&cache, 2, &ledger).await,
            Err(StorageError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_series_id_fails_fast() {
        let cache = InMemoryStandingsCache::new();
        let result = club_standings_cached(&cache, 0, || async { Ok(Vec::new()) }).await;
        assert!(matches!(result, Err(StorageError::InvalidInput(_))));
    }
}
