use std::collections::HashMap;

use shared::{
    domain::{MatchId, MatchStatus},
    protocol::Match,
};
use tokio::sync::RwLock;
use tracing::warn;

use crate::{
    api::{ApiResult, MatchApi},
    error::CacheError,
};

#[derive(Default)]
struct CacheState {
    snapshots: HashMap<MatchId, Match>,
    /// Survives invalidation so a stale refetch cannot move a match backwards.
    high_water: HashMap<MatchId, MatchStatus>,
}

/// Match snapshots keyed by id. Mutating actions invalidate an entry and the
/// next read refetches it.
#[derive(Default)]
pub struct MatchCache {
    state: RwLock<CacheState>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, match_id: MatchId) -> Option<Match> {
        self.state.read().await.snapshots.get(&match_id).cloned()
    }

    pub async fn store(&self, snapshot: Match) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        if let Some(&cached) = state.high_water.get(&snapshot.id) {
            if snapshot.status < cached {
                warn!(
                    match_id = snapshot.id.0,
                    %cached,
                    received = %snapshot.status,
                    "refusing match snapshot with regressed status"
                );
                return Err(CacheError::StatusRegressed {
                    id: snapshot.id,
                    cached,
                    received: snapshot.status,
                });
            }
        }
        state.high_water.insert(snapshot.id, snapshot.status);
        state.snapshots.insert(snapshot.id, snapshot);
        Ok(())
    }

    /// Returns whether an entry was dropped.
    pub async fn invalidate(&self, match_id: MatchId) -> bool {
        self.state
            .write()
            .await
            .snapshots
            .remove(&match_id)
            .is_some()
    }

    pub async fn get_or_fetch(&self, api: &dyn MatchApi, match_id: MatchId) -> ApiResult<Match> {
        if let Some(snapshot) = self.get(match_id).await {
            return Ok(snapshot);
        }
        let snapshot = api.fetch_match(match_id).await?;
        self.store(snapshot.clone()).await?;
        Ok(snapshot)
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
