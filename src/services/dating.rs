use std::sync::Arc;

use crate::core::{filter_candidates, resolve_mutual_matches, Decision, PageRequest, PageWindow, Paginator};
use crate::error::AppError;
use crate::models::{CandidateQuery, ProfileId, UserProfile};
use crate::services::cache::{CacheError, CacheKey, CacheManager};
use crate::services::store::ProfileStore;

/// One page of the discovery feed
#[derive(Debug)]
pub struct FeedResult {
    pub candidates: Vec<UserProfile>,
    pub window: PageWindow,
}

/// Discovery feed, decision recording and match resolution over a profile store
#[derive(Clone)]
pub struct DatingService {
    store: Arc<dyn ProfileStore>,
    cache: Arc<CacheManager>,
    page_size: u64,
}

impl DatingService {
    pub fn new(store: Arc<dyn ProfileStore>, cache: Arc<CacheManager>, page_size: u64) -> Self {
        Self {
            store,
            cache,
            page_size: page_size.max(1),
        }
    }

    /// Candidates for `viewer` on the requested page
    ///
    /// The store filters; the returned window is re-checked against the same
    /// predicate before it is handed out.
    pub async fn discovery_page(
        &self,
        viewer: &UserProfile,
        request: PageRequest,
    ) -> Result<FeedResult, AppError> {
        let query = CandidateQuery::for_viewer(viewer);

        let total = self.store.count_candidates(&query).await?;
        let window = Paginator::new(self.page_size, total).window(request)?;

        let fetched = self
            .store
            .fetch_candidates(&query, window.offset, window.limit)
            .await?;
        let fetched_len = fetched.len();
        let candidates = filter_candidates(&query, fetched);

        if candidates.len() != fetched_len {
            tracing::warn!(
                "Store returned {} profiles outside the feed filter for profile {}",
                fetched_len - candidates.len(),
                viewer.id
            );
        }

        tracing::debug!(
            "Feed page {}/{} for profile {} ({} candidates, {} excluded by decisions)",
            window.number,
            window.num_pages,
            viewer.id,
            total,
            query.exclude_ids.len()
        );

        Ok(FeedResult { candidates, window })
    }

    /// Record a like or skip from `viewer` on `target_id`
    pub async fn record_decision(
        &self,
        viewer: &UserProfile,
        target_id: ProfileId,
        decision: Decision,
    ) -> Result<(), AppError> {
        let target = self.store.get_profile(target_id).await?;
        if target.id == viewer.id {
            return Err(AppError::BadRequest(format!(
                "Profile {} cannot {} itself",
                viewer.id, decision
            )));
        }

        self.store
            .record_decision(viewer.id, target.id, decision)
            .await?;

        tracing::info!("Profile {} chose {} on profile {}", viewer.id, decision, target.id);

        if decision.affects_matches() {
            for profile_id in [viewer.id, target.id] {
                if let Err(e) = self.cache.delete(&CacheKey::matches(profile_id)).await {
                    tracing::warn!("Failed to invalidate match cache for {}: {}", profile_id, e);
                }
            }
        }

        Ok(())
    }

    /// Profiles that `viewer` liked and that liked `viewer` back
    ///
    /// Only the matched ids are cached; cards are always loaded fresh so
    /// profile edits show up immediately.
    pub async fn mutual_matches(&self, viewer: &UserProfile) -> Result<Vec<UserProfile>, AppError> {
        let key = CacheKey::matches(viewer.id);

        let match_ids = match self.cache.get::<Vec<ProfileId>>(&key).await {
            Ok(cached) => cached,
            Err(e) => {
                if !matches!(e, CacheError::CacheMiss(_)) {
                    tracing::warn!("Match cache read failed for {}: {}", viewer.id, e);
                }
                self.resolve_match_ids(viewer, &key).await?
            }
        };

        Ok(self.store.get_profiles(&match_ids).await?)
    }

    async fn resolve_match_ids(
        &self,
        viewer: &UserProfile,
        key: &str,
    ) -> Result<Vec<ProfileId>, AppError> {
        let liked = self.store.liked_profiles(viewer.id).await?;
        let liked_count = liked.len();
        let match_ids: Vec<ProfileId> = resolve_mutual_matches(viewer, liked)
            .iter()
            .map(|p| p.id)
            .collect();

        tracing::debug!(
            "Profile {} has {} mutual matches out of {} likes",
            viewer.id,
            match_ids.len(),
            liked_count
        );

        if let Err(e) = self.cache.set(key, &match_ids).await {
            tracing::warn!("Failed to cache matches for {}: {}", viewer.id, e);
        }

        Ok(match_ids)
    }
}
