// src/state.rs

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::models::user::Profile;
use crate::repo;
use crate::utils::cache::TtlCache;

/// Profiles change rarely; reads on the exam-start hot path go through
/// this cache.
const PROFILE_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub profiles: Arc<TtlCache<i64, Profile>>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self {
            pool,
            config,
            profiles: Arc::new(TtlCache::new(PROFILE_CACHE_TTL)),
        }
    }

    /// The user's profile, via the expiring cache. A missing profile is
    /// not cached, so completing it takes effect immediately.
    pub async fn profile(&self, user_id: i64) -> Result<Option<Profile>, AppError> {
        if let Some(profile) = self.profiles.get(&user_id) {
            return Ok(Some(profile));
        }

        let profile = repo::profiles::find(&self.pool, user_id).await?;
        if let Some(profile) = &profile {
            self.profiles.insert(user_id, profile.clone());
        }

        Ok(profile)
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
