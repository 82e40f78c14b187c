use std::sync::Arc;

use serde::Serialize;

use crate::data::stats_repository::StatsRepository;
use crate::domain::error::DomainError;
use crate::domain::stats::{Activity, SiteStats, merge_activity};

const ACTIVITY_PER_KIND: i64 = 3;
const ACTIVITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub stats: SiteStats,
    pub recent_activity: Vec<Activity>,
}

#[derive(Clone)]
pub struct AdminService<S: StatsRepository + 'static> {
    stats: Arc<S>,
}

impl<S> AdminService<S>
where
    S: StatsRepository + 'static,
{
    pub fn new(stats: Arc<S>) -> Self {
        Self { stats }
    }

    pub async fn dashboard(&self, is_staff: bool) -> Result<Dashboard, DomainError> {
        if !is_staff {
            return Err(DomainError::Forbidden);
        }
        let stats = self.stats.site_stats().await?;
        let activity = self.stats.recent_activity(ACTIVITY_PER_KIND).await?;
        Ok(Dashboard {
            stats,
            recent_activity: merge_activity(activity, ACTIVITY_LIMIT),
        })
    }
}
