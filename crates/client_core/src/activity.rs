use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{ActivityId, RecentActivityEntry},
    protocol::ActivityQuery,
};

use crate::{error::ServiceError, service::RecordService};

/// Source of the dashboard's recent-activity rows.
#[async_trait]
pub trait ActivityFeed: Send + Sync {
    async fn recent(&self, query: ActivityQuery)
        -> Result<Vec<RecentActivityEntry>, ServiceError>;
}

/// Reads the feed from the record service.
pub struct RemoteActivityFeed {
    service: Arc<dyn RecordService>,
}

impl RemoteActivityFeed {
    pub fn new(service: Arc<dyn RecordService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ActivityFeed for RemoteActivityFeed {
    async fn recent(
        &self,
        query: ActivityQuery,
    ) -> Result<Vec<RecentActivityEntry>, ServiceError> {
        self.service.recent_activity(query).await
    }
}

/// Fixed rows for deployments whose service has no activity endpoint.
pub struct PlaceholderActivityFeed;

impl PlaceholderActivityFeed {
    fn entries() -> Vec<RecentActivityEntry> {
        vec![
            RecentActivityEntry {
                id: ActivityId(2),
                patient: "Jane Smith".into(),
                action: "Update".into(),
                date: "2024-10-21".into(),
            },
            RecentActivityEntry {
                id: ActivityId(1),
                patient: "John Doe".into(),
                action: "Registration".into(),
                date: "2024-10-20".into(),
            },
        ]
    }
}

#[async_trait]
impl ActivityFeed for PlaceholderActivityFeed {
    async fn recent(
        &self,
        query: ActivityQuery,
    ) -> Result<Vec<RecentActivityEntry>, ServiceError> {
        Ok(Self::entries()
            .into_iter()
            .filter(|entry| query.before.map_or(true, |before| entry.id < before))
            .take(query.limit as usize)
            .collect())
    }
}
