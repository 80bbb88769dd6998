//! Activities
//!
//! The per-user activity log behind the waste-collection tracker.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    services::{ACTIVITIES, ServiceError, from_document, new_id, require_session, to_document},
    session::SessionProvider,
    store::{DocumentStore, WhereClause},
};

/// What an activity entry records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// A pickup was collected
    Pickup,

    /// A marketplace order was placed
    Purchase,

    /// A subscription started or ended
    Subscription,

    /// An item was listed for sale
    Listing,
}

/// An activity log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Owner of the entry
    pub user_id: String,

    /// Kind of activity
    pub kind: ActivityKind,

    /// Human-readable summary
    pub description: String,

    /// Points credited by the activity
    pub points: u64,

    /// When the activity happened
    pub created_at: Timestamp,
}

/// Append an entry to the activity log.
pub(crate) async fn record_activity(
    store: &dyn DocumentStore,
    user_id: &str,
    kind: ActivityKind,
    description: String,
    points: u64,
) -> Result<(), ServiceError> {
    let activity = Activity {
        user_id: user_id.to_string(),
        kind,
        description,
        points,
        created_at: Timestamp::now(),
    };

    store
        .set_document(ACTIVITIES, &new_id(), to_document(&activity, "activity")?)
        .await?;

    Ok(())
}

/// Read access to the activity log.
#[async_trait]
pub trait ActivitiesService: Send + Sync {
    /// The signed-in user's most recent activities, newest first.
    async fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>, ServiceError>;
}

/// [`ActivitiesService`] backed by a [`DocumentStore`].
#[derive(Clone)]
pub struct StoreActivitiesService {
    store: Arc<dyn DocumentStore>,
    session: Arc<dyn SessionProvider>,
}

impl fmt::Debug for StoreActivitiesService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreActivitiesService").finish_non_exhaustive()
    }
}

impl StoreActivitiesService {
    /// Create a new service.
    pub fn new(store: Arc<dyn DocumentStore>, session: Arc<dyn SessionProvider>) -> Self {
        Self { store, session }
    }
}

#[async_trait]
impl ActivitiesService for StoreActivitiesService {
    #[tracing::instrument(name = "activities.service.recent_activities", skip(self), err)]
    async fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>, ServiceError> {
        let session = require_session(self.session.as_ref())?;

        let mut documents = self
            .store
            .query_documents(ACTIVITIES, vec![WhereClause::eq("userId", session.id)])
            .await?;

        // Ids are time-ordered, so sorting them descending puts the newest first.
        documents.sort_by(|left, right| right.id.cmp(&left.id));

        documents
            .into_iter()
            .take(limit)
            .map(|document| from_document(document.data, "activity"))
            .collect()
    }
}
