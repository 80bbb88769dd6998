//! Pickups service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{Span, info, warn};

use crate::{
    config::Tariffs,
    points::PointsCalculator,
    pricing::quote_pickup,
    services::{
        RECYCLING_REQUESTS, ServiceError, USERS,
        activities::{ActivityKind, record_activity},
        ensure_user, from_document, is_member, new_id, require_session, to_document,
    },
    session::SessionProvider,
    store::{DocumentStore, DocumentUpdate, StoreError, WhereClause},
    waste::{PickupStatus, RecyclingRequest},
};

/// A persisted pickup request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupRecord {
    /// Requesting user
    pub user_id: String,

    /// The request as submitted
    #[serde(flatten)]
    pub request: RecyclingRequest,

    /// Requested collection date
    pub pickup_date: Date,

    /// Collection address
    pub address: String,

    /// Current status
    pub status: PickupStatus,

    /// Currency of the amounts below
    pub currency: String,

    /// Collection subtotal, in minor units
    pub subtotal: i64,

    /// Delivery fee, in minor units
    pub delivery_fee: i64,

    /// Membership discount, in minor units
    pub discount: i64,

    /// Amount payable, in minor units
    pub total: i64,

    /// Points credited on completion
    pub points: u64,

    /// When the request was submitted
    pub created_at: Timestamp,
}

/// A pickup request with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    /// Document id
    pub id: String,

    /// Stored record
    pub record: PickupRecord,
}

/// Pickup scheduling operations.
#[async_trait]
pub trait PickupsService: Send + Sync {
    /// Price a request and store it as `pending`. Membership pricing follows the
    /// stored profile, not the flag on the request.
    async fn schedule(
        &self,
        request: RecyclingRequest,
        pickup_date: Date,
        address: String,
    ) -> Result<Pickup, ServiceError>;

    /// Confirm a pending pickup.
    async fn confirm(&self, id: &str) -> Result<Pickup, ServiceError>;

    /// Mark a pickup collected and credit its points to the requester.
    async fn complete(&self, id: &str) -> Result<Pickup, ServiceError>;

    /// Cancel one of the signed-in user's pickups.
    async fn cancel(&self, id: &str) -> Result<Pickup, ServiceError>;

    /// The signed-in user's pickups, oldest first.
    async fn pickups(&self) -> Result<Vec<Pickup>, ServiceError>;
}

/// [`PickupsService`] backed by a [`DocumentStore`].
#[derive(Clone)]
pub struct StorePickupsService {
    store: Arc<dyn DocumentStore>,
    session: Arc<dyn SessionProvider>,
    tariffs: Arc<Tariffs>,
}

impl fmt::Debug for StorePickupsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorePickupsService")
            .field("tariffs", &self.tariffs)
            .finish_non_exhaustive()
    }
}

impl StorePickupsService {
    /// Create a new service.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: Arc<dyn SessionProvider>,
        tariffs: Arc<Tariffs>,
    ) -> Self {
        Self {
            store,
            session,
            tariffs,
        }
    }

    async fn credit(
        &self,
        user_id: &str,
        points: i64,
        weight_kg: i64,
    ) -> Result<(), ServiceError> {
        self.store
            .update_document(
                USERS,
                user_id,
                DocumentUpdate::new()
                    .increment("points", points)
                    .increment("totalRecycledKg", weight_kg),
            )
            .await?;

        Ok(())
    }

    async fn load(&self, id: &str) -> Result<PickupRecord, ServiceError> {
        let document = self
            .store
            .get_document(RECYCLING_REQUESTS, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: RECYCLING_REQUESTS.to_string(),
                id: id.to_string(),
            })?;

        from_document(document, "pickup")
    }

    async fn transition(
        &self,
        id: &str,
        mut record: PickupRecord,
        next: PickupStatus,
    ) -> Result<Pickup, ServiceError> {
        if !record.status.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition {
                from: record.status,
                to: next,
            });
        }

        self.store
            .update_document(
                RECYCLING_REQUESTS,
                id,
                DocumentUpdate::new()
                    .set("status", next.as_str())
                    .set("updatedAt", Timestamp::now().to_string()),
            )
            .await?;

        record.status = next;

        Ok(Pickup {
            id: id.to_string(),
            record,
        })
    }
}

#[async_trait]
impl PickupsService for StorePickupsService {
    #[tracing::instrument(
        name = "pickups.service.schedule",
        skip(self, address),
        fields(pickup_id = tracing::field::Empty, total = tracing::field::Empty),
        err
    )]
    async fn schedule(
        &self,
        request: RecyclingRequest,
        pickup_date: Date,
        address: String,
    ) -> Result<Pickup, ServiceError> {
        let session = require_session(self.session.as_ref())?;
        let user = ensure_user(self.store.as_ref(), &session).await?;
        let request = request.with_member(is_member(&user));

        let quote = quote_pickup(&request, &self.tariffs)?;
        let points =
            PointsCalculator::from_tariffs(&self.tariffs).pickup_points(&request, &self.tariffs)?;

        let record = PickupRecord {
            user_id: session.id,
            request,
            pickup_date,
            address,
            status: PickupStatus::Pending,
            currency: self.tariffs.currency().iso_alpha_code.to_string(),
            subtotal: quote.subtotal.to_minor_units(),
            delivery_fee: quote.delivery_fee.to_minor_units(),
            discount: quote.discount.to_minor_units(),
            total: quote.total.to_minor_units(),
            points,
            created_at: Timestamp::now(),
        };

        let id = new_id();

        let span = Span::current();
        span.record("pickup_id", tracing::field::display(&id));
        span.record("total", record.total);

        self.store
            .set_document(RECYCLING_REQUESTS, &id, to_document(&record, "pickup")?)
            .await?;

        info!(pickup_id = %id, waste_type = %record.request.waste_type(), "scheduled pickup");

        Ok(Pickup { id, record })
    }

    #[tracing::instrument(name = "pickups.service.confirm", skip(self), err)]
    async fn confirm(&self, id: &str) -> Result<Pickup, ServiceError> {
        require_session(self.session.as_ref())?;

        let record = self.load(id).await?;

        self.transition(id, record, PickupStatus::Scheduled).await
    }

    #[tracing::instrument(name = "pickups.service.complete", skip(self), err)]
    async fn complete(&self, id: &str) -> Result<Pickup, ServiceError> {
        require_session(self.session.as_ref())?;

        let record = self.load(id).await?;

        if !record.status.can_transition_to(PickupStatus::Completed) {
            return Err(ServiceError::InvalidTransition {
                from: record.status,
                to: PickupStatus::Completed,
            });
        }

        let user_id = record.user_id.clone();
        let points = i64::try_from(record.points).unwrap_or(i64::MAX);
        let weight_kg = i64::from(record.request.weight_kg());

        // Credit first: a pickup is only marked completed once its points landed.
        self.credit(&user_id, points, weight_kg).await?;

        let pickup = match self.transition(id, record, PickupStatus::Completed).await {
            Ok(pickup) => pickup,
            Err(error) => {
                if let Err(rollback) = self.credit(&user_id, -points, -weight_kg).await {
                    warn!(pickup_id = %id, error = %rollback, "failed to take back pickup credit");
                }

                return Err(error);
            }
        };
        let points = pickup.record.points;

        record_activity(
            self.store.as_ref(),
            &pickup.record.user_id,
            ActivityKind::Pickup,
            format!(
                "Recycled {} kg of {}",
                pickup.record.request.weight_kg(),
                pickup.record.request.waste_type()
            ),
            points,
        )
        .await?;

        info!(pickup_id = %id, points, "completed pickup");

        Ok(pickup)
    }

    #[tracing::instrument(name = "pickups.service.cancel", skip(self), err)]
    async fn cancel(&self, id: &str) -> Result<Pickup, ServiceError> {
        let session = require_session(self.session.as_ref())?;

        let record = self.load(id).await?;

        if record.user_id != session.id {
            return Err(ServiceError::Forbidden);
        }

        self.transition(id, record, PickupStatus::Cancelled).await
    }

    #[tracing::instrument(name = "pickups.service.pickups", skip(self), err)]
    async fn pickups(&self) -> Result<Vec<Pickup>, ServiceError> {
        let session = require_session(self.session.as_ref())?;

        self.store
            .query_documents(
                RECYCLING_REQUESTS,
                vec![WhereClause::eq("userId", Value::from(session.id))],
            )
            .await?
            .into_iter()
            .map(|document| {
                Ok(Pickup {
                    id: document.id,
                    record: from_document(document.data, "pickup")?,
                })
            })
            .collect()
    }
}
