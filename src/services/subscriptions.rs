//! Subscriptions service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::{Timestamp, ToSpan, tz::TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{Span, info};

use crate::{
    services::{
        SUBSCRIPTIONS, ServiceError, USERS,
        activities::{ActivityKind, record_activity},
        ensure_user, from_document, is_member, require_session, to_document,
    },
    session::SessionProvider,
    store::{DocumentStore, DocumentUpdate},
    subscriptions::Catalog,
};

/// Lifecycle of a subscription.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Billing and membership are in effect
    Active,

    /// Cancelled by the user
    Cancelled,
}

/// A persisted subscription, keyed by user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    /// Subscriber
    pub user_id: String,

    /// Catalog plan id
    pub plan_id: String,

    /// Plan display name at purchase time
    pub plan_name: String,

    /// Billing period in months
    pub duration_months: u8,

    /// Amount charged for the period, in minor units
    pub price: i64,

    /// Undiscounted amount, in minor units
    pub original_price: i64,

    /// Advertised discount, in whole percent
    pub discount_pct: u8,

    /// Price per month, in minor units
    pub monthly_equivalent: i64,

    /// Currency of every amount
    pub currency: String,

    /// Current status
    pub status: SubscriptionStatus,

    /// When the subscription started
    pub started_at: Timestamp,

    /// When the period ends
    pub renews_at: Timestamp,
}

/// Membership operations.
#[async_trait]
pub trait SubscriptionsService: Send + Sync {
    /// Subscribe the signed-in user to a plan for a billing duration.
    async fn subscribe(
        &self,
        plan_id: &str,
        duration_months: u8,
    ) -> Result<SubscriptionRecord, ServiceError>;

    /// Whether the signed-in user is a member. Signed out counts as not a member.
    async fn is_member(&self) -> Result<bool, ServiceError>;

    /// The signed-in user's subscription, if any.
    async fn current_subscription(&self) -> Result<Option<SubscriptionRecord>, ServiceError>;

    /// Cancel the signed-in user's subscription and drop membership.
    async fn cancel(&self) -> Result<SubscriptionRecord, ServiceError>;
}

/// [`SubscriptionsService`] backed by a [`DocumentStore`].
#[derive(Clone)]
pub struct StoreSubscriptionsService {
    store: Arc<dyn DocumentStore>,
    session: Arc<dyn SessionProvider>,
    catalog: Arc<Catalog>,
}

impl fmt::Debug for StoreSubscriptionsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSubscriptionsService")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl StoreSubscriptionsService {
    /// Create a new service.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: Arc<dyn SessionProvider>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            store,
            session,
            catalog,
        }
    }

    async fn load(&self, user_id: &str) -> Result<Option<SubscriptionRecord>, ServiceError> {
        self.store
            .get_document(SUBSCRIPTIONS, user_id)
            .await?
            .map(|document| from_document(document, "subscription"))
            .transpose()
    }
}

#[async_trait]
impl SubscriptionsService for StoreSubscriptionsService {
    #[tracing::instrument(
        name = "subscriptions.service.subscribe",
        skip(self),
        fields(price = tracing::field::Empty),
        err
    )]
    async fn subscribe(
        &self,
        plan_id: &str,
        duration_months: u8,
    ) -> Result<SubscriptionRecord, ServiceError> {
        let session = require_session(self.session.as_ref())?;

        let plan = self.catalog.plan(plan_id)?;
        let option = self.catalog.resolve(plan_id, duration_months)?;

        ensure_user(self.store.as_ref(), &session).await?;

        let started_at = Timestamp::now();
        let renews_at = started_at
            .to_zoned(TimeZone::UTC)
            .checked_add(i64::from(option.duration_months()).months())?
            .timestamp();

        let record = SubscriptionRecord {
            user_id: session.id,
            plan_id: plan.id.clone(),
            plan_name: plan.name.clone(),
            duration_months: option.duration_months(),
            price: option.price.to_minor_units(),
            original_price: option.original_price.to_minor_units(),
            discount_pct: option.discount_pct,
            monthly_equivalent: option.monthly_equivalent.to_minor_units(),
            currency: option.price.currency().iso_alpha_code.to_string(),
            status: SubscriptionStatus::Active,
            started_at,
            renews_at,
        };

        Span::current().record("price", record.price);

        self.store
            .set_document(
                SUBSCRIPTIONS,
                &record.user_id,
                to_document(&record, "subscription")?,
            )
            .await?;

        self.store
            .update_document(
                USERS,
                &record.user_id,
                DocumentUpdate::new()
                    .set("isMember", true)
                    .set("planId", record.plan_id.clone()),
            )
            .await?;

        record_activity(
            self.store.as_ref(),
            &record.user_id,
            ActivityKind::Subscription,
            format!("Subscribed to {} for {}", record.plan_name, option.duration),
            0,
        )
        .await?;

        info!(plan_id = %record.plan_id, months = record.duration_months, "subscribed");

        Ok(record)
    }

    #[tracing::instrument(name = "subscriptions.service.is_member", skip(self), err)]
    async fn is_member(&self) -> Result<bool, ServiceError> {
        let Some(session) = self.session.current_session() else {
            return Ok(false);
        };

        Ok(self
            .store
            .get_document(USERS, &session.id)
            .await?
            .is_some_and(|user| is_member(&user)))
    }

    #[tracing::instrument(name = "subscriptions.service.current_subscription", skip(self), err)]
    async fn current_subscription(&self) -> Result<Option<SubscriptionRecord>, ServiceError> {
        let session = require_session(self.session.as_ref())?;

        self.load(&session.id).await
    }

    #[tracing::instrument(name = "subscriptions.service.cancel", skip(self), err)]
    async fn cancel(&self) -> Result<SubscriptionRecord, ServiceError> {
        let session = require_session(self.session.as_ref())?;

        let mut record = self
            .load(&session.id)
            .await?
            .filter(|record| record.status == SubscriptionStatus::Active)
            .ok_or(ServiceError::NoActiveSubscription)?;

        record.status = SubscriptionStatus::Cancelled;

        self.store
            .update_document(
                SUBSCRIPTIONS,
                &session.id,
                DocumentUpdate::new().set("status", "cancelled"),
            )
            .await?;

        self.store
            .update_document(USERS, &session.id, DocumentUpdate::new().set("isMember", false))
            .await?;

        record_activity(
            self.store.as_ref(),
            &session.id,
            ActivityKind::Subscription,
            format!("Cancelled {}", record.plan_name),
            0,
        )
        .await?;

        info!(plan_id = %record.plan_id, "cancelled subscription");

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use serde_json::Value;
    use testresult::TestResult;

    use crate::{
        services::{ACTIVITIES, test_support::signed_in},
        session::StaticSession,
        store::InMemoryStore,
        subscriptions::CatalogError,
    };

    use super::*;

    fn service(
        store: Arc<dyn DocumentStore>,
        session: Arc<dyn SessionProvider>,
    ) -> Result<StoreSubscriptionsService, CatalogError> {
        Ok(StoreSubscriptionsService::new(
            store,
            session,
            Arc::new(Catalog::builtin()?),
        ))
    }

    #[tokio::test]
    async fn subscribe_grants_membership() -> TestResult {
        let (store, session) = signed_in();
        let subscriptions = service(store.clone(), session)?;

        assert!(!subscriptions.is_member().await?);

        let record = subscriptions.subscribe("pro", 12).await?;

        assert_eq!(record.plan_id, "pro");
        assert_eq!(record.price, 47_040_000);
        assert_eq!(record.original_price, 58_800_000);
        assert_eq!(record.discount_pct, 20);
        assert_eq!(record.monthly_equivalent, 3_920_000);
        assert_eq!(record.currency, "IDR");
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert!(record.renews_at > record.started_at);

        assert!(subscriptions.is_member().await?);
        assert_eq!(subscriptions.current_subscription().await?, Some(record));
        assert_eq!(store.count(ACTIVITIES)?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn renewal_is_a_calendar_period_later() -> TestResult {
        let (store, session) = signed_in();

        let record = service(store, session)?.subscribe("basic", 6).await?;

        let started = record.started_at.to_zoned(TimeZone::UTC).date();
        let renews = record.renews_at.to_zoned(TimeZone::UTC).date();

        assert_eq!(started.checked_add(6.months())?, renews);
        assert!(renews > date(2000, 1, 1));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_plan_or_duration_is_rejected() -> TestResult {
        let (store, session) = signed_in();
        let subscriptions = service(store.clone(), session)?;

        assert!(matches!(
            subscriptions.subscribe("platinum", 1).await,
            Err(ServiceError::Catalog(CatalogError::PlanNotFound(_)))
        ));
        assert!(matches!(
            subscriptions.subscribe("pro", 3).await,
            Err(ServiceError::Catalog(CatalogError::UnsupportedDuration(3)))
        ));
        assert_eq!(store.count(SUBSCRIPTIONS)?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn cancel_drops_membership() -> TestResult {
        let (store, session) = signed_in();
        let subscriptions = service(store.clone(), session)?;

        subscriptions.subscribe("basic", 1).await?;
        let cancelled = subscriptions.cancel().await?;

        assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
        assert!(!subscriptions.is_member().await?);

        let user = store.get_document(USERS, "user-1").await?;
        assert_eq!(
            user.as_ref().and_then(|doc| doc.get("isMember")),
            Some(&Value::from(false))
        );

        assert!(matches!(
            subscriptions.cancel().await,
            Err(ServiceError::NoActiveSubscription)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn signed_out_is_not_a_member() -> TestResult {
        let subscriptions = service(
            Arc::new(InMemoryStore::new()),
            Arc::new(StaticSession::signed_out()),
        )?;

        assert!(!subscriptions.is_member().await?);
        assert!(matches!(
            subscriptions.subscribe("basic", 1).await,
            Err(ServiceError::Unauthenticated)
        ));

        Ok(())
    }
}
