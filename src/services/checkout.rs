//! Checkout service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{Span, info, warn};

use crate::{
    cart::{Cart, CartError},
    config::Tariffs,
    points::PointsCalculator,
    services::{
        ORDERS, PRODUCTS, ServiceError, USERS,
        activities::{ActivityKind, record_activity},
        listings::ListingStatus,
        ensure_user, from_document, is_member, new_id, require_session, to_document,
    },
    session::SessionProvider,
    store::{DocumentStore, DocumentUpdate, WhereClause},
};

/// A purchased cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Product identifier
    pub product_id: String,

    /// Units bought
    pub quantity: u32,

    /// Price per unit, in minor units
    pub unit_price: i64,

    /// Subscriber discount, in whole percent
    pub subscription_discount_pct: u8,

    /// Line total after discount, in minor units
    pub total: i64,
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Buyer
    pub user_id: String,

    /// Purchased lines
    pub lines: Vec<OrderLine>,

    /// Currency of every amount in the order
    pub currency: String,

    /// Sum of line subtotals, in minor units
    pub subtotal: i64,

    /// Sum of subscription discounts, in minor units
    pub discount: i64,

    /// Amount paid, in minor units
    pub total: i64,

    /// Points credited for the purchase
    pub points: u64,

    /// Whether the buyer was a member at checkout
    pub is_member: bool,

    /// When the order was placed
    pub created_at: Timestamp,
}

/// An order with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Document id
    pub id: String,

    /// Stored record
    pub record: OrderRecord,
}

/// Marketplace checkout operations.
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Place an order for the cart and credit purchase points. The cart is consumed.
    ///
    /// Lines naming a marketplace listing must find it available, and the
    /// listing is marked sold once the order is stored.
    async fn checkout(&self, cart: Cart<'static>) -> Result<Order, ServiceError>;

    /// The signed-in user's orders, oldest first.
    async fn orders(&self) -> Result<Vec<Order>, ServiceError>;
}

/// [`CheckoutService`] backed by a [`DocumentStore`].
#[derive(Clone)]
pub struct StoreCheckoutService {
    store: Arc<dyn DocumentStore>,
    session: Arc<dyn SessionProvider>,
    tariffs: Arc<Tariffs>,
}

impl fmt::Debug for StoreCheckoutService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCheckoutService")
            .field("tariffs", &self.tariffs)
            .finish_non_exhaustive()
    }
}

impl StoreCheckoutService {
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

    /// Ids of marketplace listings among the lines. Fails if any of them was already sold.
    async fn listed_products(&self, lines: &[OrderLine]) -> Result<Vec<String>, ServiceError> {
        let mut listed = Vec::new();

        for line in lines {
            let Some(product) = self.store.get_document(PRODUCTS, &line.product_id).await? else {
                continue;
            };

            let status = product.get("status").and_then(Value::as_str);

            if status != Some(ListingStatus::Available.as_str()) {
                return Err(ServiceError::ListingUnavailable(line.product_id.clone()));
            }

            listed.push(line.product_id.clone());
        }

        Ok(listed)
    }

    async fn credit(&self, user_id: &str, points: i64) -> Result<(), ServiceError> {
        self.store
            .update_document(USERS, user_id, DocumentUpdate::new().increment("points", points))
            .await?;

        Ok(())
    }
}

#[async_trait]
impl CheckoutService for StoreCheckoutService {
    #[tracing::instrument(
        name = "checkout.service.checkout",
        skip(self, cart),
        fields(
            order_id = tracing::field::Empty,
            line_count = cart.len(),
            is_member = tracing::field::Empty
        ),
        err
    )]
    async fn checkout(&self, cart: Cart<'static>) -> Result<Order, ServiceError> {
        let session = require_session(self.session.as_ref())?;

        if cart.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let user = ensure_user(self.store.as_ref(), &session).await?;
        let is_member = is_member(&user);

        let totals = cart.totals()?;
        let points =
            PointsCalculator::from_tariffs(&self.tariffs).purchase_points(&totals.total, is_member)?;

        let lines = cart
            .lines()
            .iter()
            .map(|line| {
                Ok(OrderLine {
                    product_id: line.product_id().to_string(),
                    quantity: line.quantity(),
                    unit_price: line.unit_price().to_minor_units(),
                    subscription_discount_pct: line.subscription_discount_pct(),
                    total: line.total()?.to_minor_units(),
                })
            })
            .collect::<Result<Vec<_>, CartError>>()?;

        let record = OrderRecord {
            user_id: session.id,
            lines,
            currency: cart.currency().iso_alpha_code.to_string(),
            subtotal: totals.subtotal.to_minor_units(),
            discount: totals.discount.to_minor_units(),
            total: totals.total.to_minor_units(),
            points,
            is_member,
            created_at: Timestamp::now(),
        };

        let id = new_id();

        let span = Span::current();
        span.record("order_id", tracing::field::display(&id));
        span.record("is_member", is_member);

        let listed = self.listed_products(&record.lines).await?;
        let document = to_document(&record, "order")?;
        let points_delta = i64::try_from(points).unwrap_or(i64::MAX);

        // Points land before the order, so a stored order always carries its credit.
        self.credit(&record.user_id, points_delta).await?;

        if let Err(err) = self.store.set_document(ORDERS, &id, document).await {
            if let Err(rollback) = self.credit(&record.user_id, -points_delta).await {
                warn!(order_id = %id, error = %rollback, "failed to take back purchase points");
            }

            return Err(err.into());
        }

        for product_id in &listed {
            self.store
                .update_document(
                    PRODUCTS,
                    product_id,
                    DocumentUpdate::new().set("status", ListingStatus::Sold.as_str()),
                )
                .await?;
        }

        record_activity(
            self.store.as_ref(),
            &record.user_id,
            ActivityKind::Purchase,
            format!("Bought {} item(s)", totals.item_count),
            points,
        )
        .await?;

        info!(order_id = %id, total = record.total, points, "placed order");

        Ok(Order { id, record })
    }

    #[tracing::instrument(name = "checkout.service.orders", skip(self), err)]
    async fn orders(&self) -> Result<Vec<Order>, ServiceError> {
        let session = require_session(self.session.as_ref())?;

        self.store
            .query_documents(ORDERS, vec![WhereClause::eq("userId", Value::from(session.id))])
            .await?
            .into_iter()
            .map(|document| {
                Ok(Order {
                    id: document.id,
                    record: from_document(document.data, "order")?,
                })
            })
            .collect()
    }
}
