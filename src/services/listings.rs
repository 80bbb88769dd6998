//! Listings service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{Span, info};

use crate::{
    listings::{Condition, ListingDraft},
    services::{
        PRODUCTS, ServiceError,
        activities::{ActivityKind, record_activity},
        ensure_user, from_document, new_id, require_session, to_document,
    },
    session::SessionProvider,
    store::{DocumentStore, WhereClause},
    tags::TagSet,
};

/// Availability of a listed item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    /// Open for purchase
    Available,

    /// Sold to a buyer
    Sold,
}

impl ListingStatus {
    /// Status name used in stored documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Sold => "sold",
        }
    }
}

/// A persisted marketplace listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    /// Seller
    pub seller_id: String,

    /// Title
    pub title: String,

    /// Description
    pub description: String,

    /// Asking price, in minor units
    pub price: i64,

    /// Currency of the price
    pub currency: String,

    /// Declared condition
    pub condition: Condition,

    /// Category name
    pub category: String,

    /// Normalized tags
    pub tags: TagSet,

    /// Eco score at submission
    pub eco_score: u8,

    /// Availability
    pub status: ListingStatus,

    /// When the item was listed
    pub created_at: Timestamp,
}

/// A listing with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Document id
    pub id: String,

    /// Stored record
    pub record: ListingRecord,
}

/// Marketplace selling operations.
#[async_trait]
pub trait ListingsService: Send + Sync {
    /// Publish a draft as a listing owned by the signed-in user.
    async fn submit(&self, draft: ListingDraft<'static>) -> Result<Listing, ServiceError>;

    /// Listings owned by the signed-in user.
    async fn my_listings(&self) -> Result<Vec<Listing>, ServiceError>;
}

/// [`ListingsService`] backed by a [`DocumentStore`].
#[derive(Clone)]
pub struct StoreListingsService {
    store: Arc<dyn DocumentStore>,
    session: Arc<dyn SessionProvider>,
}

impl fmt::Debug for StoreListingsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreListingsService").finish_non_exhaustive()
    }
}

impl StoreListingsService {
    /// Create a new service.
    pub fn new(store: Arc<dyn DocumentStore>, session: Arc<dyn SessionProvider>) -> Self {
        Self { store, session }
    }
}

#[async_trait]
impl ListingsService for StoreListingsService {
    #[tracing::instrument(
        name = "listings.service.submit",
        skip(self, draft),
        fields(listing_id = tracing::field::Empty, eco_score = tracing::field::Empty),
        err
    )]
    async fn submit(&self, draft: ListingDraft<'static>) -> Result<Listing, ServiceError> {
        let session = require_session(self.session.as_ref())?;

        ensure_user(self.store.as_ref(), &session).await?;

        let record = ListingRecord {
            seller_id: session.id,
            title: draft.title().to_string(),
            description: draft.description().to_string(),
            price: draft.price().to_minor_units(),
            currency: draft.price().currency().iso_alpha_code.to_string(),
            condition: draft.condition(),
            category: draft.category().as_str().to_string(),
            tags: draft.tags().clone(),
            eco_score: draft.eco_score(),
            status: ListingStatus::Available,
            created_at: Timestamp::now(),
        };

        let id = new_id();

        let span = Span::current();
        span.record("listing_id", tracing::field::display(&id));
        span.record("eco_score", record.eco_score);

        self.store
            .set_document(PRODUCTS, &id, to_document(&record, "listing")?)
            .await?;

        record_activity(
            self.store.as_ref(),
            &record.seller_id,
            ActivityKind::Listing,
            format!("Listed {}", record.title),
            0,
        )
        .await?;

        info!(listing_id = %id, eco_score = record.eco_score, "listed item");

        Ok(Listing { id, record })
    }

    #[tracing::instrument(name = "listings.service.my_listings", skip(self), err)]
    async fn my_listings(&self) -> Result<Vec<Listing>, ServiceError> {
        let session = require_session(self.session.as_ref())?;

        self.store
            .query_documents(
                PRODUCTS,
                vec![WhereClause::eq("sellerId", Value::from(session.id))],
            )
            .await?
            .into_iter()
            .map(|document| {
                Ok(Listing {
                    id: document.id,
                    record: from_document(document.data, "listing")?,
                })
            })
            .collect()
    }
}
