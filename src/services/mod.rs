//! Services
//!
//! Application operations that run the calculators and persist their results
//! through a [`DocumentStore`].

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::{
    cart::CartError,
    listings::ListingError,
    pricing::PricingError,
    points::PointsError,
    session::{Session, SessionProvider},
    store::{Document, DocumentStore, StoreError},
    subscriptions::CatalogError,
    waste::PickupStatus,
};

pub mod activities;
pub mod checkout;
pub mod listings;
pub mod pickups;
pub mod subscriptions;

/// User profiles, holding points and membership
pub const USERS: &str = "users";

/// Scheduled pickups
pub const RECYCLING_REQUESTS: &str = "recycling_requests";

/// Marketplace orders
pub const ORDERS: &str = "orders";

/// Active subscriptions, keyed by user id
pub const SUBSCRIPTIONS: &str = "subscriptions";

/// Activity log shown by the tracker
pub const ACTIVITIES: &str = "activities";

/// Marketplace listings
pub const PRODUCTS: &str = "products";

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The operation needs a signed-in user.
    #[error("sign in required")]
    Unauthenticated,

    /// The signed-in user does not own the document.
    #[error("not permitted")]
    Forbidden,

    /// Checkout needs at least one line.
    #[error("cart is empty")]
    EmptyCart,

    /// The pickup cannot move to the requested status.
    #[error("pickup cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: PickupStatus,
        /// Requested status
        to: PickupStatus,
    },

    /// A cart line refers to a listing that is no longer available.
    #[error("listing {0} is no longer available")]
    ListingUnavailable(String),

    /// The user has no active subscription to cancel.
    #[error("no active subscription")]
    NoActiveSubscription,

    /// A stored document could not be read back.
    #[error("malformed {0} document")]
    MalformedDocument(&'static str),

    /// Wrapped store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Wrapped pricing error.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapped points error.
    #[error(transparent)]
    Points(#[from] PointsError),

    /// Wrapped cart error.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Wrapped catalog error.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Wrapped listing error.
    #[error(transparent)]
    Listing(#[from] ListingError),

    /// Date arithmetic error.
    #[error(transparent)]
    Time(#[from] jiff::Error),
}

pub(crate) fn require_session(provider: &dyn SessionProvider) -> Result<Session, ServiceError> {
    provider
        .current_session()
        .ok_or(ServiceError::Unauthenticated)
}

/// Fetch the user's profile, creating an empty one on first use.
pub(crate) async fn ensure_user(
    store: &dyn DocumentStore,
    session: &Session,
) -> Result<Document, ServiceError> {
    if let Some(user) = store.get_document(USERS, &session.id).await? {
        return Ok(user);
    }

    let mut user = Document::new();
    user.insert("email".to_string(), Value::from(session.email.clone()));
    user.insert("points".to_string(), Value::from(0));
    user.insert("isMember".to_string(), Value::from(false));
    user.insert(
        "createdAt".to_string(),
        Value::from(jiff::Timestamp::now().to_string()),
    );

    store.set_document(USERS, &session.id, user.clone()).await?;

    Ok(user)
}

/// Whether a user profile carries an active membership. Missing means no.
pub(crate) fn is_member(user: &Document) -> bool {
    user.get("isMember").and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn to_document<T: Serialize>(
    value: &T,
    kind: &'static str,
) -> Result<Document, ServiceError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(document)) => Ok(document),
        _ => Err(ServiceError::MalformedDocument(kind)),
    }
}

pub(crate) fn from_document<T: DeserializeOwned>(
    document: Document,
    kind: &'static str,
) -> Result<T, ServiceError> {
    serde_json::from_value(Value::Object(document))
        .map_err(|_err| ServiceError::MalformedDocument(kind))
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}


#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::store::InMemoryStore;

    use super::*;

    #[tokio::test]
    async fn ensure_user_creates_profile_once() -> TestResult {
        let store = InMemoryStore::new();
        let session = Session::new("u1", "u1@example.com");

        let created = ensure_user(&store, &session).await?;
        assert_eq!(created.get("points"), Some(&Value::from(0)));
        assert!(!is_member(&created));

        store
            .update_document(
                USERS,
                "u1",
                crate::store::DocumentUpdate::new().increment("points", 7),
            )
            .await?;

        let existing = ensure_user(&store, &session).await?;
        assert_eq!(existing.get("points"), Some(&Value::from(7)));

        Ok(())
    }

    #[test]
    fn require_session_rejects_signed_out() {
        let provider = crate::session::StaticSession::signed_out();

        assert!(matches!(
            require_session(&provider),
            Err(ServiceError::Unauthenticated)
        ));
    }
}
