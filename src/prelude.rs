//! Ecomanage prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLine, CartTotals},
    config::{ConfigError, Tariffs, WasteRate},
    context::AppContext,
    discounts::DiscountError,
    listings::{Category, Condition, EcoTag, ListingDraft, ListingError, estimate},
    logging::{LogFormat, LoggingConfig, init_subscriber},
    points::{PointsCalculator, PointsError},
    pricing::{PriceBreakdown, PricingCalculator, PricingError, quote_pickup},
    services::{
        ServiceError,
        activities::{Activity, ActivityKind, ActivitiesService},
        checkout::{CheckoutService, Order, OrderLine, OrderRecord},
        listings::{Listing, ListingRecord, ListingStatus, ListingsService},
        pickups::{Pickup, PickupRecord, PickupsService},
        subscriptions::{SubscriptionRecord, SubscriptionStatus, SubscriptionsService},
    },
    session::{Session, SessionProvider, StaticSession},
    store::{DocumentStore, DocumentUpdate, InMemoryStore, StoreError, WhereClause},
    subscriptions::{BillingDuration, BillingOption, Catalog, CatalogError, Plan},
    tags::TagSet,
    waste::{PickupStatus, RecyclingRequest, RequestError, WasteType},
};
