//! App Context

use std::{fmt, sync::Arc};

use crate::{
    config::Tariffs,
    services::{
        activities::{ActivitiesService, StoreActivitiesService},
        checkout::{CheckoutService, StoreCheckoutService},
        listings::{ListingsService, StoreListingsService},
        pickups::{PickupsService, StorePickupsService},
        subscriptions::{StoreSubscriptionsService, SubscriptionsService},
    },
    session::SessionProvider,
    store::DocumentStore,
    subscriptions::Catalog,
};

/// Every service wired against one store and session provider.
#[derive(Clone)]
pub struct AppContext {
    /// Pickup scheduling
    pub pickups: Arc<dyn PickupsService>,
    /// Marketplace checkout
    pub checkout: Arc<dyn CheckoutService>,
    /// Membership plans
    pub subscriptions: Arc<dyn SubscriptionsService>,
    /// Marketplace selling
    pub listings: Arc<dyn ListingsService>,
    /// Activity log
    pub activities: Arc<dyn ActivitiesService>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build the application context.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: Arc<dyn SessionProvider>,
        tariffs: Arc<Tariffs>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            pickups: Arc::new(StorePickupsService::new(
                Arc::clone(&store),
                Arc::clone(&session),
                Arc::clone(&tariffs),
            )),
            checkout: Arc::new(StoreCheckoutService::new(
                Arc::clone(&store),
                Arc::clone(&session),
                tariffs,
            )),
            subscriptions: Arc::new(StoreSubscriptionsService::new(
                Arc::clone(&store),
                Arc::clone(&session),
                catalog,
            )),
            listings: Arc::new(StoreListingsService::new(
                Arc::clone(&store),
                Arc::clone(&session),
            )),
            activities: Arc::new(StoreActivitiesService::new(store, session)),
        }
    }
}
