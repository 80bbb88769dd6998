//! Ecomanage
//!
//! Ecomanage is the domain core of a waste-collection and second-hand marketplace
//! app: pickup pricing and points, eco scores, carts, membership plans and the
//! services that persist them through a document store.

pub mod cart;
pub mod config;
pub mod context;
pub mod discounts;
pub mod listings;
pub mod logging;
pub mod points;
pub mod prelude;
pub mod pricing;
pub mod reports;
pub mod services;
pub mod session;
pub mod store;
pub mod subscriptions;
pub mod tags;
pub mod waste;
