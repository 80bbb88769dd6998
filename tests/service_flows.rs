//! End-to-end service flows against the in-memory store.
//!
//! A user subscribes, recycles, sells and shops, and the profile and
//! activity log reflect every step.

use std::sync::Arc;

use jiff::civil::date;
use rusty_money::{Money, iso::IDR};
use serde_json::Value;
use testresult::TestResult;

use ecomanage::{
    prelude::*,
    services::{USERS, checkout::StoreCheckoutService},
    store::MockDocumentStore,
};

fn context() -> TestResult<(Arc<InMemoryStore>, Arc<StaticSession>, AppContext)> {
    let store = Arc::new(InMemoryStore::new());
    let session = Arc::new(StaticSession::signed_in(Session::new(
        "user-7",
        "user-7@example.com",
    )));

    let context = AppContext::new(
        store.clone(),
        session.clone(),
        Arc::new(Tariffs::default()),
        Arc::new(Catalog::builtin()?),
    );

    Ok((store, session, context))
}

async fn user_field(store: &InMemoryStore, field: &str) -> TestResult<Option<Value>> {
    Ok(store
        .get_document(USERS, "user-7")
        .await?
        .and_then(|user| user.get(field).cloned()))
}

#[tokio::test]
async fn member_journey_updates_profile_and_activity_log() -> TestResult {
    let (store, _session, context) = context()?;

    context.subscriptions.subscribe("basic", 6).await?;
    assert!(context.subscriptions.is_member().await?);

    let request = RecyclingRequest::new(WasteType::Metal, 4, 2, true)?;
    let pickup = context
        .pickups
        .schedule(request, date(2026, 11, 2), "Jl. Merdeka 1".to_string())
        .await?;

    // 4 kg * 12 points * 1.5
    assert_eq!(pickup.record.points, 72);
    assert_eq!(pickup.record.status, PickupStatus::Pending);

    context.pickups.confirm(&pickup.id).await?;
    let completed = context.pickups.complete(&pickup.id).await?;
    assert_eq!(completed.record.status, PickupStatus::Completed);

    assert!(matches!(
        context.pickups.complete(&pickup.id).await,
        Err(ServiceError::InvalidTransition { .. })
    ));

    let draft = ListingDraft::new(
        "Denim jacket",
        Money::from_minor(150_000, IDR),
        Condition::Excellent,
        Category::Fashion,
        TagSet::from_strs(&["upcycled"]),
    )?;
    context.listings.submit(draft).await?;

    let mut cart = Cart::new(IDR);
    cart.add(CartLine::new("compost-bin", Money::from_minor(200_000, IDR), 1, 0)?)?;
    let order = context.checkout.checkout(cart).await?;

    // floor(20 * 1.5)
    assert_eq!(order.record.points, 30);

    assert_eq!(user_field(&store, "points").await?, Some(Value::from(102)));
    assert_eq!(user_field(&store, "totalRecycledKg").await?, Some(Value::from(4)));
    assert_eq!(user_field(&store, "isMember").await?, Some(Value::from(true)));

    let activities = context.activities.recent_activities(10).await?;
    assert_eq!(
        activities
            .iter()
            .map(|activity| activity.kind)
            .collect::<Vec<_>>(),
        [
            ActivityKind::Purchase,
            ActivityKind::Listing,
            ActivityKind::Pickup,
            ActivityKind::Subscription,
        ]
    );

    Ok(())
}

#[tokio::test]
async fn signing_out_locks_every_service() -> TestResult {
    let (_store, session, context) = context()?;

    session.sign_out();

    assert!(!context.subscriptions.is_member().await?);
    assert!(matches!(
        context.pickups.pickups().await,
        Err(ServiceError::Unauthenticated)
    ));
    assert!(matches!(
        context.checkout.orders().await,
        Err(ServiceError::Unauthenticated)
    ));
    assert!(matches!(
        context.activities.recent_activities(5).await,
        Err(ServiceError::Unauthenticated)
    ));

    Ok(())
}

#[tokio::test]
async fn another_user_cannot_cancel_a_pickup() -> TestResult {
    let (_store, session, context) = context()?;

    let request = RecyclingRequest::new(WasteType::Paper, 2, 1, false)?;
    let pickup = context
        .pickups
        .schedule(request, date(2026, 11, 3), "Jl. Sudirman 5".to_string())
        .await?;

    session.sign_in(Session::new("user-8", "user-8@example.com"));

    assert!(matches!(
        context.pickups.cancel(&pickup.id).await,
        Err(ServiceError::Forbidden)
    ));

    Ok(())
}

#[tokio::test]
async fn checkout_surfaces_store_failures() -> TestResult {
    let mut store = MockDocumentStore::new();
    store
        .expect_get_document()
        .returning(|_, _| Err(StoreError::Backend("unavailable".to_string())));
    store.expect_set_document().never();

    let checkout = StoreCheckoutService::new(
        Arc::new(store),
        Arc::new(StaticSession::signed_in(Session::new("u1", "u1@example.com"))),
        Arc::new(Tariffs::default()),
    );

    let mut cart = Cart::new(IDR);
    cart.add(CartLine::new("jar", Money::from_minor(10_000, IDR), 1, 0)?)?;

    assert!(matches!(
        checkout.checkout(cart).await,
        Err(ServiceError::Store(StoreError::Backend(_)))
    ));

    Ok(())
}

#[tokio::test]
async fn a_sold_listing_cannot_be_bought_again() -> TestResult {
    let (_store, session, context) = context()?;

    let draft = ListingDraft::new(
        "Rattan basket",
        Money::from_minor(90_000, IDR),
        Condition::Good,
        Category::Home,
        TagSet::from_strs(&["handmade"]),
    )?;
    let listing = context.listings.submit(draft).await?;

    session.sign_in(Session::new("user-8", "user-8@example.com"));

    let basket = || -> TestResult<Cart<'static>> {
        let mut cart = Cart::new(IDR);
        cart.add(CartLine::new(listing.id.clone(), Money::from_minor(90_000, IDR), 1, 0)?)?;
        Ok(cart)
    };

    context.checkout.checkout(basket()?).await?;

    session.sign_in(Session::new("user-7", "user-7@example.com"));
    let mine = context.listings.my_listings().await?;
    assert_eq!(
        mine.iter().map(|listing| listing.record.status).collect::<Vec<_>>(),
        [ListingStatus::Sold]
    );

    session.sign_in(Session::new("user-8", "user-8@example.com"));
    assert!(matches!(
        context.checkout.checkout(basket()?).await,
        Err(ServiceError::ListingUnavailable(id)) if id == listing.id
    ));
    assert_eq!(context.checkout.orders().await?.len(), 1);

    Ok(())
}

#[test]
fn context_and_services_format_with_debug() -> TestResult {
    let (_store, _session, context) = context()?;

    assert!(format!("{context:?}").starts_with("AppContext"));

    let checkout = StoreCheckoutService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(StaticSession::signed_out()),
        Arc::new(Tariffs::default()),
    );
    let rendered = format!("{checkout:?}");
    assert!(rendered.starts_with("StoreCheckoutService { tariffs: Tariffs"));
    assert!(rendered.ends_with(".. }"));

    Ok(())
}
