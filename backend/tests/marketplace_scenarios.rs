//! End-to-end marketplace scenarios over the domain services and the
//! in-memory store: booking lifecycle, ledger conservation, ratings, and
//! payment reconciliation.

mod support;

use homeservices::domain::ports::{AddRatingRequest, VerifyPaymentRequest};
use homeservices::domain::{
    Actor, AssignmentPolicyKind, BookingStatus, Caller, ErrorCode, Ledger, PaymentSignatureVerifier,
    Role,
};
use rstest::{fixture, rstest};

use support::{PAYMENT_SECRET, World, booking_request};

#[fixture]
fn world() -> World {
    World::with_customer_credits(100, AssignmentPolicyKind::ServiceOwner)
}

async fn assert_conserved(world: &World, caller: &Caller) {
    let entries = world
        .state
        .profile
        .fetch_ledger(caller.id())
        .await
        .expect("journal");
    let replayed = Ledger::replay(&entries).expect("journal never negative");
    assert_eq!(replayed, i128::from(world.balance(caller)));
}

#[rstest]
#[tokio::test]
async fn booking_debits_assigns_owner_and_logs_two_events(world: World) {
    let service = world.listing(&world.provider, 40).await;

    let created = world
        .state
        .bookings
        .create_booking(&world.customer, booking_request(&service))
        .await
        .expect("booking opened");

    assert_eq!(created.balance.value(), 60);
    assert_eq!(world.balance(&world.customer), 60);
    let booking = &created.details.booking;
    assert_eq!(booking.status(), BookingStatus::Assigned);
    assert_eq!(booking.provider_id(), Some(world.provider.id()));

    let log: Vec<_> = created
        .details
        .events
        .iter()
        .map(|event| (event.from_status(), event.to_status(), event.actor()))
        .collect();
    assert_eq!(
        log,
        vec![
            (None, BookingStatus::Pending, Actor::Customer),
            (Some(BookingStatus::Pending), BookingStatus::Assigned, Actor::System),
        ]
    );
    assert_conserved(&world, &world.customer).await;
}

#[rstest]
#[tokio::test]
async fn insufficient_credits_change_nothing(world: World) {
    let service = world.listing(&world.provider, 150).await;

    let err = world
        .state
        .bookings
        .create_booking(&world.customer, booking_request(&service))
        .await
        .expect_err("not enough credits");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.reason(), Some("insufficient_funds"));
    assert_eq!(world.balance(&world.customer), 100);
    assert_eq!(world.store.booking_count(), 0);
    assert_conserved(&world, &world.customer).await;
}

#[rstest]
#[tokio::test]
async fn provider_rejection_returns_booking_to_pool(world: World) {
    let service = world.listing(&world.provider, 40).await;
    let created = world
        .state
        .bookings
        .create_booking(&world.customer, booking_request(&service))
        .await
        .expect("booking opened");
    let id = *created.details.booking.id();

    let details = world
        .state
        .bookings
        .reject(&world.provider, &id)
        .await
        .expect("rejected");

    assert_eq!(details.booking.status(), BookingStatus::Pending);
    assert_eq!(details.booking.provider_id(), None);
    let last = details.events.last().expect("rejection event");
    assert_eq!(last.from_status(), Some(BookingStatus::Assigned));
    assert_eq!(last.to_status(), BookingStatus::Pending);
    assert_eq!(last.actor(), Actor::Provider);
    assert_eq!(details.events.len(), 3);
}

#[rstest]
#[tokio::test]
async fn status_always_matches_latest_event(world: World) {
    let service = world.listing(&world.provider, 10).await;
    let created = world
        .state
        .bookings
        .create_booking(&world.customer, booking_request(&service))
        .await
        .expect("booking opened");
    let id = *created.details.booking.id();

    let steps = [
        world.state.bookings.accept(&world.provider, &id).await,
        world.state.bookings.complete(&world.customer, &id).await,
    ];
    for step in steps {
        let details = step.expect("legal transition");
        let latest = details.events.last().map(|event| event.to_status());
        assert_eq!(latest, Some(details.booking.status()));
    }

    let read = world
        .state
        .bookings_query
        .get_booking(&world.admin, &id)
        .await
        .expect("admin can read");
    assert_eq!(read.booking.status(), BookingStatus::Completed);
    assert_eq!(read.events.last().map(|event| event.to_status()), Some(BookingStatus::Completed));
}

#[rstest]
#[tokio::test]
async fn completed_bookings_feed_the_provider_average_once(world: World) {
    let service = world.listing(&world.provider, 10).await;
    let mut ids = Vec::new();
    for _ in 0..2 {
        let created = world
            .state
            .bookings
            .create_booking(&world.customer, booking_request(&service))
            .await
            .expect("booking opened");
        let id = *created.details.booking.id();
        world.state.bookings.accept(&world.provider, &id).await.expect("accepted");
        world.state.bookings.complete(&world.customer, &id).await.expect("completed");
        ids.push(id);
    }

    let rate = |booking_id, rating| AddRatingRequest {
        booking_id,
        rating,
        review: None,
    };
    let first = world
        .state
        .ratings
        .add_rating(&world.customer, rate(ids[0], 5))
        .await
        .expect("first rating");
    assert!((first.rating_avg.value() - 5.0).abs() < f64::EPSILON);

    let second = world
        .state
        .ratings
        .add_rating(&world.customer, rate(ids[1], 4))
        .await
        .expect("second rating");
    assert!((second.rating_avg.value() - 4.5).abs() < f64::EPSILON);

    let duplicate = world
        .state
        .ratings
        .add_rating(&world.customer, rate(ids[0], 1))
        .await
        .expect_err("already rated");
    assert_eq!(duplicate.code(), ErrorCode::Conflict);
    assert_eq!(world.store.rating_count(), 2);

    let stored = world.store.service(service.id()).expect("service");
    assert!((stored.rating_avg().value() - 4.5).abs() < f64::EPSILON);
}

#[rstest]
#[case(BookingStatus::Cancelled)]
#[case(BookingStatus::Pending)]
#[tokio::test]
async fn admin_override_ignores_the_transition_table(world: World, #[case] first: BookingStatus) {
    let service = world.listing(&world.provider, 10).await;
    let created = world
        .state
        .bookings
        .create_booking(&world.customer, booking_request(&service))
        .await
        .expect("booking opened");
    let id = *created.details.booking.id();

    let details = world
        .state
        .bookings
        .override_status(&world.admin, &id, first)
        .await
        .expect("override");
    assert_eq!(details.booking.status(), first);
    assert_eq!(details.events.last().map(|event| event.actor()), Some(Actor::Admin));

    if first == BookingStatus::Pending {
        let cancelled = world
            .state
            .bookings
            .override_status(&world.admin, &id, BookingStatus::Cancelled)
            .await
            .expect("pending to cancelled");
        assert_eq!(cancelled.booking.status(), BookingStatus::Cancelled);
    }
}

#[rstest]
#[tokio::test]
async fn payment_verification_credits_exactly_once(world: World) {
    let order = world
        .state
        .payments
        .create_order(&world.customer, 25)
        .await
        .expect("order");
    assert_eq!(order.amount, 2500);

    let signature = PaymentSignatureVerifier::new(PAYMENT_SECRET).sign(&order.order_id, "pay_77");
    let request = VerifyPaymentRequest {
        order_id: order.order_id.clone(),
        payment_id: "pay_77".to_owned(),
        signature,
    };

    let first = world
        .state
        .payments
        .verify_payment(&world.customer, request.clone())
        .await
        .expect("verified");
    assert!(first.credited);
    assert_eq!(first.balance.value(), 125);

    let retry = world
        .state
        .payments
        .verify_payment(&world.customer, request)
        .await
        .expect("retry is safe");
    assert!(!retry.credited);
    assert_eq!(world.balance(&world.customer), 125);
    assert_conserved(&world, &world.customer).await;
}

#[rstest]
#[tokio::test]
async fn only_the_purchaser_can_settle_an_order(world: World) {
    let stranger = world.add_account("Stranger", Role::Customer, 7);
    let order = world
        .state
        .payments
        .create_order(&world.customer, 25)
        .await
        .expect("order");
    let request = VerifyPaymentRequest {
        signature: PaymentSignatureVerifier::new(PAYMENT_SECRET).sign(&order.order_id, "pay_9"),
        order_id: order.order_id,
        payment_id: "pay_9".to_owned(),
    };

    let err = world
        .state
        .payments
        .verify_payment(&stranger, request.clone())
        .await
        .expect_err("not the purchaser");
    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(err.reason(), Some("not_owner"));
    assert_eq!(world.balance(&stranger), 7);
    assert_eq!(world.balance(&world.customer), 100);

    let receipt = world
        .state
        .payments
        .verify_payment(&world.customer, request)
        .await
        .expect("owner settles");
    assert!(receipt.credited);
    assert_eq!(receipt.balance.value(), 125);
    assert_conserved(&world, &stranger).await;
    assert_conserved(&world, &world.customer).await;
}

#[rstest]
#[tokio::test]
async fn signature_mismatch_can_be_retried(world: World) {
    let order = world
        .state
        .payments
        .create_order(&world.customer, 10)
        .await
        .expect("order");
    let forged = VerifyPaymentRequest {
        order_id: order.order_id.clone(),
        payment_id: "pay_1".to_owned(),
        signature: "deadbeef".to_owned(),
    };
    let err = world
        .state
        .payments
        .verify_payment(&world.customer, forged)
        .await
        .expect_err("mismatch");
    assert_eq!(err.reason(), Some("signature_mismatch"));
    assert_eq!(world.balance(&world.customer), 100);

    let genuine = VerifyPaymentRequest {
        signature: PaymentSignatureVerifier::new(PAYMENT_SECRET).sign(&order.order_id, "pay_1"),
        order_id: order.order_id,
        payment_id: "pay_1".to_owned(),
    };
    let receipt = world
        .state
        .payments
        .verify_payment(&world.customer, genuine)
        .await
        .expect("genuine signature");
    assert!(receipt.credited);
    assert_eq!(world.balance(&world.customer), 110);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_cannot_overspend() {
    let world = World::with_customer_credits(50, AssignmentPolicyKind::ServiceOwner);
    let service = world.listing(&world.provider, 40).await;

    let (first, second) = tokio::join!(
        world
            .state
            .bookings
            .create_booking(&world.customer, booking_request(&service)),
        world
            .state
            .bookings
            .create_booking(&world.customer, booking_request(&service)),
    );

    assert_eq!(u8::from(first.is_ok()) + u8::from(second.is_ok()), 1);
    assert_eq!(world.balance(&world.customer), 10);
    assert_eq!(world.store.booking_count(), 1);
    assert_conserved(&world, &world.customer).await;
}

#[tokio::test]
async fn first_available_policy_ignores_the_owner() {
    let world = World::with_customer_credits(100, AssignmentPolicyKind::FirstAvailable);
    let owner = world.add_account("Second Provider", Role::Provider, 0);
    let service = world.listing(&owner, 10).await;

    let created = world
        .state
        .bookings
        .create_booking(&world.customer, booking_request(&service))
        .await
        .expect("booking opened");
    assert_eq!(created.details.booking.provider_id(), Some(world.provider.id()));
}

#[rstest]
#[tokio::test]
async fn admin_listings_fall_back_to_the_provider_pool(world: World) {
    let service = world.listing(&world.admin, 10).await;
    assert!(service.provider_id().is_none());

    let created = world
        .state
        .bookings
        .create_booking(&world.customer, booking_request(&service))
        .await
        .expect("booking opened");
    assert_eq!(created.details.booking.provider_id(), Some(world.provider.id()));
}
