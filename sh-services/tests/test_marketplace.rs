//! Marketplace service integration tests against a mocked backend.
//!
//! Covers geography fallback, provider search, bookings with invoicing,
//! messaging, withdrawals and identity verification.

mod common;

use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use sh_core::error::ShError;
use sh_models::{BookingStatus, VerificationStatus, WithdrawalStatus};
use sh_services::event_bus::AppEvent;
use sh_services::liveness::LivenessOutcome;
use sh_services::notification::ToastLevel;
use sh_services::{
    BookingRequest, BookingService, GeoService, MessagingService, ProviderFilter,
    ProviderService, VerificationService, WalletService, WithdrawalRequest,
};

// ---- Geography ----

#[tokio::test]
async fn cities_fall_back_to_bundled_table_when_remote_is_empty() {
    let (server, backend) = common::create_mock_backend().await;
    common::mount_json(&server, "GET", "cities", 200, json!([])).await;
    let bus = common::create_test_event_bus();
    let notifications = common::create_test_notifications(&bus);
    let geo = GeoService::new(common::create_test_config_handle(), backend, notifications.clone());

    let cities = geo.cities_for_country("bj").await;
    assert!(!cities.is_empty());
    assert_eq!(cities[0].name, "Cotonou");
    assert!(notifications.is_empty());
}

#[tokio::test]
async fn remote_cities_win_over_bundled_table() {
    let (server, backend) = common::create_mock_backend().await;
    common::mount_json(
        &server,
        "GET",
        "cities",
        200,
        json!([{"id": 41, "name": "Ganvié", "country_code": "BJ"}]),
    )
    .await;
    let bus = common::create_test_event_bus();
    let geo = GeoService::new(
        common::create_test_config_handle(),
        backend,
        common::create_test_notifications(&bus),
    );

    let cities = geo.cities_for_country("BJ").await;
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].id, "41");
}

#[tokio::test]
async fn unavailable_backend_falls_back_with_toast() {
    let bus = common::create_test_event_bus();
    let notifications = common::create_test_notifications(&bus);
    let geo = GeoService::new(
        common::create_test_config_handle(),
        common::unavailable_backend(),
        notifications.clone(),
    );

    assert!(!geo.countries().await.is_empty());
    assert!(geo.cities_for_country("  ").await.is_empty());
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications.recent(1)[0].level, ToastLevel::Error);
}

#[tokio::test]
async fn radius_search_failure_yields_empty_list() {
    let (server, backend) = common::create_mock_backend().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/cities_within_radius"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;
    let bus = common::create_test_event_bus();
    let notifications = common::create_test_notifications(&bus);
    let geo = GeoService::new(common::create_test_config_handle(), backend, notifications.clone());

    let nearby = geo.cities_within_radius("7", Some(40.0)).await.unwrap();
    assert!(nearby.is_empty());
    assert_eq!(notifications.len(), 1);

    assert!(matches!(
        geo.cities_within_radius("7", Some(0.0)).await,
        Err(ShError::InvalidInput(_))
    ));
}

// ---- Providers ----

#[tokio::test]
async fn radius_provider_search_filters_client_side() {
    let (server, backend) = common::create_mock_backend().await;
    let mut busy = common::provider_row("p2", "u-p2", 0, false);
    busy["distance"] = json!(3.5);
    let mut open = common::provider_row("p1", "u-p1", 0, true);
    open["distance"] = json!("1.2");
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/providers_within_radius"))
        .and(body_json(json!({"p_city_id": 1, "p_radius_km": 10.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([open, busy])))
        .expect(1)
        .mount(&server)
        .await;

    let bus = common::create_test_event_bus();
    let notifications = common::create_test_notifications(&bus);
    let config = common::create_test_config_handle();
    let geo = GeoService::new(config, backend.clone(), notifications.clone());
    let providers = ProviderService::new(backend, geo, notifications);

    let hits = providers
        .search(&ProviderFilter {
            city_id: Some("1".into()),
            radius_km: Some(10.0),
            category: Some("plumbing".into()),
            available_only: true,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].provider.id, "p1");
    assert_eq!(hits[0].distance_km, Some(1.2));
}

// ---- Bookings ----

fn booking_service(backend: sh_api::Backend, bus: &sh_services::EventBus) -> BookingService {
    BookingService::new(common::create_test_config_handle(), backend, bus.clone())
}

#[tokio::test]
async fn booking_in_the_past_is_rejected() {
    let bus = common::create_test_event_bus();
    let bookings = booking_service(common::unavailable_backend(), &bus);

    let result = bookings
        .create(BookingRequest {
            client_id: "c1".into(),
            provider_id: "p1".into(),
            service_id: None,
            scheduled_at: Utc::now() - Duration::hours(1),
            notes: None,
        })
        .await;
    assert!(matches!(result, Err(ShError::InvalidInput(_))));
}

#[tokio::test]
async fn booking_uses_hourly_rate_without_service() {
    let (server, backend) = common::create_mock_backend().await;
    common::mount_json(
        &server,
        "GET",
        "provider_profiles",
        200,
        json!([common::provider_row("p1", "u-p1", 0, true)]),
    )
    .await;
    let scheduled = Utc::now() + Duration::days(2);
    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .and(body_partial_json(json!({"price": 7500, "status": "pending", "provider_id": "p1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "b1",
            "client_id": "c1",
            "provider_id": "p1",
            "scheduled_at": scheduled.to_rfc3339(),
            "status": "pending",
            "price": 7500
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let bus = common::create_test_event_bus();
    let mut rx = bus.subscribe();
    let booking = booking_service(backend, &bus)
        .create(BookingRequest {
            client_id: "c1".into(),
            provider_id: "p1".into(),
            service_id: None,
            scheduled_at: scheduled,
            notes: Some("  ".into()),
        })
        .await
        .unwrap();

    assert_eq!(booking.price, 7500);
    assert_eq!(booking.status, BookingStatus::Pending);
    assert!(matches!(
        rx.try_recv().unwrap(),
        AppEvent::BookingChanged { ref status, .. } if status == "pending"
    ));
}

#[tokio::test]
async fn booking_without_service_or_hourly_rate_is_rejected() {
    let (server, backend) = common::create_mock_backend().await;
    let mut provider = common::provider_row("p1", "u-p1", 0, true);
    provider["hourly_rate"] = json!(null);
    common::mount_json(&server, "GET", "provider_profiles", 200, json!([provider])).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let bus = common::create_test_event_bus();
    let result = booking_service(backend, &bus)
        .create(BookingRequest {
            client_id: "c1".into(),
            provider_id: "p1".into(),
            service_id: None,
            scheduled_at: Utc::now() + Duration::days(1),
            notes: None,
        })
        .await;
    assert!(matches!(result, Err(ShError::InvalidInput(_))));
}

#[tokio::test]
async fn booking_rejects_unavailable_provider() {
    let (server, backend) = common::create_mock_backend().await;
    common::mount_json(
        &server,
        "GET",
        "provider_profiles",
        200,
        json!([common::provider_row("p1", "u-p1", 0, false)]),
    )
    .await;
    let bus = common::create_test_event_bus();

    let result = booking_service(backend, &bus)
        .create(BookingRequest {
            client_id: "c1".into(),
            provider_id: "p1".into(),
            service_id: None,
            scheduled_at: Utc::now() + Duration::days(1),
            notes: None,
        })
        .await;
    assert!(matches!(result, Err(ShError::InvalidInput(_))));
}

#[tokio::test]
async fn completing_booking_issues_invoice() {
    let (server, backend) = common::create_mock_backend().await;
    let row = |status: &str| {
        json!({
            "id": "b1",
            "client_id": "c1",
            "provider_id": "p1",
            "scheduled_at": "2030-03-01T09:00:00Z",
            "status": status,
            "price": "15000"
        })
    };
    common::mount_json(&server, "GET", "bookings", 200, json!([row("in_progress")])).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", "eq.b1"))
        .and(body_json(json!({"status": "completed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row("completed")])))
        .expect(1)
        .mount(&server)
        .await;
    common::mount_json(&server, "GET", "invoices", 200, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/invoices"))
        .and(body_partial_json(json!({"booking_id": "b1", "amount": 15000, "currency": "XOF"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "i1",
            "booking_id": "b1",
            "client_id": "c1",
            "provider_id": "p1",
            "amount": 15000,
            "currency": "XOF",
            "status": "issued"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let bus = common::create_test_event_bus();
    let mut rx = bus.subscribe();
    let (booking, invoice) = booking_service(backend, &bus)
        .change_status("b1", BookingStatus::Completed)
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Completed);
    let invoice = invoice.unwrap();
    assert_eq!(invoice.amount, 15_000);

    let events = common::drain_events(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, AppEvent::InvoiceIssued { amount: 15_000, .. })));
}

#[tokio::test]
async fn completion_stands_when_invoicing_fails() {
    let (server, backend) = common::create_mock_backend().await;
    let row = |status: &str| {
        json!({
            "id": "b1",
            "client_id": "c1",
            "provider_id": "p1",
            "scheduled_at": "2030-03-01T09:00:00Z",
            "status": status,
            "price": 15000
        })
    };
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row("completed")])))
        .expect(1)
        .mount(&server)
        .await;
    common::mount_json(&server, "GET", "invoices", 200, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/invoices"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db down"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // First GET sees the booking in progress, later ones see it completed.
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row("in_progress")])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    common::mount_json(&server, "GET", "bookings", 200, json!([row("completed")])).await;

    let bus = common::create_test_event_bus();
    let bookings = booking_service(backend, &bus);
    let (booking, invoice) = bookings
        .change_status("b1", BookingStatus::Completed)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Completed);
    assert!(invoice.is_none());

    Mock::given(method("POST"))
        .and(path("/rest/v1/invoices"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "i1",
            "booking_id": "b1",
            "client_id": "c1",
            "provider_id": "p1",
            "amount": 15000,
            "currency": "XOF",
            "status": "issued"
        }])))
        .expect(1)
        .mount(&server)
        .await;
    let invoice = bookings.invoice_booking("b1").await.unwrap();
    assert_eq!(invoice.booking_id, "b1");
    assert_eq!(invoice.amount, 15_000);
}

#[tokio::test]
async fn invalid_booking_transition_is_rejected_before_write() {
    let (server, backend) = common::create_mock_backend().await;
    common::mount_json(
        &server,
        "GET",
        "bookings",
        200,
        json!([{
            "id": "b1",
            "client_id": "c1",
            "provider_id": "p1",
            "scheduled_at": "2030-03-01T09:00:00Z",
            "status": "cancelled",
            "price": 0
        }]),
    )
    .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let bus = common::create_test_event_bus();
    let result = booking_service(backend, &bus)
        .change_status("b1", BookingStatus::Confirmed)
        .await;
    assert!(matches!(result, Err(ShError::InvalidTransition { .. })));
}

// ---- Messaging ----

#[tokio::test]
async fn send_message_updates_conversation_preview() {
    let (server, backend) = common::create_mock_backend().await;
    common::mount_json(
        &server,
        "GET",
        "conversations",
        200,
        json!([{"id": "conv1", "client_id": "u1", "provider_id": "u2"}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/messages"))
        .and(body_json(json!({"conversation_id": "conv1", "sender_id": "u1", "content": "Bonjour"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "m1",
            "conversation_id": "conv1",
            "sender_id": "u1",
            "content": "Bonjour",
            "is_read": false,
            "created_at": "2030-01-01T08:00:00Z"
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/conversations"))
        .and(body_partial_json(json!({"last_message": "Bonjour"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let bus = common::create_test_event_bus();
    let mut rx = bus.subscribe();
    let messaging = MessagingService::new(backend, bus);

    let message = messaging.send("conv1", "u1", "  Bonjour \n").await.unwrap();
    assert_eq!(message.id, "m1");
    assert!(matches!(
        rx.try_recv().unwrap(),
        AppEvent::MessageSent { ref message_id, .. } if message_id == "m1"
    ));
}

#[tokio::test]
async fn outsiders_and_empty_messages_are_rejected() {
    let (server, backend) = common::create_mock_backend().await;
    common::mount_json(
        &server,
        "GET",
        "conversations",
        200,
        json!([{"id": "conv1", "client_id": "u1", "provider_id": "u2"}]),
    )
    .await;
    let messaging = MessagingService::new(backend, common::create_test_event_bus());

    assert!(matches!(
        messaging.send("conv1", "u1", "   ").await,
        Err(ShError::InvalidInput(_))
    ));
    assert!(matches!(
        messaging.send("conv1", "intruder", "hello").await,
        Err(ShError::InvalidInput(_))
    ));
    assert!(matches!(
        messaging.get_or_create_conversation("u1", "u1").await,
        Err(ShError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn mark_read_counts_changed_rows() {
    let (server, backend) = common::create_mock_backend().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/messages"))
        .and(query_param("sender_id", "neq.u2"))
        .and(query_param("is_read", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "m1"}, {"id": "m2"}])))
        .expect(1)
        .mount(&server)
        .await;
    let bus = common::create_test_event_bus();
    let mut rx = bus.subscribe();

    let count = MessagingService::new(backend, bus)
        .mark_read("conv1", "u2")
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert!(matches!(rx.try_recv().unwrap(), AppEvent::MessagesRead { count: 2, .. }));
}

// ---- Wallet ----

fn wallet(backend: sh_api::Backend) -> WalletService {
    WalletService::new(
        common::create_test_config_handle(),
        backend,
        common::create_test_event_bus(),
    )
}

fn withdrawal(amount: i64) -> WithdrawalRequest {
    WithdrawalRequest {
        provider_id: "p1".into(),
        amount,
        method: Some("mobile_money".into()),
        account_reference: Some("+22997000000".into()),
    }
}

#[tokio::test]
async fn withdrawal_below_minimum_is_rejected() {
    let result = wallet(common::unavailable_backend())
        .request_withdrawal(withdrawal(500))
        .await;
    assert!(matches!(result, Err(ShError::InvalidInput(_))));
}

#[tokio::test]
async fn withdrawal_respects_outstanding_requests() {
    let (server, backend) = common::create_mock_backend().await;
    common::mount_json(
        &server,
        "GET",
        "provider_profiles",
        200,
        json!([common::provider_row("p1", "u-p1", 10_000, true)]),
    )
    .await;
    common::mount_json(
        &server,
        "GET",
        "withdrawals",
        200,
        json!([{"id": "w0", "provider_id": "p1", "amount": 4000, "status": "pending"}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/withdrawals"))
        .and(body_partial_json(json!({"amount": 5000, "status": "pending"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "w1",
            "provider_id": "p1",
            "amount": 5000,
            "currency": "XOF",
            "status": "pending"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let wallet = wallet(backend);
    assert!(matches!(
        wallet.request_withdrawal(withdrawal(7000)).await,
        Err(ShError::InvalidInput(_))
    ));
    let created = wallet.request_withdrawal(withdrawal(5000)).await.unwrap();
    assert_eq!(created.status, WithdrawalStatus::Pending);
}

// ---- Verification ----

#[tokio::test]
async fn passed_liveness_marks_profile_pending_review() {
    let (server, backend) = common::create_mock_backend().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.u1"))
        .and(body_json(json!({"liveness_verified": true, "verification_status": "pending"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([common::profile_row("u1", true, "pending")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    let bus = common::create_test_event_bus();
    let mut rx = bus.subscribe();
    let notifications = common::create_test_notifications(&bus);
    let verification = VerificationService::new(backend, bus, notifications.clone());

    let profile = verification
        .record_outcome("u1", &LivenessOutcome::succeeded(Some(b"jpeg")))
        .await
        .unwrap()
        .unwrap();

    assert!(profile.liveness_verified);
    assert_eq!(profile.verification_status, VerificationStatus::Pending);
    assert!(common::drain_events(&mut rx)
        .iter()
        .any(|e| matches!(e, AppEvent::VerificationUpdated { liveness_verified: true, .. })));
    assert_eq!(notifications.recent(1)[0].level, ToastLevel::Success);
}

#[tokio::test]
async fn failed_liveness_leaves_profile_untouched() {
    let (server, backend) = common::create_mock_backend().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let bus = common::create_test_event_bus();
    let notifications = common::create_test_notifications(&bus);
    let verification = VerificationService::new(backend, bus, notifications.clone());

    let result = verification
        .record_outcome("u1", &LivenessOutcome::failed())
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(notifications.recent(1)[0].level, ToastLevel::Warning);
}

#[tokio::test]
async fn verification_write_failure_is_reported() {
    let (server, backend) = common::create_mock_backend().await;
    common::mount_json(&server, "PATCH", "profiles", 500, json!({"message": "db down"})).await;
    let bus = common::create_test_event_bus();
    let notifications = common::create_test_notifications(&bus);
    let verification = VerificationService::new(backend, bus, notifications.clone());

    let result = verification
        .record_outcome("u1", &LivenessOutcome::succeeded(None))
        .await;
    assert!(matches!(result, Err(ShError::ServerError { status: 500, .. })));
    assert_eq!(notifications.recent(1)[0].level, ToastLevel::Error);
}
