//! Backend client tests against a mocked REST API.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sh_api::endpoints::bookings::BookingParty;
use sh_api::endpoints::providers::ProviderQuery;
use sh_api::{ApiClient, Backend, Query, RetryConfig};
use sh_core::config::BackendConfig;
use sh_core::error::ShError;
use sh_models::BookingStatus;

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&BackendConfig {
        url: server.uri(),
        anon_key: "anon".into(),
        access_token: "user-jwt".into(),
        ..Default::default()
    })
    .unwrap();
    (server, client)
}

#[tokio::test]
async fn test_select_sends_auth_and_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/cities"))
        .and(header("apikey", "anon"))
        .and(header("authorization", "Bearer user-jwt"))
        .and(query_param("country_code", "eq.BJ"))
        .and(query_param("order", "name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Abomey-Calavi", "country_code": "BJ"},
            {"id": "2", "name": "Cotonou", "country_code": "BJ"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let cities = client.cities_by_country("bj").await.unwrap();
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[0].id, "1");
    assert_eq!(cities[1].name, "Cotonou");
}

#[tokio::test]
async fn test_rpc_radius_search() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/cities_within_radius"))
        .and(body_json(json!({"p_city_id": 7, "p_radius_km": 30.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "name": "Cotonou", "distance": 0},
            {"id": 9, "name": "Abomey-Calavi", "distance": 12.4}
        ])))
        .mount(&server)
        .await;

    let nearby = client.cities_within_radius("7", 30.0).await.unwrap();
    assert_eq!(nearby.len(), 2);
    assert_eq!(nearby[1].distance, 12.4);
}

#[tokio::test]
async fn test_providers_within_radius_flattened_rows() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/providers_within_radius"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "p1", "user_id": "u1", "business_name": "Atelier Koffi",
            "category": "plumbing", "rating": "4.8", "distance": 3.2
        }])))
        .mount(&server)
        .await;

    let rows = client.providers_within_radius("p-city", 10.0).await.unwrap();
    assert_eq!(rows[0].provider.business_name, "Atelier Koffi");
    assert_eq!(rows[0].provider.rating, Some(4.8));
    assert_eq!(rows[0].distance, 3.2);
}

#[tokio::test]
async fn test_error_body_becomes_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/countries"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "42P01", "message": "relation \"countries\" does not exist",
            "details": null, "hint": null
        })))
        .mount(&server)
        .await;

    match client.list_countries().await.unwrap_err() {
        ShError::ServerError { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("42P01"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_failed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "JWT expired"})))
        .mount(&server)
        .await;

    let err = client.get_profile("u1").await.unwrap_err();
    assert!(matches!(err, ShError::AuthFailed(ref m) if m.contains("JWT expired")));
}

#[tokio::test]
async fn test_missing_row_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/provider_profiles"))
        .and(query_param("id", "eq.nope"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = client.get_provider("nope").await.unwrap_err();
    assert!(matches!(err, ShError::NotFound { entity: "provider_profiles", .. }));
}

#[tokio::test]
async fn test_insert_requests_representation() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/conversations"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({"client_id": "c1", "provider_id": "p1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": "conv-1", "client_id": "c1", "provider_id": "p1"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let conv = client
        .create_conversation(&sh_api::endpoints::conversations::NewConversation {
            client_id: "c1".into(),
            provider_id: "p1".into(),
        })
        .await
        .unwrap();
    assert_eq!(conv.id, "conv-1");
}

#[tokio::test]
async fn test_update_status_patch() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", "eq.b1"))
        .and(body_json(json!({"status": "confirmed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "b1", "client_id": "c1", "provider_id": "p1",
            "scheduled_at": "2030-01-01T10:00:00Z", "status": "confirmed", "price": 5000
        }])))
        .mount(&server)
        .await;

    let booking = client
        .set_booking_status("b1", BookingStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_unfiltered_writes_are_refused() {
    let (_server, client) = setup().await;

    let err = client
        .update::<_, serde_json::Value>("bookings", &Query::new(), &json!({"status": "cancelled"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ShError::InvalidInput(_)));

    let err = client.delete("bookings", &Query::new()).await.unwrap_err();
    assert!(matches!(err, ShError::InvalidInput(_)));
}

#[tokio::test]
async fn test_or_filter_for_conversations() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/conversations"))
        .and(query_param("or", "(client_id.eq.u1,provider_id.eq.u1)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.conversations_for_user("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_bookings_by_party() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("provider_id", "eq.p1"))
        .and(query_param("status", "eq.pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client
        .list_bookings(BookingParty::Provider, "p1", Some(BookingStatus::Pending))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_search_providers_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/provider_profiles"))
        .and(query_param("city_id", "eq.12"))
        .and(query_param("is_available", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "p1", "user_id": "u1", "business_name": "A", "rating": 4.1}
        ])))
        .mount(&server)
        .await;

    let providers = client
        .search_providers(&ProviderQuery {
            city_id: Some("12".into()),
            available_only: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(providers.len(), 1);
}

#[tokio::test]
async fn test_count_reads_content_range() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/messages"))
        .and(header("prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "0-0/1234")
                .set_body_json(json!([{"id": "m1"}])),
        )
        .mount(&server)
        .await;

    assert_eq!(client.table_count("messages").await.unwrap(), 1234);
}

#[tokio::test]
async fn test_upsert_merges_duplicates() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/countries"))
        .and(header("prefer", "resolution=merge-duplicates,return=minimal"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client
        .upsert_rows("countries", &[json!({"id": 1, "name": "Benin", "code": "BJ"})])
        .await
        .unwrap();
    // Empty batches never hit the network.
    client.upsert_rows("countries", &[]).await.unwrap();
}

#[tokio::test]
async fn test_unknown_table_rejected() {
    let (_server, client) = setup().await;
    let err = client.fetch_page("pg_user", 0, 10).await.unwrap_err();
    assert!(matches!(err, ShError::InvalidInput(_)));
}

#[tokio::test]
async fn test_opt_in_retry_on_gateway_errors() {
    let (server, client) = setup().await;
    let client = client.with_retry_config(RetryConfig {
        max_retries: 2,
        base_delay: std::time::Duration::from_millis(1),
        max_delay: std::time::Duration::from_millis(2),
        ..RetryConfig::default()
    });

    Mock::given(method("GET"))
        .and(path("/rest/v1/countries"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/countries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Benin", "code": "BJ"}
        ])))
        .mount(&server)
        .await;

    let countries = client.list_countries().await.unwrap();
    assert_eq!(countries[0].code, "BJ");
}

#[tokio::test]
async fn test_no_retry_by_default() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/countries"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.list_countries().await.unwrap_err();
    assert!(matches!(err, ShError::ServerError { status: 503, .. }));
}

#[test]
fn test_backend_factory_with_mock_url() {
    let backend = Backend::from_config(&BackendConfig {
        url: "http://127.0.0.1:9".into(),
        anon_key: "anon".into(),
        ..Default::default()
    });
    assert!(backend.client().is_ok());
}
