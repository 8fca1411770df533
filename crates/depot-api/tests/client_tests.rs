// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

use depot_api::{Client, TokenStore};
use depot_app::{DetailKind, EntityKind, PageQuery};
use depot_query::{EntityGateway, GatewayError, PageKey, PageRows};

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid content type header")
}

fn start_client(server: &Server, token: TokenStore) -> Result<Client> {
    let base = format!("http://{}/api/v1", server.server_addr());
    Client::new(&base, Duration::from_secs(1), token)
}

#[test]
fn fetch_page_decodes_the_list_envelope() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = start_client(&server, TokenStore::new())?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/v1/cargos?page=0&limit=5");
        let body = r#"{
            "dataList": [
                {"id": 1, "name": "Parcel", "description": "Small parcel", "basePrice": 15000},
                {"id": 2, "name": "Bicycle", "description": "Boxed bicycle", "basePrice": 90000}
            ],
            "totalElements": 2,
            "pageCount": 1
        }"#;
        let response = Response::from_string(body)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let key = PageKey::new(EntityKind::Cargos, PageQuery::new(0, 5), None);
    let page = client.fetch_page(&key)?;
    assert_eq!(page.total_elements, 2);
    assert_eq!(page.page_count, 1);
    let PageRows::Cargos(rows) = &page.rows else {
        panic!("expected cargo rows");
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "Parcel");
    assert_eq!(rows[1].base_price, 90_000);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn fetch_page_computes_page_count_when_absent() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = start_client(&server, TokenStore::new())?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let body = r#"{"dataList": [], "totalElements": 11}"#;
        let response = Response::from_string(body)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let key = PageKey::new(EntityKind::Cargos, PageQuery::new(0, 5), None);
    let page = client.fetch_page(&key)?;
    assert_eq!(page.page_count, 3);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn filter_is_forwarded_as_the_search_parameter() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = start_client(&server, TokenStore::new())?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/v1/cargos?page=0&limit=5&search=parcel");
        let body = r#"{"dataList": [], "totalElements": 0, "pageCount": 0}"#;
        let response = Response::from_string(body)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let key = PageKey::new(EntityKind::Cargos, PageQuery::new(0, 5), Some("parcel"));
    let page = client.fetch_page(&key)?;
    assert!(page.rows.is_empty());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn bearer_token_is_attached_when_present() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = start_client(&server, TokenStore::with_token("secret-token"))?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let authorization = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Authorization"))
            .map(|header| header.value.as_str().to_owned());
        assert_eq!(authorization.as_deref(), Some("Bearer secret-token"));
        let body = r#"{"dataList": [], "totalElements": 0, "pageCount": 0}"#;
        let response = Response::from_string(body)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let key = PageKey::new(EntityKind::Trips, PageQuery::new(0, 1), None);
    client.fetch_page(&key)?;

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn server_error_message_survives_verbatim() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = start_client(&server, TokenStore::new())?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &tiny_http::Method::Delete);
        assert_eq!(request.url(), "/api/v1/bookings/42");
        let response = Response::from_string(r#"{"message":"Booking already cancelled"}"#)
            .with_status_code(409)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let error = client
        .delete(EntityKind::Bookings, 42)
        .expect_err("conflict should fail");
    assert_eq!(error.toast_text(), "Booking already cancelled");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn missing_target_maps_to_not_found() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = start_client(&server, TokenStore::new())?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string("").with_status_code(404);
        request.respond(response).expect("response should succeed");
    });

    let error = client
        .delete(EntityKind::Notifications, 7)
        .expect_err("missing row should fail");
    assert!(error.is_not_found());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn delete_returns_the_confirmation_message() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = start_client(&server, TokenStore::new())?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string(r#"{"message":"Booking 42 cancelled"}"#)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let message = client.delete(EntityKind::Bookings, 42)?;
    assert_eq!(message, "Booking 42 cancelled");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn booking_detail_resolves_nested_records() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = start_client(&server, TokenStore::new())?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/v1/bookings/42");
        let body = r#"{
            "id": 42,
            "custFirstName": "Linh",
            "custLastName": "Tran",
            "phone": "0903555111",
            "email": "linh@example.com",
            "pickUpAddress": "12 Trang Thi",
            "user": {"username": "linhtran"},
            "seatNumber": "A12",
            "bookingType": "ONEWAY",
            "trip": {
                "id": 7,
                "source": {"id": 1, "name": "Ha Noi"},
                "destination": {"id": 2, "name": "Hai Phong"},
                "departureDateTime": "2026-03-15 06:00",
                "driver": {"id": 3, "firstName": "Minh", "lastName": "Pham"},
                "coach": {"id": 4, "name": "Thaco 45", "coachType": "BED", "capacity": 45},
                "price": 250000,
                "discount": null,
                "duration": 2,
                "completed": false
            },
            "totalPayment": 250000,
            "paymentDateTime": "2026-03-14 09:12",
            "paymentMethod": "CASH",
            "paymentStatus": "PAID",
            "paymentHistories": [
                {"oldStatus": null, "newStatus": "UNPAID", "statusChangeDateTime": "2026-03-14 08:30:02"},
                {"oldStatus": "UNPAID", "newStatus": "PAID", "statusChangeDateTime": "2026-03-14 09:12:44"}
            ]
        }"#;
        let response = Response::from_string(body)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let record = client.fetch_detail(DetailKind::Booking, 42)?;
    let depot_app::DetailRecord::Booking(detail) = record else {
        panic!("expected booking detail");
    };
    assert_eq!(detail.customer_name(), "Linh Tran");
    assert_eq!(detail.trip.coach.capacity, 45);
    assert_eq!(detail.payment_histories.len(), 2);
    assert_eq!(detail.payment_histories[0].old_status, None);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn unreachable_server_is_a_network_error() {
    let client = Client::new(
        "http://127.0.0.1:1/api/v1",
        Duration::from_millis(50),
        TokenStore::new(),
    )
    .expect("client should initialize");

    let key = PageKey::new(EntityKind::Trips, PageQuery::new(0, 5), None);
    let error = client
        .fetch_page(&key)
        .expect_err("fetch should fail for unreachable endpoint");
    assert!(matches!(
        error,
        GatewayError::Network(_) | GatewayError::Timeout
    ));
}

#[test]
fn token_file_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("token");
    std::fs::write(&path, "abc123\n")?;

    let store = TokenStore::load(&path)?;
    assert_eq!(store.current(), Some("abc123".to_owned()));

    let missing = TokenStore::load(&dir.path().join("absent"))?;
    assert_eq!(missing.current(), None);
    Ok(())
}
