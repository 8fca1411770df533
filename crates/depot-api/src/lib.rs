// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Blocking REST client for the ticketing backend. One method per
//! endpoint; every response is checked for status, decoded, and mapped
//! into the gateway error taxonomy before it reaches a screen.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

use depot_app::{
    BookingDetail, DetailKind, DetailRecord, EntityKind, FormPayload, PageQuery, Trip,
    format_wire_minute,
};
use depot_query::{
    EntityGateway, GatewayError, PageKey, PageResult, PageRows, compute_page_count,
};

/// Single accessor for the bearer token: set on login, read by every
/// outgoing request, cleared on logout or expiry. Shared across client
/// clones so worker threads observe updates.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<Mutex<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    /// Reads a token file if one exists; a missing file leaves the store
    /// empty and requests unauthenticated.
    pub fn load(path: &Path) -> Result<Self> {
        let store = Self::new();
        if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("read token file {}", path.display()))?;
            let token = raw.trim();
            if !token.is_empty() {
                store.set(token);
            }
        }
        Ok(store)
    }

    pub fn set(&self, token: &str) {
        let mut slot = self.inner.lock().expect("token store poisoned");
        *slot = Some(token.trim().to_owned());
    }

    pub fn clear(&self) {
        let mut slot = self.inner.lock().expect("token store poisoned");
        *slot = None;
    }

    pub fn current(&self) -> Option<String> {
        self.inner.lock().expect("token store poisoned").clone()
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
    token: TokenStore,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, token: TokenStore) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn token(&self) -> &TokenStore {
        &self.token
    }

    /// Cheap reachability probe used by `--check`: fetches a one-row page
    /// of trips and discards it.
    pub fn ping(&self) -> Result<(), GatewayError> {
        let key = PageKey::new(EntityKind::Trips, PageQuery::new(0, 1), None);
        self.fetch_page(&key).map(|_| ())
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token.current() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response, GatewayError> {
        let response = self.authorized(builder).send().map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status, &body));
        }
        Ok(response)
    }

    fn list_request(&self, key: &PageKey) -> RequestBuilder {
        let mut params: Vec<(&str, String)> = vec![
            ("page", key.page_index.to_string()),
            ("limit", key.page_size.to_string()),
        ];
        if let Some(filter) = &key.filter {
            params.push(("search", filter.clone()));
        }
        self.http
            .get(format!("{}/{}", self.base_url, key.kind.key()))
            .query(&params)
    }

    fn fetch_rows<T>(&self, key: &PageKey) -> Result<(Vec<T>, u64, i64), GatewayError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.send(self.list_request(key))?;
        let envelope: PageEnvelope<T> = decode(response)?;
        let page_count = if envelope.page_count < 0 {
            compute_page_count(envelope.total_elements, key.page_size)
        } else {
            envelope.page_count
        };
        Ok((envelope.data_list, envelope.total_elements, page_count))
    }

    fn get_record<T>(&self, path: &str) -> Result<T, GatewayError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.send(self.http.get(format!("{}/{path}", self.base_url)))?;
        decode(response)
    }
}

impl EntityGateway for Client {
    fn fetch_page(&self, key: &PageKey) -> Result<PageResult, GatewayError> {
        let (rows, total_elements, page_count) = match key.kind {
            EntityKind::Trips => {
                let (rows, total, count) = self.fetch_rows(key)?;
                (PageRows::Trips(rows), total, count)
            }
            EntityKind::Drivers => {
                let (rows, total, count) = self.fetch_rows(key)?;
                (PageRows::Drivers(rows), total, count)
            }
            EntityKind::Users => {
                let (rows, total, count) = self.fetch_rows(key)?;
                (PageRows::Users(rows), total, count)
            }
            EntityKind::Cargos => {
                let (rows, total, count) = self.fetch_rows(key)?;
                (PageRows::Cargos(rows), total, count)
            }
            EntityKind::Notifications => {
                let (rows, total, count) = self.fetch_rows(key)?;
                (PageRows::Notifications(rows), total, count)
            }
            EntityKind::Bookings => {
                let (rows, total, count) = self.fetch_rows(key)?;
                (PageRows::Bookings(rows), total, count)
            }
            EntityKind::Reviews => {
                let (rows, total, count) = self.fetch_rows(key)?;
                (PageRows::Reviews(rows), total, count)
            }
            EntityKind::TripLogs => {
                let (rows, total, count) = self.fetch_rows(key)?;
                (PageRows::TripLogs(rows), total, count)
            }
        };
        Ok(PageResult {
            rows,
            total_elements,
            page_count,
        })
    }

    fn fetch_detail(&self, kind: DetailKind, id: i64) -> Result<DetailRecord, GatewayError> {
        match kind {
            DetailKind::Booking => {
                let detail: BookingDetail = self.get_record(&format!("bookings/{id}"))?;
                Ok(DetailRecord::Booking(Box::new(detail)))
            }
            DetailKind::Trip => {
                let trip: Trip = self.get_record(&format!("trips/{id}"))?;
                Ok(DetailRecord::Trip(trip))
            }
        }
    }

    fn create(&self, payload: &FormPayload) -> Result<String, GatewayError> {
        let entity = payload.kind().entity();
        let builder = self
            .http
            .post(format!("{}/{}", self.base_url, entity.key()))
            .json(&payload_body(payload, None));
        self.send(builder)?;
        Ok(format!("New {} saved", payload.kind().label()))
    }

    fn update(&self, id: i64, payload: &FormPayload) -> Result<String, GatewayError> {
        let entity = payload.kind().entity();
        let builder = self
            .http
            .put(format!("{}/{}/{id}", self.base_url, entity.key()))
            .json(&payload_body(payload, Some(id)));
        self.send(builder)?;
        Ok(format!("{} {id} updated", payload.kind().label()))
    }

    fn delete(&self, kind: EntityKind, id: i64) -> Result<String, GatewayError> {
        let response = self.send(
            self.http
                .delete(format!("{}/{}/{id}", self.base_url, kind.key())),
        )?;
        let body = response.text().unwrap_or_default();
        Ok(confirmation_text(&body, kind, id))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageEnvelope<T> {
    data_list: Vec<T>,
    total_elements: u64,
    #[serde(default = "unknown_page_count")]
    page_count: i64,
}

const fn unknown_page_count() -> i64 {
    -1
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: Option<String>,
}

fn decode<T>(response: Response) -> Result<T, GatewayError>
where
    T: serde::de::DeserializeOwned,
{
    response
        .json()
        .map_err(|error| GatewayError::Decode(error.to_string()))
}

fn transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Network(error.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> GatewayError {
    if status == StatusCode::NOT_FOUND {
        return GatewayError::NotFound;
    }
    let message = serde_json::from_str::<MessageEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .filter(|message| !message.is_empty());
    GatewayError::Server {
        status: status.as_u16(),
        message,
    }
}

/// Delete confirmations: the server's text when it sent one, otherwise a
/// generated fallback. Booking deletes are cancels and read as such.
fn confirmation_text(body: &str, kind: EntityKind, id: i64) -> String {
    if let Ok(envelope) = serde_json::from_str::<MessageEnvelope>(body)
        && let Some(message) = envelope.message
        && !message.is_empty()
    {
        return message;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.contains('{') {
        return trimmed.to_owned();
    }
    match kind {
        EntityKind::Bookings => format!("Booking {id} cancelled"),
        _ => format!("{} {id} deleted", kind.label()),
    }
}

fn payload_body(payload: &FormPayload, id: Option<i64>) -> serde_json::Value {
    let mut body = match payload {
        FormPayload::Trip(trip) => json!({
            "source": { "name": trip.source },
            "destination": { "name": trip.destination },
            "departureDateTime": trip
                .departure_date_time
                .map(format_wire_minute),
            "driver": { "id": trip.driver_id.get() },
            "coach": { "id": trip.coach_id.get() },
            "price": trip.price,
            "discount": trip.discount_amount.map(|amount| json!({ "amount": amount })),
            "duration": trip.duration,
            "completed": trip.completed,
        }),
        FormPayload::Driver(driver) => json!({
            "firstName": driver.first_name,
            "lastName": driver.last_name,
            "email": driver.email,
            "phone": driver.phone,
            "gender": driver.gender,
            "address": driver.address,
            "licenceNumber": driver.licence_number,
            "quit": driver.quit,
        }),
        FormPayload::User(user) => json!({
            "username": user.username,
            "password": if user.password.is_empty() { None } else { Some(&user.password) },
            "firstName": user.first_name,
            "lastName": user.last_name,
            "email": user.email,
            "phone": user.phone,
            "gender": user.gender,
            "address": user.address,
            "active": user.active,
            "role": user.role,
        }),
        FormPayload::Cargo(cargo) => json!({
            "name": cargo.name,
            "description": cargo.description,
            "basePrice": cargo.base_price,
        }),
        FormPayload::Notification(notification) => json!({
            "title": notification.title,
            "message": notification.message,
            "recipientIdentifiers": notification.recipient_identifiers,
            "recipientType": notification.recipient_type,
            "sendDateTime": notification.send_date_time.map(format_wire_minute),
        }),
    };
    if let (Some(id), Some(map)) = (id, body.as_object_mut()) {
        map.insert("id".to_owned(), json!(id));
    }
    body
}
