// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The query-cache layer every list screen is built on: page request keys,
//! the page/detail caches, fetch supersession, and the gateway seam the
//! remote client and the in-memory test gateway both implement.

use std::collections::HashMap;

use thiserror::Error;

use depot_app::{
    Booking, CargoItem, DetailKind, DetailRecord, Driver, EntityKind, FormPayload, Notification,
    PageQuery, Review, Trip, TripLog, User,
};

pub const GENERIC_FAILURE_TOAST: &str = "Something went wrong. Please try again.";

/// Failures crossing the data-plane boundary. Everything here is caught at
/// the operation boundary and converted to a notification; nothing bubbles
/// out of the event loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("cannot reach server: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("server error ({status})")]
    Server { status: u16, message: Option<String> },
    #[error("target not found")]
    NotFound,
    #[error("decode response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Text for the failure toast: the server's message verbatim when it
    /// sent one, a fixed generic string otherwise.
    pub fn toast_text(&self) -> String {
        match self {
            Self::Server {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            Self::NotFound => "The record no longer exists".to_owned(),
            _ => GENERIC_FAILURE_TOAST.to_owned(),
        }
    }
}

/// One page of rows for some entity. Replaced wholesale on every fetch;
/// no component mutates a cached page in place.
#[derive(Debug, Clone, PartialEq)]
pub enum PageRows {
    Trips(Vec<Trip>),
    Drivers(Vec<Driver>),
    Users(Vec<User>),
    Cargos(Vec<CargoItem>),
    Notifications(Vec<Notification>),
    Bookings(Vec<Booking>),
    Reviews(Vec<Review>),
    TripLogs(Vec<TripLog>),
}

impl PageRows {
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Trips(_) => EntityKind::Trips,
            Self::Drivers(_) => EntityKind::Drivers,
            Self::Users(_) => EntityKind::Users,
            Self::Cargos(_) => EntityKind::Cargos,
            Self::Notifications(_) => EntityKind::Notifications,
            Self::Bookings(_) => EntityKind::Bookings,
            Self::Reviews(_) => EntityKind::Reviews,
            Self::TripLogs(_) => EntityKind::TripLogs,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Trips(rows) => rows.len(),
            Self::Drivers(rows) => rows.len(),
            Self::Users(rows) => rows.len(),
            Self::Cargos(rows) => rows.len(),
            Self::Notifications(rows) => rows.len(),
            Self::Bookings(rows) => rows.len(),
            Self::Reviews(rows) => rows.len(),
            Self::TripLogs(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row_ids(&self) -> Vec<i64> {
        match self {
            Self::Trips(rows) => rows.iter().map(|row| row.id.get()).collect(),
            Self::Drivers(rows) => rows.iter().map(|row| row.id.get()).collect(),
            Self::Users(rows) => rows.iter().map(|row| row.id.get()).collect(),
            Self::Cargos(rows) => rows.iter().map(|row| row.id.get()).collect(),
            Self::Notifications(rows) => rows.iter().map(|row| row.id.get()).collect(),
            Self::Bookings(rows) => rows.iter().map(|row| row.id.get()).collect(),
            Self::Reviews(rows) => rows.iter().map(|row| row.id.get()).collect(),
            Self::TripLogs(rows) => rows.iter().map(|row| row.id.get()).collect(),
        }
    }

    pub fn empty_for(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Trips => Self::Trips(Vec::new()),
            EntityKind::Drivers => Self::Drivers(Vec::new()),
            EntityKind::Users => Self::Users(Vec::new()),
            EntityKind::Cargos => Self::Cargos(Vec::new()),
            EntityKind::Notifications => Self::Notifications(Vec::new()),
            EntityKind::Bookings => Self::Bookings(Vec::new()),
            EntityKind::Reviews => Self::Reviews(Vec::new()),
            EntityKind::TripLogs => Self::TripLogs(Vec::new()),
        }
    }
}

/// The wire envelope of a list fetch. `page_count` is -1 when unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub rows: PageRows,
    pub total_elements: u64,
    pub page_count: i64,
}

impl PageResult {
    pub fn new(rows: PageRows, total_elements: u64, page_size: usize) -> Self {
        Self {
            rows,
            total_elements,
            page_count: compute_page_count(total_elements, page_size),
        }
    }
}

pub fn compute_page_count(total_elements: u64, page_size: usize) -> i64 {
    if page_size == 0 {
        return -1;
    }
    total_elements.div_ceil(page_size as u64) as i64
}

/// Identity of one cacheable list fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub kind: EntityKind,
    pub page_index: usize,
    pub page_size: usize,
    pub filter: Option<String>,
}

impl PageKey {
    pub fn new(kind: EntityKind, query: PageQuery, filter: Option<&str>) -> Self {
        let filter = filter
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned);
        Self {
            kind,
            page_index: query.page_index,
            page_size: query.page_size,
            filter,
        }
    }

    pub const fn query(&self) -> PageQuery {
        PageQuery::new(self.page_index, self.page_size)
    }

    /// Key of the "all rows" variant used to search across the whole
    /// dataset. Warmed explicitly, never automatically.
    pub fn all_rows(kind: EntityKind, total_elements: u64) -> Self {
        Self {
            kind,
            page_index: 0,
            page_size: (total_elements.max(1)) as usize,
            filter: None,
        }
    }
}

/// Process-wide page cache. Narrow on purpose: get, set, invalidate.
/// Only mutation invalidation evicts entries; replacement is atomic.
#[derive(Debug, Default)]
pub struct PageCache {
    entries: HashMap<PageKey, PageResult>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PageKey) -> Option<PageResult> {
        self.entries.get(key).cloned()
    }

    pub fn set(&mut self, key: PageKey, page: PageResult) {
        self.entries.insert(key, page);
    }

    pub fn invalidate(&mut self, key: &PageKey) {
        self.entries.remove(key);
    }

    /// Drops every cached page of one entity, whatever its pagination or
    /// filter. This is the invalidation signal a mutation emits.
    pub fn invalidate_entity(&mut self, kind: EntityKind) {
        self.entries.retain(|key, _| key.kind != kind);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cache of lazily resolved detail records, keyed by `(kind, id)`.
#[derive(Debug, Default)]
pub struct DetailCache {
    entries: HashMap<(DetailKind, i64), DetailRecord>,
}

impl DetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: DetailKind, id: i64) -> Option<DetailRecord> {
        self.entries.get(&(kind, id)).cloned()
    }

    pub fn set(&mut self, kind: DetailKind, id: i64, record: DetailRecord) {
        self.entries.insert((kind, id), record);
    }

    pub fn invalidate(&mut self, kind: DetailKind, id: i64) {
        self.entries.remove(&(kind, id));
    }
}

/// Ticket identifying one issued fetch. A completion is applied only while
/// its ticket is still the latest for the entity: last-request-wins by
/// request identity, not by arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub kind: EntityKind,
    pub serial: u64,
}

#[derive(Debug, Default)]
pub struct FetchBoard {
    next_serial: u64,
    latest: HashMap<EntityKind, u64>,
}

impl FetchBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, kind: EntityKind) -> FetchTicket {
        self.next_serial += 1;
        self.latest.insert(kind, self.next_serial);
        FetchTicket {
            kind,
            serial: self.next_serial,
        }
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest.get(&ticket.kind) == Some(&ticket.serial)
    }

    /// Called when a screen is left: any still-pending completion for the
    /// entity becomes a no-op.
    pub fn retire(&mut self, kind: EntityKind) {
        self.latest.remove(&kind);
    }
}

/// Pagination window of one screen. Rows already on screen are kept until
/// a newer page arrives; this type only tracks the window arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub query: PageQuery,
    pub total_elements: Option<u64>,
    pub page_count: i64,
}

impl PageWindow {
    pub fn new(query: PageQuery) -> Self {
        Self {
            query,
            total_elements: None,
            page_count: -1,
        }
    }

    pub fn observe(&mut self, page: &PageResult) {
        self.total_elements = Some(page.total_elements);
        self.page_count = page.page_count;
    }

    pub fn can_prev(&self) -> bool {
        self.query.page_index > 0
    }

    /// With an unknown page count the next page stays reachable and the
    /// server decides; a known count disables paging past the end.
    pub fn can_next(&self) -> bool {
        match self.page_count {
            count if count < 0 => true,
            count => self.query.page_index + 1 < count as usize,
        }
    }

    pub fn next(&self) -> Option<PageQuery> {
        self.can_next()
            .then(|| PageQuery::new(self.query.page_index + 1, self.query.page_size))
    }

    pub fn prev(&self) -> Option<PageQuery> {
        self.can_prev()
            .then(|| PageQuery::new(self.query.page_index - 1, self.query.page_size))
    }

    /// A size change restarts from the first page so the window never
    /// points past the end of the shrunken page count.
    pub fn with_size(&self, page_size: usize) -> PageQuery {
        PageQuery::new(0, page_size)
    }
}

/// The seam between screens and whatever serves them data: the REST client
/// in production, the seeded in-memory gateway in demo mode and tests.
///
/// Deleting a booking is the cancel operation: the backend flips the
/// payment status to CANCELLED and keeps the row.
pub trait EntityGateway: Send + Sync {
    fn fetch_page(&self, key: &PageKey) -> Result<PageResult, GatewayError>;
    fn fetch_detail(&self, kind: DetailKind, id: i64) -> Result<DetailRecord, GatewayError>;
    fn create(&self, payload: &FormPayload) -> Result<String, GatewayError>;
    fn update(&self, id: i64, payload: &FormPayload) -> Result<String, GatewayError>;
    fn delete(&self, kind: EntityKind, id: i64) -> Result<String, GatewayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Create,
    Update,
    Delete,
}

/// Applies the invalidation signal of a finished mutation: every cached
/// page of the entity goes stale, plus the detail record of the target.
/// Runs for NotFound outcomes too -- the row truly is gone.
pub fn apply_invalidation(
    pages: &mut PageCache,
    details: &mut DetailCache,
    kind: EntityKind,
    target: Option<i64>,
) {
    pages.invalidate_entity(kind);
    if let Some(id) = target {
        match kind {
            EntityKind::Bookings => details.invalidate(DetailKind::Booking, id),
            EntityKind::Trips => details.invalidate(DetailKind::Trip, id),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FetchBoard, GatewayError, PageCache, PageKey, PageResult, PageRows, PageWindow,
        apply_invalidation, compute_page_count,
    };
    use depot_app::{CargoId, CargoItem, DetailKind, DetailRecord, EntityKind, PageQuery};

    fn cargo_page(names: &[&str], total: u64, page_size: usize) -> PageResult {
        let rows = names
            .iter()
            .enumerate()
            .map(|(index, name)| CargoItem {
                id: CargoId::new(index as i64 + 1),
                name: (*name).to_owned(),
                description: String::new(),
                base_price: 10_000,
            })
            .collect();
        PageResult::new(PageRows::Cargos(rows), total, page_size)
    }

    #[test]
    fn page_count_is_ceiling_division() {
        assert_eq!(compute_page_count(3, 5), 1);
        assert_eq!(compute_page_count(10, 5), 2);
        assert_eq!(compute_page_count(11, 5), 3);
        assert_eq!(compute_page_count(0, 5), 0);
        assert_eq!(compute_page_count(10, 0), -1);
    }

    #[test]
    fn cache_hits_by_exact_tuple_and_misses_otherwise() {
        let mut cache = PageCache::new();
        let key = PageKey::new(EntityKind::Cargos, PageQuery::new(0, 5), None);
        cache.set(key.clone(), cargo_page(&["Parcel"], 1, 5));

        assert!(cache.get(&key).is_some());

        let other_page = PageKey::new(EntityKind::Cargos, PageQuery::new(1, 5), None);
        assert!(cache.get(&other_page).is_none());

        let filtered = PageKey::new(EntityKind::Cargos, PageQuery::new(0, 5), Some("parcel"));
        assert!(cache.get(&filtered).is_none());
    }

    #[test]
    fn blank_filter_normalizes_to_unfiltered_key() {
        let bare = PageKey::new(EntityKind::Trips, PageQuery::new(0, 5), None);
        let blank = PageKey::new(EntityKind::Trips, PageQuery::new(0, 5), Some("  "));
        assert_eq!(bare, blank);
    }

    #[test]
    fn invalidation_drops_every_page_of_the_entity_only() {
        let mut pages = PageCache::new();
        let mut details = super::DetailCache::new();
        for page_index in 0..3 {
            pages.set(
                PageKey::new(EntityKind::Cargos, PageQuery::new(page_index, 5), None),
                cargo_page(&["Parcel"], 12, 5),
            );
        }
        let trips_key = PageKey::new(EntityKind::Trips, PageQuery::new(0, 5), None);
        pages.set(
            trips_key.clone(),
            PageResult::new(PageRows::Trips(Vec::new()), 0, 5),
        );

        apply_invalidation(&mut pages, &mut details, EntityKind::Cargos, Some(1));

        assert_eq!(pages.len(), 1);
        assert!(pages.get(&trips_key).is_some());
    }

    #[test]
    fn booking_invalidation_also_drops_the_detail_record() {
        let mut pages = PageCache::new();
        let mut details = super::DetailCache::new();
        let trip = sample_trip();
        details.set(DetailKind::Trip, 7, DetailRecord::Trip(trip.clone()));

        apply_invalidation(&mut pages, &mut details, EntityKind::Trips, Some(7));
        assert!(details.get(DetailKind::Trip, 7).is_none());

        // An untargeted mutation leaves detail records alone.
        details.set(DetailKind::Trip, 7, DetailRecord::Trip(trip));
        apply_invalidation(&mut pages, &mut details, EntityKind::Trips, None);
        assert!(details.get(DetailKind::Trip, 7).is_some());
    }

    #[test]
    fn stale_ticket_is_not_current_even_if_it_resolves_last() {
        let mut board = FetchBoard::new();
        let first = board.issue(EntityKind::Bookings);
        let second = board.issue(EntityKind::Bookings);

        // `second` resolves first, then `first` arrives late.
        assert!(board.is_current(second));
        assert!(!board.is_current(first));
    }

    #[test]
    fn tickets_are_scoped_per_entity() {
        let mut board = FetchBoard::new();
        let bookings = board.issue(EntityKind::Bookings);
        let trips = board.issue(EntityKind::Trips);
        assert!(board.is_current(bookings));
        assert!(board.is_current(trips));
    }

    #[test]
    fn retired_entity_drops_pending_completions() {
        let mut board = FetchBoard::new();
        let ticket = board.issue(EntityKind::Reviews);
        board.retire(EntityKind::Reviews);
        assert!(!board.is_current(ticket));
    }

    #[test]
    fn window_disables_next_on_the_last_known_page() {
        let mut window = PageWindow::new(PageQuery::new(0, 5));
        window.observe(&cargo_page(&["A", "B", "C"], 3, 5));

        assert_eq!(window.page_count, 1);
        assert!(!window.can_next());
        assert!(!window.can_prev());
        assert_eq!(window.next(), None);
    }

    #[test]
    fn window_pages_forward_until_the_count_runs_out() {
        let mut window = PageWindow::new(PageQuery::new(0, 5));
        window.observe(&cargo_page(&["A", "B", "C", "D", "E"], 12, 5));

        assert_eq!(window.page_count, 3);
        assert_eq!(window.next(), Some(PageQuery::new(1, 5)));
        window.query = PageQuery::new(2, 5);
        assert!(!window.can_next());
        assert_eq!(window.prev(), Some(PageQuery::new(1, 5)));
    }

    #[test]
    fn unknown_page_count_keeps_next_reachable() {
        let window = PageWindow::new(PageQuery::new(4, 5));
        assert!(window.can_next());
    }

    #[test]
    fn size_change_restarts_from_the_first_page() {
        let window = PageWindow::new(PageQuery::new(3, 5));
        assert_eq!(window.with_size(25), PageQuery::new(0, 25));
    }

    #[test]
    fn all_rows_key_spans_the_dataset() {
        let key = PageKey::all_rows(EntityKind::Bookings, 37);
        assert_eq!(key.page_index, 0);
        assert_eq!(key.page_size, 37);
        assert_eq!(key.filter, None);
    }

    #[test]
    fn toast_text_prefers_the_server_message() {
        let server = GatewayError::Server {
            status: 409,
            message: Some("Booking already cancelled".to_owned()),
        };
        assert_eq!(server.toast_text(), "Booking already cancelled");

        let bare = GatewayError::Server {
            status: 500,
            message: None,
        };
        assert_eq!(bare.toast_text(), super::GENERIC_FAILURE_TOAST);
        assert_eq!(
            GatewayError::Network("connection refused".to_owned()).toast_text(),
            super::GENERIC_FAILURE_TOAST
        );
    }

    fn sample_trip() -> depot_app::Trip {
        use depot_app::{Coach, CoachId, DriverId, DriverRef, Province, TripId};
        use time::macros::datetime;

        depot_app::Trip {
            id: TripId::new(7),
            source: Province {
                id: 1,
                name: "Ha Noi".to_owned(),
            },
            destination: Province {
                id: 2,
                name: "Hai Phong".to_owned(),
            },
            departure_date_time: datetime!(2026-03-15 06:00),
            driver: DriverRef {
                id: DriverId::new(1),
                first_name: "Minh".to_owned(),
                last_name: "Pham".to_owned(),
            },
            coach: Coach {
                id: CoachId::new(1),
                name: "Thaco 45".to_owned(),
                coach_type: "BED".to_owned(),
                capacity: 45,
            },
            price: 250_000,
            discount: None,
            duration: 2,
            completed: false,
        }
    }
}
