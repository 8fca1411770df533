// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Terminal UI: the table controller, modal workflows, and the event loop
//! tying screens to the runtime behind the `AppRuntime` seam.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table};
use time::PrimitiveDateTime;

use depot_app::{
    Account, AppCommand, AppEvent, AppState, Action, Booking, BookingDetail, CargoItem,
    DetailKind, DetailRecord, Driver, EntityKind, FieldError, FormKind, FormPayload, ModalState,
    Notification, PAGE_SIZE_CHOICES, PageAddress, PageQuery, PaymentStatus, Review, Role, Trip,
    TripLog, User, format_wire_minute, parse_wire_minute,
};
use depot_query::{
    FetchBoard, FetchTicket, GatewayError, PageKey, PageResult, PageRows, PageWindow,
};

const STATUS_CLEAR_SECS: u64 = 4;
const EMPTY_STATE_TEXT: &str = "no rows to display";

/// Everything a screen needs from the outside world. The CLI implements
/// this over the REST client plus the process-wide caches; tests implement
/// it over the in-memory gateway. The `spawn_*` defaults run synchronously
/// and post the completion event; the production runtime overrides them
/// with worker threads so the UI stays responsive while requests fly.
pub trait AppRuntime {
    fn role(&self) -> Role;

    fn cached_page(&self, key: &PageKey) -> Option<PageResult>;
    fn store_page(&mut self, key: PageKey, page: PageResult);
    fn cached_detail(&self, kind: DetailKind, id: i64) -> Option<DetailRecord>;
    fn store_detail(&mut self, kind: DetailKind, id: i64, record: DetailRecord);
    /// Applies a mutation's invalidation signal to the caches.
    fn invalidate(&mut self, kind: EntityKind, target: Option<i64>);

    fn fetch_page(&mut self, key: &PageKey) -> Result<PageResult, GatewayError>;
    fn fetch_detail(&mut self, kind: DetailKind, id: i64) -> Result<DetailRecord, GatewayError>;
    fn submit_form(
        &mut self,
        payload: &FormPayload,
        target: Option<i64>,
    ) -> Result<String, GatewayError>;
    fn delete_row(&mut self, kind: EntityKind, id: i64) -> Result<String, GatewayError>;

    fn spawn_fetch_page(
        &mut self,
        ticket: FetchTicket,
        key: PageKey,
        tx: &Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self.fetch_page(&key);
        tx.send(InternalEvent::PageLoaded {
            ticket,
            key,
            result,
        })
        .map_err(|_| anyhow::anyhow!("internal event channel closed"))
    }

    fn spawn_fetch_detail(
        &mut self,
        request_id: u64,
        kind: DetailKind,
        id: i64,
        tx: &Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self.fetch_detail(kind, id);
        tx.send(InternalEvent::DetailLoaded {
            request_id,
            kind,
            id,
            result,
        })
        .map_err(|_| anyhow::anyhow!("internal event channel closed"))
    }

    fn spawn_mutation(
        &mut self,
        request_id: u64,
        call: MutationCall,
        tx: &Sender<InternalEvent>,
    ) -> Result<()> {
        let (kind, target) = call.describes();
        let result = match &call {
            MutationCall::Submit { payload, target } => self.submit_form(payload, *target),
            MutationCall::Delete { kind, id } => self.delete_row(*kind, *id),
        };
        tx.send(InternalEvent::MutationDone {
            request_id,
            kind,
            target,
            result,
        })
        .map_err(|_| anyhow::anyhow!("internal event channel closed"))
    }
}

#[derive(Debug, Clone)]
pub enum MutationCall {
    Submit {
        payload: FormPayload,
        target: Option<i64>,
    },
    Delete {
        kind: EntityKind,
        id: i64,
    },
}

impl MutationCall {
    pub fn describes(&self) -> (EntityKind, Option<i64>) {
        match self {
            Self::Submit { payload, target } => (payload.kind().entity(), *target),
            Self::Delete { kind, id } => (*kind, Some(*id)),
        }
    }
}

#[derive(Debug)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    PageLoaded {
        ticket: FetchTicket,
        key: PageKey,
        result: Result<PageResult, GatewayError>,
    },
    DetailLoaded {
        request_id: u64,
        kind: DetailKind,
        id: i64,
        result: Result<DetailRecord, GatewayError>,
    },
    MutationDone {
        request_id: u64,
        kind: EntityKind,
        target: Option<i64>,
        result: Result<String, GatewayError>,
    },
}

// ---------------------------------------------------------------------------
// Table controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CellAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl CellAlign {
    const fn as_alignment(self) -> Alignment {
        match self {
            Self::Left => Alignment::Left,
            Self::Center => Alignment::Center,
            Self::Right => Alignment::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Money(i64),
    DateTime(PrimitiveDateTime),
    Rating(u8),
    Payment(PaymentStatus),
    Flag {
        value: bool,
        on: &'static str,
        off: &'static str,
    },
}

impl CellValue {
    fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Money(value) => format_money(*value),
            Self::DateTime(value) => format_display_datetime(*value),
            Self::Rating(value) => format!("{value}/5"),
            Self::Payment(status) => status.as_str().to_owned(),
            Self::Flag { value, on, off } => (if *value { *on } else { *off }).to_owned(),
        }
    }
}

/// Declarative column descriptor. Defaults: left aligned, no ellipsis.
struct ColumnSpec<R> {
    header: &'static str,
    width: u16,
    align: CellAlign,
    ellipsis: bool,
    accessor: fn(&R) -> CellValue,
}

impl<R> ColumnSpec<R> {
    fn new(header: &'static str, width: u16, accessor: fn(&R) -> CellValue) -> Self {
        Self {
            header,
            width,
            align: CellAlign::default(),
            ellipsis: false,
            accessor,
        }
    }

    fn center(mut self) -> Self {
        self.align = CellAlign::Center;
        self
    }

    fn right(mut self) -> Self {
        self.align = CellAlign::Right;
        self
    }

    fn ellipsis(mut self) -> Self {
        self.ellipsis = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnMeta {
    header: &'static str,
    width: u16,
    align: CellAlign,
    ellipsis: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct ProjectedRow {
    id: i64,
    cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct TableProjection {
    columns: Vec<ColumnMeta>,
    rows: Vec<ProjectedRow>,
}

impl TableProjection {
    fn row_count(&self) -> usize {
        self.rows.len()
    }
}

fn project<R>(rows: &[R], specs: &[ColumnSpec<R>], id_of: fn(&R) -> i64) -> TableProjection {
    let columns = specs
        .iter()
        .map(|spec| ColumnMeta {
            header: spec.header,
            width: spec.width,
            align: spec.align,
            ellipsis: spec.ellipsis,
        })
        .collect();
    let rows = rows
        .iter()
        .map(|row| ProjectedRow {
            id: id_of(row),
            cells: specs
                .iter()
                .map(|spec| (spec.accessor)(row).display())
                .collect(),
        })
        .collect();
    TableProjection { columns, rows }
}

fn trip_columns() -> Vec<ColumnSpec<Trip>> {
    vec![
        ColumnSpec::new("Id", 5, |trip: &Trip| CellValue::Integer(trip.id.get())).right(),
        ColumnSpec::new("Route", 28, |trip: &Trip| {
            CellValue::Text(format!(
                "{} => {}",
                trip.source.name, trip.destination.name
            ))
        })
        .ellipsis(),
        ColumnSpec::new("Departure", 17, |trip: &Trip| {
            CellValue::DateTime(trip.departure_date_time)
        })
        .center(),
        ColumnSpec::new("Driver", 16, |trip: &Trip| {
            CellValue::Text(trip.driver.full_name())
        })
        .ellipsis(),
        ColumnSpec::new("Coach", 18, |trip: &Trip| {
            CellValue::Text(format!("{} [{}]", trip.coach.name, trip.coach.coach_type))
        })
        .ellipsis(),
        ColumnSpec::new("Price", 10, |trip: &Trip| CellValue::Money(trip.price)).right(),
        ColumnSpec::new("Done", 5, |trip: &Trip| CellValue::Flag {
            value: trip.completed,
            on: "yes",
            off: "no",
        })
        .center(),
    ]
}

fn driver_columns() -> Vec<ColumnSpec<Driver>> {
    vec![
        ColumnSpec::new("Id", 5, |driver: &Driver| CellValue::Integer(driver.id.get())).right(),
        ColumnSpec::new("Name", 20, |driver: &Driver| {
            CellValue::Text(format!("{} {}", driver.first_name, driver.last_name))
        })
        .ellipsis(),
        ColumnSpec::new("Phone", 12, |driver: &Driver| {
            CellValue::Text(driver.phone.clone())
        })
        .center(),
        ColumnSpec::new("Email", 26, |driver: &Driver| {
            CellValue::Text(driver.email.clone())
        })
        .ellipsis(),
        ColumnSpec::new("Licence", 10, |driver: &Driver| {
            CellValue::Text(driver.licence_number.clone())
        })
        .center(),
        ColumnSpec::new("Quit", 5, |driver: &Driver| CellValue::Flag {
            value: driver.quit,
            on: "yes",
            off: "no",
        })
        .center(),
    ]
}

fn user_columns() -> Vec<ColumnSpec<User>> {
    vec![
        ColumnSpec::new("Id", 5, |user: &User| CellValue::Integer(user.id.get())).right(),
        ColumnSpec::new("Username", 14, |user: &User| {
            CellValue::Text(user.username.clone())
        })
        .ellipsis(),
        ColumnSpec::new("Name", 20, |user: &User| {
            CellValue::Text(format!("{} {}", user.first_name, user.last_name))
        })
        .ellipsis(),
        ColumnSpec::new("Email", 26, |user: &User| CellValue::Text(user.email.clone()))
            .ellipsis(),
        ColumnSpec::new("Phone", 12, |user: &User| CellValue::Text(user.phone.clone()))
            .center(),
        ColumnSpec::new("Role", 9, |user: &User| {
            CellValue::Text(user.role.as_str().to_owned())
        })
        .center(),
        ColumnSpec::new("Active", 6, |user: &User| CellValue::Flag {
            value: user.active,
            on: "yes",
            off: "no",
        })
        .center(),
    ]
}

fn cargo_columns() -> Vec<ColumnSpec<CargoItem>> {
    vec![
        ColumnSpec::new("Id", 5, |cargo: &CargoItem| CellValue::Integer(cargo.id.get()))
            .right(),
        ColumnSpec::new("Name", 14, |cargo: &CargoItem| {
            CellValue::Text(cargo.name.clone())
        }),
        ColumnSpec::new("Description", 40, |cargo: &CargoItem| {
            CellValue::Text(cargo.description.clone())
        })
        .ellipsis(),
        ColumnSpec::new("Price", 10, |cargo: &CargoItem| {
            CellValue::Money(cargo.base_price)
        })
        .right(),
    ]
}

fn notification_columns() -> Vec<ColumnSpec<Notification>> {
    vec![
        ColumnSpec::new("Title", 20, |notification: &Notification| {
            CellValue::Text(notification.title.clone())
        })
        .ellipsis(),
        ColumnSpec::new("Message", 34, |notification: &Notification| {
            CellValue::Text(notification.message.clone())
        })
        .ellipsis(),
        ColumnSpec::new("Recipients", 18, |notification: &Notification| {
            if notification.recipient_identifiers.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(notification.recipient_identifiers.clone())
            }
        })
        .ellipsis(),
        ColumnSpec::new("Type", 8, |notification: &Notification| {
            CellValue::Text(notification.recipient_type.as_str().to_owned())
        })
        .center(),
        ColumnSpec::new("Send time", 17, |notification: &Notification| {
            CellValue::DateTime(notification.send_date_time)
        })
        .center(),
    ]
}

fn booking_columns() -> Vec<ColumnSpec<Booking>> {
    vec![
        ColumnSpec::new("Id", 5, |booking: &Booking| {
            CellValue::Integer(booking.id.get())
        })
        .right(),
        ColumnSpec::new("Customer", 18, |booking: &Booking| {
            CellValue::Text(format!(
                "{} {}",
                booking.cust_first_name, booking.cust_last_name
            ))
        })
        .ellipsis(),
        ColumnSpec::new("Phone", 12, |booking: &Booking| {
            CellValue::Text(booking.phone.clone())
        })
        .center(),
        ColumnSpec::new("Trip", 30, |booking: &Booking| {
            CellValue::Text(booking.trip.route(booking.booking_type))
        })
        .ellipsis(),
        ColumnSpec::new("Seat", 5, |booking: &Booking| {
            CellValue::Text(booking.seat_number.clone())
        })
        .center(),
        ColumnSpec::new("Payment", 9, |booking: &Booking| {
            CellValue::Payment(booking.payment_status)
        })
        .center(),
    ]
}

fn review_columns() -> Vec<ColumnSpec<Review>> {
    vec![
        ColumnSpec::new("User", 14, |review: &Review| {
            CellValue::Text(review.user.username.clone())
        })
        .ellipsis(),
        ColumnSpec::new("Drv", 4, |review: &Review| {
            CellValue::Rating(review.driver_rating)
        })
        .center(),
        ColumnSpec::new("Coa", 4, |review: &Review| {
            CellValue::Rating(review.coach_rating)
        })
        .center(),
        ColumnSpec::new("Trp", 4, |review: &Review| {
            CellValue::Rating(review.trip_rating)
        })
        .center(),
        ColumnSpec::new("Trip", 24, |review: &Review| {
            CellValue::Text(format!(
                "{} => {}",
                review.trip.source.name, review.trip.destination.name
            ))
        })
        .ellipsis(),
        ColumnSpec::new("Comment", 30, |review: &Review| {
            CellValue::Text(review.comment.clone())
        })
        .ellipsis(),
        ColumnSpec::new("Date", 17, |review: &Review| {
            CellValue::DateTime(review.created_at)
        })
        .center(),
    ]
}

fn trip_log_columns() -> Vec<ColumnSpec<TripLog>> {
    vec![
        ColumnSpec::new("Trip", 5, |log: &TripLog| {
            CellValue::Integer(log.trip.id.get())
        })
        .right(),
        ColumnSpec::new("Type", 12, |log: &TripLog| {
            CellValue::Text(log.log_type.as_str().to_owned())
        })
        .center(),
        ColumnSpec::new("Time", 17, |log: &TripLog| CellValue::DateTime(log.log_time))
            .center(),
        ColumnSpec::new("Description", 36, |log: &TripLog| {
            CellValue::Text(log.description.clone())
        })
        .ellipsis(),
        ColumnSpec::new("By", 14, |log: &TripLog| {
            CellValue::Text(log.created_by.username.clone())
        })
        .ellipsis(),
    ]
}

fn projection_for(rows: &PageRows) -> TableProjection {
    match rows {
        PageRows::Trips(rows) => project(rows, &trip_columns(), |row| row.id.get()),
        PageRows::Drivers(rows) => project(rows, &driver_columns(), |row| row.id.get()),
        PageRows::Users(rows) => project(rows, &user_columns(), |row| row.id.get()),
        PageRows::Cargos(rows) => project(rows, &cargo_columns(), |row| row.id.get()),
        PageRows::Notifications(rows) => {
            project(rows, &notification_columns(), |row| row.id.get())
        }
        PageRows::Bookings(rows) => project(rows, &booking_columns(), |row| row.id.get()),
        PageRows::Reviews(rows) => project(rows, &review_columns(), |row| row.id.get()),
        PageRows::TripLogs(rows) => project(rows, &trip_log_columns(), |row| row.id.get()),
    }
}

/// Case-insensitive substring match across every cell of the current page.
/// Cells that projected to nothing match as the empty string.
fn apply_global_filter(projection: &TableProjection, filter: &str) -> TableProjection {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return projection.clone();
    }
    TableProjection {
        columns: projection.columns.clone(),
        rows: projection
            .rows
            .iter()
            .filter(|row| {
                row.cells
                    .iter()
                    .any(|cell| cell.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect(),
    }
}

fn format_money(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn format_display_datetime(value: PrimitiveDateTime) -> String {
    value
        .format(&time::macros::format_description!(
            "[hour]:[minute] [day]/[month]/[year]"
        ))
        .unwrap_or_else(|_| value.to_string())
}

fn clip(text: &str, width: usize, ellipsis: bool) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    if ellipsis && width > 1 {
        let mut clipped: String = text.chars().take(width - 1).collect();
        clipped.push('…');
        clipped
    } else {
        text.chars().take(width).collect()
    }
}

// ---------------------------------------------------------------------------
// Screen state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
enum DetailLoad {
    #[default]
    Idle,
    Loading {
        request_id: u64,
    },
    Ready(DetailRecord),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormField {
    label: &'static str,
    value: String,
    error: Option<String>,
}

impl FormField {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormUiState {
    kind: FormKind,
    target: Option<i64>,
    fields: Vec<FormField>,
    cursor: usize,
    submitting: bool,
}

/// Per-screen view state. Rebuilt whenever the active screen changes, so
/// nothing modal or selection-related survives navigation.
#[derive(Debug, Default)]
pub struct ViewData {
    window: Option<PageWindow>,
    filter: String,
    filter_mode: bool,
    saved_query: Option<PageQuery>,
    rows: Option<PageRows>,
    selected_row: usize,
    detail: DetailLoad,
    form: Option<FormUiState>,
    board: FetchBoard,
    detail_request: u64,
    mutation_request: u64,
    status_token: u64,
    address: String,
}

impl ViewData {
    fn fresh(screen: EntityKind, query: PageQuery) -> Self {
        Self {
            window: Some(PageWindow::new(query)),
            address: PageAddress { screen, query }.to_string(),
            ..Self::default()
        }
    }

    fn window(&self) -> PageWindow {
        self.window.unwrap_or_else(|| PageWindow::new(PageQuery::default()))
    }
}

fn visible_projection(view: &ViewData) -> TableProjection {
    let Some(rows) = &view.rows else {
        return TableProjection::default();
    };
    apply_global_filter(&projection_for(rows), &view.filter)
}

fn selected_row_id(view: &ViewData) -> Option<i64> {
    let projection = visible_projection(view);
    projection
        .rows
        .get(view.selected_row.min(projection.row_count().saturating_sub(1)))
        .map(|row| row.id)
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    initial: Option<PageAddress>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let (internal_tx, internal_rx) = mpsc::channel();

    let query = match initial {
        Some(address) => {
            state.dispatch(AppCommand::OpenScreen(address.screen));
            address.query
        }
        None => PageQuery::default(),
    };
    let mut view_data = ViewData::fresh(state.active_screen, query);
    start_page_fetch(state, runtime, &mut view_data, &internal_tx, query, false);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        apply_internal_event(state, runtime, view_data, tx, event);
    }
}

fn apply_internal_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: InternalEvent,
) {
    match event {
        InternalEvent::ClearStatus { token } => {
            if token == view_data.status_token {
                state.dispatch(AppCommand::ClearStatus);
            }
        }
        InternalEvent::PageLoaded {
            ticket,
            key,
            result,
        } => {
            apply_page_loaded(state, runtime, view_data, tx, ticket, key, result);
        }
        InternalEvent::DetailLoaded {
            request_id,
            kind,
            id,
            result,
        } => {
            apply_detail_loaded(state, runtime, view_data, tx, request_id, kind, id, result);
        }
        InternalEvent::MutationDone {
            request_id,
            kind,
            target,
            result,
        } => {
            apply_mutation_done(state, runtime, view_data, tx, request_id, kind, target, result);
        }
    }
}

fn apply_page_loaded<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    ticket: FetchTicket,
    key: PageKey,
    result: Result<PageResult, GatewayError>,
) {
    let page = match result {
        Ok(page) => page,
        Err(error) => {
            if view_data.board.is_current(ticket) {
                emit_status(state, view_data, tx, error.toast_text());
            }
            return;
        }
    };

    // Fresh data is always worth caching, even when a newer fetch has
    // already superseded this one for display.
    runtime.store_page(key.clone(), page.clone());

    if !view_data.board.is_current(ticket) || key.kind != state.active_screen {
        return;
    }
    apply_page(view_data, &page);
}

fn apply_page(view_data: &mut ViewData, page: &PageResult) {
    let mut window = view_data.window();
    window.observe(page);
    view_data.window = Some(window);
    view_data.rows = Some(page.rows.clone());
    let visible = visible_projection(view_data).row_count();
    if view_data.selected_row >= visible {
        view_data.selected_row = visible.saturating_sub(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_detail_loaded<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    request_id: u64,
    kind: DetailKind,
    id: i64,
    result: Result<DetailRecord, GatewayError>,
) {
    let DetailLoad::Loading {
        request_id: expected,
    } = view_data.detail
    else {
        return;
    };
    if request_id != expected {
        return;
    }
    if state.modal != (ModalState::DetailOpen { kind, id }) {
        view_data.detail = DetailLoad::Idle;
        return;
    }

    match result {
        Ok(record) => {
            runtime.store_detail(kind, id, record.clone());
            view_data.detail = DetailLoad::Ready(record);
        }
        Err(error) => {
            // The modal stays open showing the placeholder; the failure is
            // surfaced as a toast.
            view_data.detail = DetailLoad::Failed;
            emit_status(state, view_data, tx, error.toast_text());
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_mutation_done<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    request_id: u64,
    kind: EntityKind,
    target: Option<i64>,
    result: Result<String, GatewayError>,
) {
    let succeeded = result.is_ok();
    let vanished = matches!(&result, Err(error) if error.is_not_found());

    // The invalidation signal applies even if this screen is long gone:
    // the mutation completed server-side and the cached pages are stale.
    if succeeded || vanished {
        runtime.invalidate(kind, target);
    }

    if request_id != view_data.mutation_request || kind != state.active_screen {
        return;
    }

    match result {
        Ok(message) => {
            emit_status(state, view_data, tx, message);
        }
        Err(error) => {
            emit_status(state, view_data, tx, error.toast_text());
        }
    }

    // Success or failure both close the confirm modal; the form closes
    // only once its submission succeeded.
    state.dispatch(AppCommand::MutationResolved);
    if succeeded {
        view_data.form = None;
    } else if let Some(form) = &mut view_data.form {
        form.submitting = false;
    }

    if succeeded || vanished {
        let query = view_data.window().query;
        start_page_fetch(state, runtime, view_data, tx, query, true);
    }
}

// ---------------------------------------------------------------------------
// Fetch plumbing
// ---------------------------------------------------------------------------

fn start_page_fetch<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    query: PageQuery,
    force: bool,
) {
    let mut window = view_data.window();
    window.query = query;
    view_data.window = Some(window);
    view_data.address = PageAddress {
        screen: state.active_screen,
        query,
    }
    .to_string();

    let key = PageKey::new(state.active_screen, query, None);
    if !force && let Some(hit) = runtime.cached_page(&key) {
        apply_page(view_data, &hit);
        return;
    }

    let ticket = view_data.board.issue(state.active_screen);
    if let Err(error) = runtime.spawn_fetch_page(ticket, key, tx) {
        emit_status(state, view_data, tx, format!("fetch failed: {error}"));
    }
}

/// Explicitly warms the whole-dataset page so the global filter can search
/// across every row, then switches the window onto it. Only ever triggered
/// by the operator entering search; never automatic.
fn start_prefetch_all<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let window = view_data.window();
    let Some(total) = window.total_elements else {
        return;
    };
    if total <= window.query.page_size as u64 {
        return;
    }
    let key = PageKey::all_rows(state.active_screen, total);
    start_page_fetch(state, runtime, view_data, tx, key.query(), false);
}

fn request_detail<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    kind: DetailKind,
    id: i64,
) {
    if let Some(record) = runtime.cached_detail(kind, id) {
        view_data.detail = DetailLoad::Ready(record);
        return;
    }
    view_data.detail_request += 1;
    let request_id = view_data.detail_request;
    view_data.detail = DetailLoad::Loading { request_id };
    if let Err(error) = runtime.spawn_fetch_detail(request_id, kind, id, tx) {
        view_data.detail = DetailLoad::Failed;
        emit_status(state, view_data, tx, format!("detail fetch failed: {error}"));
    }
}

fn start_mutation<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    call: MutationCall,
) {
    view_data.mutation_request += 1;
    let request_id = view_data.mutation_request;
    if let Err(error) = runtime.spawn_mutation(request_id, call, tx) {
        emit_status(state, view_data, tx, format!("mutation failed: {error}"));
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(STATUS_CLEAR_SECS));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

// ---------------------------------------------------------------------------
// Key handling
// ---------------------------------------------------------------------------

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if view_data.filter_mode {
        handle_filter_key(state, runtime, view_data, tx, key);
        return false;
    }
    if view_data.form.is_some() {
        handle_form_key(state, runtime, view_data, tx, key);
        return false;
    }
    if state.modal != ModalState::Closed {
        handle_modal_key(state, runtime, view_data, tx, key);
        return false;
    }
    handle_nav_key(state, runtime, view_data, tx, key)
}

fn handle_filter_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view_data.filter_mode = false;
            view_data.filter.clear();
            if let Some(query) = view_data.saved_query.take() {
                start_page_fetch(state, runtime, view_data, tx, query, false);
            }
        }
        KeyCode::Enter => {
            view_data.filter_mode = false;
        }
        KeyCode::Backspace => {
            view_data.filter.pop();
        }
        KeyCode::Char(ch) => {
            view_data.filter.push(ch);
            view_data.selected_row = 0;
        }
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(form) = &mut view_data.form else {
        return;
    };
    if form.submitting {
        return;
    }
    match key.code {
        KeyCode::Esc => {
            view_data.form = None;
        }
        KeyCode::Down | KeyCode::Tab => {
            form.cursor = (form.cursor + 1) % form.fields.len();
        }
        KeyCode::Up | KeyCode::BackTab => {
            form.cursor = (form.cursor + form.fields.len() - 1) % form.fields.len();
        }
        KeyCode::Backspace => {
            form.fields[form.cursor].value.pop();
            form.fields[form.cursor].error = None;
        }
        KeyCode::Char(ch) => {
            form.fields[form.cursor].value.push(ch);
            form.fields[form.cursor].error = None;
        }
        KeyCode::Enter => {
            submit_form_ui(state, runtime, view_data, tx);
        }
        _ => {}
    }
}

fn handle_modal_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (&state.modal, key.code) {
        (ModalState::DeleteConfirmOpen { .. }, KeyCode::Char('y') | KeyCode::Enter) => {
            let events = state.dispatch(AppCommand::ConfirmDelete);
            handle_app_events(state, runtime, view_data, tx, events);
        }
        (ModalState::DeleteConfirmOpen { .. }, KeyCode::Char('n') | KeyCode::Esc) => {
            state.dispatch(AppCommand::CloseModal);
        }
        (_, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) => {
            state.dispatch(AppCommand::CloseModal);
            view_data.detail = DetailLoad::Idle;
        }
        _ => {}
    }
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab | KeyCode::Char(']') => {
            let events = state.dispatch(AppCommand::NextScreen);
            handle_app_events(state, runtime, view_data, tx, events);
        }
        KeyCode::BackTab | KeyCode::Char('[') => {
            let events = state.dispatch(AppCommand::PrevScreen);
            handle_app_events(state, runtime, view_data, tx, events);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            let visible = visible_projection(view_data).row_count();
            if visible > 0 && view_data.selected_row + 1 < visible {
                view_data.selected_row += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.selected_row = view_data.selected_row.saturating_sub(1);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            let window = view_data.window();
            match window.next() {
                Some(query) => start_page_fetch(state, runtime, view_data, tx, query, false),
                None => emit_status(state, view_data, tx, "already on the last page"),
            }
        }
        KeyCode::Char('h') | KeyCode::Left => {
            let window = view_data.window();
            match window.prev() {
                Some(query) => start_page_fetch(state, runtime, view_data, tx, query, false),
                None => emit_status(state, view_data, tx, "already on the first page"),
            }
        }
        KeyCode::Char('=') => {
            let window = view_data.window();
            let current = window.query.page_size;
            let position = PAGE_SIZE_CHOICES
                .iter()
                .position(|size| *size == current)
                .unwrap_or(0);
            let next_size = PAGE_SIZE_CHOICES[(position + 1) % PAGE_SIZE_CHOICES.len()];
            let query = window.with_size(next_size);
            start_page_fetch(state, runtime, view_data, tx, query, false);
        }
        KeyCode::Char('/') => {
            view_data.filter_mode = true;
            view_data.saved_query = Some(view_data.window().query);
            view_data.selected_row = 0;
            start_prefetch_all(state, runtime, view_data, tx);
        }
        KeyCode::Char('r') => {
            let query = view_data.window().query;
            start_page_fetch(state, runtime, view_data, tx, query, true);
            emit_status(state, view_data, tx, "refreshing");
        }
        KeyCode::Char('a') => {
            if FormKind::for_entity(state.active_screen).is_some() {
                let events = state.dispatch(AppCommand::RequestForm {
                    action: Action::Create,
                    target: None,
                });
                handle_app_events(state, runtime, view_data, tx, events);
            }
        }
        KeyCode::Char('e') => {
            if FormKind::for_entity(state.active_screen).is_some()
                && let Some(id) = selected_row_id(view_data)
            {
                let events = state.dispatch(AppCommand::RequestForm {
                    action: Action::Update,
                    target: Some(id),
                });
                handle_app_events(state, runtime, view_data, tx, events);
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = selected_row_id(view_data) {
                let events = state.dispatch(AppCommand::RequestDelete { id });
                handle_app_events(state, runtime, view_data, tx, events);
            }
        }
        KeyCode::Enter => {
            let kind = match state.active_screen {
                EntityKind::Bookings => Some(DetailKind::Booking),
                EntityKind::Trips => Some(DetailKind::Trip),
                _ => None,
            };
            if let Some(kind) = kind
                && let Some(id) = selected_row_id(view_data)
            {
                let events = state.dispatch(AppCommand::OpenDetail { kind, id });
                handle_app_events(state, runtime, view_data, tx, events);
            }
        }
        _ => {}
    }
    false
}

fn handle_app_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: Vec<AppEvent>,
) {
    for event in events {
        match event {
            AppEvent::ScreenChanged(screen) => {
                *view_data = ViewData::fresh(screen, PageQuery::default());
                start_page_fetch(state, runtime, view_data, tx, PageQuery::default(), false);
            }
            AppEvent::DetailRequested { kind, id } => {
                request_detail(state, runtime, view_data, tx, kind, id);
            }
            AppEvent::FormRequested { action, target } => {
                open_form(state, view_data, action, target);
            }
            AppEvent::DeleteDispatched { id } => {
                start_mutation(
                    state,
                    runtime,
                    view_data,
                    tx,
                    MutationCall::Delete {
                        kind: state.active_screen,
                        id,
                    },
                );
            }
            AppEvent::DeleteArmed { .. }
            | AppEvent::Forbidden
            | AppEvent::ModalClosed
            | AppEvent::StatusUpdated(_)
            | AppEvent::StatusCleared => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

fn open_form(state: &AppState, view_data: &mut ViewData, action: Action, target: Option<i64>) {
    let Some(kind) = FormKind::for_entity(state.active_screen) else {
        return;
    };
    let payload = match (action, target) {
        (Action::Update, Some(id)) => {
            let Some(rows) = &view_data.rows else {
                return;
            };
            let Some(payload) = payload_from_row(rows, id) else {
                return;
            };
            payload
        }
        _ => FormPayload::blank_for(kind),
    };
    view_data.form = Some(FormUiState {
        kind,
        target: if action == Action::Update { target } else { None },
        fields: fields_from_payload(&payload),
        cursor: 0,
        submitting: false,
    });
}

fn payload_from_row(rows: &PageRows, id: i64) -> Option<FormPayload> {
    match rows {
        PageRows::Trips(rows) => rows.iter().find(|row| row.id.get() == id).map(|trip| {
            FormPayload::Trip(depot_app::TripFormInput {
                source: trip.source.name.clone(),
                destination: trip.destination.name.clone(),
                departure_date_time: Some(trip.departure_date_time),
                driver_id: trip.driver.id,
                coach_id: trip.coach.id,
                price: trip.price,
                discount_amount: trip.discount.as_ref().map(|discount| discount.amount),
                duration: trip.duration,
                completed: trip.completed,
            })
        }),
        PageRows::Drivers(rows) => rows.iter().find(|row| row.id.get() == id).map(|driver| {
            FormPayload::Driver(depot_app::DriverFormInput {
                first_name: driver.first_name.clone(),
                last_name: driver.last_name.clone(),
                email: driver.email.clone(),
                phone: driver.phone.clone(),
                gender: driver.gender,
                address: driver.address.clone(),
                licence_number: driver.licence_number.clone(),
                quit: driver.quit,
            })
        }),
        PageRows::Users(rows) => rows.iter().find(|row| row.id.get() == id).map(|user| {
            FormPayload::User(depot_app::UserFormInput {
                username: user.username.clone(),
                password: String::new(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                email: user.email.clone(),
                phone: user.phone.clone(),
                gender: user.gender,
                address: user.address.clone(),
                active: user.active,
                role: user.role,
                is_edit: true,
            })
        }),
        PageRows::Cargos(rows) => rows.iter().find(|row| row.id.get() == id).map(|cargo| {
            FormPayload::Cargo(depot_app::CargoFormInput {
                name: cargo.name.clone(),
                description: cargo.description.clone(),
                base_price: cargo.base_price,
            })
        }),
        PageRows::Notifications(rows) => {
            rows.iter().find(|row| row.id.get() == id).map(|notification| {
                FormPayload::Notification(depot_app::NotificationFormInput {
                    title: notification.title.clone(),
                    message: notification.message.clone(),
                    recipient_identifiers: notification.recipient_identifiers.clone(),
                    recipient_type: notification.recipient_type,
                    send_date_time: Some(notification.send_date_time),
                })
            })
        }
        PageRows::Bookings(_) | PageRows::Reviews(_) | PageRows::TripLogs(_) => None,
    }
}

fn bool_field(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn gender_field(value: bool) -> &'static str {
    if value { "female" } else { "male" }
}

fn fields_from_payload(payload: &FormPayload) -> Vec<FormField> {
    match payload {
        FormPayload::Trip(trip) => vec![
            FormField::new("source", trip.source.clone()),
            FormField::new("destination", trip.destination.clone()),
            FormField::new(
                "departure",
                trip.departure_date_time.map(format_wire_minute).unwrap_or_default(),
            ),
            FormField::new("driver", non_zero_id(trip.driver_id.get())),
            FormField::new("coach", non_zero_id(trip.coach_id.get())),
            FormField::new("price", non_zero_amount(trip.price)),
            FormField::new(
                "discount",
                trip.discount_amount.map(|amount| amount.to_string()).unwrap_or_default(),
            ),
            FormField::new("duration", trip.duration.to_string()),
            FormField::new("completed", bool_field(trip.completed)),
        ],
        FormPayload::Driver(driver) => vec![
            FormField::new("first name", driver.first_name.clone()),
            FormField::new("last name", driver.last_name.clone()),
            FormField::new("email", driver.email.clone()),
            FormField::new("phone", driver.phone.clone()),
            FormField::new("gender", gender_field(driver.gender)),
            FormField::new("address", driver.address.clone()),
            FormField::new("licence", driver.licence_number.clone()),
            FormField::new("quit", bool_field(driver.quit)),
        ],
        FormPayload::User(user) => vec![
            FormField::new("username", user.username.clone()),
            FormField::new("password", user.password.clone()),
            FormField::new("first name", user.first_name.clone()),
            FormField::new("last name", user.last_name.clone()),
            FormField::new("email", user.email.clone()),
            FormField::new("phone", user.phone.clone()),
            FormField::new("gender", gender_field(user.gender)),
            FormField::new("address", user.address.clone()),
            FormField::new("active", bool_field(user.active)),
            FormField::new("role", user.role.as_str()),
        ],
        FormPayload::Cargo(cargo) => vec![
            FormField::new("name", cargo.name.clone()),
            FormField::new("description", cargo.description.clone()),
            FormField::new("price", non_zero_amount(cargo.base_price)),
        ],
        FormPayload::Notification(notification) => vec![
            FormField::new("title", notification.title.clone()),
            FormField::new("message", notification.message.clone()),
            FormField::new("recipients", notification.recipient_identifiers.clone()),
            FormField::new("type", notification.recipient_type.as_str()),
            FormField::new(
                "send time",
                notification.send_date_time.map(format_wire_minute).unwrap_or_default(),
            ),
        ],
    }
}

fn non_zero_id(value: i64) -> String {
    if value > 0 { value.to_string() } else { String::new() }
}

fn non_zero_amount(value: i64) -> String {
    if value != 0 { value.to_string() } else { String::new() }
}

fn field_value<'a>(fields: &'a [FormField], label: &str) -> &'a str {
    fields
        .iter()
        .find(|field| field.label == label)
        .map(|field| field.value.as_str())
        .unwrap_or("")
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "no" | "false" | "0" => Ok(false),
        "yes" | "true" | "1" => Ok(true),
        _ => Err("Enter yes or no".to_owned()),
    }
}

fn parse_gender(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "male" | "m" => Ok(false),
        "female" | "f" => Ok(true),
        _ => Err("Enter male or female".to_owned()),
    }
}

fn parse_int(value: &str, message: &str) -> Result<i64, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<i64>().map_err(|_| message.to_owned())
}

fn parse_datetime(value: &str) -> Result<Option<PrimitiveDateTime>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_wire_minute(trimmed)
        .map(Some)
        .ok_or_else(|| "Use yyyy-MM-dd HH:mm".to_owned())
}

/// Parses the form fields back into a payload. A parse failure pins the
/// message to the offending field instead of surfacing a toast.
fn payload_from_fields(form: &FormUiState) -> Result<FormPayload, FieldError> {
    let fields = &form.fields;
    let parse_error = |field: &'static str, message: String| FieldError { field, message };

    let payload = match form.kind {
        FormKind::Trip => FormPayload::Trip(depot_app::TripFormInput {
            source: field_value(fields, "source").trim().to_owned(),
            destination: field_value(fields, "destination").trim().to_owned(),
            departure_date_time: parse_datetime(field_value(fields, "departure"))
                .map_err(|message| parse_error("departure", message))?,
            driver_id: depot_app::DriverId::new(
                parse_int(field_value(fields, "driver"), "Enter a driver id")
                    .map_err(|message| parse_error("driver", message))?,
            ),
            coach_id: depot_app::CoachId::new(
                parse_int(field_value(fields, "coach"), "Enter a coach id")
                    .map_err(|message| parse_error("coach", message))?,
            ),
            price: parse_int(field_value(fields, "price"), "Enter a price")
                .map_err(|message| parse_error("price", message))?,
            discount_amount: {
                let raw = field_value(fields, "discount").trim();
                if raw.is_empty() {
                    None
                } else {
                    Some(
                        raw.parse::<i64>()
                            .map_err(|_| parse_error("discount", "Enter an amount".to_owned()))?,
                    )
                }
            },
            duration: parse_int(field_value(fields, "duration"), "Enter hours")
                .map_err(|message| parse_error("duration", message))?,
            completed: parse_bool(field_value(fields, "completed"))
                .map_err(|message| parse_error("completed", message))?,
        }),
        FormKind::Driver => FormPayload::Driver(depot_app::DriverFormInput {
            first_name: field_value(fields, "first name").trim().to_owned(),
            last_name: field_value(fields, "last name").trim().to_owned(),
            email: field_value(fields, "email").trim().to_owned(),
            phone: field_value(fields, "phone").trim().to_owned(),
            gender: parse_gender(field_value(fields, "gender"))
                .map_err(|message| parse_error("gender", message))?,
            address: field_value(fields, "address").trim().to_owned(),
            licence_number: field_value(fields, "licence").trim().to_owned(),
            quit: parse_bool(field_value(fields, "quit"))
                .map_err(|message| parse_error("quit", message))?,
        }),
        FormKind::User => FormPayload::User(depot_app::UserFormInput {
            username: field_value(fields, "username").trim().to_owned(),
            password: field_value(fields, "password").to_owned(),
            first_name: field_value(fields, "first name").trim().to_owned(),
            last_name: field_value(fields, "last name").trim().to_owned(),
            email: field_value(fields, "email").trim().to_owned(),
            phone: field_value(fields, "phone").trim().to_owned(),
            gender: parse_gender(field_value(fields, "gender"))
                .map_err(|message| parse_error("gender", message))?,
            address: field_value(fields, "address").trim().to_owned(),
            active: parse_bool(field_value(fields, "active"))
                .map_err(|message| parse_error("active", message))?,
            role: Role::parse(field_value(fields, "role"))
                .ok_or_else(|| parse_error("role", "Use admin, operator, or viewer".to_owned()))?,
            is_edit: form.target.is_some(),
        }),
        FormKind::Cargo => FormPayload::Cargo(depot_app::CargoFormInput {
            name: field_value(fields, "name").trim().to_owned(),
            description: field_value(fields, "description").trim().to_owned(),
            base_price: parse_int(field_value(fields, "price"), "Enter a price")
                .map_err(|message| parse_error("price", message))?,
        }),
        FormKind::Notification => FormPayload::Notification(depot_app::NotificationFormInput {
            title: field_value(fields, "title").trim().to_owned(),
            message: field_value(fields, "message").trim().to_owned(),
            recipient_identifiers: field_value(fields, "recipients").trim().to_owned(),
            recipient_type: depot_app::RecipientType::parse(
                field_value(fields, "type").trim().to_ascii_uppercase().as_str(),
            )
            .ok_or_else(|| parse_error("type", "Use ALL, USER, or DRIVER".to_owned()))?,
            send_date_time: parse_datetime(field_value(fields, "send time"))
                .map_err(|message| parse_error("send time", message))?,
        }),
    };

    payload.validate()?;
    Ok(payload)
}

fn submit_form_ui<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let Some(form) = view_data.form.clone() else {
        return;
    };
    match payload_from_fields(&form) {
        Ok(payload) => {
            if let Some(form) = &mut view_data.form {
                form.submitting = true;
                for field in &mut form.fields {
                    field.error = None;
                }
            }
            let target = form.target;
            start_mutation(
                state,
                runtime,
                view_data,
                tx,
                MutationCall::Submit { payload, target },
            );
        }
        Err(error) => {
            if let Some(form) = &mut view_data.form {
                let index = form
                    .fields
                    .iter()
                    .position(|field| field.label == error.field)
                    .unwrap_or(form.cursor);
                form.fields[index].error = Some(error.message.clone());
                form.cursor = index;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(frame: &mut ratatui::Frame, state: &AppState, view_data: &ViewData) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(frame.area());

    frame.render_widget(render_tabs(state), chunks[0]);
    frame.render_widget(render_title_line(state, view_data), chunks[1]);
    frame.render_widget(render_search_line(view_data), chunks[2]);
    render_table(frame, view_data, chunks[3]);
    frame.render_widget(render_footer(view_data), chunks[4]);
    frame.render_widget(render_status_line(state), chunks[5]);

    if let Some(form) = &view_data.form {
        render_form_overlay(frame, form);
    } else {
        render_modal(frame, state, view_data);
    }
}

fn render_tabs(state: &AppState) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for screen in EntityKind::ALL {
        let style = if screen == state.active_screen {
            Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} ", screen.label()), style));
        spans.push(Span::raw(" "));
    }
    Paragraph::new(Line::from(spans))
}

fn render_title_line(state: &AppState, view_data: &ViewData) -> Paragraph<'static> {
    let line = Line::from(vec![
        Span::styled(
            state.active_screen.title().to_owned(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            view_data.address.clone(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    Paragraph::new(line)
}

fn render_search_line(view_data: &ViewData) -> Paragraph<'static> {
    let indicator = if view_data.filter_mode { ">" } else { " " };
    let line = Line::from(vec![
        Span::raw(format!("search{indicator} ")),
        Span::styled(
            view_data.filter.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);
    Paragraph::new(line)
}

fn render_table(frame: &mut ratatui::Frame, view_data: &ViewData, area: Rect) {
    let projection = visible_projection(view_data);
    if projection.columns.is_empty() || projection.rows.is_empty() {
        let text = if view_data.rows.is_none() {
            "loading…"
        } else {
            EMPTY_STATE_TEXT
        };
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let header = Row::new(
        projection
            .columns
            .iter()
            .map(|column| {
                Cell::from(
                    Text::from(column.header).alignment(column.align.as_alignment()),
                )
            })
            .collect::<Vec<_>>(),
    )
    .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

    let rows: Vec<Row> = projection
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let cells: Vec<Cell> = row
                .cells
                .iter()
                .zip(&projection.columns)
                .map(|(cell, column)| {
                    let clipped = clip(cell, column.width as usize, column.ellipsis);
                    Cell::from(Text::from(clipped).alignment(column.align.as_alignment()))
                })
                .collect();
            let row = Row::new(cells);
            if index == view_data.selected_row {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let widths: Vec<Constraint> = projection
        .columns
        .iter()
        .map(|column| Constraint::Length(column.width))
        .collect();

    frame.render_widget(Table::new(rows, widths).header(header).column_spacing(1), area);
}

fn render_footer(view_data: &ViewData) -> Paragraph<'static> {
    let window = view_data.window();
    let page_count = if window.page_count >= 0 {
        window.page_count.to_string()
    } else {
        "?".to_owned()
    };
    let total = window
        .total_elements
        .map(|total| total.to_string())
        .unwrap_or_else(|| "?".to_owned());
    let line = format!(
        "page {}/{page_count} · {total} rows · limit {} · [h/l] page  [=] size  [/] search  [a]dd [e]dit [d]elete  [q]uit",
        window.query.page_index + 1,
        window.query.page_size,
    );
    Paragraph::new(line).style(Style::default().fg(Color::DarkGray))
}

fn render_status_line(state: &AppState) -> Paragraph<'static> {
    let message = state.status_line.clone().unwrap_or_default();
    Paragraph::new(message).style(Style::default().fg(Color::Yellow))
}

fn render_modal(frame: &mut ratatui::Frame, state: &AppState, view_data: &ViewData) {
    match &state.modal {
        ModalState::Closed => {}
        ModalState::DetailOpen { kind, id } => {
            let (title, lines) = detail_modal_content(*kind, *id, &view_data.detail);
            render_popup(frame, &title, lines, 64);
        }
        ModalState::DeleteConfirmOpen { id } => {
            let lines = confirm_modal_lines(state.active_screen, *id);
            render_popup(frame, "confirm", lines, 56);
        }
        ModalState::ForbiddenOpen { message } => {
            let lines = vec![
                Line::from(message.clone()),
                Line::from(""),
                Line::from(Span::styled(
                    "press esc to dismiss",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            render_popup(frame, "forbidden", lines, 48);
        }
    }
}

fn confirm_modal_lines(screen: EntityKind, id: i64) -> Vec<Line<'static>> {
    let mut lines = match screen {
        EntityKind::Bookings => vec![
            Line::from(format!("Cancel booking {id}?")),
            Line::from(Span::styled(
                "* This turns the payment status to CANCELLED",
                Style::default().fg(Color::DarkGray),
            )),
        ],
        _ => vec![Line::from(format!("Delete {} {id}?", screen.label()))],
    };
    lines.push(Line::from(""));
    lines.push(Line::from("[y] confirm   [n] cancel"));
    lines
}

fn skeleton_lines() -> Vec<Line<'static>> {
    (0..4)
        .map(|_| {
            Line::from(Span::styled(
                "░░░░░░░░░░░░░░░░░░░░░░░░░░░░",
                Style::default().fg(Color::DarkGray),
            ))
        })
        .collect()
}

fn detail_modal_content(
    kind: DetailKind,
    id: i64,
    load: &DetailLoad,
) -> (String, Vec<Line<'static>>) {
    let title = match kind {
        DetailKind::Booking => format!("booking {id}"),
        DetailKind::Trip => format!("trip {id}"),
    };
    let lines = match load {
        DetailLoad::Idle | DetailLoad::Loading { .. } => skeleton_lines(),
        DetailLoad::Failed => vec![Line::from("no data -- the detail fetch failed")],
        DetailLoad::Ready(record) => match record {
            DetailRecord::Booking(detail) => booking_detail_lines(detail),
            DetailRecord::Trip(trip) => trip_detail_lines(trip),
        },
    };
    (title, lines)
}

fn booking_detail_lines(detail: &BookingDetail) -> Vec<Line<'static>> {
    let account = match &detail.user {
        Some(Account { username }) => format!("Buy with account ({username})"),
        None => "Buy without account".to_owned(),
    };
    let mut lines = vec![
        Line::from(Span::styled(
            "CUSTOMER",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("  {} · {}", detail.customer_name(), account)),
        Line::from(format!("  {} · {}", detail.phone, detail.email)),
        Line::from(format!("  pickup: {}", detail.pick_up_address)),
        Line::from(""),
        Line::from(Span::styled(
            "TRIP",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "  {} {} {}",
            detail.trip.source.name,
            detail.booking_type.route_arrow(),
            detail.trip.destination.name
        )),
        Line::from(format!(
            "  departs {} · driver {}",
            format_display_datetime(detail.trip.departure_date_time),
            detail.trip.driver.full_name()
        )),
        Line::from(format!(
            "  coach {} [{}] · seat {}",
            detail.trip.coach.name, detail.trip.coach.coach_type, detail.seat_number
        )),
        Line::from(""),
        Line::from(Span::styled(
            "PAYMENT",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "  total {} · {} · {}",
            format_money(detail.total_payment),
            detail.payment_method.as_str(),
            detail.payment_status.as_str()
        )),
    ];
    if !detail.payment_histories.is_empty() {
        lines.push(Line::from("  history:"));
        for history in detail.payment_histories.iter().rev() {
            let from = history
                .old_status
                .map(|status| status.as_str())
                .unwrap_or("CREATE");
            lines.push(Line::from(format!(
                "    {} {} -> {}",
                format_display_datetime(history.status_change_date_time),
                from,
                history.new_status.as_str()
            )));
        }
    }
    lines
}

fn trip_detail_lines(trip: &Trip) -> Vec<Line<'static>> {
    let discount = trip
        .discount
        .as_ref()
        .map(|discount| format_money(discount.amount))
        .unwrap_or_else(|| "NONE".to_owned());
    vec![
        Line::from(format!(
            "{} => {}",
            trip.source.name, trip.destination.name
        )),
        Line::from(format!(
            "departs {} · {}h",
            format_display_datetime(trip.departure_date_time),
            trip.duration
        )),
        Line::from(format!("driver {}", trip.driver.full_name())),
        Line::from(format!(
            "coach {} [{}] · {} seats",
            trip.coach.name, trip.coach.coach_type, trip.coach.capacity
        )),
        Line::from(format!(
            "price {} · discount {}",
            format_money(trip.price),
            discount
        )),
        Line::from(format!(
            "completed: {}",
            if trip.completed { "yes" } else { "no" }
        )),
    ]
}

fn render_form_overlay(frame: &mut ratatui::Frame, form: &FormUiState) {
    let mut lines = Vec::new();
    for (index, field) in form.fields.iter().enumerate() {
        let marker = if index == form.cursor { "> " } else { "  " };
        let mut spans = vec![
            Span::raw(marker),
            Span::styled(
                format!("{:<12}", field.label),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw(field.value.clone()),
        ];
        if index == form.cursor {
            spans.push(Span::styled("▏", Style::default().fg(Color::Yellow)));
        }
        lines.push(Line::from(spans));
        if let Some(error) = &field.error {
            lines.push(Line::from(Span::styled(
                format!("    {error}"),
                Style::default().fg(Color::Red),
            )));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        if form.submitting {
            "saving…".to_owned()
        } else {
            "[enter] save   [esc] cancel   [tab] next field".to_owned()
        },
        Style::default().fg(Color::DarkGray),
    )));

    let title = match form.target {
        Some(id) => format!("edit {} {id}", form.kind.label()),
        None => format!("new {}", form.kind.label()),
    };
    render_popup(frame, &title, lines, 56);
}

fn render_popup(frame: &mut ratatui::Frame, title: &str, lines: Vec<Line<'static>>, width: u16) {
    let height = (lines.len() as u16).saturating_add(2);
    let area = centered_rect(frame.area(), width, height);
    frame.render_widget(Clear, area);
    let block = Block::bordered().title(format!(" {title} "));
    frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
