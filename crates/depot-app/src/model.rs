// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::ids::*;

// Backend wire formats for date-times. Lists and booking rows carry
// minute precision; histories and logs carry seconds.
time::serde::format_description!(wire_minute, PrimitiveDateTime, "[year]-[month]-[day] [hour]:[minute]");
time::serde::format_description!(wire_second, PrimitiveDateTime, "[year]-[month]-[day] [hour]:[minute]:[second]");

const WIRE_MINUTE: &[time::format_description::BorrowedFormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]");

pub fn format_wire_minute(value: PrimitiveDateTime) -> String {
    value
        .format(WIRE_MINUTE)
        .unwrap_or_else(|_| value.to_string())
}

pub fn parse_wire_minute(value: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(value.trim(), WIRE_MINUTE).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Trips,
    Drivers,
    Users,
    Cargos,
    Notifications,
    Bookings,
    Reviews,
    TripLogs,
}

impl EntityKind {
    pub const ALL: [Self; 8] = [
        Self::Trips,
        Self::Drivers,
        Self::Users,
        Self::Cargos,
        Self::Notifications,
        Self::Bookings,
        Self::Reviews,
        Self::TripLogs,
    ];

    /// Stable key used to namespace cache entries and API routes.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Trips => "trips",
            Self::Drivers => "drivers",
            Self::Users => "users",
            Self::Cargos => "cargos",
            Self::Notifications => "notifications",
            Self::Bookings => "bookings",
            Self::Reviews => "reviews",
            Self::TripLogs => "trip-logs",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "trips" => Some(Self::Trips),
            "drivers" => Some(Self::Drivers),
            "users" => Some(Self::Users),
            "cargos" => Some(Self::Cargos),
            "notifications" => Some(Self::Notifications),
            "bookings" => Some(Self::Bookings),
            "reviews" => Some(Self::Reviews),
            "trip-logs" => Some(Self::TripLogs),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Trips => "trips",
            Self::Drivers => "drivers",
            Self::Users => "users",
            Self::Cargos => "cargos",
            Self::Notifications => "notifs",
            Self::Bookings => "bookings",
            Self::Reviews => "reviews",
            Self::TripLogs => "logs",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Trips => "Trip management",
            Self::Drivers => "Driver management",
            Self::Users => "User management",
            Self::Cargos => "Cargo management",
            Self::Notifications => "Notification management",
            Self::Bookings => "Booking management",
            Self::Reviews => "Review management",
            Self::TripLogs => "Trip log",
        }
    }

    /// Screen route, the resource path capability checks are keyed by.
    pub fn resource_path(self) -> String {
        format!("/{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingType {
    #[serde(rename = "ONEWAY")]
    OneWay,
    #[serde(rename = "ROUNDTRIP")]
    Roundtrip,
}

impl BookingType {
    pub const fn route_arrow(self) -> &'static str {
        match self {
            Self::OneWay => "=>",
            Self::Roundtrip => "<=>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl PaymentMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Card => "CARD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipientType {
    All,
    User,
    Driver,
}

impl RecipientType {
    pub const ALL: [Self; 3] = [Self::All, Self::User, Self::Driver];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::User => "USER",
            Self::Driver => "DRIVER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ALL" => Some(Self::All),
            "USER" => Some(Self::User),
            "DRIVER" => Some(Self::Driver),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripLogType {
    Departure,
    Arrival,
    Incident,
    Maintenance,
}

impl TripLogType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Departure => "DEPARTURE",
            Self::Arrival => "ARRIVAL",
            Self::Incident => "INCIDENT",
            Self::Maintenance => "MAINTENANCE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Operator,
    Viewer,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operator => "operator",
            Self::Viewer => "viewer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "operator" => Some(Self::Operator),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Province {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRef {
    pub id: DriverId,
    pub first_name: String,
    pub last_name: String,
}

impl DriverRef {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coach {
    pub id: CoachId,
    pub name: String,
    pub coach_type: String,
    pub capacity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: TripId,
    pub source: Province,
    pub destination: Province,
    #[serde(with = "wire_minute")]
    pub departure_date_time: PrimitiveDateTime,
    pub driver: DriverRef,
    pub coach: Coach,
    pub price: i64,
    pub discount: Option<Discount>,
    /// Scheduled travel time in hours.
    pub duration: i64,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub id: TripId,
    pub source: Province,
    pub destination: Province,
    #[serde(with = "wire_minute")]
    pub departure_date_time: PrimitiveDateTime,
}

impl TripSummary {
    pub fn route(&self, booking_type: BookingType) -> String {
        format!(
            "{} {} {}",
            self.source.name,
            booking_type.route_arrow(),
            self.destination.name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: DriverId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: bool,
    pub address: String,
    pub licence_number: String,
    pub quit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: bool,
    pub address: String,
    pub active: bool,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoItem {
    pub id: CargoId,
    pub name: String,
    pub description: String,
    pub base_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub recipient_identifiers: String,
    pub recipient_type: RecipientType,
    #[serde(with = "wire_minute")]
    pub send_date_time: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub cust_first_name: String,
    pub cust_last_name: String,
    pub phone: String,
    pub email: String,
    pub seat_number: String,
    pub booking_type: BookingType,
    #[serde(with = "wire_minute")]
    pub booking_date_time: PrimitiveDateTime,
    pub payment_status: PaymentStatus,
    pub trip: TripSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistory {
    pub old_status: Option<PaymentStatus>,
    pub new_status: PaymentStatus,
    #[serde(with = "wire_second")]
    pub status_change_date_time: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    pub id: BookingId,
    pub cust_first_name: String,
    pub cust_last_name: String,
    pub phone: String,
    pub email: String,
    pub pick_up_address: String,
    pub user: Option<Account>,
    pub seat_number: String,
    pub booking_type: BookingType,
    pub trip: Trip,
    pub total_payment: i64,
    #[serde(with = "wire_minute::option")]
    pub payment_date_time: Option<PrimitiveDateTime>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_histories: Vec<PaymentHistory>,
}

impl BookingDetail {
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.cust_first_name, self.cust_last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user: Account,
    pub driver_rating: u8,
    pub coach_rating: u8,
    pub trip_rating: u8,
    pub trip: TripSummary,
    pub comment: String,
    #[serde(with = "wire_second")]
    pub created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripLog {
    pub id: TripLogId,
    pub trip: TripSummary,
    pub log_type: TripLogType,
    #[serde(with = "wire_second")]
    pub log_time: PrimitiveDateTime,
    pub description: String,
    pub created_by: Account,
}

/// Secondary records resolved lazily when a detail modal opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetailKind {
    Booking,
    Trip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailRecord {
    Booking(Box<BookingDetail>),
    Trip(Trip),
}

#[cfg(test)]
mod tests {
    use super::{
        Booking, BookingType, EntityKind, PaymentStatus, RecipientType, Role, TripSummary,
    };

    #[test]
    fn entity_key_round_trips() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.key()), Some(kind));
        }
        assert_eq!(EntityKind::parse("coaches"), None);
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" OPERATOR "), Some(Role::Operator));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn recipient_type_round_trips() {
        for recipient in RecipientType::ALL {
            assert_eq!(RecipientType::parse(recipient.as_str()), Some(recipient));
        }
    }

    #[test]
    fn booking_row_decodes_wire_shape() {
        let raw = r#"{
            "id": 42,
            "custFirstName": "Linh",
            "custLastName": "Tran",
            "phone": "0903555111",
            "email": "linh@example.com",
            "seatNumber": "A12",
            "bookingType": "ONEWAY",
            "bookingDateTime": "2026-03-14 08:30",
            "paymentStatus": "PAID",
            "trip": {
                "id": 7,
                "source": {"id": 1, "name": "Ha Noi"},
                "destination": {"id": 2, "name": "Hai Phong"},
                "departureDateTime": "2026-03-15 06:00"
            }
        }"#;
        let booking: Booking = serde_json::from_str(raw).expect("decode booking row");
        assert_eq!(booking.id.get(), 42);
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.trip.departure_date_time.hour(), 6);
        assert_eq!(
            booking.trip.route(booking.booking_type),
            "Ha Noi => Hai Phong"
        );
    }

    #[test]
    fn route_marks_roundtrip_bookings() {
        let raw = r#"{
            "id": 7,
            "source": {"id": 1, "name": "Da Nang"},
            "destination": {"id": 2, "name": "Hue"},
            "departureDateTime": "2026-04-01 12:00"
        }"#;
        let trip: TripSummary = serde_json::from_str(raw).expect("decode trip summary");
        assert_eq!(trip.route(BookingType::Roundtrip), "Da Nang <=> Hue");
    }
}
