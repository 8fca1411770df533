// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Deterministic demo dataset and an in-memory gateway with real
//! pagination, filtering, and mutation semantics. Backs `--demo` mode and
//! the tests of every crate that needs a data plane without a network.

use std::sync::Mutex;

use time::{Date, Month, PrimitiveDateTime, Time};

use depot_app::{
    Account, Booking, BookingDetail, BookingId, BookingType, CargoId, CargoItem, Coach, CoachId,
    DetailKind, DetailRecord, Discount, Driver, DriverId, DriverRef, EntityKind, FormPayload,
    Notification, NotificationId, PaymentHistory, PaymentMethod, PaymentStatus, Province,
    RecipientType, Review, ReviewId, Role, Trip, TripId, TripLog, TripLogId, TripLogType,
    TripSummary, User, UserId,
};
use depot_query::{
    EntityGateway, GatewayError, PageKey, PageResult, PageRows, compute_page_count,
};

const PROVINCES: [&str; 8] = [
    "Ha Noi",
    "Hai Phong",
    "Ninh Binh",
    "Thanh Hoa",
    "Vinh",
    "Hue",
    "Da Nang",
    "Nha Trang",
];

const FIRST_NAMES: [&str; 12] = [
    "Minh", "Linh", "Huy", "Lan", "Tuan", "Mai", "Duc", "Thao", "Quang", "Ngoc", "Son", "Ha",
];

const LAST_NAMES: [&str; 10] = [
    "Nguyen", "Tran", "Le", "Pham", "Hoang", "Vu", "Dang", "Bui", "Do", "Ngo",
];

const COACH_NAMES: [&str; 6] = [
    "Thaco 45", "Hyundai Solati", "Samco Felix", "Universe Noble", "Thaco 29", "County Limo",
];

const COACH_TYPES: [&str; 3] = ["BED", "CHAIR", "LIMOUSINE"];

const STREETS: [&str; 6] = [
    "Trang Thi",
    "Le Loi",
    "Hai Ba Trung",
    "Nguyen Hue",
    "Tran Phu",
    "Ly Thuong Kiet",
];

const CARGO_NAMES: [&str; 6] = [
    "Parcel", "Bicycle", "Documents", "Electronics", "Fresh goods", "Luggage",
];

const NOTIFICATION_TITLES: [&str; 5] = [
    "Schedule change",
    "Holiday timetable",
    "Maintenance window",
    "New route opened",
    "Fare update",
];

const REVIEW_COMMENTS: [&str; 6] = [
    "Smooth ride, friendly driver",
    "Coach was late leaving the station",
    "Clean seats and good air conditioning",
    "Too many stops along the way",
    "Would book this route again",
    "Driver drove carefully in the rain",
];

const LOG_DESCRIPTIONS: [&str; 4] = [
    "Left the station on schedule",
    "Arrived at the destination bay",
    "Passenger reported a missing bag",
    "Tyre pressure checked at rest stop",
];

fn day_time(day: u8, hour: u8, minute: u8) -> PrimitiveDateTime {
    let date = Date::from_calendar_date(2026, Month::March, day).expect("valid demo date");
    let time = Time::from_hms(hour, minute, 0).expect("valid demo time");
    PrimitiveDateTime::new(date, time)
}

fn province(index: usize) -> Province {
    Province {
        id: (index % PROVINCES.len()) as i64 + 1,
        name: PROVINCES[index % PROVINCES.len()].to_owned(),
    }
}

fn person_name(index: usize) -> (String, String) {
    (
        FIRST_NAMES[index % FIRST_NAMES.len()].to_owned(),
        LAST_NAMES[(index * 3 + 1) % LAST_NAMES.len()].to_owned(),
    )
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub drivers: Vec<Driver>,
    pub coaches: Vec<Coach>,
    pub trips: Vec<Trip>,
    pub users: Vec<User>,
    pub cargos: Vec<CargoItem>,
    pub notifications: Vec<Notification>,
    pub bookings: Vec<BookingDetail>,
    pub reviews: Vec<Review>,
    pub trip_logs: Vec<TripLog>,
    next_id: i64,
}

impl Dataset {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Builds the seeded demo dataset. Same input, same output: generation is
/// pure index arithmetic so tests can assert exact rows.
pub fn demo_dataset() -> Dataset {
    let mut data = Dataset {
        next_id: 1_000,
        ..Dataset::default()
    };

    for index in 0..8 {
        let (first_name, last_name) = person_name(index);
        data.drivers.push(Driver {
            id: DriverId::new(index as i64 + 1),
            email: format!(
                "{}.{}@depot.example",
                first_name.to_ascii_lowercase(),
                last_name.to_ascii_lowercase()
            ),
            phone: format!("09035{:05}", 11_000 + index * 97),
            gender: index % 3 == 0,
            address: format!("{} {}", index + 2, STREETS[index % STREETS.len()]),
            licence_number: format!("D{:06}", 120_000 + index * 731),
            quit: index == 7,
            first_name,
            last_name,
        });
    }

    for index in 0..6 {
        data.coaches.push(Coach {
            id: CoachId::new(index as i64 + 1),
            name: COACH_NAMES[index].to_owned(),
            coach_type: COACH_TYPES[index % COACH_TYPES.len()].to_owned(),
            capacity: match COACH_TYPES[index % COACH_TYPES.len()] {
                "LIMOUSINE" => 16,
                "CHAIR" => 29,
                _ => 45,
            },
        });
    }

    for index in 0..23 {
        let driver = &data.drivers[index % 7];
        data.trips.push(Trip {
            id: TripId::new(index as i64 + 1),
            source: province(index),
            destination: province(index + 1 + index % 3),
            departure_date_time: day_time((index % 28) as u8 + 1, (5 + index % 16) as u8, 0),
            driver: DriverRef {
                id: driver.id,
                first_name: driver.first_name.clone(),
                last_name: driver.last_name.clone(),
            },
            coach: data.coaches[index % data.coaches.len()].clone(),
            price: 150_000 + (index as i64 % 5) * 50_000,
            discount: (index % 4 == 0).then(|| Discount {
                id: index as i64 + 1,
                amount: 20_000,
            }),
            duration: 2 + (index as i64 % 6),
            completed: index % 5 == 0,
        });
    }

    for index in 0..12 {
        let (first_name, last_name) = person_name(index + 5);
        data.users.push(User {
            id: UserId::new(index as i64 + 1),
            username: format!(
                "{}{}",
                first_name.to_ascii_lowercase(),
                last_name.to_ascii_lowercase()
            ),
            email: format!(
                "{}.{}@mail.example",
                first_name.to_ascii_lowercase(),
                last_name.to_ascii_lowercase()
            ),
            phone: format!("09125{:05}", 40_000 + index * 83),
            gender: index % 2 == 0,
            address: format!("{} {}", index + 10, STREETS[(index + 2) % STREETS.len()]),
            active: index % 6 != 5,
            role: match index {
                0 => Role::Admin,
                1 | 2 => Role::Operator,
                _ => Role::Viewer,
            },
            first_name,
            last_name,
        });
    }

    for index in 0..6 {
        data.cargos.push(CargoItem {
            id: CargoId::new(index as i64 + 1),
            name: CARGO_NAMES[index].to_owned(),
            description: format!("{} transport between stations", CARGO_NAMES[index]),
            base_price: 10_000 + (index as i64) * 7_500,
        });
    }

    for index in 0..9 {
        let recipient_type = RecipientType::ALL[index % 3];
        data.notifications.push(Notification {
            id: NotificationId::new(index as i64 + 1),
            title: NOTIFICATION_TITLES[index % NOTIFICATION_TITLES.len()].to_owned(),
            message: format!(
                "{} effective from March {}",
                NOTIFICATION_TITLES[index % NOTIFICATION_TITLES.len()],
                index + 3
            ),
            recipient_identifiers: match recipient_type {
                RecipientType::All => String::new(),
                RecipientType::User => data.users[index % data.users.len()].username.clone(),
                RecipientType::Driver => format!("driver-{}", index % 8 + 1),
            },
            recipient_type,
            send_date_time: day_time((index % 20) as u8 + 1, 9, (index * 7 % 60) as u8),
        });
    }

    for index in 0..31 {
        let trip = data.trips[index % data.trips.len()].clone();
        let (first_name, last_name) = person_name(index + 2);
        let booked_at = day_time((index % 26) as u8 + 1, 8, (index * 11 % 60) as u8);
        let payment_status = match index % 5 {
            0 | 1 | 2 => PaymentStatus::Paid,
            3 => PaymentStatus::Unpaid,
            _ => PaymentStatus::Cancelled,
        };
        let mut payment_histories = vec![PaymentHistory {
            old_status: None,
            new_status: PaymentStatus::Unpaid,
            status_change_date_time: PrimitiveDateTime::new(
                booked_at.date(),
                Time::from_hms(booked_at.hour(), booked_at.minute(), 2).expect("valid second"),
            ),
        }];
        if payment_status != PaymentStatus::Unpaid {
            payment_histories.push(PaymentHistory {
                old_status: Some(PaymentStatus::Unpaid),
                new_status: payment_status,
                status_change_date_time: PrimitiveDateTime::new(
                    booked_at.date(),
                    Time::from_hms(booked_at.hour() + 1, 5, 30).expect("valid time"),
                ),
            });
        }
        let discount = trip.discount.as_ref().map(|d| d.amount).unwrap_or(0);
        data.bookings.push(BookingDetail {
            id: BookingId::new(index as i64 + 1),
            cust_first_name: first_name.clone(),
            cust_last_name: last_name.clone(),
            phone: format!("09785{:05}", 70_000 + index * 57),
            email: format!(
                "{}.{}@mail.example",
                first_name.to_ascii_lowercase(),
                last_name.to_ascii_lowercase()
            ),
            pick_up_address: format!("{} {}", index + 1, STREETS[index % STREETS.len()]),
            user: (index % 3 != 2).then(|| Account {
                username: data.users[index % data.users.len()].username.clone(),
            }),
            seat_number: format!("{}{:02}", ['A', 'B', 'C'][index % 3], index % 14 + 1),
            booking_type: if index % 4 == 0 {
                BookingType::Roundtrip
            } else {
                BookingType::OneWay
            },
            total_payment: trip.price - discount,
            payment_date_time: (payment_status == PaymentStatus::Paid).then(|| booked_at),
            payment_method: if index % 2 == 0 {
                PaymentMethod::Cash
            } else {
                PaymentMethod::Card
            },
            payment_status,
            payment_histories,
            trip,
        });
    }

    for index in 0..14 {
        let trip = &data.trips[(index * 2) % data.trips.len()];
        data.reviews.push(Review {
            id: ReviewId::new(index as i64 + 1),
            user: Account {
                username: data.users[index % data.users.len()].username.clone(),
            },
            driver_rating: (index % 5) as u8 + 1,
            coach_rating: ((index + 2) % 5) as u8 + 1,
            trip_rating: ((index + 4) % 5) as u8 + 1,
            trip: summary_of(trip),
            comment: REVIEW_COMMENTS[index % REVIEW_COMMENTS.len()].to_owned(),
            created_at: PrimitiveDateTime::new(
                day_time((index % 25) as u8 + 2, 18, 0).date(),
                Time::from_hms(18, (index * 13 % 60) as u8, 45).expect("valid time"),
            ),
        });
    }

    for index in 0..18 {
        let trip = &data.trips[index % data.trips.len()];
        data.trip_logs.push(TripLog {
            id: TripLogId::new(index as i64 + 1),
            trip: summary_of(trip),
            log_type: match index % 4 {
                0 => TripLogType::Departure,
                1 => TripLogType::Arrival,
                2 => TripLogType::Incident,
                _ => TripLogType::Maintenance,
            },
            log_time: PrimitiveDateTime::new(
                day_time((index % 27) as u8 + 1, 6, 0).date(),
                Time::from_hms((6 + index % 14) as u8, (index * 17 % 60) as u8, 12)
                    .expect("valid time"),
            ),
            description: LOG_DESCRIPTIONS[index % LOG_DESCRIPTIONS.len()].to_owned(),
            created_by: Account {
                username: data.users[(index + 1) % data.users.len()].username.clone(),
            },
        });
    }

    data
}

fn summary_of(trip: &Trip) -> TripSummary {
    TripSummary {
        id: trip.id,
        source: trip.source.clone(),
        destination: trip.destination.clone(),
        departure_date_time: trip.departure_date_time,
    }
}

fn booking_row(detail: &BookingDetail) -> Booking {
    Booking {
        id: detail.id,
        cust_first_name: detail.cust_first_name.clone(),
        cust_last_name: detail.cust_last_name.clone(),
        phone: detail.phone.clone(),
        email: detail.email.clone(),
        seat_number: detail.seat_number.clone(),
        booking_type: detail.booking_type,
        booking_date_time: detail
            .payment_histories
            .first()
            .map(|history| history.status_change_date_time)
            .unwrap_or(detail.trip.departure_date_time),
        payment_status: detail.payment_status,
        trip: summary_of(&detail.trip),
    }
}

/// In-memory `EntityGateway`. All state sits behind one mutex so the
/// gateway can be shared with worker threads exactly like the HTTP client.
pub struct MemoryGateway {
    state: Mutex<Dataset>,
}

impl MemoryGateway {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            state: Mutex::new(dataset),
        }
    }

    pub fn seeded() -> Self {
        Self::new(demo_dataset())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Dataset> {
        self.state.lock().expect("gateway state poisoned")
    }
}

fn matches_filter(haystack: &[String], filter: &str) -> bool {
    let needle = filter.to_lowercase();
    haystack
        .iter()
        .any(|text| text.to_lowercase().contains(&needle))
}

fn paginate<T: Clone>(rows: Vec<T>, key: &PageKey) -> (Vec<T>, u64, i64) {
    let total = rows.len() as u64;
    let start = key.page_index.saturating_mul(key.page_size).min(rows.len());
    let end = start.saturating_add(key.page_size).min(rows.len());
    (
        rows[start..end].to_vec(),
        total,
        compute_page_count(total, key.page_size),
    )
}

fn filter_rows<T: Clone>(
    rows: &[T],
    key: &PageKey,
    haystack: impl Fn(&T) -> Vec<String>,
) -> Vec<T> {
    match &key.filter {
        None => rows.to_vec(),
        Some(filter) => rows
            .iter()
            .filter(|row| matches_filter(&haystack(row), filter))
            .cloned()
            .collect(),
    }
}

impl EntityGateway for MemoryGateway {
    fn fetch_page(&self, key: &PageKey) -> Result<PageResult, GatewayError> {
        let data = self.lock();
        let (rows, total_elements, page_count) = match key.kind {
            EntityKind::Trips => {
                let filtered = filter_rows(&data.trips, key, |trip| {
                    vec![
                        trip.source.name.clone(),
                        trip.destination.name.clone(),
                        trip.driver.full_name(),
                        trip.coach.name.clone(),
                    ]
                });
                let (page, total, count) = paginate(filtered, key);
                (PageRows::Trips(page), total, count)
            }
            EntityKind::Drivers => {
                let filtered = filter_rows(&data.drivers, key, |driver| {
                    vec![
                        driver.first_name.clone(),
                        driver.last_name.clone(),
                        driver.phone.clone(),
                        driver.licence_number.clone(),
                    ]
                });
                let (page, total, count) = paginate(filtered, key);
                (PageRows::Drivers(page), total, count)
            }
            EntityKind::Users => {
                let filtered = filter_rows(&data.users, key, |user| {
                    vec![
                        user.username.clone(),
                        user.first_name.clone(),
                        user.last_name.clone(),
                        user.email.clone(),
                    ]
                });
                let (page, total, count) = paginate(filtered, key);
                (PageRows::Users(page), total, count)
            }
            EntityKind::Cargos => {
                let filtered = filter_rows(&data.cargos, key, |cargo| {
                    vec![cargo.name.clone(), cargo.description.clone()]
                });
                let (page, total, count) = paginate(filtered, key);
                (PageRows::Cargos(page), total, count)
            }
            EntityKind::Notifications => {
                let filtered = filter_rows(&data.notifications, key, |notification| {
                    vec![notification.title.clone(), notification.message.clone()]
                });
                let (page, total, count) = paginate(filtered, key);
                (PageRows::Notifications(page), total, count)
            }
            EntityKind::Bookings => {
                let rows: Vec<Booking> = data.bookings.iter().map(booking_row).collect();
                let filtered = filter_rows(&rows, key, |booking| {
                    vec![
                        booking.cust_first_name.clone(),
                        booking.cust_last_name.clone(),
                        booking.phone.clone(),
                        booking.seat_number.clone(),
                    ]
                });
                let (page, total, count) = paginate(filtered, key);
                (PageRows::Bookings(page), total, count)
            }
            EntityKind::Reviews => {
                let filtered = filter_rows(&data.reviews, key, |review| {
                    vec![review.user.username.clone(), review.comment.clone()]
                });
                let (page, total, count) = paginate(filtered, key);
                (PageRows::Reviews(page), total, count)
            }
            EntityKind::TripLogs => {
                let filtered = filter_rows(&data.trip_logs, key, |log| {
                    vec![log.description.clone(), log.created_by.username.clone()]
                });
                let (page, total, count) = paginate(filtered, key);
                (PageRows::TripLogs(page), total, count)
            }
        };
        Ok(PageResult {
            rows,
            total_elements,
            page_count,
        })
    }

    fn fetch_detail(&self, kind: DetailKind, id: i64) -> Result<DetailRecord, GatewayError> {
        let data = self.lock();
        match kind {
            DetailKind::Booking => data
                .bookings
                .iter()
                .find(|booking| booking.id.get() == id)
                .map(|booking| DetailRecord::Booking(Box::new(booking.clone())))
                .ok_or(GatewayError::NotFound),
            DetailKind::Trip => data
                .trips
                .iter()
                .find(|trip| trip.id.get() == id)
                .map(|trip| DetailRecord::Trip(trip.clone()))
                .ok_or(GatewayError::NotFound),
        }
    }

    fn create(&self, payload: &FormPayload) -> Result<String, GatewayError> {
        let mut data = self.lock();
        let id = data.next_id();
        match payload {
            FormPayload::Trip(trip) => {
                let driver = data
                    .drivers
                    .iter()
                    .find(|driver| driver.id == trip.driver_id)
                    .ok_or(GatewayError::Server {
                        status: 400,
                        message: Some("Unknown driver".to_owned()),
                    })?
                    .clone();
                let coach = data
                    .coaches
                    .iter()
                    .find(|coach| coach.id == trip.coach_id)
                    .ok_or(GatewayError::Server {
                        status: 400,
                        message: Some("Unknown coach".to_owned()),
                    })?
                    .clone();
                let record = Trip {
                    id: TripId::new(id),
                    source: Province {
                        id: 0,
                        name: trip.source.clone(),
                    },
                    destination: Province {
                        id: 0,
                        name: trip.destination.clone(),
                    },
                    departure_date_time: trip
                        .departure_date_time
                        .ok_or(GatewayError::Server {
                            status: 400,
                            message: Some("Departure time is required".to_owned()),
                        })?,
                    driver: DriverRef {
                        id: driver.id,
                        first_name: driver.first_name,
                        last_name: driver.last_name,
                    },
                    coach,
                    price: trip.price,
                    discount: trip.discount_amount.map(|amount| Discount { id, amount }),
                    duration: trip.duration,
                    completed: trip.completed,
                };
                data.trips.push(record);
            }
            FormPayload::Driver(driver) => {
                let record = Driver {
                    id: DriverId::new(id),
                    first_name: driver.first_name.clone(),
                    last_name: driver.last_name.clone(),
                    email: driver.email.clone(),
                    phone: driver.phone.clone(),
                    gender: driver.gender,
                    address: driver.address.clone(),
                    licence_number: driver.licence_number.clone(),
                    quit: driver.quit,
                };
                data.drivers.push(record);
            }
            FormPayload::User(user) => {
                let record = User {
                    id: UserId::new(id),
                    username: user.username.clone(),
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                    email: user.email.clone(),
                    phone: user.phone.clone(),
                    gender: user.gender,
                    address: user.address.clone(),
                    active: user.active,
                    role: user.role,
                };
                data.users.push(record);
            }
            FormPayload::Cargo(cargo) => {
                let record = CargoItem {
                    id: CargoId::new(id),
                    name: cargo.name.clone(),
                    description: cargo.description.clone(),
                    base_price: cargo.base_price,
                };
                data.cargos.push(record);
            }
            FormPayload::Notification(notification) => {
                let record = Notification {
                    id: NotificationId::new(id),
                    title: notification.title.clone(),
                    message: notification.message.clone(),
                    recipient_identifiers: notification.recipient_identifiers.clone(),
                    recipient_type: notification.recipient_type,
                    send_date_time: notification.send_date_time.ok_or(GatewayError::Server {
                        status: 400,
                        message: Some("Send time is required".to_owned()),
                    })?,
                };
                data.notifications.push(record);
            }
        }
        Ok(format!("New {} saved", payload.kind().label()))
    }

    fn update(&self, id: i64, payload: &FormPayload) -> Result<String, GatewayError> {
        let mut data = self.lock();
        match payload {
            FormPayload::Driver(input) => {
                let driver = data
                    .drivers
                    .iter_mut()
                    .find(|driver| driver.id.get() == id)
                    .ok_or(GatewayError::NotFound)?;
                driver.first_name = input.first_name.clone();
                driver.last_name = input.last_name.clone();
                driver.email = input.email.clone();
                driver.phone = input.phone.clone();
                driver.gender = input.gender;
                driver.address = input.address.clone();
                driver.licence_number = input.licence_number.clone();
                driver.quit = input.quit;
            }
            FormPayload::User(input) => {
                let user = data
                    .users
                    .iter_mut()
                    .find(|user| user.id.get() == id)
                    .ok_or(GatewayError::NotFound)?;
                user.username = input.username.clone();
                user.first_name = input.first_name.clone();
                user.last_name = input.last_name.clone();
                user.email = input.email.clone();
                user.phone = input.phone.clone();
                user.gender = input.gender;
                user.address = input.address.clone();
                user.active = input.active;
                user.role = input.role;
            }
            FormPayload::Cargo(input) => {
                let cargo = data
                    .cargos
                    .iter_mut()
                    .find(|cargo| cargo.id.get() == id)
                    .ok_or(GatewayError::NotFound)?;
                cargo.name = input.name.clone();
                cargo.description = input.description.clone();
                cargo.base_price = input.base_price;
            }
            FormPayload::Notification(input) => {
                let notification = data
                    .notifications
                    .iter_mut()
                    .find(|notification| notification.id.get() == id)
                    .ok_or(GatewayError::NotFound)?;
                notification.title = input.title.clone();
                notification.message = input.message.clone();
                notification.recipient_identifiers = input.recipient_identifiers.clone();
                notification.recipient_type = input.recipient_type;
                if let Some(send) = input.send_date_time {
                    notification.send_date_time = send;
                }
            }
            FormPayload::Trip(input) => {
                let trip = data
                    .trips
                    .iter()
                    .position(|trip| trip.id.get() == id)
                    .ok_or(GatewayError::NotFound)?;
                let mut record = data.trips[trip].clone();
                record.source.name = input.source.clone();
                record.destination.name = input.destination.clone();
                if let Some(departure) = input.departure_date_time {
                    record.departure_date_time = departure;
                }
                record.price = input.price;
                record.duration = input.duration;
                record.completed = input.completed;
                record.discount = input.discount_amount.map(|amount| Discount { id, amount });
                data.trips[trip] = record;
            }
        }
        Ok(format!("{} {id} updated", payload.kind().label()))
    }

    fn delete(&self, kind: EntityKind, id: i64) -> Result<String, GatewayError> {
        let mut data = self.lock();
        match kind {
            EntityKind::Bookings => {
                let booking = data
                    .bookings
                    .iter_mut()
                    .find(|booking| booking.id.get() == id)
                    .ok_or(GatewayError::NotFound)?;
                if booking.payment_status == PaymentStatus::Cancelled {
                    return Err(GatewayError::Server {
                        status: 409,
                        message: Some("Booking already cancelled".to_owned()),
                    });
                }
                let old_status = booking.payment_status;
                booking.payment_status = PaymentStatus::Cancelled;
                let last_change = booking
                    .payment_histories
                    .last()
                    .map(|history| history.status_change_date_time)
                    .unwrap_or(booking.trip.departure_date_time);
                booking.payment_histories.push(PaymentHistory {
                    old_status: Some(old_status),
                    new_status: PaymentStatus::Cancelled,
                    status_change_date_time: last_change,
                });
                Ok(format!("Booking {id} cancelled"))
            }
            EntityKind::Trips => remove_by_id(&mut data.trips, |trip| trip.id.get(), id)
                .map(|_| format!("trip {id} deleted")),
            EntityKind::Drivers => remove_by_id(&mut data.drivers, |driver| driver.id.get(), id)
                .map(|_| format!("driver {id} deleted")),
            EntityKind::Users => remove_by_id(&mut data.users, |user| user.id.get(), id)
                .map(|_| format!("user {id} deleted")),
            EntityKind::Cargos => remove_by_id(&mut data.cargos, |cargo| cargo.id.get(), id)
                .map(|_| format!("cargo {id} deleted")),
            EntityKind::Notifications => {
                remove_by_id(&mut data.notifications, |notification| notification.id.get(), id)
                    .map(|_| format!("notification {id} deleted"))
            }
            EntityKind::Reviews => remove_by_id(&mut data.reviews, |review| review.id.get(), id)
                .map(|_| format!("review {id} deleted")),
            EntityKind::TripLogs => remove_by_id(&mut data.trip_logs, |log| log.id.get(), id)
                .map(|_| format!("log {id} deleted")),
        }
    }
}

fn remove_by_id<T>(
    rows: &mut Vec<T>,
    id_of: impl Fn(&T) -> i64,
    id: i64,
) -> Result<(), GatewayError> {
    let position = rows
        .iter()
        .position(|row| id_of(row) == id)
        .ok_or(GatewayError::NotFound)?;
    rows.remove(position);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{MemoryGateway, demo_dataset};
    use depot_app::{DetailKind, DetailRecord, EntityKind, PageQuery, PaymentStatus};
    use depot_query::{EntityGateway, GatewayError, PageKey, PageRows};

    #[test]
    fn dataset_generation_is_deterministic() {
        let first = demo_dataset();
        let second = demo_dataset();
        assert_eq!(first.trips, second.trips);
        assert_eq!(first.bookings, second.bookings);
        assert_eq!(first.bookings.len(), 31);
        assert_eq!(first.trips.len(), 23);
    }

    #[test]
    fn pages_slice_the_dataset_and_report_totals() {
        let gateway = MemoryGateway::seeded();
        let key = PageKey::new(EntityKind::Bookings, PageQuery::new(0, 5), None);
        let page = gateway.fetch_page(&key).expect("first page");
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.total_elements, 31);
        assert_eq!(page.page_count, 7);

        let last = PageKey::new(EntityKind::Bookings, PageQuery::new(6, 5), None);
        let page = gateway.fetch_page(&last).expect("last page");
        assert_eq!(page.rows.len(), 1);

        let past_end = PageKey::new(EntityKind::Bookings, PageQuery::new(9, 5), None);
        let page = gateway.fetch_page(&past_end).expect("page past the end");
        assert!(page.rows.is_empty());
        assert_eq!(page.total_elements, 31);
    }

    #[test]
    fn filter_is_case_insensitive_substring_match() {
        let gateway = MemoryGateway::seeded();
        let key = PageKey::new(EntityKind::Cargos, PageQuery::new(0, 25), Some("BICY"));
        let page = gateway.fetch_page(&key).expect("filtered page");
        let PageRows::Cargos(rows) = &page.rows else {
            panic!("expected cargo rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Bicycle");
        assert_eq!(page.total_elements, 1);
    }

    #[test]
    fn cancelling_a_booking_keeps_the_row_and_appends_history() {
        let gateway = MemoryGateway::seeded();
        // Booking 1 is PAID in the seeded data.
        let message = gateway
            .delete(EntityKind::Bookings, 1)
            .expect("first cancel succeeds");
        assert_eq!(message, "Booking 1 cancelled");

        let DetailRecord::Booking(detail) = gateway
            .fetch_detail(DetailKind::Booking, 1)
            .expect("booking still exists")
        else {
            panic!("expected booking detail");
        };
        assert_eq!(detail.payment_status, PaymentStatus::Cancelled);
        assert_eq!(
            detail.payment_histories.last().map(|h| h.new_status),
            Some(PaymentStatus::Cancelled)
        );
    }

    #[test]
    fn second_cancel_conflicts_with_the_server_message() {
        let gateway = MemoryGateway::seeded();
        gateway
            .delete(EntityKind::Bookings, 1)
            .expect("first cancel succeeds");
        let error = gateway
            .delete(EntityKind::Bookings, 1)
            .expect_err("second cancel must fail");
        assert_eq!(error.toast_text(), "Booking already cancelled");
    }

    #[test]
    fn deleting_a_missing_row_is_not_found() {
        let gateway = MemoryGateway::seeded();
        let error = gateway
            .delete(EntityKind::Notifications, 99_999)
            .expect_err("missing row");
        assert_eq!(error, GatewayError::NotFound);
    }

    #[test]
    fn deleted_notification_is_absent_from_the_next_fetch() {
        let gateway = MemoryGateway::seeded();
        gateway
            .delete(EntityKind::Notifications, 3)
            .expect("delete notification");

        let key = PageKey::new(EntityKind::Notifications, PageQuery::new(0, 25), None);
        let page = gateway.fetch_page(&key).expect("refetch");
        assert!(!page.rows.row_ids().contains(&3));
        assert_eq!(page.total_elements, 8);
    }

    #[test]
    fn create_assigns_a_fresh_id() {
        use depot_app::{CargoFormInput, FormPayload};

        let gateway = MemoryGateway::seeded();
        let message = gateway
            .create(&FormPayload::Cargo(CargoFormInput {
                name: "Pet crate".to_owned(),
                description: "Ventilated pet crate".to_owned(),
                base_price: 35_000,
            }))
            .expect("create cargo");
        assert_eq!(message, "New cargo saved");

        let key = PageKey::new(EntityKind::Cargos, PageQuery::new(0, 25), Some("pet"));
        let page = gateway.fetch_page(&key).expect("filtered fetch");
        let PageRows::Cargos(rows) = &page.rows else {
            panic!("expected cargo rows");
        };
        assert_eq!(rows.len(), 1);
        assert!(rows[0].id.get() > 1_000);
    }

    #[test]
    fn update_replaces_fields_in_place() {
        use depot_app::{CargoFormInput, FormPayload};

        let gateway = MemoryGateway::seeded();
        gateway
            .update(
                2,
                &FormPayload::Cargo(CargoFormInput {
                    name: "Bicycle XL".to_owned(),
                    description: "Oversized bicycle box".to_owned(),
                    base_price: 120_000,
                }),
            )
            .expect("update cargo");

        let key = PageKey::new(EntityKind::Cargos, PageQuery::new(0, 25), Some("XL"));
        let page = gateway.fetch_page(&key).expect("fetch updated");
        assert_eq!(page.total_elements, 1);
    }
}
