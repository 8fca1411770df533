// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

use time::PrimitiveDateTime;

use crate::{CoachId, DriverId, EntityKind, RecipientType, Role};

/// Field-level validation failure. Rendered inline next to the offending
/// form field, never as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Trip,
    Driver,
    User,
    Cargo,
    Notification,
}

impl FormKind {
    pub const fn entity(self) -> EntityKind {
        match self {
            Self::Trip => EntityKind::Trips,
            Self::Driver => EntityKind::Drivers,
            Self::User => EntityKind::Users,
            Self::Cargo => EntityKind::Cargos,
            Self::Notification => EntityKind::Notifications,
        }
    }

    pub const fn for_entity(entity: EntityKind) -> Option<Self> {
        match entity {
            EntityKind::Trips => Some(Self::Trip),
            EntityKind::Drivers => Some(Self::Driver),
            EntityKind::Users => Some(Self::User),
            EntityKind::Cargos => Some(Self::Cargo),
            EntityKind::Notifications => Some(Self::Notification),
            EntityKind::Bookings | EntityKind::Reviews | EntityKind::TripLogs => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Trip => "trip",
            Self::Driver => "driver",
            Self::User => "user",
            Self::Cargo => "cargo",
            Self::Notification => "notification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripFormInput {
    pub source: String,
    pub destination: String,
    pub departure_date_time: Option<PrimitiveDateTime>,
    pub driver_id: DriverId,
    pub coach_id: CoachId,
    pub price: i64,
    pub discount_amount: Option<i64>,
    pub duration: i64,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverFormInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: bool,
    pub address: String,
    pub licence_number: String,
    pub quit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFormInput {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: bool,
    pub address: String,
    pub active: bool,
    pub role: Role,
    pub is_edit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoFormInput {
    pub name: String,
    pub description: String,
    pub base_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationFormInput {
    pub title: String,
    pub message: String,
    pub recipient_identifiers: String,
    pub recipient_type: RecipientType,
    pub send_date_time: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Trip(TripFormInput),
    Driver(DriverFormInput),
    User(UserFormInput),
    Cargo(CargoFormInput),
    Notification(NotificationFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Trip(_) => FormKind::Trip,
            Self::Driver(_) => FormKind::Driver,
            Self::User(_) => FormKind::User,
            Self::Cargo(_) => FormKind::Cargo,
            Self::Notification(_) => FormKind::Notification,
        }
    }

    pub fn blank_for(kind: FormKind) -> Self {
        match kind {
            FormKind::Trip => Self::Trip(TripFormInput {
                source: String::new(),
                destination: String::new(),
                departure_date_time: None,
                driver_id: DriverId::new(0),
                coach_id: CoachId::new(0),
                price: 0,
                discount_amount: None,
                duration: 1,
                completed: false,
            }),
            FormKind::Driver => Self::Driver(DriverFormInput {
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                phone: String::new(),
                gender: false,
                address: String::new(),
                licence_number: String::new(),
                quit: false,
            }),
            FormKind::User => Self::User(UserFormInput {
                username: String::new(),
                password: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                phone: String::new(),
                gender: false,
                address: String::new(),
                active: true,
                role: Role::Viewer,
                is_edit: false,
            }),
            FormKind::Cargo => Self::Cargo(CargoFormInput {
                name: String::new(),
                description: String::new(),
                base_price: 0,
            }),
            FormKind::Notification => Self::Notification(NotificationFormInput {
                title: String::new(),
                message: String::new(),
                recipient_identifiers: String::new(),
                recipient_type: RecipientType::All,
                send_date_time: None,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        match self {
            Self::Trip(trip) => trip.validate(),
            Self::Driver(driver) => driver.validate(),
            Self::User(user) => user.validate(),
            Self::Cargo(cargo) => cargo.validate(),
            Self::Notification(notification) => notification.validate(),
        }
    }
}

impl TripFormInput {
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.source.trim().is_empty() {
            return Err(FieldError::new("source", "Required"));
        }
        if self.destination.trim().is_empty() {
            return Err(FieldError::new("destination", "Required"));
        }
        if self.source.trim() == self.destination.trim() {
            return Err(FieldError::new(
                "destination",
                "Destination must differ from source",
            ));
        }
        if self.departure_date_time.is_none() {
            return Err(FieldError::new("departure", "Required"));
        }
        if self.driver_id.get() <= 0 {
            return Err(FieldError::new("driver", "Required"));
        }
        if self.coach_id.get() <= 0 {
            return Err(FieldError::new("coach", "Required"));
        }
        if self.price <= 0 {
            return Err(FieldError::new("price", "Price must be positive"));
        }
        if let Some(amount) = self.discount_amount
            && amount < 0
        {
            return Err(FieldError::new("discount", "Discount cannot be negative"));
        }
        if self.duration < 1 {
            return Err(FieldError::new("duration", "Duration must be at least 1h"));
        }
        Ok(())
    }
}

impl DriverFormInput {
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.first_name.trim().is_empty() {
            return Err(FieldError::new("first name", "Required"));
        }
        if self.last_name.trim().is_empty() {
            return Err(FieldError::new("last name", "Required"));
        }
        if !self.email.contains('@') {
            return Err(FieldError::new("email", "Invalid email"));
        }
        if self.phone.trim().is_empty() {
            return Err(FieldError::new("phone", "Required"));
        }
        if self.licence_number.trim().is_empty() {
            return Err(FieldError::new("licence", "Required"));
        }
        Ok(())
    }
}

impl UserFormInput {
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.username.trim().is_empty() {
            return Err(FieldError::new("username", "Required"));
        }
        if !self.is_edit && self.password.is_empty() {
            return Err(FieldError::new("password", "Required"));
        }
        if self.first_name.trim().is_empty() {
            return Err(FieldError::new("first name", "Required"));
        }
        if self.last_name.trim().is_empty() {
            return Err(FieldError::new("last name", "Required"));
        }
        if !self.email.contains('@') {
            return Err(FieldError::new("email", "Invalid email"));
        }
        Ok(())
    }
}

impl CargoFormInput {
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.name.trim().is_empty() {
            return Err(FieldError::new("name", "Cargo name is required"));
        }
        if self.description.trim().is_empty() {
            return Err(FieldError::new("description", "Description is required"));
        }
        if self.base_price < 0 {
            return Err(FieldError::new("price", "Price cannot be negative"));
        }
        Ok(())
    }
}

impl NotificationFormInput {
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.title.trim().is_empty() {
            return Err(FieldError::new("title", "Required"));
        }
        if self.message.trim().is_empty() {
            return Err(FieldError::new("message", "Required"));
        }
        if self.recipient_type != RecipientType::All
            && self.recipient_identifiers.trim().is_empty()
        {
            return Err(FieldError::new(
                "recipients",
                "Recipients are required unless sending to ALL",
            ));
        }
        if self.send_date_time.is_none() {
            return Err(FieldError::new("send time", "Required"));
        }
        Ok(())
    }
}
