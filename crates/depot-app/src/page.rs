// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

use url::form_urlencoded;

use crate::EntityKind;

/// Fixed fallback applied wherever a page address is missing or malformed,
/// so every screen resolves the same defaults.
pub const DEFAULT_PAGE_SIZE: usize = 5;

pub const PAGE_SIZE_CHOICES: [usize; 3] = [5, 10, 25];

/// Pagination state of one list screen. `page_index` is 0-based internally;
/// the page address carries it 1-based as `page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageQuery {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageQuery {
    pub const fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// Decodes `page=..&limit=..`. Missing, empty, non-numeric, or
    /// sub-1 values fall back to page 1 / limit 5.
    pub fn from_query_string(query: &str) -> Self {
        let mut page: Option<usize> = None;
        let mut limit: Option<usize> = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => page = parse_positive(&value),
                "limit" => limit = parse_positive(&value),
                _ => {}
            }
        }
        Self {
            page_index: page.unwrap_or(1) - 1,
            page_size: limit.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    pub fn to_query_string(self) -> String {
        format!("page={}&limit={}", self.page_index + 1, self.page_size)
    }
}

fn parse_positive(value: &str) -> Option<usize> {
    match value.trim().parse::<usize>() {
        Ok(parsed) if parsed >= 1 => Some(parsed),
        _ => None,
    }
}

/// A shareable address for a list screen, e.g. `bookings?page=3&limit=10`.
/// The TUI keeps the active screen's address current so a session can be
/// reopened exactly where it was left (`depot --open <address>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageAddress {
    pub screen: EntityKind,
    pub query: PageQuery,
}

impl PageAddress {
    pub fn parse(input: &str) -> Option<Self> {
        let (screen_part, query_part) = match input.split_once('?') {
            Some((screen, query)) => (screen, query),
            None => (input, ""),
        };
        let screen = EntityKind::parse(screen_part.trim().trim_start_matches('/'))?;
        Some(Self {
            screen,
            query: PageQuery::from_query_string(query_part),
        })
    }
}

impl fmt::Display for PageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?{}", self.screen.key(), self.query.to_query_string())
    }
}
