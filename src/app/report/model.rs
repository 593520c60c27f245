//! Format-agnostic report model and its assembler.

#![warn(clippy::all, rust_2018_idioms)]

use std::collections::HashMap;

use crate::app::accounts::Account;
use crate::app::health::HealthEvent;

/// Header of the Events sheet.
pub const EVENT_COLUMNS: [&str; 13] = [
    "Account Id",
    "Account Name",
    "ARN",
    "Service",
    "Type",
    "Category",
    "Region",
    "Start Time",
    "End Time",
    "Last Updated Time",
    "Status",
    "Description",
    "Affected Resources",
];

/// Starting widths of the Events columns; variable columns start at 0 and grow.
const INITIAL_EVENT_WIDTHS: [usize; 13] = [14, 20, 0, 0, 0, 0, 0, 12, 12, 12, 0, 15, 0];

/// How an event row names its account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountName {
    /// Name resolved once and stored with the row.
    Literal(String),
    /// Name joined from the report's accounts table by account id.
    Lookup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub account_name: AccountName,
    pub event: HealthEvent,
}

/// Column widths of the Events sheet, grown row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnWidths([usize; 13]);

impl Default for ColumnWidths {
    fn default() -> Self {
        Self(INITIAL_EVENT_WIDTHS)
    }
}

impl ColumnWidths {
    pub fn observe(&mut self, event: &HealthEvent) {
        let variable: [(usize, &str); 7] = [
            (2, &event.arn),
            (3, &event.service),
            (4, &event.event_type_code),
            (5, &event.event_type_category),
            (6, &event.region),
            (10, &event.status_code),
            (12, &event.affected_resources),
        ];
        for (column, value) in variable {
            self.0[column] = self.0[column].max(value.chars().count());
        }
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

/// Two linked tables: events, and (organization-wide only) accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub events: Vec<EventRow>,
    pub accounts: Option<Vec<Account>>,
    pub column_widths: ColumnWidths,
}

impl Report {
    /// Display name of the row's account, joining against the accounts table
    /// for [`AccountName::Lookup`] rows.
    pub fn resolve_account_name<'a>(&'a self, row: &'a EventRow) -> Option<&'a str> {
        match &row.account_name {
            AccountName::Literal(name) => Some(name),
            AccountName::Lookup => self
                .accounts
                .as_ref()?
                .iter()
                .find(|account| account.id == row.event.account_id)
                .map(|account| account.name.as_str()),
        }
    }

    /// Event count per account id.
    pub fn events_per_account(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for row in &self.events {
            *counts.entry(row.event.account_id.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Accumulates per-account event batches into a [`Report`].
///
/// Batches are appended in the order they are given; the caller is responsible
/// for handing them over in a stable order.
#[derive(Debug)]
pub struct ReportAssembler {
    naming: Naming,
    events: Vec<EventRow>,
    widths: ColumnWidths,
}

#[derive(Debug)]
enum Naming {
    Single(String),
    Organization(Vec<Account>),
}

impl ReportAssembler {
    /// Single-account report: every row carries `account_name` literally.
    pub fn single_account(account_name: impl Into<String>) -> Self {
        Self::with_naming(Naming::Single(account_name.into()))
    }

    /// Organization-wide report: rows reference `accounts` by id.
    pub fn organization(accounts: Vec<Account>) -> Self {
        Self::with_naming(Naming::Organization(accounts))
    }

    fn with_naming(naming: Naming) -> Self {
        Self {
            naming,
            events: Vec::new(),
            widths: ColumnWidths::default(),
        }
    }

    /// Append one account's harvested events.
    pub fn append_account(&mut self, events: Vec<HealthEvent>) {
        for event in events {
            self.widths.observe(&event);
            let account_name = match &self.naming {
                Naming::Single(name) => AccountName::Literal(name.clone()),
                Naming::Organization(_) => AccountName::Lookup,
            };
            self.events.push(EventRow {
                account_name,
                event,
            });
        }
    }

    pub fn widths(&self) -> &ColumnWidths {
        &self.widths
    }

    pub fn finish(self) -> Report {
        Report {
            events: self.events,
            accounts: match self.naming {
                Naming::Single(_) => None,
                Naming::Organization(accounts) => Some(accounts),
            },
            column_widths: self.widths,
        }
    }
}
