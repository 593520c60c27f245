//! Writes a [`Report`] into a [`TabularSink`].
//!
//! When the report carries an accounts table, account names on the Events sheet
//! are written as `VLOOKUP` formulas into the keyed `AccountTable`; otherwise
//! they are written as the stored literal.

#![warn(clippy::all, rust_2018_idioms)]

use super::model::{AccountName, EventRow, Report, EVENT_COLUMNS};
use super::sink::{Cell, TabularSink};
use crate::app::accounts::{Account, ACCOUNT_ATTRIBUTES, ACCOUNT_NAME_POSITION};
use crate::app::error::ReportError;
use crate::log_warn;

pub const EVENTS_SHEET: &str = "Events";
pub const ACCOUNTS_SHEET: &str = "Accounts";
pub const ACCOUNT_TABLE: &str = "AccountTable";

/// Length of every AWS account id.
pub const ACCOUNT_ID_DIGITS: usize = 12;

/// Accounts sheet columns that get a fixed width (Id and JoinedTimestamp).
const ACCOUNT_FIXED_WIDTHS: [(u16, f64); 2] = [(0, 14.0), (6, 14.0)];

pub fn write_report(report: &Report, sink: &mut dyn TabularSink) -> Result<(), ReportError> {
    write_events_sheet(report, sink)?;
    if let Some(accounts) = &report.accounts {
        write_accounts_sheet(accounts, sink)?;
    }
    Ok(())
}

fn write_events_sheet(report: &Report, sink: &mut dyn TabularSink) -> Result<(), ReportError> {
    sink.begin_sheet(EVENTS_SHEET)?;
    sink.write_header(0, &EVENT_COLUMNS)?;

    let mut row: u32 = 0;
    for event_row in &report.events {
        row += 1;
        let cells = event_cells(report, event_row, row);
        for (col, cell) in (0u16..).zip(cells.iter()) {
            sink.write_cell(row, col, cell)?;
        }
    }

    for (col, width) in (0u16..).zip(report.column_widths.as_slice()) {
        sink.set_column_width(col, *width as f64)?;
    }

    let last_col = (EVENT_COLUMNS.len() - 1) as u16;
    sink.autofilter(0, 0, row, last_col)?;
    Ok(())
}

fn event_cells(report: &Report, event_row: &EventRow, row: u32) -> [Cell; 13] {
    let event = &event_row.event;
    [
        account_id_cell(&event.account_id),
        account_name_cell(report, event_row, row),
        Cell::Text(event.arn.clone()),
        Cell::Text(event.service.clone()),
        Cell::Text(event.event_type_code.clone()),
        Cell::Text(event.event_type_category.clone()),
        Cell::Text(event.region.clone()),
        time_cell(event.start_time),
        time_cell(event.end_time),
        time_cell(event.last_updated_time),
        Cell::Text(event.status_code.clone()),
        Cell::Text(event.description.clone()),
        Cell::Text(event.affected_resources.clone()),
    ]
}

fn account_name_cell(report: &Report, event_row: &EventRow, row: u32) -> Cell {
    match (&event_row.account_name, &report.accounts) {
        (AccountName::Lookup, Some(_)) => Cell::Formula(format!(
            "=VLOOKUP(A{},{}[#Data],{},FALSE)",
            row + 1,
            ACCOUNT_TABLE,
            ACCOUNT_NAME_POSITION
        )),
        _ => report
            .resolve_account_name(event_row)
            .map(|name| Cell::Text(name.to_string()))
            .unwrap_or(Cell::Empty),
    }
}

/// Numeric cell for twelve-digit ids, text otherwise.
pub fn account_id_cell(account_id: &str) -> Cell {
    let well_formed = account_id.len() == ACCOUNT_ID_DIGITS
        && account_id.bytes().all(|b| b.is_ascii_digit());

    match account_id.parse::<u64>() {
        Ok(id) if well_formed => Cell::AccountId(id),
        _ => {
            log_warn!(
                "Account id {} is not {} digits, writing it as text",
                account_id,
                ACCOUNT_ID_DIGITS
            );
            Cell::Text(account_id.to_string())
        }
    }
}

fn time_cell(time: Option<chrono::DateTime<chrono::Utc>>) -> Cell {
    time.map(Cell::DateTime).unwrap_or(Cell::Empty)
}

fn optional_text(value: &Option<String>) -> Cell {
    value
        .as_ref()
        .map(|v| Cell::Text(v.clone()))
        .unwrap_or(Cell::Empty)
}

fn write_accounts_sheet(accounts: &[Account], sink: &mut dyn TabularSink) -> Result<(), ReportError> {
    sink.begin_sheet(ACCOUNTS_SHEET)?;
    sink.add_keyed_table(ACCOUNT_TABLE, &ACCOUNT_ATTRIBUTES, accounts.len() as u32)?;

    for (row, account) in (1u32..).zip(accounts) {
        let cells = [
            account_id_cell(&account.id),
            optional_text(&account.arn),
            optional_text(&account.email),
            Cell::Text(account.name.clone()),
            optional_text(&account.status),
            optional_text(&account.joined_method),
            time_cell(account.joined_timestamp),
        ];
        for (col, cell) in (0u16..).zip(cells.iter()) {
            sink.write_cell(row, col, cell)?;
        }
    }

    for (col, width) in ACCOUNT_FIXED_WIDTHS {
        sink.set_column_width(col, width)?;
    }
    Ok(())
}
