//! Report assembly and output.
//!
//! - [`model`]: the format-agnostic report (event rows, optional accounts table,
//!   column widths) and the [`ReportAssembler`] that builds it account by account
//! - [`sink`]: the tabular sink capability plus an in-memory implementation
//! - [`xlsx`]: the Excel workbook sink
//! - [`render`]: maps a report onto sheets, cells and formulas

#![warn(clippy::all, rust_2018_idioms)]

pub mod model;
pub mod render;
pub mod sink;
pub mod xlsx;

pub use model::{AccountName, ColumnWidths, EventRow, Report, ReportAssembler, EVENT_COLUMNS};
pub use render::{
    account_id_cell, write_report, ACCOUNTS_SHEET, ACCOUNT_ID_DIGITS, ACCOUNT_TABLE, EVENTS_SHEET,
};
pub use sink::{Cell, MemorySheet, MemorySink, TabularSink};
pub use xlsx::XlsxSink;
