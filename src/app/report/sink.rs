//! Tabular sink capability the report is written into.

#![warn(clippy::all, rust_2018_idioms)]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::app::error::ReportError;

/// Typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    /// Account id written as a number displayed with all twelve digits.
    AccountId(u64),
    DateTime(DateTime<Utc>),
    Formula(String),
    Empty,
}

/// Destination for sheets of typed cells.
///
/// Calls address the sheet most recently opened with [`TabularSink::begin_sheet`].
pub trait TabularSink {
    fn begin_sheet(&mut self, name: &str) -> Result<(), ReportError>;

    /// Bold header row.
    fn write_header(&mut self, row: u32, headers: &[&str]) -> Result<(), ReportError>;

    fn write_cell(&mut self, row: u32, col: u16, cell: &Cell) -> Result<(), ReportError>;

    fn set_column_width(&mut self, col: u16, width: f64) -> Result<(), ReportError>;

    fn autofilter(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> Result<(), ReportError>;

    /// Named table with `headers` in row 0 over `data_rows` rows below it,
    /// so that formulas elsewhere can address it by name.
    fn add_keyed_table(
        &mut self,
        name: &str,
        headers: &[&str],
        data_rows: u32,
    ) -> Result<(), ReportError>;
}

/// Everything written to one sheet of a [`MemorySink`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    pub name: String,
    pub header_rows: Vec<u32>,
    pub cells: BTreeMap<(u32, u16), Cell>,
    pub column_widths: BTreeMap<u16, f64>,
    pub autofilter: Option<(u32, u16, u32, u16)>,
    pub tables: Vec<(String, Vec<String>, u32)>,
}

impl MemorySheet {
    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Rows that hold at least one cell.
    pub fn row_count(&self) -> u32 {
        self.cells.keys().map(|(row, _)| row + 1).max().unwrap_or(0)
    }
}

/// In-memory sink used for previews and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySink {
    pub sheets: Vec<MemorySheet>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    fn current(&mut self) -> Result<&mut MemorySheet, ReportError> {
        self.sheets
            .last_mut()
            .ok_or_else(|| ReportError::sink("no sheet has been started"))
    }
}

impl TabularSink for MemorySink {
    fn begin_sheet(&mut self, name: &str) -> Result<(), ReportError> {
        if self.sheet(name).is_some() {
            return Err(ReportError::sink(format!("duplicate sheet name {}", name)));
        }
        self.sheets.push(MemorySheet {
            name: name.to_string(),
            ..MemorySheet::default()
        });
        Ok(())
    }

    fn write_header(&mut self, row: u32, headers: &[&str]) -> Result<(), ReportError> {
        let sheet = self.current()?;
        sheet.header_rows.push(row);
        for (col, header) in (0u16..).zip(headers) {
            sheet
                .cells
                .insert((row, col), Cell::Text(header.to_string()));
        }
        Ok(())
    }

    fn write_cell(&mut self, row: u32, col: u16, cell: &Cell) -> Result<(), ReportError> {
        self.current()?.cells.insert((row, col), cell.clone());
        Ok(())
    }

    fn set_column_width(&mut self, col: u16, width: f64) -> Result<(), ReportError> {
        self.current()?.column_widths.insert(col, width);
        Ok(())
    }

    fn autofilter(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> Result<(), ReportError> {
        self.current()?.autofilter = Some((first_row, first_col, last_row, last_col));
        Ok(())
    }

    fn add_keyed_table(
        &mut self,
        name: &str,
        headers: &[&str],
        data_rows: u32,
    ) -> Result<(), ReportError> {
        let sheet = self.current()?;
        sheet.tables.push((
            name.to_string(),
            headers.iter().map(|h| h.to_string()).collect(),
            data_rows,
        ));
        for (col, header) in (0u16..).zip(headers) {
            sheet.cells.insert((0, col), Cell::Text(header.to_string()));
        }
        Ok(())
    }
}
