//! Excel workbook sink built on `rust_xlsxwriter`.

#![warn(clippy::all, rust_2018_idioms)]

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Table, TableColumn, Workbook, Worksheet};
use tracing::debug;

use super::sink::{Cell, TabularSink};
use crate::app::error::ReportError;

const DATE_FORMAT: &str = "dd/mm/yy hh:mm";
/// Keeps leading zeros of account ids on display.
const ACCOUNT_ID_FORMAT: &str = "000000000000";

/// Writes sheets into an `.xlsx` workbook saved by [`XlsxSink::save`].
pub struct XlsxSink {
    path: PathBuf,
    workbook: Workbook,
    current: Option<Worksheet>,
    bold: Format,
    account_id: Format,
    date: Format,
}

impl XlsxSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            workbook: Workbook::new(),
            current: None,
            bold: Format::new().set_bold(),
            account_id: Format::new().set_num_format(ACCOUNT_ID_FORMAT),
            date: Format::new().set_num_format(DATE_FORMAT),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sheet(&mut self) -> Result<&mut Worksheet, ReportError> {
        self.current
            .as_mut()
            .ok_or_else(|| ReportError::sink("no sheet has been started"))
    }

    /// Flush the open sheet and write the workbook to disk.
    pub fn save(mut self) -> Result<(), ReportError> {
        if let Some(sheet) = self.current.take() {
            self.workbook.push_worksheet(sheet);
        }
        self.workbook.save(&self.path).map_err(|e| {
            ReportError::sink(format!("{}: {}", self.path.display(), e))
        })?;
        debug!("Workbook saved to {}", self.path.display());
        Ok(())
    }
}

impl TabularSink for XlsxSink {
    fn begin_sheet(&mut self, name: &str) -> Result<(), ReportError> {
        if let Some(previous) = self.current.take() {
            self.workbook.push_worksheet(previous);
        }
        let mut sheet = Worksheet::new();
        sheet.set_name(name)?;
        self.current = Some(sheet);
        Ok(())
    }

    fn write_header(&mut self, row: u32, headers: &[&str]) -> Result<(), ReportError> {
        let bold = self.bold.clone();
        let sheet = self.sheet()?;
        for (col, header) in (0u16..).zip(headers) {
            sheet.write_string_with_format(row, col, *header, &bold)?;
        }
        Ok(())
    }

    fn write_cell(&mut self, row: u32, col: u16, cell: &Cell) -> Result<(), ReportError> {
        let account_id = self.account_id.clone();
        let date = self.date.clone();
        let sheet = self.sheet()?;
        match cell {
            Cell::Text(text) => {
                sheet.write_string(row, col, text.as_str())?;
            }
            // Account ids stay well below 2^53, so the f64 cell holds them exactly
            Cell::AccountId(value) => {
                sheet.write_number_with_format(row, col, *value as f64, &account_id)?;
            }
            Cell::DateTime(time) => {
                sheet.write_datetime_with_format(row, col, &time.naive_utc(), &date)?;
            }
            Cell::Formula(formula) => {
                sheet.write_formula(row, col, formula.as_str())?;
            }
            Cell::Empty => {}
        }
        Ok(())
    }

    fn set_column_width(&mut self, col: u16, width: f64) -> Result<(), ReportError> {
        self.sheet()?.set_column_width(col, width)?;
        Ok(())
    }

    fn autofilter(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> Result<(), ReportError> {
        self.sheet()?
            .autofilter(first_row, first_col, last_row, last_col)?;
        Ok(())
    }

    fn add_keyed_table(
        &mut self,
        name: &str,
        headers: &[&str],
        data_rows: u32,
    ) -> Result<(), ReportError> {
        if headers.is_empty() {
            return Err(ReportError::sink(format!("table {} has no columns", name)));
        }
        if data_rows == 0 {
            // Excel tables need at least one data row
            return self.write_header(0, headers);
        }

        let columns: Vec<TableColumn> = headers
            .iter()
            .map(|header| {
                TableColumn::new()
                    .set_header(*header)
                    .set_header_format(self.bold.clone())
            })
            .collect();
        let table = Table::new().set_name(name).set_columns(&columns);
        let last_col = (headers.len() - 1) as u16;

        self.sheet()?.add_table(0, 0, data_rows, last_col, &table)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        let mut sink = XlsxSink::new(&path);
        assert_eq!(sink.path(), path.as_path());
        sink.begin_sheet("Events").unwrap();
        sink.write_header(0, &["Account Id", "Account Name"]).unwrap();
        sink.write_cell(1, 0, &Cell::AccountId(12345678901)).unwrap();
        sink.write_cell(1, 1, &Cell::Text("prod".to_string())).unwrap();
        sink.autofilter(0, 0, 1, 1).unwrap();
        sink.save().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_account_id_format_pads_to_full_length() {
        use crate::app::report::render::ACCOUNT_ID_DIGITS;

        assert_eq!(ACCOUNT_ID_FORMAT.len(), ACCOUNT_ID_DIGITS);
        assert!(ACCOUNT_ID_FORMAT.chars().all(|c| c == '0'));
    }

    #[test]
    fn test_keyed_table_saved_with_bold_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.xlsx");

        let mut sink = XlsxSink::new(&path);
        sink.begin_sheet("Accounts").unwrap();
        sink.add_keyed_table("AccountTable", &["Id", "Name"], 1).unwrap();
        sink.write_cell(1, 0, &Cell::AccountId(12345678901)).unwrap();
        sink.write_cell(1, 1, &Cell::Text("payments".to_string())).unwrap();
        sink.save().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_cells_require_a_sheet() {
        let mut sink = XlsxSink::new("unused.xlsx");
        assert!(sink.write_cell(0, 0, &Cell::Empty).is_err());
    }
}
