use async_trait::async_trait;

use crate::{error::StoreError, post::Row};

/// Opens spreadsheets by id.
#[async_trait]
pub trait SpreadsheetProvider: Send + Sync {
    type Spreadsheet: Spreadsheet;

    /// Opens the spreadsheet with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SpreadsheetNotFound`] if the id does not resolve,
    /// or another [`StoreError`] if the backend cannot be reached.
    async fn open(&self, spreadsheet_id: &str) -> Result<Self::Spreadsheet, StoreError>;
}

/// An opened spreadsheet.
#[async_trait]
pub trait Spreadsheet: Send + Sync {
    type Worksheet: Worksheet;

    /// Looks up a worksheet by name. `Ok(None)` means it does not exist.
    async fn worksheet(&self, name: &str) -> Result<Option<Self::Worksheet>, StoreError>;
}

/// A single worksheet. Rows and columns are 1-based; row 1 is the header.
#[async_trait]
pub trait Worksheet: Send + Sync {
    fn name(&self) -> &str;

    /// Index of the last row holding any data, 0 for an empty worksheet.
    async fn last_row(&self) -> Result<usize, StoreError>;

    /// Raw cell values of `column` for rows `from_row..=to_row`. Blank cells
    /// are returned as empty strings.
    async fn read_column(
        &self,
        from_row: usize,
        to_row: usize,
        column: usize,
    ) -> Result<Vec<String>, StoreError>;

    /// Appends a row after the last row.
    async fn append_row(&self, row: &Row) -> Result<(), StoreError>;
}
