use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::{
    error::StoreError,
    post::Row,
    store::{Spreadsheet, SpreadsheetProvider, Worksheet},
};

type Grid = Vec<Vec<String>>;
type Book = Arc<Mutex<HashMap<String, Grid>>>;

/// An in-memory spreadsheet backend.
///
/// Cloning shares the underlying data, so a clone kept by a test observes
/// every row appended through the handler.
///
/// # Example
///
/// ```
/// use formpost::MemorySpreadsheets;
///
/// let sheets = MemorySpreadsheets::new();
/// sheets.add_worksheet("book", "Tokyo", &["ID", "Type"]);
/// sheets.push_row("book", "Tokyo", &["7", "フォーム投稿"]);
///
/// assert_eq!(sheets.rows("book", "Tokyo").len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemorySpreadsheets {
    books: Arc<Mutex<HashMap<String, Book>>>,
}

impl MemorySpreadsheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the worksheet (and its spreadsheet if needed) with an optional
    /// header row. An existing worksheet is replaced.
    pub fn add_worksheet(&self, spreadsheet_id: &str, name: &str, header: &[&str]) {
        let book = self.book_or_insert(spreadsheet_id);
        let mut grid = Grid::new();
        if !header.is_empty() {
            grid.push(header.iter().map(|c| (*c).to_string()).collect());
        }
        book.lock().insert(name.to_string(), grid);
    }

    /// Writes a row directly, bypassing the handler.
    pub fn push_row(&self, spreadsheet_id: &str, worksheet: &str, cells: &[&str]) {
        let book = self.book_or_insert(spreadsheet_id);
        book.lock()
            .entry(worksheet.to_string())
            .or_default()
            .push(cells.iter().map(|c| (*c).to_string()).collect());
    }

    /// Every row of the worksheet including the header, or nothing if it does
    /// not exist.
    pub fn rows(&self, spreadsheet_id: &str, worksheet: &str) -> Grid {
        self.books
            .lock()
            .get(spreadsheet_id)
            .and_then(|book| book.lock().get(worksheet).cloned())
            .unwrap_or_default()
    }

    fn book_or_insert(&self, spreadsheet_id: &str) -> Book {
        let mut books = self.books.lock();
        Arc::clone(books.entry(spreadsheet_id.to_string()).or_default())
    }
}

#[async_trait]
impl SpreadsheetProvider for MemorySpreadsheets {
    type Spreadsheet = MemorySpreadsheet;

    async fn open(&self, spreadsheet_id: &str) -> Result<MemorySpreadsheet, StoreError> {
        let book = self
            .books
            .lock()
            .get(spreadsheet_id)
            .cloned()
            .ok_or_else(|| StoreError::SpreadsheetNotFound {
                id: spreadsheet_id.to_string(),
            })?;
        Ok(MemorySpreadsheet { book })
    }
}

/// A spreadsheet opened from [`MemorySpreadsheets`].
#[derive(Clone, Debug)]
pub struct MemorySpreadsheet {
    book: Book,
}

#[async_trait]
impl Spreadsheet for MemorySpreadsheet {
    type Worksheet = MemoryWorksheet;

    async fn worksheet(&self, name: &str) -> Result<Option<MemoryWorksheet>, StoreError> {
        let exists = self.book.lock().contains_key(name);
        Ok(exists.then(|| MemoryWorksheet {
            book: Arc::clone(&self.book),
            name: name.to_string(),
        }))
    }
}

/// A worksheet of a [`MemorySpreadsheet`].
#[derive(Clone, Debug)]
pub struct MemoryWorksheet {
    book: Book,
    name: String,
}

impl MemoryWorksheet {
    fn with_grid<R>(&self, f: impl FnOnce(&mut Grid) -> R) -> Result<R, StoreError> {
        let mut book = self.book.lock();
        let grid = book.get_mut(&self.name).ok_or_else(|| StoreError::Rejected {
            reason: format!("worksheet {:?} was removed", self.name),
        })?;
        Ok(f(grid))
    }
}

#[async_trait]
impl Worksheet for MemoryWorksheet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn last_row(&self) -> Result<usize, StoreError> {
        self.with_grid(|grid| grid.len())
    }

    async fn read_column(
        &self,
        from_row: usize,
        to_row: usize,
        column: usize,
    ) -> Result<Vec<String>, StoreError> {
        if from_row == 0 || column == 0 {
            return Err(StoreError::Rejected {
                reason: "rows and columns are 1-based".to_string(),
            });
        }
        self.with_grid(|grid| {
            (from_row..=to_row)
                .map(|row| {
                    grid.get(row - 1)
                        .and_then(|cells| cells.get(column - 1))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect()
        })
    }

    async fn append_row(&self, row: &Row) -> Result<(), StoreError> {
        let cells = row
            .cells()
            .into_iter()
            .map(|cell| match cell {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
        self.with_grid(|grid| grid.push(cells))
    }
}
