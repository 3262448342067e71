//! Google Sheets v4 REST backend.
//!
//! Only three endpoints are used:
//!
//! - `GET /v4/spreadsheets/{id}?fields=sheets.properties.title` to open a
//!   spreadsheet and list its worksheets.
//! - `GET /v4/spreadsheets/{id}/values/{range}` to find the last row and to
//!   read the id column.
//! - `POST /v4/spreadsheets/{id}/values/{range}:append` to append a row.

use std::time::Duration;

use async_trait::async_trait;
use formpost::{Row, Spreadsheet, SpreadsheetProvider, StoreError, Worksheet};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, instrument};

#[derive(Clone, Debug)]
pub struct GoogleSheets {
    client: Client,
    base: Url,
    token: Option<String>,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl GoogleSheets {
    /// Creates a client for the API rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base: Url, token: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Rejected {
                reason: format!("{} cannot be a base URL", self.base),
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets"])
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: e.to_string(),
            })
    }
}

async fn rejected(response: Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    StoreError::Rejected {
        reason: format!("status {}: {}", status.as_u16(), body.trim()),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    if !response.status().is_success() {
        return Err(rejected(response).await);
    }
    response.json().await.map_err(|e| StoreError::Malformed {
        reason: e.to_string(),
    })
}

/// A1 notation column letters for a 1-based column index.
fn column_letters(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.iter().rev().map(|b| char::from(*b)).collect()
}

/// Quotes a worksheet title for use in an A1 range.
fn quoted(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SpreadsheetProvider for GoogleSheets {
    type Spreadsheet = SheetsSpreadsheet;

    #[instrument(level = "debug", skip(self))]
    async fn open(&self, spreadsheet_id: &str) -> Result<SheetsSpreadsheet, StoreError> {
        let mut url = self.endpoint(&[spreadsheet_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self.send(self.client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::SpreadsheetNotFound {
                id: spreadsheet_id.to_string(),
            });
        }
        let meta: SpreadsheetMeta = decode(response).await?;
        let titles = meta
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect::<Vec<_>>();
        debug!(worksheets = titles.len(), "opened spreadsheet");

        Ok(SheetsSpreadsheet {
            api: self.clone(),
            id: spreadsheet_id.to_string(),
            titles,
        })
    }
}

/// A spreadsheet opened through [`GoogleSheets`].
#[derive(Clone, Debug)]
pub struct SheetsSpreadsheet {
    api: GoogleSheets,
    id: String,
    titles: Vec<String>,
}

#[async_trait]
impl Spreadsheet for SheetsSpreadsheet {
    type Worksheet = SheetsWorksheet;

    async fn worksheet(&self, name: &str) -> Result<Option<SheetsWorksheet>, StoreError> {
        Ok(self
            .titles
            .iter()
            .any(|title| title == name)
            .then(|| SheetsWorksheet {
                api: self.api.clone(),
                spreadsheet_id: self.id.clone(),
                title: name.to_string(),
            }))
    }
}

#[derive(Clone, Debug)]
pub struct SheetsWorksheet {
    api: GoogleSheets,
    spreadsheet_id: String,
    title: String,
}

impl SheetsWorksheet {
    async fn values(&self, range: &str, columns: bool) -> Result<Vec<Vec<Value>>, StoreError> {
        let mut url = self.api.endpoint(&[&self.spreadsheet_id, "values", range])?;
        if columns {
            url.query_pairs_mut()
                .append_pair("majorDimension", "COLUMNS");
        }
        let response = self.api.send(self.api.client.get(url)).await?;
        let range: ValueRange = decode(response).await?;
        Ok(range.values)
    }
}

#[async_trait]
impl Worksheet for SheetsWorksheet {
    fn name(&self) -> &str {
        &self.title
    }

    async fn last_row(&self) -> Result<usize, StoreError> {
        // The API drops trailing empty rows, so the row count of the whole
        // sheet is the index of its last row.
        Ok(self.values(&quoted(&self.title), false).await?.len())
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
        if to_row < from_row {
            return Ok(Vec::new());
        }
        let letters = column_letters(column);
        let range = format!(
            "{}!{letters}{from_row}:{letters}{to_row}",
            quoted(&self.title)
        );
        let values = self.values(&range, true).await?;

        let mut cells: Vec<String> = values
            .first()
            .map(|column| column.iter().map(cell_text).collect())
            .unwrap_or_default();
        cells.resize(to_row - from_row + 1, String::new());
        Ok(cells)
    }

    async fn append_row(&self, row: &Row) -> Result<(), StoreError> {
        let target = format!("{}!A1:append", quoted(&self.title));
        let mut url = self.api.endpoint(&[&self.spreadsheet_id, "values", &target])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = json!({ "values": [row.cells()] });
        let request = self.api.client.post(url).json(&body);
        let response = self.api.send(request).await?;
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }
        Ok(())
    }
}
