//! Low-level client for the remote spreadsheet service.
//!
//! Everything here is range-addressed: callers name a tab and an A1 range and
//! get raw string cells back. Domain mapping lives in `gateway`/`models`.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::TokenProvider;
use crate::config::Config;
use crate::error::{Error, Result};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Properties of one tab within the backing document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabProperties {
    pub sheet_id: i64,
    pub title: String,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: TabProperties,
}

#[derive(Deserialize)]
struct DocumentMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// HTTP client bound to one spreadsheet document.
pub struct SheetsClient {
    spreadsheet_id: String,
    http: reqwest::Client,
    tokens: TokenProvider,
}

impl SheetsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::new();
        let tokens = TokenProvider::new(config, http.clone())?;
        Ok(SheetsClient {
            spreadsheet_id: config.spreadsheet_id.clone(),
            http,
            tokens,
        })
    }

    /// Read raw cell values for an A1 range. Trailing empty cells are absent
    /// from each row, and rows past the last populated one are absent entirely.
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = format!(
            "{API_BASE}/{}/values/{}",
            self.spreadsheet_id,
            urlencoding::encode(range)
        );
        let body: ValueRange = self.request_json(self.http.get(&url)).await?;
        Ok(body.values.into_iter().map(row_to_strings).collect())
    }

    /// Overwrite cells starting at the given range with RAW (unparsed) input.
    pub async fn update_values(&self, range: &str, values: Vec<Vec<String>>) -> Result<()> {
        let url = format!(
            "{API_BASE}/{}/values/{}?valueInputOption=RAW",
            self.spreadsheet_id,
            urlencoding::encode(range)
        );
        let payload = json!({ "values": values });
        self.request_ok(self.http.put(&url).json(&payload)).await
    }

    /// Append rows after the last populated row of the range's tab.
    pub async fn append_values(&self, range: &str, values: Vec<Vec<String>>) -> Result<()> {
        let url = format!(
            "{API_BASE}/{}/values/{}:append?valueInputOption=RAW",
            self.spreadsheet_id,
            urlencoding::encode(range)
        );
        let payload = json!({ "values": values });
        self.request_ok(self.http.post(&url).json(&payload)).await
    }

    /// Submit structural requests (add/delete tab, delete rows) in one batch.
    /// Requests execute in the order given.
    pub async fn batch_update(&self, requests: Vec<Value>) -> Result<()> {
        let url = format!("{API_BASE}/{}:batchUpdate", self.spreadsheet_id);
        let payload = json!({ "requests": requests });
        self.request_ok(self.http.post(&url).json(&payload)).await
    }

    /// Fetch the document's tab list (titles and numeric tab ids).
    pub async fn get_metadata(&self) -> Result<Vec<TabProperties>> {
        let url = format!("{API_BASE}/{}", self.spreadsheet_id);
        let body: DocumentMetadata = self.request_json(self.http.get(&url)).await?;
        Ok(body.sheets.into_iter().map(|s| s.properties).collect())
    }

    async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = self.send(builder).await?;
        Ok(response.json().await?)
    }

    async fn request_ok(&self, builder: reqwest::RequestBuilder) -> Result<()> {
        self.send(builder).await?;
        Ok(())
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let token = self.tokens.token().await?;
        let response = builder.bearer_auth(token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Remote {
            status: status.as_u16(),
            message: extract_error_message(&body),
        })
    }
}

/// Pull the service's error message out of an error body, falling back to the
/// raw body when it is not the expected JSON shape.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

fn row_to_strings(row: Vec<Value>) -> Vec<String> {
    row.into_iter()
        .map(|cell| match cell {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect()
}

/// Convert a 1-based column number to its letter name (A=1, Z=26, AA=27).
pub fn col_to_letter(col: u32) -> String {
    let mut col = col;
    let mut result = String::new();
    while col > 0 {
        col -= 1;
        result.push(((col % 26) as u8 + b'A') as char);
        col /= 26;
    }
    result.chars().rev().collect()
}

/// A1 reference for a single cell, e.g. `cell_ref("Sheet1", "C", 5)` → `Sheet1!C5`.
pub fn cell_ref(tab: &str, column: &str, row: i64) -> String {
    format!("{tab}!{column}{row}")
}

/// A1 reference for a column span on a tab, e.g. `Sheet1!A:D`.
pub fn tab_range(tab: &str, span: &str) -> String {
    format!("{tab}!{span}")
}

/// `addSheet` request for `batch_update`.
pub fn add_sheet_request(title: &str) -> Value {
    json!({ "addSheet": { "properties": { "title": title } } })
}

/// `deleteSheet` request for `batch_update`.
pub fn delete_sheet_request(sheet_id: i64) -> Value {
    json!({ "deleteSheet": { "sheetId": sheet_id } })
}

/// `deleteDimension` request removing one row (1-based) from a tab.
/// The wire format is 0-based and half-open.
pub fn delete_row_request(sheet_id: i64, row: i64) -> Value {
    json!({
        "deleteDimension": {
            "range": {
                "sheetId": sheet_id,
                "dimension": "ROWS",
                "startIndex": row - 1,
                "endIndex": row,
            }
        }
    })
}
