//! HTTP implementation of [`Destination`] over the spreadsheet and drive
//! REST APIs.
//!
//! Documents are created through the drive API (so they land in a folder);
//! every other operation goes through the spreadsheet API. All calls share a
//! bearer token and pass through the client's retry policy.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use metricsync_core::{with_retry, CellValue, RetryPolicy};

use crate::destination::{Destination, SheetInfo};
use crate::error::SheetsError;
use crate::retry::sheets_retry_policy;

const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/";
const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3/";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Everything but RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddSheetReply {
    add_sheet: Option<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<AddSheetReply>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// A1 range covering `column` of `sheet`, with the sheet name quoted.
fn column_range(sheet: &str, column: &str) -> String {
    format!("'{}'!{column}:{column}", sheet.replace('\'', "''"))
}

fn anchor_range(sheet: &str) -> String {
    format!("'{}'!A1", sheet.replace('\'', "''"))
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct SheetsClient {
    client: Client,
    token: String,
    sheets_base: Url,
    drive_base: Url,
    retry: RetryPolicy<SheetsError>,
}

impl SheetsClient {
    /// Creates a client pointed at the production APIs.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, SheetsError> {
        Self::with_base_urls(token, timeout_secs, DEFAULT_SHEETS_BASE_URL, DEFAULT_DRIVE_BASE_URL)
    }

    /// Creates a client with custom base URLs (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SheetsError::InvalidBaseUrl`] if either URL does not parse.
    pub fn with_base_urls(
        token: &str,
        timeout_secs: u64,
        sheets_base: &str,
        drive_base: &str,
    ) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("metricsync/0.1 (spreadsheet-sync)")
            .build()?;

        Ok(Self {
            client,
            token: token.to_owned(),
            sheets_base: parse_base(sheets_base)?,
            drive_base: parse_base(drive_base)?,
            retry: sheets_retry_policy(3, Duration::from_secs(10)),
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy<SheetsError>) -> Self {
        self.retry = retry;
        self
    }

    /// `{sheets_base}spreadsheets/{document_id}{suffix}`
    fn spreadsheet_url(&self, document_id: &str, suffix: &str) -> Result<Url, SheetsError> {
        let document = utf8_percent_encode(document_id.trim(), PATH_SEGMENT);
        self.sheets_base
            .join(&format!("spreadsheets/{document}{suffix}"))
            .map_err(|e| SheetsError::InvalidBaseUrl(format!("cannot join document '{document_id}': {e}")))
    }

    fn values_url(&self, document_id: &str, range: &str, action: &str) -> Result<Url, SheetsError> {
        let range = utf8_percent_encode(range, PATH_SEGMENT);
        self.spreadsheet_url(document_id, &format!("/values/{range}{action}"))
    }

    /// Sends one request through the retry policy and decodes the JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        operation: &str,
    ) -> Result<T, SheetsError> {
        with_retry(&self.retry, operation, || {
            let method = method.clone();
            let url = url.clone();
            let body = body.clone();
            async move {
                let mut request = self.client.request(method, url.clone()).bearer_auth(&self.token);
                if let Some(body) = body {
                    request = request.json(&body);
                }
                let response = Self::check_status(request.send().await?, &url)?;
                let text = response.text().await?;
                let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
                serde_json::from_str(text).map_err(|e| SheetsError::Deserialize {
                    context: url.to_string(),
                    source: e,
                })
            }
        })
        .await
    }

    async fn batch_update(
        &self,
        document_id: &str,
        requests: serde_json::Value,
        operation: &str,
    ) -> Result<BatchUpdateResponse, SheetsError> {
        let url = self.spreadsheet_url(document_id, ":batchUpdate")?;
        self.send_json(Method::POST, url, Some(json!({ "requests": requests })), operation)
            .await
    }

    fn check_status(response: Response, url: &Url) -> Result<Response, SheetsError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SheetsError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(SheetsError::NotFound {
                resource: url.path().to_string(),
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(SheetsError::RateLimited { retry_after_secs });
        }
        Err(SheetsError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

fn parse_base(raw: &str) -> Result<Url, SheetsError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| SheetsError::InvalidBaseUrl(format!("'{raw}': {e}")))
}

#[async_trait]
impl Destination for SheetsClient {
    async fn create_document(&self, title: &str, folder_id: &str) -> Result<String, SheetsError> {
        let mut url = self
            .drive_base
            .join("files")
            .map_err(|e| SheetsError::InvalidBaseUrl(format!("cannot join 'files': {e}")))?;
        url.query_pairs_mut()
            .append_pair("supportsAllDrives", "true")
            .append_pair("fields", "id");
        let body = json!({
            "name": title,
            "mimeType": SPREADSHEET_MIME_TYPE,
            "parents": [folder_id],
        });
        let created: CreatedFile = self
            .send_json(Method::POST, url, Some(body), "drive create document")
            .await?;
        tracing::info!(document_id = %created.id, title, folder_id, "created destination document");
        Ok(created.id)
    }

    async fn list_sheets(&self, document_id: &str) -> Result<Vec<SheetInfo>, SheetsError> {
        let mut url = self.spreadsheet_url(document_id, "")?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");
        let meta: SpreadsheetMeta = self
            .send_json(Method::GET, url, None, "sheets list sheets")
            .await?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|s| SheetInfo {
                sheet_id: s.properties.sheet_id,
                title: s.properties.title,
            })
            .collect())
    }

    async fn create_sheet(&self, document_id: &str, title: &str) -> Result<SheetInfo, SheetsError> {
        let requests = json!([{ "addSheet": { "properties": { "title": title } } }]);
        let response = self
            .batch_update(document_id, requests, "sheets add sheet")
            .await?;
        response
            .replies
            .into_iter()
            .find_map(|r| r.add_sheet)
            .map(|s| SheetInfo {
                sheet_id: s.properties.sheet_id,
                title: s.properties.title,
            })
            .ok_or_else(|| SheetsError::MalformedResponse {
                context: format!("addSheet '{title}'"),
                reason: "reply carried no sheet properties".to_string(),
            })
    }

    async fn read_column(
        &self,
        document_id: &str,
        sheet: &str,
        column: &str,
    ) -> Result<Vec<String>, SheetsError> {
        let url = self.values_url(document_id, &column_range(sheet, column), "")?;
        let range: ValueRange = self
            .send_json(Method::GET, url, None, "sheets read column")
            .await?;
        Ok(range
            .values
            .iter()
            .map(|row| row.first().map(cell_text).unwrap_or_default())
            .collect())
    }

    async fn append_rows(
        &self,
        document_id: &str,
        sheet: &str,
        rows: &[Vec<CellValue>],
    ) -> Result<(), SheetsError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut url = self.values_url(document_id, &anchor_range(sheet), ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let _: serde_json::Value = self
            .send_json(Method::POST, url, Some(json!({ "values": rows })), "sheets append rows")
            .await?;
        tracing::debug!(document_id, sheet, rows = rows.len(), "rows appended");
        Ok(())
    }

    async fn rename_document(&self, document_id: &str, title: &str) -> Result<(), SheetsError> {
        let requests = json!([{
            "updateSpreadsheetProperties": {
                "properties": { "title": title },
                "fields": "title"
            }
        }]);
        self.batch_update(document_id, requests, "sheets rename document")
            .await?;
        Ok(())
    }

    async fn format_sheet(&self, document_id: &str, sheet: &SheetInfo) -> Result<(), SheetsError> {
        let requests = json!([
            {
                "updateSheetProperties": {
                    "properties": {
                        "sheetId": sheet.sheet_id,
                        "gridProperties": { "frozenRowCount": 1 }
                    },
                    "fields": "gridProperties.frozenRowCount"
                }
            },
            {
                "repeatCell": {
                    "range": { "sheetId": sheet.sheet_id, "startRowIndex": 0, "endRowIndex": 1 },
                    "cell": { "userEnteredFormat": { "textFormat": { "bold": true } } },
                    "fields": "userEnteredFormat.textFormat.bold"
                }
            }
        ]);
        self.batch_update(document_id, requests, "sheets format sheet")
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_quote_sheet_names() {
        assert_eq!(column_range("Instagram", "A"), "'Instagram'!A:A");
        assert_eq!(column_range("Bob's", "A"), "'Bob''s'!A:A");
        assert_eq!(anchor_range("YouTube Monthly"), "'YouTube Monthly'!A1");
    }

    #[test]
    fn values_url_encodes_the_range() {
        let client =
            SheetsClient::with_base_urls("t", 5, "https://sheets.example.com/v4", "https://drive.example.com/v3")
                .unwrap();
        let url = client
            .values_url("doc-1", &column_range("Instagram", "A"), "")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example.com/v4/spreadsheets/doc-1/values/%27Instagram%27%21A%3AA"
        );
    }

    #[test]
    fn cell_text_stringifies_non_strings() {
        assert_eq!(cell_text(&json!("2024-01-01")), "2024-01-01");
        assert_eq!(cell_text(&json!(45292)), "45292");
        assert_eq!(cell_text(&json!(null)), "");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = SheetsClient::with_base_urls("t", 5, "not a url", "https://drive.example.com");
        assert!(matches!(result, Err(SheetsError::InvalidBaseUrl(_))));
    }
}
