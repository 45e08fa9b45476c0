//! Google Sheets v4 REST client
//!
//! Only two calls are needed: list the worksheet titles of the spreadsheet,
//! and append one row to a worksheet. Appends are not retried.

use crate::error::SheetError;
use async_trait::async_trait;
use fotoreg_core::{AppendReceipt, ObservationRow, RowSink, SheetsSettings, SinkError};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_range: Option<String>,
}

/// Client bound to one spreadsheet
#[derive(Debug)]
pub struct SheetsClient {
    http: reqwest::Client,
    api_base: Url,
    spreadsheet_key: SecretString,
    access_token: SecretString,
}

impl SheetsClient {
    /// Create a client for the spreadsheet identified by `spreadsheet_key`
    pub fn new(
        settings: &SheetsSettings,
        spreadsheet_key: SecretString,
        access_token: SecretString,
    ) -> Result<Self, SheetError> {
        let api_base = Url::parse(&settings.api_base)
            .map_err(|e| SheetError::InvalidUrl(format!("{}: {e}", settings.api_base)))?;
        if api_base.cannot_be_a_base() {
            return Err(SheetError::InvalidUrl(settings.api_base.clone()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_base,
            spreadsheet_key,
            access_token,
        })
    }

    /// Titles of all worksheet tabs, in spreadsheet order
    pub async fn worksheet_titles(&self) -> Result<Vec<String>, SheetError> {
        let mut url = self.spreadsheet_url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self
            .http
            .get(url)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await?;
        let meta: SpreadsheetMeta = decode(response).await?;

        Ok(meta
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    /// Append one row of values after the last row of `worksheet`
    ///
    /// Fails with [`SheetError::WorksheetNotFound`] when the tab does not
    /// exist; tabs are never created.
    pub async fn append_values(
        &self,
        worksheet: &str,
        values: Vec<Value>,
    ) -> Result<AppendReceipt, SheetError> {
        let titles = self.worksheet_titles().await?;
        if !titles.iter().any(|t| t == worksheet) {
            return Err(SheetError::WorksheetNotFound(worksheet.to_string()));
        }

        let range = a1_range(worksheet);
        let mut url = self.spreadsheet_url(&["values", &format!("{range}:append")])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [values],
        });

        tracing::debug!(worksheet, "Appending row");
        let response = self
            .http
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await?;
        let appended: AppendResponse = decode(response).await?;

        Ok(AppendReceipt {
            updated_range: appended.updates.and_then(|u| u.updated_range),
        })
    }

    fn spreadsheet_url(&self, tail: &[&str]) -> Result<Url, SheetError> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| SheetError::InvalidUrl(self.api_base.to_string()))?;
            segments
                .pop_if_empty()
                .push("spreadsheets")
                .push(self.spreadsheet_key.expose_secret());
            for segment in tail {
                segments.push(segment);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl RowSink for SheetsClient {
    async fn append_row(
        &self,
        worksheet: &str,
        row: &ObservationRow,
    ) -> Result<AppendReceipt, SinkError> {
        self.append_values(worksheet, row.to_values())
            .await
            .map_err(SinkError::from)
    }
}

/// A1 notation anchoring the append at the top of a worksheet
fn a1_range(worksheet: &str) -> String {
    format!("'{}'!A1", worksheet.replace('\'', "''"))
}

async fn decode<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, SheetError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Spreadsheet service refused request");
        return Err(SheetError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> Result<SheetsClient, SheetError> {
        SheetsClient::new(
            &SheetsSettings {
                api_base: base.to_string(),
                timeout_secs: 5,
            },
            SecretString::from("1AbC-key"),
            SecretString::from("ya29.token"),
        )
    }

    #[test]
    fn a1_range_quotes_titles() {
        assert_eq!(a1_range("Nelson"), "'Nelson'!A1");
        assert_eq!(a1_range("O'Brien"), "'O''Brien'!A1");
    }

    #[test]
    fn urls_are_built_under_the_base_path() {
        let c = client("https://sheets.googleapis.com/v4").unwrap();
        let url = c.spreadsheet_url(&["values", "'Nelson'!A1:append"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/1AbC-key/values/'Nelson'!A1:append"
        );

        let c = client("https://sheets.googleapis.com/v4/").unwrap();
        assert_eq!(
            c.spreadsheet_url(&[]).unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/1AbC-key"
        );
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(matches!(client("not a url"), Err(SheetError::InvalidUrl(_))));
        assert!(matches!(client("mailto:x@y.z"), Err(SheetError::InvalidUrl(_))));
    }
}
