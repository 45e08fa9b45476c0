//! Seams between the workflow and the outside world
//!
//! - [`RowSink`]: destination that appends rows to a named worksheet
//! - [`Clock`]: source of the write timestamp
//! - [`ObservationRow`]: the fixed column layout written per observation

use crate::error::{SessionError, SinkError};
use crate::types::{Digitizer, Draft};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timestamp layout of the write-time column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Spreadsheet cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Text cell
    Text(String),
    /// Numeric cell
    Number(f64),
    /// Left empty
    Blank,
}

impl CellValue {
    /// JSON value sent to the spreadsheet service
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(String::new())),
            CellValue::Blank => Value::String(String::new()),
        }
    }

    fn from_text(value: Option<&str>) -> Self {
        value.map_or(CellValue::Blank, |s| CellValue::Text(s.to_string()))
    }

    fn from_number(value: Option<f64>) -> Self {
        value.map_or(CellValue::Blank, CellValue::Number)
    }
}

/// Row appended for one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRow {
    /// Destination worksheet
    pub digitizer: Digitizer,
    /// Cells in column order
    pub cells: Vec<CellValue>,
}

impl ObservationRow {
    /// Column headers, in write order
    pub const COLUMNS: [&'static str; 9] = [
        "fecha",
        "fotografia",
        "observador",
        "especie",
        "latitud",
        "longitud",
        "sitio",
        "registrado",
        "digitador",
    ];

    /// Build the row for a clean draft
    pub fn from_draft(draft: &Draft, now: DateTime<FixedOffset>) -> Result<Self, SessionError> {
        let date = draft.date.ok_or(SessionError::IncompleteDraft("date"))?;
        let photo = draft
            .photo
            .as_ref()
            .ok_or(SessionError::IncompleteDraft("photo"))?;
        let observer = draft
            .observer
            .as_deref()
            .ok_or(SessionError::IncompleteDraft("observer"))?;
        let digitizer = draft
            .digitizer
            .ok_or(SessionError::IncompleteDraft("digitizer"))?;
        let species = draft
            .chosen_species()
            .ok_or(SessionError::IncompleteDraft("species"))?;

        let cells = vec![
            CellValue::Text(date.to_string()),
            CellValue::Text(photo.name.clone()),
            CellValue::Text(observer.to_string()),
            CellValue::Text(species.to_string()),
            CellValue::from_number(draft.latitude),
            CellValue::from_number(draft.longitude),
            CellValue::from_text(draft.site.as_deref()),
            CellValue::Text(now.format(TIMESTAMP_FORMAT).to_string()),
            CellValue::Text(digitizer.name().to_string()),
        ];

        Ok(Self { digitizer, cells })
    }

    /// Worksheet title the row goes to
    #[inline]
    #[must_use]
    pub fn worksheet(&self) -> &'static str {
        self.digitizer.name()
    }

    /// Cells as JSON values
    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        self.cells.iter().map(CellValue::to_json).collect()
    }
}

/// What the destination reports after an append
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendReceipt {
    /// A1 range written, when the service reports it
    pub updated_range: Option<String>,
}

/// Destination for observation rows
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Append `row` after the last non-empty row of `worksheet`
    ///
    /// The worksheet must already exist.
    async fn append_row(
        &self,
        worksheet: &str,
        row: &ObservationRow,
    ) -> Result<AppendReceipt, SinkError>;
}

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
