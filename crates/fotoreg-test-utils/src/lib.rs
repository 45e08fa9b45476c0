//! Testing utilities for the fotoreg workspace
//!
//! Shared test helpers, fixtures, and an in-memory spreadsheet.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use fotoreg_core::{
    AppendReceipt, Clock, Digitizer, Draft, ObservationRow, PhotoRef, RowSink, SinkError,
    Vocabulary,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;

pub const TEST_TOKEN: &str = "jbb-conservacion-2025";

pub const SAMPLE_VOCABULARY_CSV: &str = "\
Plantas,Aves,Insectos,Observadores,Sitios
Quercus humboldtii,Turdus fuscater,Apis mellifera,Carlos Vargas,Jardín Botánico
Espeletia grandiflora,Zonotrichia capensis,Bombus atratus,Juliana Zuluaga,Humedal Córdoba
Alnus acuminata,Colibri coruscans,,Nelson Salinas,Parque Nacional
Weinmannia tomentosa,,,,Cerros Orientales
";

pub fn sample_vocabulary() -> Vocabulary {
    Vocabulary::from_reader(SAMPLE_VOCABULARY_CSV.as_bytes()).unwrap()
}

pub fn bogota() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).unwrap()
}

/// The draft from the reference scenario: listed species, site, no coordinates
pub fn complete_draft() -> Draft {
    Draft::new()
        .with_token(TEST_TOKEN)
        .with_date(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
        .with_photo(PhotoRef::new("IMG_0001.jpg").with_size(2_048_000))
        .with_observer("Carlos Vargas")
        .with_digitizer(Digitizer::Nelson)
        .with_species("Quercus humboldtii")
        .with_site("Jardín Botánico")
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Self(Utc.with_ymd_and_hms(year, month, day, hour, min, sec).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// In-memory spreadsheet with one tab per digitizer
#[derive(Debug)]
pub struct MemorySheet {
    tabs: Mutex<BTreeMap<String, Vec<ObservationRow>>>,
    fail_next: Mutex<Option<SinkError>>,
}

impl Default for MemorySheet {
    fn default() -> Self {
        Self::with_tabs(Digitizer::ALL.iter().map(Digitizer::name))
    }
}

impl MemorySheet {
    pub fn with_tabs<'a>(tabs: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            tabs: Mutex::new(tabs.into_iter().map(|t| (t.to_string(), Vec::new())).collect()),
            fail_next: Mutex::new(None),
        }
    }

    /// Make the next append fail with `error`
    pub fn fail_next(&self, error: SinkError) {
        *self.fail_next.lock() = Some(error);
    }

    pub fn rows(&self, tab: &str) -> Vec<ObservationRow> {
        self.tabs.lock().get(tab).cloned().unwrap_or_default()
    }

    pub fn total_rows(&self) -> usize {
        self.tabs.lock().values().map(Vec::len).sum()
    }
}

#[async_trait]
impl RowSink for MemorySheet {
    async fn append_row(
        &self,
        worksheet: &str,
        row: &ObservationRow,
    ) -> Result<AppendReceipt, SinkError> {
        if let Some(error) = self.fail_next.lock().take() {
            return Err(error);
        }
        let mut tabs = self.tabs.lock();
        let rows = tabs
            .get_mut(worksheet)
            .ok_or_else(|| SinkError::WorksheetNotFound(worksheet.to_string()))?;
        rows.push(row.clone());
        Ok(AppendReceipt {
            updated_range: Some(format!("'{worksheet}'!A{0}:I{0}", rows.len())),
        })
    }
}
