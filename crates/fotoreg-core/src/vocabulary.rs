//! Controlled vocabularies for the form's selection lists
//!
//! Loaded once from a CSV file with one column per list. Columns are
//! independent and may have different lengths, so blank cells are skipped.

use crate::error::VocabularyError;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const PLANTS: &str = "Plantas";
const BIRDS: &str = "Aves";
const INSECTS: &str = "Insectos";
const OBSERVERS: &str = "Observadores";
const SITES: &str = "Sitios";

/// Selection lists shown on the form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Vocabulary {
    plants: Vec<String>,
    birds: Vec<String>,
    insects: Vec<String>,
    taxa: Vec<String>,
    observers: Vec<String>,
    sites: Vec<String>,
}

impl Vocabulary {
    /// Build from raw lists
    ///
    /// Plants are sorted; the combined taxa list is the sorted union of
    /// birds, insects and plants. Observers and sites keep file order.
    #[must_use]
    pub fn from_lists(
        mut plants: Vec<String>,
        birds: Vec<String>,
        insects: Vec<String>,
        observers: Vec<String>,
        sites: Vec<String>,
    ) -> Self {
        plants.sort();
        let mut taxa: Vec<String> = birds
            .iter()
            .chain(insects.iter())
            .chain(plants.iter())
            .cloned()
            .collect();
        taxa.sort();

        Self {
            plants,
            birds,
            insects,
            taxa,
            observers,
            sites,
        }
    }

    /// Load from a CSV file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VocabularyError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let vocabulary = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            taxa = vocabulary.taxa.len(),
            observers = vocabulary.observers.len(),
            sites = vocabulary.sites.len(),
            "Loaded vocabulary"
        );
        Ok(vocabulary)
    }

    /// Parse CSV content
    pub fn from_reader(reader: impl Read) -> Result<Self, VocabularyError> {
        let mut csv = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(VocabularyError::MissingColumn(name))
        };
        let columns = [
            column(PLANTS)?,
            column(BIRDS)?,
            column(INSECTS)?,
            column(OBSERVERS)?,
            column(SITES)?,
        ];

        let mut lists: [Vec<String>; 5] = Default::default();
        for record in csv.records() {
            let record = record?;
            for (list, &idx) in lists.iter_mut().zip(columns.iter()) {
                if let Some(value) = cell(&record, idx) {
                    list.push(value);
                }
            }
        }

        let [plants, birds, insects, observers, sites] = lists;
        Ok(Self::from_lists(plants, birds, insects, observers, sites))
    }

    /// Plant names, sorted
    #[must_use]
    pub fn plants(&self) -> &[String] {
        &self.plants
    }

    /// Bird names
    #[must_use]
    pub fn birds(&self) -> &[String] {
        &self.birds
    }

    /// Insect names
    #[must_use]
    pub fn insects(&self) -> &[String] {
        &self.insects
    }

    /// All scientific names offered in the species selector
    #[must_use]
    pub fn taxa(&self) -> &[String] {
        &self.taxa
    }

    /// Observer names
    #[must_use]
    pub fn observers(&self) -> &[String] {
        &self.observers
    }

    /// Site names
    #[must_use]
    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    /// Whether `name` is a selectable species
    #[must_use]
    pub fn has_taxon(&self, name: &str) -> bool {
        self.taxa.binary_search_by(|t| t.as_str().cmp(name)).is_ok()
    }

    /// Whether `name` is a selectable observer
    #[must_use]
    pub fn has_observer(&self, name: &str) -> bool {
        self.observers.iter().any(|o| o == name)
    }

    /// Whether `name` is a selectable site
    #[must_use]
    pub fn has_site(&self, name: &str) -> bool {
        self.sites.iter().any(|s| s == name)
    }
}

fn cell(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
