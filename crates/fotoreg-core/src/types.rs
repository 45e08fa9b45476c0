//! Core types for observation drafts
//!
//! Defines:
//! - The observation draft and its fields
//! - Digitizer identities (one worksheet tab each)
//! - Photo references and the geographic bounds for coordinates

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Accepted latitude range, decimal degrees
pub const LATITUDE_RANGE: RangeInclusive<f64> = 3.725_902..=4.838_990;

/// Accepted longitude range, decimal degrees
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -74.2248..=-73.991_94;

/// Minimum number of characters a photo file name must have
pub const MIN_PHOTO_NAME_CHARS: usize = 5;

/// Staff member encoding the record
///
/// Each digitizer owns one worksheet tab in the destination spreadsheet,
/// titled exactly like [`Digitizer::name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Digitizer {
    /// Angela
    Angela,
    /// Nelson
    Nelson,
}

impl Digitizer {
    /// All digitizers, in the order they are offered
    pub const ALL: [Digitizer; 2] = [Digitizer::Angela, Digitizer::Nelson];

    /// Display name, also the worksheet title
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Digitizer::Angela => "Angela",
            Digitizer::Nelson => "Nelson",
        }
    }
}

impl std::fmt::Display for Digitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a name is not a known digitizer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown digitizer: {0}")]
pub struct UnknownDigitizer(pub String);

impl FromStr for Digitizer {
    type Err = UnknownDigitizer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Digitizer::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| UnknownDigitizer(s.to_string()))
    }
}

/// Uploaded photo handle
///
/// Only the name is kept; the image content is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    /// Original file name as uploaded
    pub name: String,
    /// Size of the upload in bytes
    #[serde(default)]
    pub size_bytes: u64,
}

impl PhotoRef {
    /// Create a photo reference from a file name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes: 0,
        }
    }

    /// With upload size
    #[inline]
    #[must_use]
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Name length in characters
    #[inline]
    #[must_use]
    pub fn name_len(&self) -> usize {
        self.name.chars().count()
    }
}

/// One in-progress observation record
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Draft {
    /// Shared-secret token typed by the user
    pub token: Option<String>,
    /// Observation date
    pub date: Option<NaiveDate>,
    /// Uploaded photo
    pub photo: Option<PhotoRef>,
    /// Person who took the photo
    pub observer: Option<String>,
    /// Person encoding the record
    pub digitizer: Option<Digitizer>,
    /// Scientific name picked from the controlled list
    pub species: Option<String>,
    /// Free-text scientific name, for taxa missing from the list
    pub species_alt: Option<String>,
    /// Decimal latitude
    pub latitude: Option<f64>,
    /// Decimal longitude
    pub longitude: Option<f64>,
    /// Named location
    pub site: Option<String>,
}

impl std::fmt::Debug for Draft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Draft")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("date", &self.date)
            .field("photo", &self.photo)
            .field("observer", &self.observer)
            .field("digitizer", &self.digitizer)
            .field("species", &self.species)
            .field("species_alt", &self.species_alt)
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("site", &self.site)
            .finish()
    }
}

impl Draft {
    /// Create an empty draft
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field has been filled in
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Trim text fields and turn blank ones into `None`
    ///
    /// The token is kept as typed; only an empty one becomes `None`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.token = self.token.filter(|t| !t.is_empty());
        for field in [
            &mut self.observer,
            &mut self.species,
            &mut self.species_alt,
            &mut self.site,
        ] {
            *field = field.take().and_then(non_blank);
        }
        self.photo = self.photo.filter(|p| !p.name.trim().is_empty());
        self
    }

    /// Species to record: the listed name wins over the free-text one
    #[must_use]
    pub fn chosen_species(&self) -> Option<&str> {
        self.species
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.species_alt.as_deref().filter(|s| !s.is_empty()))
    }

    /// True when both coordinates are present
    #[inline]
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Builder: token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Builder: date
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Builder: photo
    #[must_use]
    pub fn with_photo(mut self, photo: PhotoRef) -> Self {
        self.photo = Some(photo);
        self
    }

    /// Builder: observer
    #[must_use]
    pub fn with_observer(mut self, observer: impl Into<String>) -> Self {
        self.observer = Some(observer.into());
        self
    }

    /// Builder: digitizer
    #[must_use]
    pub fn with_digitizer(mut self, digitizer: Digitizer) -> Self {
        self.digitizer = Some(digitizer);
        self
    }

    /// Builder: listed species
    #[must_use]
    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    /// Builder: free-text species
    #[must_use]
    pub fn with_species_alt(mut self, species: impl Into<String>) -> Self {
        self.species_alt = Some(species.into());
        self
    }

    /// Builder: coordinates
    #[must_use]
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Builder: site
    #[must_use]
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}
