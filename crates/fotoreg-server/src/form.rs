//! Decoding of the submitted form into a draft
//!
//! Field names on the wire: `token`, `date`, `photo` (file), `observer`,
//! `digitizer`, `sp1`, `sp1alt`, `lat`, `lon`, `site`.

use bytes::{Buf, BufMut};
use chrono::NaiveDate;
use fotoreg_core::{Digitizer, Draft, PhotoRef, Vocabulary};
use futures::TryStreamExt;
use std::collections::HashMap;
use warp::multipart::{FormData, Part};

/// Upper bound for one multipart request
pub const MAX_UPLOAD_BYTES: u64 = 32 * 1024 * 1024;

/// Raw values of one form submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormInput {
    /// Text fields by name
    pub fields: HashMap<String, String>,
    /// Uploaded photo, when a file was chosen
    pub photo: Option<PhotoRef>,
}

impl FormInput {
    /// Read every part of a multipart body
    ///
    /// The photo's bytes are counted and dropped.
    pub async fn read(mut form: FormData) -> Result<Self, warp::Error> {
        let mut input = FormInput::default();
        while let Some(part) = form.try_next().await? {
            let name = part.name().to_string();
            if name == "photo" {
                let filename = part.filename().map(str::to_string);
                let size = count_bytes(part).await?;
                if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                    input.photo = Some(PhotoRef::new(filename).with_size(size));
                }
            } else {
                let bytes = collect_bytes(part).await?;
                input
                    .fields
                    .insert(name, String::from_utf8_lossy(&bytes).into_owned());
            }
        }
        Ok(input)
    }

    /// Turn the raw values into a draft
    ///
    /// Selections that are not in the vocabulary are dropped, as the form
    /// never offers them. When no new file was chosen, `previous_photo`
    /// stays attached.
    #[must_use]
    pub fn into_draft(self, vocabulary: &Vocabulary, previous_photo: Option<PhotoRef>) -> Draft {
        let text = |key: &str| {
            self.fields
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let date = text("date").and_then(|v| {
            parse_or_warn("date", &v, |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        });
        let digitizer = text("digitizer")
            .and_then(|v| parse_or_warn("digitizer", &v, |s| s.parse::<Digitizer>().ok()));
        let latitude = text("lat").and_then(|v| parse_or_warn("lat", &v, parse_decimal));
        let longitude = text("lon").and_then(|v| parse_or_warn("lon", &v, parse_decimal));

        let observer =
            text("observer").and_then(|v| listed("observer", v, |s| vocabulary.has_observer(s)));
        let species = text("sp1").and_then(|v| listed("sp1", v, |s| vocabulary.has_taxon(s)));
        let site = text("site").and_then(|v| listed("site", v, |s| vocabulary.has_site(s)));

        Draft {
            token: self.fields.get("token").filter(|v| !v.is_empty()).cloned(),
            date,
            photo: self.photo.clone().or(previous_photo),
            observer,
            digitizer,
            species,
            species_alt: text("sp1alt"),
            latitude,
            longitude,
            site,
        }
    }
}

fn parse_decimal(value: &str) -> Option<f64> {
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn parse_or_warn<T>(
    field: &'static str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let parsed = parse(value);
    if parsed.is_none() {
        tracing::warn!(field, value, "Ignoring unparseable form value");
    }
    parsed
}

fn listed(field: &'static str, value: String, known: impl Fn(&str) -> bool) -> Option<String> {
    if known(&value) {
        Some(value)
    } else {
        tracing::warn!(field, value = %value, "Ignoring value outside the vocabulary");
        None
    }
}

async fn collect_bytes(part: Part) -> Result<Vec<u8>, warp::Error> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, buf| async move {
            acc.put(buf);
            Ok(acc)
        })
        .await
}

async fn count_bytes(part: Part) -> Result<u64, warp::Error> {
    part.stream()
        .try_fold(0u64, |n, buf| async move { Ok(n + buf.remaining() as u64) })
        .await
}
