//! Confirmation preview of a clean draft

use crate::types::Draft;
use serde::Serialize;

/// One labelled value shown before saving
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewLine {
    /// Field label
    pub label: &'static str,
    /// Rendered value
    pub value: String,
}

impl std::fmt::Display for PreviewLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: '{}'", self.label, self.value)
    }
}

/// Lines for every filled-in field, in form order
///
/// The token is never part of the preview.
#[must_use]
pub fn render_preview(draft: &Draft) -> Vec<PreviewLine> {
    let mut lines = Vec::new();
    let mut push = |label: &'static str, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            lines.push(PreviewLine { label, value });
        }
    };

    push("Fecha observación", draft.date.map(|d| d.to_string()));
    push(
        "Nombre de la fotografía",
        draft.photo.as_ref().map(|p| p.name.clone()),
    );
    push("Observador", draft.observer.clone());
    push("Digitador", draft.digitizer.map(|d| d.name().to_string()));
    push("Especie", draft.chosen_species().map(str::to_string));
    // zero is falsy on the form, and outside the accepted range anyway
    push(
        "Latitud",
        draft.latitude.filter(|v| *v != 0.0).map(|v| v.to_string()),
    );
    push(
        "Longitud",
        draft.longitude.filter(|v| *v != 0.0).map(|v| v.to_string()),
    );
    push("Sitio", draft.site.clone());

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Digitizer, PhotoRef};
    use chrono::NaiveDate;

    #[test]
    fn preview_skips_empty_fields_and_token() {
        let draft = Draft::new()
            .with_token("secreto")
            .with_date(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
            .with_photo(PhotoRef::new("IMG_0001.jpg"))
            .with_digitizer(Digitizer::Angela)
            .with_coordinates(4.6097, -74.0817);

        let text: Vec<String> = render_preview(&draft).iter().map(ToString::to_string).collect();
        assert_eq!(
            text,
            vec![
                "Fecha observación: '2025-03-10'",
                "Nombre de la fotografía: 'IMG_0001.jpg'",
                "Digitador: 'Angela'",
                "Latitud: '4.6097'",
                "Longitud: '-74.0817'",
            ]
        );
    }

    #[test]
    fn preview_is_idempotent() {
        let draft = Draft::new().with_species_alt("Espeletia grandiflora");
        assert_eq!(render_preview(&draft), render_preview(&draft));
        assert_eq!(render_preview(&draft)[0].value, "Espeletia grandiflora");
    }
}
