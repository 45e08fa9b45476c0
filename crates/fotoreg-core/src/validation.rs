//! Draft validation
//!
//! Every rule is evaluated on every pass; the returned issues keep the rule
//! order so the message block always reads the same way for the same draft.

use crate::types::{Draft, LATITUDE_RANGE, LONGITUDE_RANGE, MIN_PHOTO_NAME_CHARS};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// A single violated rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationIssue {
    /// Token absent or different from the shared secret
    TokenMismatch,
    /// No observation date
    MissingDate,
    /// Photo present but its name is shorter than the minimum
    PhotoNameTooShort,
    /// No photo attached
    MissingPhoto,
    /// No observer selected
    MissingObserver,
    /// No digitizer selected
    MissingDigitizer,
    /// Neither listed nor free-text species
    MissingSpecies,
    /// No site and incomplete coordinates
    MissingLocation,
    /// Latitude outside the accepted range
    LatitudeOutOfRange,
    /// Longitude outside the accepted range
    LongitudeOutOfRange,
}

impl ValidationIssue {
    /// User-facing message
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::TokenMismatch => "El token de autenticación es incorrecto.".to_string(),
            Self::MissingDate => "La fecha de observación es un campo obligatorio.".to_string(),
            Self::PhotoNameTooShort => {
                "El nombre de la fotografía es sospechosamente pequeño.".to_string()
            }
            Self::MissingPhoto => "No hay fotografía adjudicada a la observación.".to_string(),
            Self::MissingObserver => {
                "El nombre del observador es un campo obligatorio.".to_string()
            }
            Self::MissingDigitizer => "El digitador es un campo obligatorio.".to_string(),
            Self::MissingSpecies => "El nombre de la especie 1 es obligatorio.".to_string(),
            Self::MissingLocation => "Una ubicación geográfica es obligatoria, ya sea 'Sitio' o coordenadas geográficas.".to_string(),
            Self::LatitudeOutOfRange => format!(
                "La latitud debe estar entre {} y {}.",
                LATITUDE_RANGE.start(),
                LATITUDE_RANGE.end()
            ),
            Self::LongitudeOutOfRange => format!(
                "La longitud debe estar entre {} y {}.",
                LONGITUDE_RANGE.start(),
                LONGITUDE_RANGE.end()
            ),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Check a draft against the shared secret and the field rules
///
/// Returns an empty list when the draft may be previewed and saved.
#[must_use]
pub fn validate(draft: &Draft, expected_token: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if !token_matches(draft.token.as_deref(), expected_token) {
        issues.push(ValidationIssue::TokenMismatch);
    }

    if draft.date.is_none() {
        issues.push(ValidationIssue::MissingDate);
    }

    match &draft.photo {
        Some(photo) if photo.name_len() < MIN_PHOTO_NAME_CHARS => {
            issues.push(ValidationIssue::PhotoNameTooShort);
        }
        Some(_) => {}
        None => issues.push(ValidationIssue::MissingPhoto),
    }

    if draft.observer.is_none() {
        issues.push(ValidationIssue::MissingObserver);
    }

    if draft.digitizer.is_none() {
        issues.push(ValidationIssue::MissingDigitizer);
    }

    if draft.chosen_species().is_none() {
        issues.push(ValidationIssue::MissingSpecies);
    }

    if draft.site.is_none() && !draft.has_coordinates() {
        issues.push(ValidationIssue::MissingLocation);
    }

    if draft.latitude.is_some_and(|lat| !LATITUDE_RANGE.contains(&lat)) {
        issues.push(ValidationIssue::LatitudeOutOfRange);
    }

    if draft.longitude.is_some_and(|lon| !LONGITUDE_RANGE.contains(&lon)) {
        issues.push(ValidationIssue::LongitudeOutOfRange);
    }

    issues
}

/// Render issues as the message block shown above the form
#[must_use]
pub fn render_issues(issues: &[ValidationIssue]) -> String {
    let mut out = String::from("# Error\n\n");
    for issue in issues {
        out.push_str(&issue.message());
        out.push_str("\n\n");
    }
    out
}

fn token_matches(given: Option<&str>, expected: &str) -> bool {
    match given {
        Some(given) => bool::from(given.as_bytes().ct_eq(expected.as_bytes())),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Digitizer, PhotoRef};
    use chrono::NaiveDate;

    const TOKEN: &str = "clave-compartida";

    fn complete() -> Draft {
        Draft::new()
            .with_token(TOKEN)
            .with_date(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
            .with_photo(PhotoRef::new("IMG_0001.jpg"))
            .with_observer("Carlos Vargas")
            .with_digitizer(Digitizer::Nelson)
            .with_species("Quercus humboldtii")
            .with_site("Jardín Botánico")
    }

    #[test]
    fn complete_draft_has_no_issues() {
        assert!(validate(&complete(), TOKEN).is_empty());
    }

    #[test]
    fn short_photo_name_is_not_also_missing() {
        let draft = Draft {
            photo: Some(PhotoRef::new("ab")),
            ..complete()
        };
        assert_eq!(
            validate(&draft, TOKEN),
            vec![ValidationIssue::PhotoNameTooShort]
        );
    }

    #[test]
    fn missing_photo_only() {
        let draft = Draft {
            photo: None,
            ..complete()
        };
        assert_eq!(validate(&draft, TOKEN), vec![ValidationIssue::MissingPhoto]);
    }

    #[test]
    fn coordinates_replace_site() {
        let draft = Draft {
            site: None,
            ..complete()
        }
        .with_coordinates(4.66, -74.1);
        assert!(validate(&draft, TOKEN).is_empty());

        let draft = Draft {
            site: None,
            longitude: None,
            ..draft
        };
        assert_eq!(
            validate(&draft, TOKEN),
            vec![ValidationIssue::MissingLocation]
        );
    }

    #[test]
    fn out_of_range_coordinates_are_flagged() {
        let draft = complete().with_coordinates(10.0, -80.0);
        assert_eq!(
            validate(&draft, TOKEN),
            vec![
                ValidationIssue::LatitudeOutOfRange,
                ValidationIssue::LongitudeOutOfRange
            ]
        );
    }

    #[test]
    fn token_comparison_is_exact() {
        assert!(token_matches(Some(TOKEN), TOKEN));
        assert!(!token_matches(Some("clave"), TOKEN));
        assert!(!token_matches(Some("Clave-compartida"), TOKEN));
        assert!(!token_matches(None, TOKEN));
    }

    #[test]
    fn padded_token_is_a_mismatch() {
        let draft = complete().with_token(format!(" {TOKEN} ")).normalized();
        assert_eq!(validate(&draft, TOKEN), vec![ValidationIssue::TokenMismatch]);
    }

    #[test]
    fn render_prefixes_error_heading() {
        let text = render_issues(&[ValidationIssue::MissingDate, ValidationIssue::MissingPhoto]);
        assert_eq!(
            text,
            "# Error\n\nLa fecha de observación es un campo obligatorio.\n\n\
             No hay fotografía adjudicada a la observación.\n\n"
        );
    }
}
