//! HTML rendering of the single form page

use fotoreg_core::{
    render_issues, Digitizer, Draft, PreviewLine, ValidationIssue, Vocabulary, LATITUDE_RANGE,
    LONGITUDE_RANGE,
};

/// Message shown above the form after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Row appended to the named worksheet
    Saved {
        /// Worksheet title
        worksheet: String,
    },
    /// Informational message
    Info(String),
    /// External failure; the draft was kept
    Failure(String),
}

/// Everything the page shows
#[derive(Debug)]
pub struct PageView<'a> {
    /// Selection lists
    pub vocabulary: &'a Vocabulary,
    /// Values to pre-fill
    pub draft: &'a Draft,
    /// Issues from the last validation
    pub issues: &'a [ValidationIssue],
    /// Preview of a clean draft; enables the save button
    pub preview: Option<&'a [PreviewLine]>,
    /// Outcome notice
    pub notice: Option<Notice>,
}

const INTRO: &str = r#"<h1>Jardín Botánico de Bogotá</h1>
<h2>Programa Conservación <em>in situ</em></h2>
<h3>Formato de digitalización de registros de especies a partir de fotografías.</h3>
<h4>Instrucciones</h4>
<p>Insertar las observaciones en la forma abajo. Una vez termine de digitar los datos de una
observación, presione el botón <strong class="red">Validar</strong> para validar los datos. Si
existen errores, un mensaje aparecerá indicando la naturaleza del error. Los datos no serán
guardados si son erróneos, así que deben ser corregidos para que puedan ser guardados.</p>
"#;

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:1rem;font-weight:bold}\
small{display:block;color:#555;font-weight:normal}\
input,select{width:100%;padding:.3rem}\
.red{color:#c00}.errors{background:#eef4ff;padding:1rem}\
.saved{background:#e8f6e8;padding:1rem}.failure{background:#fde8e8;padding:1rem}";

/// Full HTML document
#[must_use]
pub fn render_page(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"es\"><head><meta charset=\"utf-8\">");
    html.push_str("<title>Fotografías - Registro de especies</title>");
    html.push_str(&format!("<style>{STYLE}</style></head><body>\n"));
    html.push_str(INTRO);

    if let Some(notice) = &view.notice {
        html.push_str(&render_notice(notice));
    }

    html.push_str(&render_form(view.vocabulary, view.draft));

    if !view.issues.is_empty() {
        html.push_str(&render_issue_block(view.issues));
    } else if let Some(lines) = view.preview {
        html.push_str(&render_preview_block(lines));
    }

    html.push_str("</body></html>\n");
    html
}

fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Saved { worksheet } => format!(
            "<div class=\"saved\">{}</div>\n",
            escape(&format!("Registro guardado en la hoja '{worksheet}'."))
        ),
        Notice::Info(text) => format!("<div class=\"errors\">{}</div>\n", escape(text)),
        Notice::Failure(text) => format!("<div class=\"failure\">{}</div>\n", escape(text)),
    }
}

fn render_form(vocabulary: &Vocabulary, draft: &Draft) -> String {
    let mut form = String::new();
    form.push_str(
        "<form method=\"post\" action=\"/validar\" enctype=\"multipart/form-data\">\n",
    );

    form.push_str(&text_input(
        "token",
        "Token de autenticación",
        "Token de validación de usuario",
        "password",
        "Digite el token",
        draft.token.as_deref(),
    ));
    form.push_str(&text_input(
        "date",
        "Fecha",
        "Fecha en la cual fue realizada la observación.",
        "date",
        "",
        draft.date.map(|d| d.to_string()).as_deref(),
    ));

    form.push_str(&field_label(
        "photo",
        "Seleccione una fotografía",
        "Fotografía base de observación.",
    ));
    form.push_str("<input type=\"file\" id=\"photo\" name=\"photo\" accept=\"image/*\">\n");
    if let Some(photo) = &draft.photo {
        form.push_str(&format!(
            "<small>Fotografía cargada: {}</small>\n",
            escape(&photo.name)
        ));
    }

    form.push_str(&select(
        "observer",
        "Observador",
        "Persona que tomó la fotografía",
        "Seleccione un investigador",
        vocabulary.observers().iter().map(String::as_str),
        draft.observer.as_deref(),
    ));
    form.push_str(&select(
        "digitizer",
        "Digitalizador",
        "Persona que sistematiza la fotografía",
        "Seleccione un investigador",
        Digitizer::ALL.iter().map(Digitizer::name),
        draft.digitizer.map(|d| d.name()),
    ));
    form.push_str(&select(
        "sp1",
        "Especie",
        "Nombre científico (sin autores) de la especie 1",
        "Digite el nombre científico",
        vocabulary.taxa().iter().map(String::as_str),
        draft.species.as_deref(),
    ));
    form.push_str(&text_input(
        "sp1alt",
        "Especie (si no está en el listado de arriba)",
        "Si el nombre científico de la especie no está en la lista de arriba, digitelo aquí. \
         Verifique la ortografía en una base de datos apropiada (por ejemplo, GBIF).",
        "text",
        "Digite el nombre científico",
        draft.species_alt.as_deref(),
    ));
    form.push_str(&number_input(
        "lat",
        "Latitud",
        "Latitud de la observación en formato decimal (e.g., 3.09284)",
        (*LATITUDE_RANGE.start(), *LATITUDE_RANGE.end()),
        draft.latitude,
    ));
    form.push_str(&number_input(
        "lon",
        "Longitud",
        "Longitud de la observación en formato decimal (e.g., -77.2360184)",
        (*LONGITUDE_RANGE.start(), *LONGITUDE_RANGE.end()),
        draft.longitude,
    ));
    form.push_str(&select(
        "site",
        "Sitio",
        "Sitio (parque, localidad, etc.) donde se realizó la observación.",
        "Seleccione un sitio",
        vocabulary.sites().iter().map(String::as_str),
        draft.site.as_deref(),
    ));

    form.push_str("<p><button type=\"submit\">Validar</button></p>\n</form>\n");
    form
}

fn render_issue_block(issues: &[ValidationIssue]) -> String {
    let mut block = String::from("<div class=\"errors\">\n");
    for chunk in render_issues(issues).split("\n\n").filter(|c| !c.is_empty()) {
        match chunk.strip_prefix("# ") {
            Some(heading) => block.push_str(&format!("<h1>{}</h1>\n", escape(heading))),
            None => block.push_str(&format!("<p>{}</p>\n", escape(chunk))),
        }
    }
    block.push_str("</div>\n");
    block
}

fn render_preview_block(lines: &[PreviewLine]) -> String {
    let mut block = String::from("<div class=\"preview\">\n");
    for line in lines {
        block.push_str(&format!("<p>{}</p>\n", escape(&line.to_string())));
    }
    block.push_str(
        "<p>Si los datos arriba son correctos, presione el botón \
         <strong class=\"red\">Guardar</strong> para enviar los datos.</p>\n\
         <form method=\"post\" action=\"/guardar\"><button type=\"submit\">Guardar</button></form>\n",
    );
    block.push_str("</div>\n");
    block
}

fn field_label(name: &str, label: &str, help: &str) -> String {
    format!(
        "<label for=\"{name}\">{}<small>{}</small></label>\n",
        escape(label),
        escape(help)
    )
}

fn text_input(
    name: &str,
    label: &str,
    help: &str,
    kind: &str,
    placeholder: &str,
    value: Option<&str>,
) -> String {
    format!(
        "{}<input type=\"{kind}\" id=\"{name}\" name=\"{name}\" placeholder=\"{}\" value=\"{}\">\n",
        field_label(name, label, help),
        escape(placeholder),
        escape(value.unwrap_or_default())
    )
}

fn number_input(
    name: &str,
    label: &str,
    help: &str,
    (min, max): (f64, f64),
    value: Option<f64>,
) -> String {
    format!(
        "{}<input type=\"number\" id=\"{name}\" name=\"{name}\" placeholder=\"{label}\" \
         min=\"{min}\" max=\"{max}\" step=\"0.00001\" value=\"{}\">\n",
        field_label(name, label, help),
        value.map(|v| v.to_string()).unwrap_or_default()
    )
}

fn select<'a>(
    name: &str,
    label: &str,
    help: &str,
    placeholder: &str,
    options: impl Iterator<Item = &'a str>,
    selected: Option<&str>,
) -> String {
    let mut html = field_label(name, label, help);
    html.push_str(&format!(
        "<select id=\"{name}\" name=\"{name}\">\n<option value=\"\">{}</option>\n",
        escape(placeholder)
    ));
    for option in options {
        let mark = if selected == Some(option) { " selected" } else { "" };
        let option = escape(option);
        html.push_str(&format!("<option value=\"{option}\"{mark}>{option}</option>\n"));
    }
    html.push_str("</select>\n");
    html
}

/// Escape text for HTML content and attribute values
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
