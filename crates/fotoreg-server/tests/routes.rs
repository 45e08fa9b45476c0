//! End-to-end form flows through the warp routes.

use bytes::Bytes;
use fotoreg_core::{RowSink, SinkError};
use fotoreg_server::{routes, AppState, SESSION_COOKIE};
use fotoreg_test_utils::{bogota, sample_vocabulary, FixedClock, MemorySheet, TEST_TOKEN};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;
use warp::http::StatusCode;

const BOUNDARY: &str = "fotoreg-test-boundary";
const JPEG: &[u8] = b"\xff\xd8\xff\xe0jpeg";

struct Harness {
    state: Arc<AppState>,
    sheet: Arc<MemorySheet>,
}

impl Harness {
    fn new() -> Self {
        let sheet = Arc::new(MemorySheet::default());
        let sink: Arc<dyn RowSink> = sheet.clone();
        let state = Arc::new(AppState::new(
            sample_vocabulary(),
            SecretString::from(TEST_TOKEN),
            sink,
            Arc::new(FixedClock::at(2025, 3, 10, 21, 15, 42)),
            bogota(),
        ));
        Self { state, sheet }
    }

    async fn get(&self, cookie: Option<&str>) -> Reply {
        let mut req = warp::test::request().method("GET").path("/");
        if let Some(cookie) = cookie {
            req = req.header("cookie", format!("{SESSION_COOKIE}={cookie}"));
        }
        Reply::from(req.reply(&routes(self.state.clone())).await)
    }

    async fn validate(&self, cookie: Option<&str>, body: Vec<u8>) -> Reply {
        let mut req = warp::test::request()
            .method("POST")
            .path("/validar")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body);
        if let Some(cookie) = cookie {
            req = req.header("cookie", format!("{SESSION_COOKIE}={cookie}"));
        }
        Reply::from(req.reply(&routes(self.state.clone())).await)
    }

    async fn save(&self, cookie: &str) -> Reply {
        let req = warp::test::request()
            .method("POST")
            .path("/guardar")
            .header("cookie", format!("{SESSION_COOKIE}={cookie}"));
        Reply::from(req.reply(&routes(self.state.clone())).await)
    }
}

struct Reply {
    status: StatusCode,
    session: Option<String>,
    body: String,
}

impl From<warp::http::Response<Bytes>> for Reply {
    fn from(response: warp::http::Response<Bytes>) -> Self {
        let session = response
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .and_then(|v| v.strip_prefix(&format!("{SESSION_COOKIE}=")))
            .map(str::to_string);
        Self {
            status: response.status(),
            session,
            body: String::from_utf8_lossy(response.body()).into_owned(),
        }
    }
}

fn multipart(fields: &[(&str, &str)], photo: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; \
                 filename=\"{filename}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn complete_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("token", TEST_TOKEN),
        ("date", "2025-03-10"),
        ("observer", "Carlos Vargas"),
        ("digitizer", "Nelson"),
        ("sp1", "Quercus humboldtii"),
        ("sp1alt", ""),
        ("lat", ""),
        ("lon", ""),
        ("site", "Jardín Botánico"),
    ]
}

#[tokio::test]
async fn form_page_opens_a_session() {
    let h = Harness::new();
    let reply = h.get(None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.session.is_some());
    assert!(reply.body.contains("Token de autenticación"));
    assert!(reply.body.contains("<option value=\"Juliana Zuluaga\">"));
    assert!(reply.body.contains("<option value=\"Turdus fuscater\">"));
    assert!(!reply.body.contains("action=\"/guardar\""));
    assert_eq!(h.state.sessions.len(), 1);
}

#[tokio::test]
async fn validate_preview_and_save() {
    let h = Harness::new();
    let body = multipart(&complete_fields(), Some(("IMG_0001.jpg", JPEG)));
    let reply = h.validate(None, body).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Nombre de la fotografía: &#39;IMG_0001.jpg&#39;"));
    assert!(reply.body.contains("Especie: &#39;Quercus humboldtii&#39;"));
    assert!(reply.body.contains("action=\"/guardar\""));

    let cookie = reply.session.unwrap();
    let saved = h.save(&cookie).await;
    assert_eq!(saved.status, StatusCode::OK);
    assert!(saved.body.contains("Registro guardado en la hoja &#39;Nelson&#39;."));
    assert!(!saved.body.contains("action=\"/guardar\""));

    let rows = h.sheet.rows("Nelson");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        serde_json::Value::Array(rows[0].to_values()),
        json!([
            "2025-03-10",
            "IMG_0001.jpg",
            "Carlos Vargas",
            "Quercus humboldtii",
            "",
            "",
            "Jardín Botánico",
            "2025-03-10 16:15:42",
            "Nelson"
        ])
    );

    // the session starts over with an empty form
    let page = h.get(Some(&cookie)).await;
    assert!(!page.body.contains("Fotografía cargada"));
}

#[tokio::test]
async fn issues_block_the_save_button() {
    let h = Harness::new();
    let fields: Vec<_> = complete_fields()
        .into_iter()
        .filter(|(name, _)| *name != "date")
        .collect();
    let reply = h.validate(None, multipart(&fields, Some(("IMG_0001.jpg", JPEG)))).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("<h1>Error</h1>"));
    assert!(reply.body.contains("La fecha de observación es un campo obligatorio."));
    assert!(!reply.body.contains("action=\"/guardar\""));
    // entered values stay in the form
    assert!(reply.body.contains("<option value=\"Carlos Vargas\" selected>"));

    let saved = h.save(&reply.session.unwrap()).await;
    assert_eq!(saved.status, StatusCode::CONFLICT);
    assert_eq!(h.sheet.total_rows(), 0);
}

#[tokio::test]
async fn wrong_token_is_reported() {
    let h = Harness::new();
    let mut fields = complete_fields();
    fields[0] = ("token", "otra-clave");
    let reply = h.validate(None, multipart(&fields, Some(("IMG_0001.jpg", JPEG)))).await;

    assert!(reply.body.contains("<h1>Error</h1>"));
    assert!(!reply.body.contains("action=\"/guardar\""));
}

#[tokio::test]
async fn padded_token_is_reported() {
    let h = Harness::new();
    let padded = format!(" {TEST_TOKEN} ");
    let fields: Vec<(&str, &str)> = complete_fields()
        .into_iter()
        .map(|(name, value)| if name == "token" { (name, padded.as_str()) } else { (name, value) })
        .collect();
    let reply = h.validate(None, multipart(&fields, Some(("IMG_0001.jpg", JPEG)))).await;

    assert!(reply.body.contains("El token de autenticación es incorrecto."));
    assert!(!reply.body.contains("action=\"/guardar\""));
}

#[tokio::test]
async fn uploaded_photo_survives_a_correction() {
    let h = Harness::new();
    let fields: Vec<_> = complete_fields()
        .into_iter()
        .filter(|(name, _)| *name != "observer")
        .collect();
    let first = h.validate(None, multipart(&fields, Some(("IMG_0042.jpg", JPEG)))).await;
    assert!(first.body.contains("Fotografía cargada: IMG_0042.jpg"));
    let cookie = first.session.unwrap();

    let second = h.validate(Some(&cookie), multipart(&complete_fields(), None)).await;
    assert!(second.body.contains("Nombre de la fotografía: &#39;IMG_0042.jpg&#39;"));
    assert!(second.body.contains("action=\"/guardar\""));
}

#[tokio::test]
async fn failed_save_keeps_the_draft_for_a_retry() {
    let h = Harness::new();
    let reply = h
        .validate(None, multipart(&complete_fields(), Some(("IMG_0001.jpg", JPEG))))
        .await;
    let cookie = reply.session.unwrap();

    h.sheet.fail_next(SinkError::Transport("connection reset".into()));
    let failed = h.save(&cookie).await;
    assert_eq!(failed.status, StatusCode::BAD_GATEWAY);
    assert!(failed.body.contains("No fue posible guardar el registro"));
    assert!(failed.body.contains("action=\"/guardar\""));
    assert_eq!(h.sheet.total_rows(), 0);

    let retried = h.save(&cookie).await;
    assert_eq!(retried.status, StatusCode::OK);
    assert_eq!(h.sheet.rows("Nelson").len(), 1);
}

#[tokio::test]
async fn health_and_unknown_paths() {
    let h = Harness::new();
    let filter = routes(h.state.clone());

    let health = warp::test::request().path("/healthz").reply(&filter).await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.body().as_ref(), b"ok");

    let missing = warp::test::request().path("/nada").reply(&filter).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let wrong_method = warp::test::request().path("/guardar").reply(&filter).await;
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
}
