//! HTTP routes
//!
//! - `GET /` shows the form for the caller's session
//! - `POST /validar` reads the multipart form, validates it and shows either
//!   the issues or the preview with the save button
//! - `POST /guardar` appends the previewed draft to the digitizer's worksheet
//! - `GET /healthz` liveness probe

use crate::error::ServerError;
use crate::form::{FormInput, MAX_UPLOAD_BYTES};
use crate::render::{render_page, Notice, PageView};
use crate::sessions::{SessionStore, SESSION_COOKIE};
use chrono::FixedOffset;
use fotoreg_core::{
    render_preview, Clock, Draft, DraftPhase, PreviewLine, RowSink, Session, SessionError,
    Vocabulary,
};
use secrecy::{ExposeSecret, SecretString};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;
use warp::http::header::{HeaderValue, SET_COOKIE};
use warp::http::StatusCode;
use warp::multipart::FormData;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Everything the handlers share
pub struct AppState {
    /// Selection lists
    pub vocabulary: Vocabulary,
    /// Token every draft must carry
    pub expected_token: SecretString,
    /// Destination of saved rows
    pub sink: Arc<dyn RowSink>,
    /// Source of submission timestamps
    pub clock: Arc<dyn Clock>,
    /// Zone the timestamps are written in
    pub zone: FixedOffset,
    /// Open sessions
    pub sessions: SessionStore,
}

impl AppState {
    /// State with no open sessions
    #[must_use]
    pub fn new(
        vocabulary: Vocabulary,
        expected_token: SecretString,
        sink: Arc<dyn RowSink>,
        clock: Arc<dyn Clock>,
        zone: FixedOffset,
    ) -> Self {
        Self {
            vocabulary,
            expected_token,
            sink,
            clock,
            zone,
            sessions: SessionStore::new(),
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("taxa", &self.vocabulary.taxa().len())
            .field("zone", &self.zone)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

/// All routes of the form server
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let form = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .and_then(show_form);

    let validar = warp::path!("validar")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
        .and_then(validate_form);

    let guardar = warp::path!("guardar")
        .and(warp::post())
        .and(with_state(state))
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .and_then(save_draft);

    let health = warp::path!("healthz").and(warp::get()).map(|| "ok");

    form.or(validar)
        .or(guardar)
        .or(health)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn show_form(
    state: Arc<AppState>,
    cookie: Option<String>,
) -> Result<Response, Infallible> {
    let (id, handle) = state.sessions.get_or_create(cookie.as_deref());
    let session = handle.lock().await;

    let preview =
        (session.phase() == DraftPhase::Previewed).then(|| render_preview(session.draft()));
    let html = page(&state, &session, preview.as_deref(), None);
    Ok(with_session(html, StatusCode::OK, id))
}

async fn validate_form(
    state: Arc<AppState>,
    cookie: Option<String>,
    form: FormData,
) -> Result<Response, Infallible> {
    let (id, handle) = state.sessions.get_or_create(cookie.as_deref());

    let input = match FormInput::read(form).await {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!(session = %id, error = %e, "Could not read form upload");
            return Ok(failure(ServerError::Upload(e), id));
        }
    };

    let mut session = handle.lock().await;
    let previous_photo = session.draft().photo.clone();
    let draft = input.into_draft(&state.vocabulary, previous_photo);

    let preview = match validate_and_preview(&mut session, draft, &state.expected_token) {
        Ok(preview) => preview,
        Err(e) => return Ok(failure(e.into(), id)),
    };

    let html = page(&state, &session, preview.as_deref(), None);
    Ok(with_session(html, StatusCode::OK, id))
}

fn validate_and_preview(
    session: &mut Session,
    draft: Draft,
    expected_token: &SecretString,
) -> Result<Option<Vec<PreviewLine>>, SessionError> {
    session.update(draft)?;
    if session.validate(expected_token.expose_secret())?.is_empty() {
        Ok(Some(session.preview()?))
    } else {
        Ok(None)
    }
}

async fn save_draft(
    state: Arc<AppState>,
    cookie: Option<String>,
) -> Result<Response, Infallible> {
    let (id, handle) = state.sessions.get_or_create(cookie.as_deref());
    let mut session = handle.lock().await;

    let now = state.clock.now().with_timezone(&state.zone);
    match session.submit(state.sink.as_ref(), now).await {
        Ok(receipt) => {
            let notice = Notice::Saved {
                worksheet: receipt.row.worksheet().to_string(),
            };
            let html = page(&state, &session, None, Some(notice));
            Ok(with_session(html, StatusCode::OK, id))
        }
        Err(e) => {
            let err = ServerError::from(e);
            let status = err.status();
            let (preview, notice) = match &err {
                ServerError::Session(SessionError::Sink(sink)) => (
                    Some(render_preview(session.draft())),
                    Notice::Failure(format!(
                        "No fue posible guardar el registro ({sink}). Los datos se conservan; \
                         intente de nuevo."
                    )),
                ),
                _ => (
                    None,
                    Notice::Info("Valide los datos antes de guardarlos.".to_string()),
                ),
            };
            let html = page(&state, &session, preview.as_deref(), Some(notice));
            Ok(with_session(html, status, id))
        }
    }
}

fn page(
    state: &AppState,
    session: &Session,
    preview: Option<&[PreviewLine]>,
    notice: Option<Notice>,
) -> String {
    render_page(&PageView {
        vocabulary: &state.vocabulary,
        draft: session.draft(),
        issues: session.issues(),
        preview,
        notice,
    })
}

fn failure(err: ServerError, id: Uuid) -> Response {
    tracing::error!(session = %id, error = %err, "Request failed");
    let html = format!(
        "<!DOCTYPE html><html lang=\"es\"><head><meta charset=\"utf-8\"></head><body>\
         <h1>Error</h1><p>{}</p><p><a href=\"/\">Volver al formulario</a></p></body></html>",
        crate::render::escape(&err.to_string())
    );
    with_session(html, err.status(), id)
}

fn with_session(html: String, status: StatusCode, id: Uuid) -> Response {
    let mut response = warp::reply::with_status(warp::reply::html(html), status).into_response();
    let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let status = if rejection.is_not_found() {
        StatusCode::NOT_FOUND
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        StatusCode::PAYLOAD_TOO_LARGE
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        StatusCode::METHOD_NOT_ALLOWED
    } else {
        StatusCode::BAD_REQUEST
    };
    tracing::debug!(?rejection, %status, "Rejected request");

    let body = status.canonical_reason().unwrap_or("error").to_string();
    Ok(warp::reply::with_status(body, status).into_response())
}
