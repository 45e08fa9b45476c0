//! Client tests against a local stand-in for the Sheets REST API.

use fotoreg_core::{Clock, ObservationRow, RowSink, SheetsSettings, SinkError};
use fotoreg_sheets::{SheetError, SheetsClient};
use fotoreg_test_utils::{bogota, complete_draft, FixedClock};
use parking_lot::Mutex;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::Filter;

const KEY: &str = "1AbC-key";
const ACCESS: &str = "ya29.token";

#[derive(Debug, Clone)]
struct Recorded {
    range: String,
    query: HashMap<String, String>,
    auth: String,
    body: Value,
}

fn spawn_service(tabs: &'static [&'static str], deny: bool) -> (SocketAddr, Arc<Mutex<Vec<Recorded>>>) {
    let recorded = Arc::new(Mutex::new(Vec::new()));

    let meta = warp::get()
        .and(warp::path!("v4" / "spreadsheets" / String))
        .and(warp::header::<String>("authorization"))
        .map(move |key: String, auth: String| {
            if deny || key != KEY || auth != format!("Bearer {ACCESS}") {
                return warp::reply::with_status(
                    warp::reply::json(&json!({"error": {"status": "PERMISSION_DENIED"}})),
                    StatusCode::FORBIDDEN,
                );
            }
            let sheets: Vec<Value> = tabs
                .iter()
                .map(|t| json!({"properties": {"title": t}}))
                .collect();
            warp::reply::with_status(warp::reply::json(&json!({ "sheets": sheets })), StatusCode::OK)
        });

    let log = recorded.clone();
    let append = warp::post()
        .and(warp::path!("v4" / "spreadsheets" / String / "values" / String))
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::header::<String>("authorization"))
        .and(warp::body::json())
        .map(
            move |_key: String, range: String, query: HashMap<String, String>, auth: String, body: Value| {
                let mut log = log.lock();
                log.push(Recorded {
                    range,
                    query,
                    auth,
                    body,
                });
                warp::reply::json(&json!({
                    "updates": {"updatedRange": format!("'Nelson'!A{0}:I{0}", log.len() + 1)}
                }))
            },
        );

    let (addr, server) = warp::serve(meta.or(append)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr, recorded)
}

fn client(addr: SocketAddr) -> SheetsClient {
    SheetsClient::new(
        &SheetsSettings {
            api_base: format!("http://{addr}/v4"),
            timeout_secs: 5,
        },
        SecretString::from(KEY),
        SecretString::from(ACCESS),
    )
    .unwrap()
}

fn row() -> ObservationRow {
    let now = FixedClock::at(2025, 3, 10, 21, 0, 0).now().with_timezone(&bogota());
    ObservationRow::from_draft(&complete_draft(), now).unwrap()
}

#[tokio::test]
async fn lists_worksheet_titles() {
    let (addr, _) = spawn_service(&["Angela", "Nelson"], false);
    let titles = client(addr).worksheet_titles().await.unwrap();
    assert_eq!(titles, vec!["Angela", "Nelson"]);
}

#[tokio::test]
async fn appends_row_to_digitizer_tab() {
    let (addr, recorded) = spawn_service(&["Angela", "Nelson"], false);
    let row = row();

    let receipt = client(addr).append_row(row.worksheet(), &row).await.unwrap();
    assert_eq!(receipt.updated_range.as_deref(), Some("'Nelson'!A2:I2"));

    let calls = recorded.lock().clone();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.range, "'Nelson'!A1:append");
    assert_eq!(call.query.get("valueInputOption").map(String::as_str), Some("RAW"));
    assert_eq!(call.query.get("insertDataOption").map(String::as_str), Some("INSERT_ROWS"));
    assert_eq!(call.auth, format!("Bearer {ACCESS}"));
    assert_eq!(
        call.body["values"][0],
        json!([
            "2025-03-10",
            "IMG_0001.jpg",
            "Carlos Vargas",
            "Quercus humboldtii",
            "",
            "",
            "Jardín Botánico",
            "2025-03-10 16:00:00",
            "Nelson"
        ])
    );
}

#[tokio::test]
async fn missing_tab_is_not_created() {
    let (addr, recorded) = spawn_service(&["Angela"], false);
    let row = row();

    let err = client(addr).append_row(row.worksheet(), &row).await.unwrap_err();
    assert!(matches!(err, SinkError::WorksheetNotFound(ref t) if t == "Nelson"));
    assert!(recorded.lock().is_empty());
}

#[tokio::test]
async fn rejected_credentials_surface_as_auth_errors() {
    let (addr, _) = spawn_service(&["Nelson"], true);

    let err = client(addr).worksheet_titles().await.unwrap_err();
    assert!(err.is_auth());
    assert!(matches!(SinkError::from(err), SinkError::Unauthorized(_)));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let (addr, _) = spawn_service(&["Nelson"], false);
    let dead = SocketAddr::from(([127, 0, 0, 1], 1));
    assert_ne!(addr, dead);

    let row = row();
    let err = client(dead).append_row(row.worksheet(), &row).await.unwrap_err();
    assert!(matches!(err, SinkError::Transport(_)));

    let err = client(dead).worksheet_titles().await.unwrap_err();
    assert!(matches!(err, SheetError::Http(_)));
}
