//! fotoreg server - the web form in front of the observation workflow
//!
//! Serves one page per user session. The user fills in the form, validates
//! it, checks the preview and saves; the saved observation lands as a new
//! row in the worksheet named after the digitizer.

#![warn(unreachable_pub)]

pub mod error;
pub mod form;
pub mod render;
pub mod routes;
pub mod sessions;

pub use error::ServerError;
pub use routes::{routes, AppState};
pub use sessions::{SessionStore, SESSION_COOKIE};

use fotoreg_core::Digitizer;
use fotoreg_sheets::{SheetError, SheetsClient};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

/// Digitizers whose worksheet is missing from the spreadsheet
pub async fn missing_worksheets(client: &SheetsClient) -> Result<Vec<Digitizer>, SheetError> {
    let titles = client.worksheet_titles().await?;
    Ok(Digitizer::ALL
        .iter()
        .copied()
        .filter(|d| !titles.iter().any(|t| t == d.name()))
        .collect())
}

/// Bind the form server and run it until `shutdown` resolves
pub async fn serve(
    state: Arc<AppState>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(addr = %bound, "Form server listening");
    server.await;
    tracing::info!("Form server stopped");
    Ok(())
}
