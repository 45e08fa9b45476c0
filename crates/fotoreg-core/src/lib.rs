//! fotoreg core - species-observation photo registry
//!
//! The whole workflow for one form:
//! - Loads controlled vocabularies for the selection lists
//! - Validates an observation draft against the field rules
//! - Renders a confirmation preview
//! - Appends the confirmed observation to a spreadsheet worksheet
//!
//! # Example
//!
//! ```rust,ignore
//! use fotoreg_core::{Session, Draft, SystemClock, Clock};
//!
//! # async fn example(sink: &dyn fotoreg_core::RowSink) -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new();
//! session.update(Draft::new().with_observer("Carlos Vargas"))?;
//!
//! if session.validate("token")?.is_empty() {
//!     for line in session.preview()? {
//!         println!("{line}");
//!     }
//!     let now = SystemClock.now().fixed_offset();
//!     session.submit(sink, now).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod api;
pub mod config;
pub mod error;
pub mod phase;
pub mod preview;
pub mod session;
pub mod types;
pub mod validation;
pub mod vocabulary;

pub use api::{
    AppendReceipt, CellValue, Clock, ObservationRow, RowSink, SystemClock, TIMESTAMP_FORMAT,
};
pub use config::{AppConfig, Secrets, SheetsSettings};
pub use error::{ConfigError, SessionError, SinkError, VocabularyError};
pub use phase::DraftPhase;
pub use preview::{render_preview, PreviewLine};
pub use session::{Session, SubmitReceipt};
pub use types::{Digitizer, Draft, PhotoRef, LATITUDE_RANGE, LONGITUDE_RANGE};
pub use validation::{render_issues, validate, ValidationIssue};
pub use vocabulary::Vocabulary;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
