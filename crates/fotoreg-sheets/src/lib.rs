//! Google Sheets destination for observation rows
//!
//! [`SheetsClient`] implements [`fotoreg_core::RowSink`]: each digitizer's
//! rows go to the worksheet titled with the digitizer's name.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod client;
pub mod error;

pub use client::SheetsClient;
pub use error::SheetError;
