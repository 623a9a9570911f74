//! Copies daily WHOOP and MyFitnessPal metrics into the weekly tabs of a tracking
//! spreadsheet, walking forward from a start date until today.

pub mod args;
pub mod auth;
pub mod cfg;
pub mod coord;
pub mod csv_sink;
pub mod cursor;
pub mod error;
pub mod field_map;
pub mod job;
pub mod metric;
pub mod mfp;
pub mod plan;
pub mod sheets;
pub mod token;
pub mod walker;
pub mod whoop;

pub use error::{MappingMiss, SyncError};
