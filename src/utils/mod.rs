//! Utility modules shared by the loader and the wide table
//!
//! - Frame helpers: delimited-file reading and writing, header
//!   normalization and column validation

pub mod frame_helpers;

// Re-export commonly used helpers
pub use frame_helpers::{
    column_names, find_column, normalize_column_name, read_delimited, require_column,
    string_values, write_frame,
};
