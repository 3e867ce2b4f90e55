//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `project-graph` crate. It uses the `thiserror` library to create an
//! `Error` enum covering the failure modes of the fallible public APIs,
//! providing clear and descriptive error messages.
//!
//! Note that individual project-load failures during graph traversal are
//! deliberately *not* represented here: the loader never propagates them
//! across the task boundary. They are modeled by the tagged
//! [`ParseFailure`](crate::model::ParseFailure) type and reported through
//! the [`ErrorLogger`](crate::logger::ErrorLogger) seam instead.

use thiserror::Error;

/// Main error type for project-graph operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while reading a package manifest file.
    #[error("Manifest error in {path}: {message}")]
    Manifest { path: String, message: String },

    /// An error occurred while writing the generated property file.
    #[error("Property file error: {message}")]
    PropertyFile { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
