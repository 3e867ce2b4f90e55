//! # Load-Failure Reporting
//!
//! The loader never propagates an individual project's failure across the
//! task boundary; instead every failure is handed to an [`ErrorLogger`].
//! The trait is deliberately tiny so that embedders can route reports into
//! their own diagnostics pipeline, and so that tests can capture them with
//! a mock implementation.
//!
//! The default implementation formats reports through the `log` facade.

use std::path::PathBuf;

/// Source location attached to a structured descriptor failure.
///
/// Line and column information is 1-based where known; fields the parser
/// could not determine are zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Path of the descriptor the error was found in.
    pub file: PathBuf,
    pub line: u64,
    pub column: u64,
    pub end_line: u64,
    pub end_column: u64,
    /// Short stable error code, e.g. `PG0001`.
    pub code: String,
}

/// Sink for per-project load failures.
///
/// Implementations must not panic: a report is the end of the road for a
/// failed project, and the traversal keeps running regardless.
pub trait ErrorLogger: Send + Sync {
    /// Report a load failure. `location` is present for structured
    /// descriptor errors and absent for generic failures.
    fn log_error(&self, location: Option<&SourceLocation>, message: &str);
}

/// The default `ErrorLogger`, reporting through `log::error!`.
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, location: Option<&SourceLocation>, message: &str) {
        match location {
            Some(loc) => log::error!(
                "{}({},{}): error {}: {}",
                loc.file.display(),
                loc.line,
                loc.column,
                loc.code,
                message
            ),
            None => log::error!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_logger_formats_location() {
        testing_logger::setup();

        let location = SourceLocation {
            file: PathBuf::from("/projects/broken.proj"),
            line: 3,
            column: 7,
            end_line: 0,
            end_column: 0,
            code: "PG0001".to_string(),
        };
        DefaultErrorLogger.log_error(Some(&location), "mapping values are not allowed");

        testing_logger::validate(|captured| {
            assert_eq!(captured.len(), 1);
            assert_eq!(captured[0].level, log::Level::Error);
            assert!(captured[0].body.contains("/projects/broken.proj(3,7)"));
            assert!(captured[0].body.contains("PG0001"));
            assert!(captured[0].body.contains("mapping values are not allowed"));
        });
    }

    #[test]
    fn test_default_logger_plain_message() {
        testing_logger::setup();

        DefaultErrorLogger.log_error(None, "No such file or directory");

        testing_logger::validate(|captured| {
            assert_eq!(captured.len(), 1);
            assert_eq!(captured[0].body, "No such file or directory");
        });
    }
}
