//! Error types for the liqmon core library.
//!
//! Report generation never fails: empty inputs, parse failures and malformed
//! rules are absorbed into documented default values by each component. The
//! errors here cover the edges of the library instead, where tables are built
//! from external input, configuration is loaded, and reports are written.

use thiserror::Error;

use crate::table::TableError;

/// Main error type for liqmon operations.
#[derive(Debug, Error)]
pub enum LiqmonError {
    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A table could not be built from the supplied data
    #[error("Invalid table for source '{source_name}'")]
    Table {
        source_name: String,
        #[source]
        source: TableError,
    },

    /// Input document did not have the expected shape
    #[error("Malformed input: {context}")]
    MalformedInput { context: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with LiqmonError
pub type Result<T> = std::result::Result<T, LiqmonError>;

impl LiqmonError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a table construction error for the named source
    pub fn table(source_name: impl Into<String>, error: TableError) -> Self {
        Self::Table {
            source_name: source_name.into(),
            source: error,
        }
    }

    /// Creates a malformed input error
    pub fn malformed_input(context: impl Into<String>) -> Self {
        Self::MalformedInput {
            context: context.into(),
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, error: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source: error,
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, error: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = LiqmonError::configuration("weights must sum to 1.0");
        assert!(error.to_string().contains("weights must sum to 1.0"));

        let error = LiqmonError::malformed_input("expected an object of sources");
        assert!(error.to_string().contains("expected an object of sources"));
    }

    #[test]
    fn test_table_error_names_source() {
        let error = LiqmonError::table(
            "ecb_data",
            TableError::DuplicateColumn {
                column: "date".to_string(),
            },
        );
        assert_eq!(error.to_string(), "Invalid table for source 'ecb_data'");

        // The cause is reachable through the source chain, not the message
        let cause = std::error::Error::source(&error).unwrap();
        assert!(cause.to_string().contains("date"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = LiqmonError::io("Failed to read sources.json", inner);
        assert!(std::error::Error::source(&error).is_some());
        assert!(error.to_string().contains("sources.json"));
    }
}
