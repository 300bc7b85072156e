//! Error types for estatura operations.
//!
//! The pipeline is all-or-nothing: any error aborts the run. There are no
//! retries and no partial-failure handling.

use std::fmt;
use std::path::PathBuf;

/// Main error type for estatura operations.
///
/// # Examples
///
/// ```
/// use estatura::error::EstaturaError;
///
/// let err = EstaturaError::SchemaMismatch {
///     expected: "date,time_hours,height_cm".to_string(),
///     found: "date,height".to_string(),
/// };
/// assert!(err.to_string().contains("schema mismatch"));
/// ```
#[derive(Debug)]
pub enum EstaturaError {
    /// File could not be opened or read.
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A CSV row or field failed to parse.
    CsvParse {
        /// 1-based line number in the file
        line: usize,
        /// Column the failure occurred in
        column: String,
        /// Parser message
        message: String,
    },

    /// Header columns differ from the expected fixed schema.
    SchemaMismatch {
        /// Expected header
        expected: String,
        /// Header actually found
        found: String,
    },

    /// Invalid prior or sampler setting.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// A computation was given no data to work on.
    EmptyData {
        /// What was empty
        context: String,
    },

    /// Plot rendering failed in the drawing backend.
    Plot(String),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for EstaturaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstaturaError::Io { path, source } => {
                write!(f, "I/O error reading {}: {source}", path.display())
            }
            EstaturaError::CsvParse {
                line,
                column,
                message,
            } => {
                write!(
                    f,
                    "CSV parse error at line {line}, column '{column}': {message}"
                )
            }
            EstaturaError::SchemaMismatch { expected, found } => {
                write!(
                    f,
                    "CSV schema mismatch: expected header '{expected}', found '{found}'"
                )
            }
            EstaturaError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            EstaturaError::EmptyData { context } => write!(f, "empty input: {context}"),
            EstaturaError::Plot(msg) => write!(f, "Plot rendering failed: {msg}"),
            EstaturaError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EstaturaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EstaturaError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<&str> for EstaturaError {
    fn from(msg: &str) -> Self {
        EstaturaError::Other(msg.to_string())
    }
}

impl From<String> for EstaturaError {
    fn from(msg: String) -> Self {
        EstaturaError::Other(msg)
    }
}

impl EstaturaError {
    /// Create an I/O error tagged with the offending path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an empty-input error.
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::EmptyData {
            context: context.to_string(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, EstaturaError>;
