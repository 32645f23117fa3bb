//! Typed errors raised by the application itself.
//!
//! Failures coming from the database, the HTTP client or the tracing exporter
//! travel as [`anyhow::Error`]; this enum only covers conditions the program
//! detects on its own.

/// Application error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The AI solution typed at startup is not one we know how to build.
    #[error("Invalid AI solution: {0}")]
    InvalidBackend(String),

    /// Standard input closed while we were waiting for an answer.
    #[error("Input closed while reading {0}")]
    InputClosed(&'static str),

    /// A setting required by the selected backend is missing or blank.
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    /// A configured endpoint is not a valid URL.
    #[error("Invalid URL for {key}: {source}")]
    InvalidUrl {
        /// Config key holding the URL.
        key: &'static str,
        /// Underlying parse failure.
        #[source]
        source: url::ParseError,
    },

    /// The fake-data price bounds do not describe a usable range.
    #[error("Invalid price range: [{min}, {max})")]
    InvalidPriceRange {
        /// Inclusive lower bound.
        min: f64,
        /// Exclusive upper bound.
        max: f64,
    },

    /// Console I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
