/*!
 * Error types for the polypress pipeline.
 *
 * This module contains custom error types for the different layers of the
 * application, using the thiserror crate for ergonomic error definitions:
 * - `ProviderError`: failures reported by a translation engine client
 * - `StoreError`: failures reported by a content-store adapter
 * - `PipelineError`: failures of the translation pipeline itself
 * - `AppError`: top-level error used by the binary
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to a translation engine
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The account's character quota is used up
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The target locale has no equivalent engine language code
    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),
}

impl ProviderError {
    /// Whether a retry of the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Errors that can occur when talking to the content store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error when sending the request fails
    #[error("Content store request failed: {0}")]
    RequestFailed(String),

    /// Error returned by the content store
    #[error("Content store responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error body from the store
        message: String,
    },

    /// Error when the store's response cannot be decoded
    #[error("Failed to parse content store response: {0}")]
    ParseError(String),
}

/// Errors produced by the translation pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required credential or setting is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The canonical entry does not exist
    #[error("Entry not found: {endpoint}/{entry_id} (locale {locale})")]
    NotFound {
        /// Content-type endpoint, e.g. "articles"
        endpoint: String,
        /// Document identifier
        entry_id: String,
        /// Locale the entry was requested in
        locale: String,
    },

    /// A category or tag could not be localized
    #[error("Failed to localize {endpoint}/{document_id} into {locale}: {reason}")]
    DependencyTranslation {
        /// Content-type endpoint of the dependent entity
        endpoint: String,
        /// Document identifier of the dependent entity
        document_id: String,
        /// Locale that could not be created
        locale: String,
        /// Underlying failure
        reason: String,
    },

    /// One chunk of a document could not be translated
    #[error("Chunk {chunk_index} failed to translate into {locale}: {source}")]
    ChunkTranslation {
        /// Position of the chunk in the document
        chunk_index: usize,
        /// Target locale
        locale: String,
        /// Engine failure
        #[source]
        source: ProviderError,
    },

    /// The translated markup can no longer be split into its fields
    #[error("Markup error: {0}")]
    Markup(String),

    /// Error from the content store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from the translation engine
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl PipelineError {
    /// Whether this error aborts a whole invocation
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::NotFound { .. } | Self::Store(_))
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        Self::Pipeline(PipelineError::Provider(error))
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        Self::Pipeline(PipelineError::Store(error))
    }
}
