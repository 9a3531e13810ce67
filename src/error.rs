//! Error types for the scan intake pipeline

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes, used by callers to decide between "fix the input"
/// and "try again later".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The bundle or request is invalid; retrying the same input fails again
    Validation,
    /// The hardware-lister tree could not be read as a tree at all
    Extraction,
    /// The addressed record does not exist
    NotFound,
    /// The addressed record already exists
    Conflict,
    /// The persistent store is unavailable; the caller may retry
    Transient,
    /// Configuration or programming error
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Extraction => write!(f, "extraction"),
            ErrorCategory::NotFound => write!(f, "not_found"),
            ErrorCategory::Conflict => write!(f, "conflict"),
            ErrorCategory::Transient => write!(f, "transient"),
            ErrorCategory::Internal => write!(f, "internal"),
        }
    }
}

/// Errors that can occur while ingesting scan bundles and managing drives
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Bundle Validation Errors
    // =========================================================================
    /// Schema identifier absent or not the supported version
    #[error("Schema mismatch: expected '{expected}', found {}", describe_found(.found))]
    SchemaMismatch {
        expected: String,
        found: Option<String>,
    },

    /// A required field is absent
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// The bundle's intake asset differs from the upload target
    #[error("Asset mismatch: upload targets '{expected}' but bundle names '{found}'")]
    AssetMismatch { expected: String, found: String },

    /// The raw payload exceeds the configured ceiling
    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The payload is not a JSON object
    #[error("Malformed bundle: {0}")]
    MalformedBundle(String),

    // =========================================================================
    // Extraction Errors
    // =========================================================================
    /// The hardware-lister source cannot be read as a tree
    #[error("Malformed hardware tree: {0}")]
    MalformedTree(String),

    // =========================================================================
    // Drive Inventory Errors
    // =========================================================================
    /// Status change addressed a drive the asset does not have
    #[error("Drive status target not found: serial '{serial}' on asset '{asset_id}'")]
    DriveStatusTargetNotFound { asset_id: String, serial: String },

    /// Manual entry collided with an existing (asset, serial) record
    #[error("Drive already exists: serial '{serial}' on asset '{asset_id}'")]
    DriveAlreadyExists { asset_id: String, serial: String },

    /// Drive input without a usable identity
    #[error("Invalid drive: {0}")]
    InvalidDrive(String),

    // =========================================================================
    // Infrastructure Errors
    // =========================================================================
    /// Persistent store unavailable
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_found(found: &Option<String>) -> String {
    match found {
        Some(schema) => format!("'{}'", schema),
        None => "nothing".to_string(),
    }
}

impl Error {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::SchemaMismatch { .. }
            | Error::MissingField(_)
            | Error::AssetMismatch { .. }
            | Error::PayloadTooLarge { .. }
            | Error::MalformedBundle(_)
            | Error::InvalidDrive(_) => ErrorCategory::Validation,
            Error::MalformedTree(_) => ErrorCategory::Extraction,
            Error::DriveStatusTargetNotFound { .. } => ErrorCategory::NotFound,
            Error::DriveAlreadyExists { .. } => ErrorCategory::Conflict,
            Error::StoreUnavailable(_) => ErrorCategory::Transient,
            Error::Config(_)
            | Error::Serialization(_)
            | Error::Io(_)
            | Error::Metrics(_)
            | Error::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// True when the caller may reasonably retry the same request.
    pub fn is_transient(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    /// Short machine-readable name of the variant, used in audit details.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::SchemaMismatch { .. } => "SchemaMismatch",
            Error::MissingField(_) => "MissingField",
            Error::AssetMismatch { .. } => "AssetMismatch",
            Error::PayloadTooLarge { .. } => "PayloadTooLarge",
            Error::MalformedBundle(_) => "MalformedBundle",
            Error::MalformedTree(_) => "MalformedTree",
            Error::DriveStatusTargetNotFound { .. } => "DriveStatusTargetNotFound",
            Error::DriveAlreadyExists { .. } => "DriveAlreadyExists",
            Error::InvalidDrive(_) => "InvalidDrive",
            Error::StoreUnavailable(_) => "StoreUnavailable",
            Error::Config(_) => "Config",
            Error::Serialization(_) => "Serialization",
            Error::Io(_) => "Io",
            Error::Metrics(_) => "Metrics",
            Error::Internal(_) => "Internal",
        }
    }
}
