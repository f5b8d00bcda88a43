//! Error types for rasterfn.
//!
//! Uses thiserror for structured errors with context. Errors are split by
//! the phase they abort:
//! - Configuration errors abort the whole run before any tile is processed
//! - Tile errors abort a single tile call, with no partial result
//! - Connector errors come from zonal attribute lookups and abort the tile
//!   that issued the query

use thiserror::Error;

/// Top-level error type for rasterfn.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum RasterFnError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Tile error: {0}")]
    Tile(#[from] TileError),

    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Run file error: {0}")]
    RunFile(#[from] toml::de::Error),

    #[error("Raster function '{0}' is not registered")]
    UnknownFunction(String),

    #[error("{0}")]
    Other(String),
}

/// Errors from configuration derivation and output negotiation.
///
/// Raised once per run, before any tile is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Invalid parameter '{parameter}': {error}")]
    InvalidParameter { parameter: String, error: String },

    #[error("Band index {band} is out of range for a raster with {band_count} band(s)")]
    BandOutOfRange { band: usize, band_count: usize },

    #[error("Required raster '{0}' was not supplied")]
    MissingRaster(String),

    #[error("{0}")]
    Other(String),
}

/// Errors from a single per-tile computation.
#[derive(Error, Debug)]
pub enum TileError {
    #[error("Missing pixel block for raster '{0}'")]
    MissingInput(String),

    #[error("Raster '{input}' has {got} band(s) in this tile, expected {expected}")]
    BandCountMismatch {
        input: String,
        expected: usize,
        got: usize,
    },

    #[error("Pixel block shape {got:?} does not match {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Zonal attributes lookup failed: {0}")]
    Connector(#[from] ConnectorError),
}

/// Errors from zonal attributes connectors.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Failed to read table {path}: {error}")]
    Io { path: String, error: String },

    #[error("Request to {url} failed: {error}")]
    Http { url: String, error: String },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Service error {code}: {message}")]
    Service { code: i64, message: String },

    #[error("Malformed zonal attributes response: {0}")]
    Parse(String),

    #[error("Unsupported filter expression: {0}")]
    Filter(String),
}

/// A zone-map literal that could not be parsed.
///
/// Never surfaced to callers of a raster function: it only signals that the
/// zonal attributes source is a table reference rather than a literal.
#[derive(Error, Debug)]
pub enum LiteralError {
    #[error("Not a zone-map literal: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("Zone-map literal must be a JSON object")]
    NotAnObject,

    #[error("Zone '{zone}' is not an array of attribute rows")]
    InvalidRows { zone: String },
}

// ============================================================================
// Error Utilities
// ============================================================================

impl ConfigurationError {
    /// Get the parameter this error refers to, if any.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            ConfigurationError::InvalidParameter { parameter, .. } => Some(parameter),
            ConfigurationError::MissingRaster(name) => Some(name),
            _ => None,
        }
    }

    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            ConfigurationError::BandOutOfRange { band_count, .. } => Some(format!(
                "Choose a band index between 1 and {}",
                band_count
            )),
            ConfigurationError::MissingRaster(name) => {
                Some(format!("Supply a raster for the '{}' parameter", name))
            }
            ConfigurationError::InvalidParameter { parameter, error } => {
                Some(format!("Adjust '{}': {}", parameter, error))
            }
            ConfigurationError::Other(_) => None,
        }
    }
}

impl ConnectorError {
    /// Check if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::Http { .. } => true,
            ConnectorError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Result type alias for rasterfn operations.
pub type RasterFnResult<T> = Result<T, RasterFnError>;

/// Result type alias for configuration derivation and negotiation.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

/// Result type alias for per-tile computation.
pub type TileResult<T> = Result<T, TileError>;
