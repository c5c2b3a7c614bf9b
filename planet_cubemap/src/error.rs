//! Error types for the planet cubemap cache
//!
//! This module defines the error types used throughout the crate,
//! including render target creation, pixel extraction, and cache lookups.

use std::fmt;
use crate::device::TextureFormat;

/// Result type for planet cubemap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Planet cubemap errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (device lock, readback failure, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (released target, stale handle, etc.)
    InvalidResource(String),

    /// No graphics device available to create resources
    InvalidContext(String),

    /// Render target dimensions rejected (zero width or height)
    InvalidDimensions {
        width: u32,
        height: u32,
    },

    /// Pixel source is empty or could not be read
    UnreadableSource(String),

    /// Pixel format not supported by the extraction path
    UnsupportedFormat(TextureFormat),

    /// No cache entry under the given key
    KeyNotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InvalidContext(msg) => write!(f, "Invalid context: {}", msg),
            Error::InvalidDimensions { width, height } => {
                write!(f, "Invalid dimensions: {}x{}", width, height)
            }
            Error::UnreadableSource(msg) => write!(f, "Unreadable source: {}", msg),
            Error::UnsupportedFormat(format) => write!(f, "Unsupported format: {:?}", format),
            Error::KeyNotFound(key) => write!(f, "Key not found: '{}'", key),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::BackendError` from it
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("planet::TextureCache", "Device lock poisoned");
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::planet::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with an `Error::BackendError`
///
/// # Example
///
/// ```ignore
/// engine_bail!("planet::MemoryGraphicsDevice", "Upload size mismatch: {}", len);
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
