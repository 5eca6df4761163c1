use std::path::PathBuf;
use thiserror::Error;

use crate::classfile::ClassParseError;

/// Failure taxonomy for the scanner core.
///
/// All three scanner failures propagate immediately; classpath/runtime skew
/// is not transient, so nothing here is retried or downgraded to a default.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot resolve {name}: {detail}")]
    Resolution { name: String, detail: String },

    #[error("access denied for {path}: {source}")]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("structural mismatch on {element}: {detail}")]
    StructuralMismatch { element: String, detail: String },

    #[error("malformed class file {origin}: {source}")]
    Malformed {
        origin: String,
        #[source]
        source: ClassParseError,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error on {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl ScanError {
    pub fn resolution(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Resolution {
            name: name.into(),
            detail: detail.into(),
        }
    }

    pub fn mismatch(element: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            element: element.into(),
            detail: detail.into(),
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
