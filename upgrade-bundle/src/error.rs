//! Error types for bundle construction and inspection

use std::path::{Path, PathBuf};

use crate::layout::Component;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, BundleError>;

/// Everything that can abort building or reading a bundle
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// The flash-size selector is not one of the supported presets
    #[error("flash must be 8 or 16 MB (got `{value}`)")]
    InvalidConfiguration { value: String },

    /// An input could not be read or the output could not be written
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A component does not fit the partition reserved for it
    #[error("{component} image is {size:#x} bytes, partition holds {capacity:#x}")]
    PartitionOverflow {
        component: Component,
        size: u64,
        capacity: u64,
    },

    #[error("manifest encoding: {0}")]
    Manifest(#[from] serde_json::Error),

    /// An existing bundle failed structural checks
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),
}

impl BundleError {
    pub fn invalid_configuration(value: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            value: value.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedBundle(msg.into())
    }
}
