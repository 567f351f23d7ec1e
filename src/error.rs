use thiserror::Error;

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::source::SourceError;
use crate::store::StoreError;

/// Any failure the binaries can run into.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}
