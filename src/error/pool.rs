use std::path::PathBuf;

use thiserror::Error;

use crate::credentials::Tier;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Failed to read credential file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse credential file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No usable credentials in either tier.")]
    Empty,
    #[error("Sample size must be >= 1.")]
    SampleSizeZero,
    #[error("No {tier} credentials available.")]
    EmptyTier { tier: Tier },
}
