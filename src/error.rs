use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a supported image (JPEG, PNG, WebP or GIF)", path.display())]
    NotAnImage { path: PathBuf },

    #[error("{} is {size} bytes, over the {limit} byte upload limit", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("inference request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Typst compilation failed: {0}")]
    Typst(String),
}
