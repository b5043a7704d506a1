// error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("VCF error in {path}: {message}")]
    Vcf { path: PathBuf, message: String },

    #[error("Positions out of order in {path}: {current} follows {previous}. Input must be sorted by position.")]
    UnsortedPositions {
        path: PathBuf,
        previous: u64,
        current: u64,
    },

    #[error("No usable variants found in {path}")]
    NoVariants { path: PathBuf },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("PCA failed for window starting at {window_start}: {message}")]
    Pca { window_start: u64, message: String },
}

impl ClusterError {
    pub fn vcf(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Vcf {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;
