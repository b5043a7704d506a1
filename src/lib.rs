// lib.rs

//! Sliding-window PCA and Ward hierarchical clustering of haplotypes from a
//! single-chromosome VCF. Each window reports per-sample principal components,
//! the silhouette-chosen merge distance and the resulting cluster label.

pub mod analysis;
pub mod cli;
pub mod clustering;
pub mod dosage;
pub mod error;
pub mod output_writer;
pub mod params;
pub mod pca_runner;
pub mod pipeline;
pub mod vcf;
pub mod windows;

pub use error::{ClusterError, Result};
pub use params::AnalysisParams;
pub use pipeline::{run_pipeline, RunSummary};
