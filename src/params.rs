// params.rs

use crate::cli::CliArgs;
use crate::error::{ClusterError, Result};
use log::info;
use std::path::PathBuf;

/// Number of principal components reported per window.
pub const PCA_COMPONENTS: usize = 2;

/// Merge distance used when the silhouette search hits a degenerate labeling.
pub const FALLBACK_DISTANCE: u64 = 10;

/// Immutable run configuration shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct AnalysisParams {
    pub vcf_path: PathBuf,
    pub chromosome: String,
    pub window_size: u64,
    pub step_size: u64,
    pub min_snps_cutoff: usize,
    pub min_dist: u64,
    pub max_dist: u64,
    pub dist_step: u64,
    pub n_components: usize,
    pub out_dir: PathBuf,
    pub pca_seed: Option<u64>,
}

impl AnalysisParams {
    pub fn from_cli(cli_args: &CliArgs) -> Result<Self> {
        let params = Self {
            vcf_path: cli_args.vcf_path.clone(),
            chromosome: cli_args.chromosome.clone(),
            window_size: cli_args.window_size,
            step_size: cli_args.step_size,
            min_snps_cutoff: cli_args.min_snps_cutoff,
            min_dist: cli_args.min_dist,
            max_dist: cli_args.max_dist,
            dist_step: cli_args.dist_step,
            n_components: PCA_COMPONENTS,
            out_dir: cli_args.out_dir.clone(),
            pca_seed: cli_args.pca_seed,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 || self.step_size == 0 || self.dist_step == 0 {
            return Err(ClusterError::InvalidParameter(format!(
                "window size ({}), step size ({}) and distance step ({}) must all be at least 1",
                self.window_size, self.step_size, self.dist_step
            )));
        }
        if self.min_dist >= self.max_dist {
            return Err(ClusterError::InvalidParameter(format!(
                "minimum distance ({}) must be below maximum distance ({}); the threshold grid would be empty",
                self.min_dist, self.max_dist
            )));
        }
        if self.n_components == 0 {
            return Err(ClusterError::InvalidParameter(
                "number of principal components must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Candidate merge distances `min_dist, min_dist + dist_step, ... < max_dist`.
    pub fn distance_grid(&self) -> Vec<u64> {
        let step = usize::try_from(self.dist_step).unwrap_or(usize::MAX).max(1);
        (self.min_dist..self.max_dist).step_by(step).collect()
    }

    pub fn output_filename(&self) -> String {
        format!(
            "{}_window{}_step{}_cutoff{}_dmin{}_dmax{}_dstep{}_pcacomp{}.csv",
            self.chromosome,
            self.window_size,
            self.step_size,
            self.min_snps_cutoff,
            self.min_dist,
            self.max_dist,
            self.dist_step,
            self.n_components
        )
    }

    pub fn output_path(&self) -> PathBuf {
        self.out_dir.join(self.output_filename())
    }

    pub fn log_parameters(&self) {
        info!("Beginning to classify haplotypes with user inputs:");
        info!("genotype (vcf) file: {}", self.vcf_path.display());
        info!("chromosome basename: {}", self.chromosome);
        info!("sliding window size: {}", self.window_size);
        info!("sliding window step size: {}", self.step_size);
        info!(
            "minimum number of SNPs in window for classification: {}",
            self.min_snps_cutoff
        );
        info!("mergeby distance minimum (inclusive): {}", self.min_dist);
        info!("mergeby distance maximum (exclusive): {}", self.max_dist);
        info!("distance step size: {}", self.dist_step);
        info!(
            "number of principal components (set internally): {}",
            self.n_components
        );
        info!("output directory: {}", self.out_dir.display());
        if let Some(seed) = self.pca_seed {
            info!("PCA seed: {}", seed);
        }
    }
}

#[cfg(test)]
pub(crate) fn test_params(chromosome: &str) -> AnalysisParams {
    AnalysisParams {
        vcf_path: PathBuf::from("input.vcf"),
        chromosome: chromosome.to_string(),
        window_size: 250_000,
        step_size: 100_000,
        min_snps_cutoff: 10,
        min_dist: 2,
        max_dist: 80,
        dist_step: 10,
        n_components: PCA_COMPONENTS,
        out_dir: PathBuf::from("."),
        pca_seed: Some(42),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_encodes_every_parameter() {
        let params = test_params("ch09");
        assert_eq!(
            params.output_filename(),
            "ch09_window250000_step100000_cutoff10_dmin2_dmax80_dstep10_pcacomp2.csv"
        );
    }

    #[test]
    fn output_path_is_joined_onto_out_dir() {
        let mut params = test_params("ch01");
        params.out_dir = PathBuf::from("results");
        assert_eq!(
            params.output_path(),
            PathBuf::from("results")
                .join("ch01_window250000_step100000_cutoff10_dmin2_dmax80_dstep10_pcacomp2.csv")
        );
    }

    #[test]
    fn grid_excludes_max_dist() {
        let params = test_params("ch09");
        assert_eq!(params.distance_grid(), vec![2, 12, 22, 32, 42, 52, 62, 72]);

        let mut exact = test_params("ch09");
        exact.min_dist = 0;
        exact.max_dist = 30;
        exact.dist_step = 10;
        assert_eq!(exact.distance_grid(), vec![0, 10, 20]);
    }

    #[test]
    fn empty_grid_is_rejected() {
        let mut params = test_params("ch09");
        params.min_dist = 80;
        assert!(matches!(
            params.validate(),
            Err(ClusterError::InvalidParameter(_))
        ));
    }

    #[test]
    fn zero_step_is_rejected() {
        let mut params = test_params("ch09");
        params.step_size = 0;
        assert!(params.validate().is_err());
    }
}
