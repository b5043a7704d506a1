// pipeline.rs

use crate::analysis::{self, UndefinedReason, WindowOutcome};
use crate::error::Result;
use crate::output_writer;
use crate::params::AnalysisParams;
use crate::vcf;
use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub n_samples: usize,
    pub n_variants: usize,
    pub n_windows: usize,
    pub undefined_windows: usize,
    pub below_cutoff_windows: usize,
    pub fallback_windows: usize,
    pub rows_written: usize,
}

impl RunSummary {
    pub fn log(&self) {
        info!("--- Run summary ---");
        info!("Samples: {}, variants: {}", self.n_samples, self.n_variants);
        info!(
            "Windows: {} ({} undefined, {} at or below the SNP cutoff, {} used the fallback distance)",
            self.n_windows, self.undefined_windows, self.below_cutoff_windows, self.fallback_windows
        );
        info!(
            "Rows written: {} -> {}",
            self.rows_written,
            self.output_path.display()
        );
    }
}

/// Loads the VCF, analyzes every window and writes the result table once.
pub fn run_pipeline(params: &AnalysisParams) -> Result<RunSummary> {
    params.validate()?;

    let genotype_data = vcf::load_genotypes(&params.vcf_path)?;

    let analysis_start = Instant::now();
    let results = analysis::analyze_windows(&genotype_data, params)?;
    info!(
        "Analyzed {} windows in {:.2?}.",
        results.len(),
        analysis_start.elapsed()
    );

    let undefined_windows = results
        .iter()
        .filter(|r| matches!(r.outcome, WindowOutcome::Undefined(_)))
        .count();
    let fallback_windows = results
        .iter()
        .filter_map(|r| r.clusters())
        .filter(|c| c.used_fallback)
        .count();
    let below_cutoff_windows = results
        .iter()
        .filter(|r| matches!(r.outcome, WindowOutcome::Undefined(UndefinedReason::TooFewSnps)))
        .count();
    if !results.is_empty() && below_cutoff_windows == results.len() {
        warn!(
            "Every window had {} SNPs or fewer; all PC and cluster values are undefined.",
            params.min_snps_cutoff
        );
    }

    if !params.out_dir.as_os_str().is_empty() {
        fs::create_dir_all(&params.out_dir)?;
    }
    let output_path = params.output_path();
    let rows_written = output_writer::write_results(
        &output_path,
        &results,
        &genotype_data.sample_names,
        &params.chromosome,
        params.n_components,
    )?;

    Ok(RunSummary {
        output_path,
        n_samples: genotype_data.n_samples(),
        n_variants: genotype_data.n_variants(),
        n_windows: results.len(),
        undefined_windows,
        below_cutoff_windows,
        fallback_windows,
        rows_written,
    })
}
