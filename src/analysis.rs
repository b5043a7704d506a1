// analysis.rs

use crate::clustering::{self, ThresholdSearch};
use crate::dosage;
use crate::error::Result;
use crate::params::{AnalysisParams, FALLBACK_DISTANCE};
use crate::pca_runner;
use crate::vcf::GenotypeData;
use crate::windows::{self, Window};
use log::{debug, info, warn};
use ndarray::Array2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedReason {
    /// Selected-variant count did not exceed the cutoff.
    TooFewSnps,
}

/// PCs, chosen merge distance and cluster labels for every sample of a window.
#[derive(Debug, Clone)]
pub struct WindowClusters {
    /// samples x components
    pub pcs: Array2<f64>,
    pub distance: u64,
    pub labels: Vec<usize>,
    pub used_fallback: bool,
}

#[derive(Debug, Clone)]
pub enum WindowOutcome {
    Undefined(UndefinedReason),
    Clustered(WindowClusters),
}

#[derive(Debug, Clone)]
pub struct WindowResult {
    pub window: Window,
    pub snp_count: usize,
    pub outcome: WindowOutcome,
}

impl WindowResult {
    pub fn clusters(&self) -> Option<&WindowClusters> {
        match &self.outcome {
            WindowOutcome::Clustered(clusters) => Some(clusters),
            WindowOutcome::Undefined(_) => None,
        }
    }
}

/// Picks the merge distance for a window: the silhouette-optimal grid value,
/// or `FALLBACK_DISTANCE` when the search could not score every grid value.
pub fn choose_distance(search: &ThresholdSearch, window_start: u64) -> (u64, bool) {
    match *search {
        ThresholdSearch::Best { distance, score } => {
            debug!(
                "Window at {}: best merge distance {} (silhouette {:.4})",
                window_start, distance, score
            );
            (distance, false)
        }
        ThresholdSearch::Degenerate {
            distance,
            n_clusters,
        } => {
            warn!(
                "Window at {}: merge distance of {} results in {} cluster(s), 1 or one per sample; setting d to {} and trying again",
                window_start, distance, n_clusters, FALLBACK_DISTANCE
            );
            (FALLBACK_DISTANCE, true)
        }
        ThresholdSearch::EmptyGrid => {
            warn!(
                "Window at {}: empty distance grid, setting d to {}",
                window_start, FALLBACK_DISTANCE
            );
            (FALLBACK_DISTANCE, true)
        }
    }
}

pub fn analyze_window(
    genotype_data: &GenotypeData,
    window: &Window,
    params: &AnalysisParams,
    distance_grid: &[u64],
) -> Result<WindowResult> {
    let variant_range = windows::select_variants(&genotype_data.positions, window);
    let snp_count = variant_range.len();

    if snp_count <= params.min_snps_cutoff {
        debug!(
            "Window at {}: {} SNPs is not above the cutoff of {}, values undefined.",
            window.start, snp_count, params.min_snps_cutoff
        );
        return Ok(WindowResult {
            window: *window,
            snp_count,
            outcome: WindowOutcome::Undefined(UndefinedReason::TooFewSnps),
        });
    }

    let dosages = dosage::dosage_matrix(genotype_data.genotypes_in(variant_range));
    let standardized = dosage::standardize_columns(&dosages);

    let distances = clustering::euclidean_distances(&standardized);
    let dendrogram = clustering::ward_linkage(&distances);
    let search = clustering::search_distance_threshold(&dendrogram, &distances, distance_grid);
    let (distance, used_fallback) = choose_distance(&search, window.start);
    let labels = dendrogram.cut(distance as f64);

    let pcs = pca_runner::project_window(
        &standardized,
        params.n_components,
        params.pca_seed,
        window.start,
    )?;

    Ok(WindowResult {
        window: *window,
        snp_count,
        outcome: WindowOutcome::Clustered(WindowClusters {
            pcs,
            distance,
            labels,
            used_fallback,
        }),
    })
}

/// Runs every planned window in order.
pub fn analyze_windows(
    genotype_data: &GenotypeData,
    params: &AnalysisParams,
) -> Result<Vec<WindowResult>> {
    let (first_position, last_position) =
        match (genotype_data.first_position(), genotype_data.last_position()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(Vec::new()),
        };

    let plan = windows::plan_windows(
        first_position,
        last_position,
        params.window_size,
        params.step_size,
    );
    if plan.is_empty() {
        warn!(
            "Position span {}-{} leaves no room for a {} bp window with step {}; no windows to analyze.",
            first_position, last_position, params.window_size, params.step_size
        );
        return Ok(Vec::new());
    }
    info!(
        "Analyzing {} windows over positions {}-{}.",
        plan.len(),
        first_position,
        last_position
    );

    let distance_grid = params.distance_grid();
    let mut results = Vec::with_capacity(plan.len());
    for window in &plan {
        let result = analyze_window(genotype_data, window, params, &distance_grid)?;
        info!(
            "Finished window: {} {} for chromosome {} ({} SNPs)",
            window.start, window.stop, params.chromosome, result.snp_count
        );
        results.push(result);
    }
    info!("Finished Windowing Chromosome: {}", params.chromosome);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::test_params;
    use crate::vcf::PLOIDY;
    use ndarray::{Array3, Axis};

    /// Six samples in three pairs; pair members carry identical genotypes.
    fn paired_samples(n_variants: usize, spacing: u64) -> GenotypeData {
        let n_samples = 6;
        let genotypes = Array3::from_shape_fn((n_variants, n_samples, PLOIDY), |(v, s, _)| {
            match s / 2 {
                0 => 0,
                1 => 1,
                _ => (v % 2) as u8,
            }
        });
        let positions = (0..n_variants as u64).map(|i| 1_000 + i * spacing).collect();
        let sample_names = (0..n_samples).map(|s| format!("S{}", s)).collect();
        GenotypeData::from_parts(sample_names, positions, genotypes).unwrap()
    }

    fn params_for(window_size: u64, step_size: u64, cutoff: usize) -> AnalysisParams {
        let mut params = test_params("chr1");
        params.window_size = window_size;
        params.step_size = step_size;
        params.min_snps_cutoff = cutoff;
        params
    }

    #[test]
    fn fallback_is_a_fixed_distance() {
        let degenerate = ThresholdSearch::Degenerate {
            distance: 42,
            n_clusters: 1,
        };
        assert_eq!(choose_distance(&degenerate, 0), (FALLBACK_DISTANCE, true));
        assert_eq!(
            choose_distance(&ThresholdSearch::EmptyGrid, 0),
            (FALLBACK_DISTANCE, true)
        );
        let best = ThresholdSearch::Best {
            distance: 22,
            score: 0.5,
        };
        assert_eq!(choose_distance(&best, 0), (22, false));
    }

    #[test]
    fn window_at_cutoff_is_undefined() {
        // [1000, 5000] holds 5 variants at spacing 1000
        let data = paired_samples(10, 1_000);
        let params = params_for(4_000, 1_000, 5);
        let window = Window {
            index: 0,
            start: 1_000,
            stop: 5_000,
        };
        let result = analyze_window(&data, &window, &params, &params.distance_grid()).unwrap();
        assert_eq!(result.snp_count, 5);
        assert!(matches!(
            result.outcome,
            WindowOutcome::Undefined(UndefinedReason::TooFewSnps)
        ));
    }

    #[test]
    fn fixed_site_does_not_change_clustering() {
        let mut data = paired_samples(31, 1_000);
        data.genotypes
            .slice_mut(ndarray::s![15, .., ..])
            .fill(1);
        let kept: Vec<usize> = (0..31).filter(|&v| v != 15).collect();
        let without_fixed_site = GenotypeData::from_parts(
            data.sample_names.clone(),
            kept.iter().map(|&v| data.positions[v]).collect(),
            data.genotypes.select(Axis(0), &kept),
        )
        .unwrap();

        let mut params = params_for(30_000, 1_000, 10);
        params.min_dist = 2;
        params.max_dist = 9;
        params.dist_step = 3;
        let grid = params.distance_grid();
        let window = Window {
            index: 0,
            start: 1_000,
            stop: 31_000,
        };

        let with_site = analyze_window(&data, &window, &params, &grid).unwrap();
        let without_site = analyze_window(&without_fixed_site, &window, &params, &grid).unwrap();
        assert_eq!(with_site.snp_count, 31);
        assert_eq!(without_site.snp_count, 30);

        let clusters = with_site.clusters().expect("window with a fixed site should be clustered");
        let reference = without_site.clusters().expect("window should be clustered");
        assert_eq!(clusters.labels, vec![0, 0, 1, 1, 2, 2]);
        assert_eq!(clusters.labels, reference.labels);
        assert_eq!(clusters.distance, reference.distance);
    }

    #[test]
    fn degenerate_search_falls_back_and_keeps_pairs_together() {
        let data = paired_samples(21, 1_000);
        let params = params_for(20_000, 1_000, 10);
        let window = Window {
            index: 0,
            start: 1_000,
            stop: 21_000,
        };
        let result = analyze_window(&data, &window, &params, &params.distance_grid()).unwrap();
        let clusters = result.clusters().expect("window should be clustered");
        assert_eq!(result.snp_count, 21);
        // The default grid reaches thresholds that merge every sample.
        assert!(clusters.used_fallback);
        assert_eq!(clusters.distance, FALLBACK_DISTANCE);
        assert_eq!(clusters.labels.len(), 6);
        for pair in clusters.labels.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
        assert_eq!(clusters.pcs.dim(), (6, 2));
    }

    #[test]
    fn scored_search_stays_on_the_grid() {
        let data = paired_samples(21, 1_000);
        let mut params = params_for(20_000, 1_000, 10);
        params.min_dist = 2;
        params.max_dist = 9;
        params.dist_step = 3;
        let window = Window {
            index: 0,
            start: 1_000,
            stop: 21_000,
        };
        let result = analyze_window(&data, &window, &params, &params.distance_grid()).unwrap();
        let clusters = result.clusters().expect("window should be clustered");
        assert!(!clusters.used_fallback);
        assert!(clusters.distance >= params.min_dist && clusters.distance < params.max_dist);
        assert_eq!((clusters.distance - params.min_dist) % params.dist_step, 0);
        // Pairs are the only structure below distance 9: three clusters.
        assert_eq!(clusters.labels, vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn analyze_windows_follows_the_plan() {
        let data = paired_samples(100, 1_000);
        let params = params_for(20_000, 10_000, 10);
        let results = analyze_windows(&data, &params).unwrap();
        // (100_000 - 1_000 - 20_000) / 10_000
        assert_eq!(results.len(), 7);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.window.index, i);
            assert_eq!(result.window.midpoint(), (1_000 + 10_000 * i as u64 + 10_000) as f64);
            assert_eq!(result.snp_count, 21);
        }
    }

    #[test]
    fn span_shorter_than_window_gives_no_results() {
        let data = paired_samples(5, 1_000);
        let params = params_for(250_000, 100_000, 1);
        assert!(analyze_windows(&data, &params).unwrap().is_empty());
    }
}
