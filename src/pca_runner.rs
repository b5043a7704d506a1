// pca_runner.rs

use crate::error::{ClusterError, Result};
use efficient_pca::PCA as EfficientPcaModel;
use log::{debug, warn};
use ndarray::{s, Array2};

const N_OVERSAMPLES: usize = 10;

/// Projects the standardized samples x variants matrix of one window onto its
/// leading principal components.
///
/// Always returns `n_components` columns. Components the window cannot
/// support (fewer than 2 samples, or fewer variants than components) are NaN.
pub fn project_window(
    standardized: &Array2<f64>,
    n_components: usize,
    seed: Option<u64>,
    window_start: u64,
) -> Result<Array2<f64>> {
    let num_samples = standardized.nrows();
    let num_features = standardized.ncols();
    let mut projected = Array2::<f64>::from_elem((num_samples, n_components), f64::NAN);

    if num_samples < 2 || num_features == 0 {
        warn!(
            "Window at {}: PCA needs at least 2 samples and 1 variant ({} x {}), leaving PCs undefined.",
            window_start, num_samples, num_features
        );
        return Ok(projected);
    }

    let max_possible_k = num_samples.min(num_features);
    let k_actual = n_components.min(max_possible_k);
    if k_actual < n_components {
        warn!(
            "Window at {}: requested {} components but a {} x {} matrix supports {}; the rest stay undefined.",
            window_start, n_components, num_samples, num_features, k_actual
        );
    }
    let n_oversamples = N_OVERSAMPLES.min(max_possible_k - k_actual);

    debug!(
        "Window at {}: efficient_pca rfit k={}, oversamples={}, seed={:?}",
        window_start, k_actual, n_oversamples, seed
    );

    let mut pca_model = EfficientPcaModel::new();
    pca_model
        .rfit(standardized.clone(), k_actual, n_oversamples, seed, None)
        .map_err(|e| ClusterError::Pca {
            window_start,
            message: e.to_string(),
        })?;

    let transformed_pcs = pca_model
        .transform(standardized.clone())
        .map_err(|e| ClusterError::Pca {
            window_start,
            message: e.to_string(),
        })?;

    let computed_k = transformed_pcs.ncols().min(k_actual);
    if computed_k < k_actual {
        warn!(
            "Window at {}: PCA returned {} components, expected {}.",
            window_start, computed_k, k_actual
        );
    }
    projected
        .slice_mut(s![.., ..computed_k])
        .assign(&transformed_pcs.slice(s![.., ..computed_k]));
    Ok(projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn single_sample_leaves_components_undefined() {
        let projected = project_window(&array![[1.0, -1.0, 0.5]], 2, Some(1), 0).unwrap();
        assert_eq!(projected.dim(), (1, 2));
        assert!(projected.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn first_component_separates_groups() {
        let standardized = array![
            [-1.0, -1.0, -0.9],
            [-1.0, -0.9, -1.0],
            [-0.9, -1.0, -1.0],
            [1.0, 1.0, 0.9],
            [1.0, 0.9, 1.0],
            [0.9, 1.0, 1.0],
        ];
        let projected = project_window(&standardized, 2, Some(42), 0).unwrap();
        assert_eq!(projected.dim(), (6, 2));
        assert!(projected.iter().all(|v| v.is_finite()));
        let pc1 = projected.column(0);
        // Sign is arbitrary; the two groups must land on opposite sides.
        assert!(pc1[0] * pc1[3] < 0.0);
        assert!(pc1[0] * pc1[1] > 0.0);
        assert!(pc1[3] * pc1[5] > 0.0);
    }
}
