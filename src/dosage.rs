// dosage.rs

use ndarray::{Array2, ArrayView3, Axis};

/// Sums the allele calls of each (variant, sample) cell and returns the
/// dosages as a samples x variants matrix.
pub fn dosage_matrix(genotypes: ArrayView3<'_, u8>) -> Array2<f64> {
    let variants_by_samples = genotypes.map_axis(Axis(2), |alleles| {
        alleles.iter().map(|&allele| f64::from(allele)).sum::<f64>()
    });
    variants_by_samples.t().as_standard_layout().into_owned()
}

/// Z-scores every column with its mean and population standard deviation.
/// A constant column keeps a deviation of 1 and comes back as all zeros.
pub fn standardize_columns(dosages: &Array2<f64>) -> Array2<f64> {
    if dosages.nrows() == 0 {
        return dosages.clone();
    }
    match dosages.mean_axis(Axis(0)) {
        Some(column_means) => {
            let column_std_devs = dosages
                .std_axis(Axis(0), 0.0)
                .mapv(|std_dev| if std_dev == 0.0 { 1.0 } else { std_dev });
            (dosages - &column_means) / &column_std_devs
        }
        None => dosages.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn dosage_sums_both_copies_and_transposes() {
        // 2 variants x 3 samples x 2 copies
        let genotypes = Array3::from_shape_vec(
            (2, 3, 2),
            vec![
                0, 0, 0, 1, 1, 1, // variant 0
                1, 0, 0, 0, 1, 1, // variant 1
            ],
        )
        .unwrap();
        let dosages = dosage_matrix(genotypes.view());
        assert_eq!(dosages, array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0]]);
        assert!(dosages.is_standard_layout());
    }

    #[test]
    fn standardized_columns_have_zero_mean_and_unit_variance() {
        let dosages = array![[0.0, 2.0], [1.0, 2.0], [2.0, 0.0], [1.0, 1.0]];
        let standardized = standardize_columns(&dosages);
        for column in standardized.columns() {
            let mean = column.mean().unwrap();
            let variance = column.var(0.0);
            assert!(mean.abs() < 1e-12, "mean was {}", mean);
            assert!((variance - 1.0).abs() < 1e-12, "variance was {}", variance);
        }
    }

    #[test]
    fn standardization_uses_population_deviation() {
        let standardized = standardize_columns(&array![[0.0], [2.0]]);
        assert_eq!(standardized, array![[-1.0], [1.0]]);
    }

    #[test]
    fn zero_variance_column_becomes_zero() {
        let standardized = standardize_columns(&array![[1.0, 0.0], [1.0, 2.0], [1.0, 1.0]]);
        assert!(standardized.column(0).iter().all(|&v| v == 0.0));
        assert!(standardized.iter().all(|v| v.is_finite()));
        let variance = standardized.column(1).var(0.0);
        assert!((variance - 1.0).abs() < 1e-12);
    }
}
