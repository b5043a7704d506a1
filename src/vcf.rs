// vcf.rs

use crate::error::{ClusterError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use ndarray::{s, Array3, ArrayView3};
use noodles_vcf::{
    self as vcf,
    // Series trait supplies `iter(&header)` on the concrete GT series.
    variant::record::samples::Series as VcfSeriesTrait,
};
use std::ops::Range;
use std::path::Path;
use std::time::Instant;

pub const PLOIDY: usize = 2;

/// In-memory genotypes for one chromosome.
#[derive(Debug, Clone)]
pub struct GenotypeData {
    pub sample_names: Vec<String>,
    /// One position per variant, non-decreasing.
    pub positions: Vec<u64>,
    /// Allele indices, shaped (variant, sample, chromosome copy).
    pub genotypes: Array3<u8>,
}

impl GenotypeData {
    pub fn from_parts(
        sample_names: Vec<String>,
        positions: Vec<u64>,
        genotypes: Array3<u8>,
    ) -> Result<Self> {
        let (n_variants, n_samples, ploidy) = genotypes.dim();
        if n_variants != positions.len() {
            return Err(ClusterError::InvalidParameter(format!(
                "genotype tensor has {} variants but {} positions were given",
                n_variants,
                positions.len()
            )));
        }
        if n_samples != sample_names.len() {
            return Err(ClusterError::InvalidParameter(format!(
                "genotype tensor has {} samples but {} sample names were given",
                n_samples,
                sample_names.len()
            )));
        }
        if ploidy != PLOIDY {
            return Err(ClusterError::InvalidParameter(format!(
                "genotype tensor ploidy is {}, expected {}",
                ploidy, PLOIDY
            )));
        }
        if let Some(pair) = positions.windows(2).find(|pair| pair[1] < pair[0]) {
            return Err(ClusterError::UnsortedPositions {
                path: Path::new("<memory>").to_path_buf(),
                previous: pair[0],
                current: pair[1],
            });
        }
        Ok(Self {
            sample_names,
            positions,
            genotypes,
        })
    }

    pub fn n_variants(&self) -> usize {
        self.positions.len()
    }

    pub fn n_samples(&self) -> usize {
        self.sample_names.len()
    }

    pub fn first_position(&self) -> Option<u64> {
        self.positions.first().copied()
    }

    pub fn last_position(&self) -> Option<u64> {
        self.positions.last().copied()
    }

    /// Genotype calls for a contiguous range of variant indices.
    pub fn genotypes_in(&self, variant_range: Range<usize>) -> ArrayView3<'_, u8> {
        self.genotypes.slice(s![variant_range, .., ..])
    }
}

fn parse_gt_string(gt_string: &str) -> Option<[u8; PLOIDY]> {
    let mut alleles = gt_string.split(['/', '|']);
    let first = alleles.next()?.parse::<u8>().ok()?;
    let second = alleles.next()?.parse::<u8>().ok()?;
    if alleles.next().is_some() {
        return None;
    }
    Some([first, second])
}

/// Reads every fully called diploid record of `vcf_path` into memory.
///
/// Records with a missing, haploid or polyploid call for any sample are
/// skipped. Positions must be non-decreasing.
pub fn load_genotypes(vcf_path: &Path) -> Result<GenotypeData> {
    let start_time = Instant::now();
    info!("Reading VCF: {}", vcf_path.display());

    let mut reader = vcf::io::reader::Builder::default().build_from_path(vcf_path)?;
    let header = reader.read_header()?;

    let sample_names: Vec<String> = header.sample_names().iter().cloned().collect();
    let sample_count = sample_names.len();
    if sample_count == 0 {
        return Err(ClusterError::vcf(vcf_path, "VCF header contains no samples."));
    }
    debug!(
        "Sample names (first 5): {:?}",
        sample_names.iter().take(5).collect::<Vec<_>>()
    );

    let gt_key_str = vcf::variant::record::samples::keys::key::GENOTYPE;
    if !header.formats().contains_key(gt_key_str) {
        return Err(ClusterError::vcf(
            vcf_path,
            format!("GT key (FORMAT={}) not found in FORMAT header", gt_key_str),
        ));
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Reading variants...");

    let mut positions: Vec<u64> = Vec::new();
    let mut flat_calls: Vec<u8> = Vec::new();
    let mut first_contig: Option<String> = None;
    let mut foreign_contig_records = 0usize;
    let mut skipped_records = 0usize;
    let mut record_buffer = vcf::Record::default();

    while reader.read_record(&mut record_buffer)? != 0 {
        let record = &record_buffer;
        let contig = record.reference_sequence_name();

        let position = match record.variant_start() {
            Some(Ok(pos)) => pos.get() as u64,
            Some(Err(e)) => {
                return Err(ClusterError::vcf(
                    vcf_path,
                    format!("invalid position on contig {}: {}", contig, e),
                ))
            }
            None => {
                debug!("Record on {} has no position, skipping.", contig);
                skipped_records += 1;
                continue;
            }
        };

        if first_contig.is_none() {
            first_contig = Some(contig.to_string());
        } else if first_contig.as_deref() != Some(contig) {
            foreign_contig_records += 1;
        }

        let mut calls_for_variant: Vec<u8> = Vec::with_capacity(sample_count * PLOIDY);
        let mut has_unusable_gt = false;

        match record.samples().select(gt_key_str) {
            Some(gt_series) => {
                for (sample_idx, value_option_result) in gt_series.iter(&header).enumerate() {
                    if sample_idx >= sample_count {
                        warn!(
                            "More GT values than samples for variant at {}:{}. Skipping variant.",
                            contig, position
                        );
                        has_unusable_gt = true;
                        break;
                    }
                    let parsed = match value_option_result {
                        Ok(Some(vcf::variant::record::samples::series::Value::String(gt_string))) => {
                            parse_gt_string(&gt_string)
                        }
                        Ok(Some(vcf::variant::record::samples::series::Value::Genotype(boxed_gt))) => {
                            let genotype_trait_object = &*boxed_gt;
                            let alleles: Option<Vec<u8>> = genotype_trait_object
                                .iter()
                                .map(|allele_result| {
                                    allele_result
                                        .ok()
                                        .and_then(|(allele_idx, _phasing)| allele_idx)
                                        .and_then(|idx| u8::try_from(idx).ok())
                                })
                                .collect();
                            match alleles.as_deref() {
                                Some(&[first, second]) => Some([first, second]),
                                _ => None,
                            }
                        }
                        Ok(Some(other_type)) => {
                            debug!(
                                "Variant at {}:{}: GT for sample {} has unexpected type {:?}.",
                                contig, position, sample_idx, other_type
                            );
                            None
                        }
                        Ok(None) => None,
                        Err(e) => {
                            warn!(
                                "Error parsing genotype for variant at {}:{} sample {}: {}.",
                                contig, position, sample_idx, e
                            );
                            None
                        }
                    };

                    match parsed {
                        Some(alleles) => calls_for_variant.extend_from_slice(&alleles),
                        None => {
                            debug!(
                                "Variant at {}:{}: sample {} is not a fully called diploid genotype, skipping variant.",
                                contig, position, sample_idx
                            );
                            has_unusable_gt = true;
                            break;
                        }
                    }
                }
            }
            None => {
                debug!("Variant at {}:{}: GT series not found.", contig, position);
                has_unusable_gt = true;
            }
        }

        if has_unusable_gt || calls_for_variant.len() != sample_count * PLOIDY {
            skipped_records += 1;
            continue;
        }

        if let Some(&previous) = positions.last() {
            if position < previous {
                pb.finish_and_clear();
                return Err(ClusterError::UnsortedPositions {
                    path: vcf_path.to_path_buf(),
                    previous,
                    current: position,
                });
            }
        }

        positions.push(position);
        flat_calls.extend_from_slice(&calls_for_variant);

        if positions.len() % 10_000 == 0 {
            pb.set_message(format!("Read {} variants", positions.len()));
            pb.tick();
        }
    }
    pb.finish_with_message(format!("Read {} variants", positions.len()));

    if skipped_records > 0 {
        warn!(
            "Skipped {} record(s) without fully called diploid genotypes.",
            skipped_records
        );
    }
    if foreign_contig_records > 0 {
        warn!(
            "{} record(s) are on a contig other than {}; the input is treated as a single chromosome.",
            foreign_contig_records,
            first_contig.as_deref().unwrap_or("?")
        );
    }
    if positions.is_empty() {
        return Err(ClusterError::NoVariants {
            path: vcf_path.to_path_buf(),
        });
    }

    let n_variants = positions.len();
    let genotypes = Array3::from_shape_vec((n_variants, sample_count, PLOIDY), flat_calls)?;

    info!(
        "Loaded {} variants x {} samples from {} in {:.2?}.",
        n_variants,
        sample_count,
        vcf_path.display(),
        start_time.elapsed()
    );

    Ok(GenotypeData {
        sample_names,
        positions,
        genotypes,
    })
}
