// output_writer.rs

use crate::analysis::WindowResult;
use crate::error::Result;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Undefined values are written as empty fields.
fn format_float(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

pub fn header(n_components: usize) -> Vec<String> {
    let mut columns = vec![String::new()];
    columns.extend((1..=n_components).map(|pc| format!("PC{}", pc)));
    columns.extend(
        ["dist", "hclust", "Positions", "Sample", "Chromosome"]
            .iter()
            .map(|name| name.to_string()),
    );
    columns
}

/// Writes one row per (window, sample), window-major, preceded by the header.
/// Returns the number of data rows.
pub fn write_table<W: Write>(
    writer: W,
    results: &[WindowResult],
    sample_names: &[String],
    chromosome: &str,
    n_components: usize,
) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    csv_writer.write_record(header(n_components))?;

    let mut row_index = 0usize;
    for result in results {
        let position = format_float(result.window.midpoint());
        let clusters = result.clusters();
        for (sample_idx, sample_name) in sample_names.iter().enumerate() {
            let mut record: Vec<String> = Vec::with_capacity(n_components + 6);
            record.push(row_index.to_string());
            match clusters {
                Some(clusters) => {
                    record.extend((0..n_components).map(|pc_idx| {
                        clusters
                            .pcs
                            .get([sample_idx, pc_idx])
                            .map_or_else(String::new, |&value| format_float(value))
                    }));
                    record.push(clusters.distance.to_string());
                    record.push(
                        clusters
                            .labels
                            .get(sample_idx)
                            .map_or_else(String::new, |label| label.to_string()),
                    );
                }
                None => record.extend(std::iter::repeat(String::new()).take(n_components + 2)),
            }
            record.push(position.clone());
            record.push(sample_name.clone());
            record.push(chromosome.to_string());
            csv_writer.write_record(&record)?;
            row_index += 1;
        }
    }
    csv_writer.flush()?;
    Ok(row_index)
}

pub fn write_results(
    output_path: &Path,
    results: &[WindowResult],
    sample_names: &[String],
    chromosome: &str,
    n_components: usize,
) -> Result<usize> {
    info!("Writing output to file: {}", output_path.display());
    let writer = BufWriter::new(File::create(output_path)?);
    let rows_written = write_table(writer, results, sample_names, chromosome, n_components)?;
    info!(
        "Wrote {} rows ({} windows x {} samples) to {}",
        rows_written,
        results.len(),
        sample_names.len(),
        output_path.display()
    );
    Ok(rows_written)
}
