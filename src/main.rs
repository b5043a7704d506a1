// main.rs

use anyhow::{Context, Result};
use cluster_haplotypes::cli::{self, Invocation};
use cluster_haplotypes::{run_pipeline, AnalysisParams};
use log::info;
use std::time::Instant;

fn main() -> Result<()> {
    let total_time_start = Instant::now();
    let cli_args = match cli::parse_invocation(std::env::args_os()) {
        Ok(Invocation::Run(cli_args)) => cli_args,
        Ok(Invocation::Usage) => {
            println!("{}", cli::USAGE);
            return Ok(());
        }
        Err(e) => e.exit(),
    };

    // Initialize logger
    let log_level = cli_args
        .log_level
        .parse::<log::LevelFilter>()
        .unwrap_or_else(|_| {
            eprintln!(
                "Warning: Invalid log level '{}' provided. Defaulting to Info.",
                cli_args.log_level
            );
            log::LevelFilter::Info
        });
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_micros()
        .init();

    info!("Starting cluster_haplotypes with args: {:?}", cli_args);

    let params = AnalysisParams::from_cli(&cli_args).context("Invalid parameters")?;
    params.log_parameters();

    let summary = run_pipeline(&params).with_context(|| {
        format!(
            "Failed to cluster haplotypes for {}",
            params.vcf_path.display()
        )
    })?;
    summary.log();

    info!(
        "cluster_haplotypes finished successfully in {:.2?}.",
        total_time_start.elapsed()
    );
    Ok(())
}
