// cli.rs

use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

pub const USAGE: &str = "\
!! USER ERROR !!
Usage: cluster_haplotypes [vcf_file] [chromosome_basename] [window_size] [window_step_size] [min_snps_cutoff] [min d] [max d] [step d]

arg1: Location of the uncompressed chromosome level vcf file
arg2: Output file basename (typically the chromosome name)
arg3: Window size for iterating through the genome - MUST BE AN EVEN NUMBER
arg4: Step size for window iterations
arg5: Minimum number of SNPs a window needs for calculations, otherwise its values are left undefined
arg6: Minimum distance threshold for merging clusters (inclusive)
arg7: Maximum distance threshold for merging clusters (exclusive)
arg8: Distance (d) step size

Options: --out-dir <DIR>  --pca-seed <SEED>  --log-level <LEVEL>
";

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Sliding-window PCA and hierarchical clustering of haplotypes from a single-chromosome VCF.",
    long_about = None
)]
pub struct CliArgs {
    /// Uncompressed single-chromosome VCF with fully called diploid genotypes
    pub vcf_path: PathBuf,

    /// Chromosome label, also used as the output file stem
    pub chromosome: String,

    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub window_size: u64,

    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub step_size: u64,

    /// Windows with this many SNPs or fewer are left undefined
    pub min_snps_cutoff: usize,

    pub min_dist: u64,

    pub max_dist: u64,

    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub dist_step: u64,

    /// Directory the result table is written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Seed for the randomized PCA fit
    #[arg(long)]
    pub pca_seed: Option<u64>,

    #[arg(long, default_value = "Info")]
    pub log_level: String,
}

#[derive(Debug)]
pub enum Invocation {
    Run(CliArgs),
    /// Positional argument count was wrong; print `USAGE` and stop.
    Usage,
}

/// Parses the command line. A missing or surplus positional argument maps to
/// `Invocation::Usage`; every other clap failure (non-numeric values, `--help`)
/// is returned for clap to report itself.
pub fn parse_invocation<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match CliArgs::try_parse_from(args) {
        Ok(cli_args) => Ok(Invocation::Run(cli_args)),
        Err(e) => match e.kind() {
            ErrorKind::MissingRequiredArgument
            | ErrorKind::UnknownArgument
            | ErrorKind::TooManyValues
            | ErrorKind::WrongNumberOfValues => Ok(Invocation::Usage),
            _ => Err(e),
        },
    }
}
