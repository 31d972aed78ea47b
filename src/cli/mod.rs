//! Command-line interface for blobstats.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **cov**: Extract per-contig base and read coverage from SAM/BAM files
//! - **stats**: Compute per-group composition statistics for an assembly
//!
//! ## Usage
//!
//! ```text
//! # Per-contig coverage from a BAM file
//! blobstats cov --fasta assembly.fa lib1.bam
//!
//! # Group statistics with a saved flagstat report for a SAM library
//! blobstats stats --fasta assembly.fa --groups taxa.tsv lib1.sam --flagstat lib1.flagstat
//!
//! # Group statistics from a coverage table saved by `cov --output-dir out`
//! blobstats stats --fasta assembly.fa --groups taxa.tsv out/lib1.cov
//!
//! # Merge two groups under one label, JSON output
//! blobstats stats --contigs contigs.tsv lib1.bam --label Worms=Nematoda,Platyhelminthes --format json
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};

use crate::core::contig::ContigTable;
use crate::parsing::{contigs, fasta, flagstat};
use crate::stats::summary::LibrarySource;

pub mod cov;
pub mod stats;

#[derive(Parser)]
#[command(name = "blobstats")]
#[command(version)]
#[command(about = "Per-contig coverage and per-group composition statistics for assemblies")]
#[command(
    long_about = "blobstats reads alignments of sequencing libraries against an assembly and reports:\n- Base and read coverage for every contig\n- Per-group statistics (count, span, N50, GC, coverage, mapped reads)\n- A bounded, deterministic set of coloured display labels for the groups"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract per-contig coverage from alignment files
    Cov(cov::CovArgs),

    /// Compute per-group statistics
    Stats(stats::StatsArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Where contig attributes come from
#[derive(Args, Debug)]
pub struct AssemblyArgs {
    /// Contig attribute table (name, length, gc, [groups], [visible])
    #[arg(long, conflicts_with = "fasta", required_unless_present = "fasta")]
    pub contigs: Option<PathBuf>,

    /// Assembly FASTA; lengths and GC are computed from the sequences
    #[arg(long)]
    pub fasta: Option<PathBuf>,

    /// Group assignment table (contig, group); contigs without an entry are no-hit
    #[arg(long)]
    pub groups: Option<PathBuf>,

    /// Hide contigs shorter than this from visible counts and ranking
    #[arg(long, default_value = "0")]
    pub min_length: u64,
}

/// Alignment inputs, one library per file
#[derive(Args, Debug)]
pub struct AlignmentArgs {
    /// SAM (optionally gzipped), BAM or saved `.cov` tables; format is chosen by extension
    pub alignments: Vec<PathBuf>,

    /// Saved `samtools flagstat` reports, matched to the alignment files in order
    #[arg(long)]
    pub flagstat: Vec<PathBuf>,
}

/// Load the contig table described by the assembly arguments
///
/// # Errors
///
/// Returns an error if a table or FASTA file cannot be read or parsed.
pub fn load_assembly(args: &AssemblyArgs) -> anyhow::Result<ContigTable> {
    let mut table = match (&args.contigs, &args.fasta) {
        (Some(path), _) => contigs::parse_contig_table_file(path)
            .with_context(|| format!("Failed to read contig table {}", path.display()))?,
        (None, Some(path)) => fasta::parse_fasta_file(path)
            .with_context(|| format!("Failed to read FASTA {}", path.display()))?,
        (None, None) => anyhow::bail!("Either --contigs or --fasta is required"),
    };

    if let Some(path) = &args.groups {
        let assignments = contigs::parse_group_file(path)
            .with_context(|| format!("Failed to read group table {}", path.display()))?;
        let unknown = table.assign_groups(
            assignments
                .iter()
                .map(|(name, group)| (name.as_str(), group.clone())),
        );
        if !unknown.is_empty() {
            warn!(
                count = unknown.len(),
                first = %unknown[0],
                "Group table names contigs that are not in the assembly; ignored"
            );
        }
    }

    if args.min_length > 0 {
        table.apply_min_length(args.min_length);
    }

    debug!(contigs = table.len(), "Loaded assembly");
    Ok(table)
}

/// Build library sources from the alignment arguments
///
/// # Errors
///
/// Returns an error if there are more flagstat reports than alignment files,
/// a report cannot be parsed, or two files map to the same library name.
pub fn library_sources(args: &AlignmentArgs) -> anyhow::Result<Vec<LibrarySource>> {
    if args.flagstat.len() > args.alignments.len() {
        anyhow::bail!(
            "Got {} flagstat reports for {} alignment files",
            args.flagstat.len(),
            args.alignments.len()
        );
    }

    let mut sources = Vec::with_capacity(args.alignments.len());
    for (i, path) in args.alignments.iter().enumerate() {
        let reported = match args.flagstat.get(i) {
            Some(report) => Some(
                flagstat::parse_flagstat_file(report)
                    .with_context(|| format!("Failed to read flagstat report {}", report.display()))?,
            ),
            None => None,
        };
        let source = LibrarySource::from_path(path).with_reported(reported);
        if sources.iter().any(|s: &LibrarySource| s.name == source.name) {
            anyhow::bail!("Duplicate library name '{}' from {}", source.name, path.display());
        }
        sources.push(source);
    }

    Ok(sources)
}

/// Open the output destination: a file if given, stdout otherwise
///
/// # Errors
///
/// Returns an error if the file cannot be created.
pub fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
