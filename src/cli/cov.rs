use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::json;
use tracing::info;

use crate::cli::{library_sources, load_assembly, open_output, AlignmentArgs, AssemblyArgs, OutputFormat};
use crate::core::contig::ContigTable;
use crate::core::library::Library;
use crate::coverage::progress::{LogProgress, NoProgress, ProgressObserver};
use crate::report::write_coverage_table;
use crate::stats::summary::ingest_libraries;

#[derive(Args, Debug)]
pub struct CovArgs {
    #[command(flatten)]
    pub assembly: AssemblyArgs,

    #[command(flatten)]
    pub alignment: AlignmentArgs,

    /// Write one `<library>.cov` file per library into this directory instead of stdout
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Execute cov subcommand
///
/// # Errors
///
/// Returns an error if inputs cannot be read, an alignment references a contig
/// outside the assembly, or output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CovArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if args.alignment.alignments.is_empty() {
        anyhow::bail!("At least one SAM or BAM file is required");
    }

    let contigs = load_assembly(&args.assembly)?;
    let sources = library_sources(&args.alignment)?;

    let log_progress = LogProgress::new();
    let progress: &dyn ProgressObserver = if verbose { &log_progress } else { &NoProgress };
    let libraries = ingest_libraries(&sources, &contigs, progress)?;

    for library in &libraries {
        info!(
            library = %library.name,
            total = library.total_reads(),
            mapped = library.parsed.mapped,
            "Extracted coverage"
        );
    }

    match &args.output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            for library in &libraries {
                let extension = match format {
                    OutputFormat::Json => "cov.json",
                    OutputFormat::Text | OutputFormat::Tsv => "cov",
                };
                let path = dir.join(format!("{}.{extension}", library.name));
                let mut out = open_output(Some(&path))?;
                write_library(&mut *out, &contigs, library, format)?;
                out.flush()?;
            }
        }
        None => {
            let mut out = open_output(None)?;
            if matches!(format, OutputFormat::Json) {
                let all: Vec<_> = libraries.iter().map(|l| coverage_json(&contigs, l)).collect();
                serde_json::to_writer_pretty(&mut out, &all)?;
                writeln!(out)?;
            } else {
                for library in &libraries {
                    write_library(&mut *out, &contigs, library, format)?;
                }
            }
            out.flush()?;
        }
    }

    Ok(())
}

fn write_library(
    out: &mut dyn Write,
    contigs: &ContigTable,
    library: &Library,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &coverage_json(contigs, library))?;
            writeln!(out)?;
        }
        OutputFormat::Text | OutputFormat::Tsv => write_coverage_table(out, contigs, library)?,
    }
    Ok(())
}

fn coverage_json(contigs: &ContigTable, library: &Library) -> serde_json::Value {
    let rows: Vec<_> = contigs
        .iter()
        .map(|contig| {
            let coverage = library.coverage.get(&contig.name).copied().unwrap_or_default();
            json!({
                "name": contig.name,
                "length": contig.length,
                "read_cov": coverage.read_count,
                "base_cov": coverage.base_coverage,
                "depth": coverage.depth(contig.length),
            })
        })
        .collect();

    json!({
        "library": library.name,
        "total_reads": library.total_reads(),
        "mapped_reads": library.mapped_reads_reported(),
        "parsed": library.parsed,
        "warnings": library.warnings,
        "contigs": rows,
    })
}
