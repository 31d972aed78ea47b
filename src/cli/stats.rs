use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tracing::{debug, info};

use crate::cli::{library_sources, load_assembly, open_output, AlignmentArgs, AssemblyArgs, OutputFormat};
use crate::core::types::SortOrder;
use crate::coverage::progress::{LogProgress, NoProgress, ProgressObserver};
use crate::labels::policy::PolicyConfig;
use crate::report::{write_stats_json, write_stats_text, write_stats_tsv};
use crate::stats::summary::summarize;

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub assembly: AssemblyArgs,

    #[command(flatten)]
    pub alignment: AlignmentArgs,

    /// JSON file with label policy settings (max_display, sort_order, labels, exclude)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum number of individually coloured groups [default: 7]
    #[arg(short = 'm', long)]
    pub max_display: Option<usize>,

    /// Rank groups by visible span or visible contig count [default: span]
    #[arg(long, value_enum)]
    pub sort: Option<SortOrder>,

    /// Merge groups under one label: NAME=GROUP[,GROUP...] (repeatable)
    #[arg(short, long)]
    pub label: Vec<String>,

    /// Groups always collapsed into 'other' (repeatable or comma-separated)
    #[arg(short = 'x', long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Title written above each text table
    #[arg(long)]
    pub title: Option<String>,

    /// Output file (stdout if not given)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl StatsArgs {
    /// Combine the config file, if any, with flags given on the command line
    fn policy_config(&self) -> anyhow::Result<PolicyConfig> {
        let mut config = match &self.config {
            Some(path) => PolicyConfig::load_from_file(path)?,
            None => PolicyConfig::default(),
        };
        if let Some(max_display) = self.max_display {
            config.max_display = max_display;
        }
        if let Some(sort) = self.sort {
            config.sort_order = sort;
        }
        config.labels.extend(self.label.iter().cloned());
        config.exclude.extend(self.exclude.iter().cloned());
        Ok(config)
    }

    fn title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        let input = self.assembly.contigs.as_ref().or(self.assembly.fasta.as_ref());
        input
            .and_then(|p| p.file_name())
            .map_or_else(|| "blobstats".to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// Execute stats subcommand
///
/// # Errors
///
/// Returns an error if inputs or the policy configuration are invalid, an
/// alignment references a contig outside the assembly, or output cannot be
/// written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: StatsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.policy_config()?;
    let policy = config.to_policy()?;
    debug!(?config, "Label policy");

    let contigs = load_assembly(&args.assembly)?;
    let sources = library_sources(&args.alignment)?;

    let log_progress = LogProgress::new();
    let progress: &dyn ProgressObserver = if verbose { &log_progress } else { &NoProgress };
    let summary = summarize(&contigs, &sources, &policy, config.sort_order, progress)?;

    info!(
        contigs = contigs.len(),
        libraries = summary.libraries.len(),
        labels = summary.display_order.len(),
        "Computed group statistics"
    );

    let mut out = open_output(args.output.as_deref())?;
    match format {
        OutputFormat::Text => write_stats_text(&mut *out, &args.title(), &summary)?,
        OutputFormat::Json => write_stats_json(&mut *out, &summary)?,
        OutputFormat::Tsv => write_stats_tsv(&mut *out, &summary)?,
    }
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> StatsArgs {
        let mut full = vec!["blobstats", "stats", "--contigs", "c.tsv"];
        full.extend_from_slice(args);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Stats(args) => args,
            Commands::Cov(_) => panic!("expected stats"),
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"max_display": 3, "sort_order": "count", "labels": ["W=A"], "exclude": ["B"]}}"#
        )
        .unwrap();
        let config_path = file.path().to_str().unwrap().to_string();

        let args = parse(&["--config", &config_path, "-m", "5", "--label", "V=C", "-x", "D,E"]);
        let config = args.policy_config().unwrap();

        assert_eq!(config.max_display, 5);
        assert_eq!(config.sort_order, SortOrder::Count);
        assert_eq!(config.labels, vec!["W=A".to_string(), "V=C".to_string()]);
        assert_eq!(config.exclude, vec!["B", "D", "E"]);
    }

    #[test]
    fn test_defaults_without_config() {
        let config = parse(&[]).policy_config().unwrap();
        assert_eq!(config, PolicyConfig::default());
    }

    #[test]
    fn test_title_from_input_name() {
        assert_eq!(parse(&[]).title(), "c.tsv");
        assert_eq!(parse(&["--title", "My assembly"]).title(), "My assembly");
    }
}
