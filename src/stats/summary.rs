//! End-to-end pipeline from alignment sources to per-label statistics.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::contig::ContigTable;
use crate::core::library::{Library, ReadTotals};
use crate::core::types::{Color, DisplayLabel, Group, SortOrder};
use crate::coverage::aggregator::{CoverageAggregator, CoverageError};
use crate::coverage::progress::ProgressObserver;
use crate::labels::policy::{rank_groups, LabelAssignment, LabelError, LabelPolicy};
use crate::parsing::sam::ParseError;
use crate::parsing::{bam, cov, sam};
use crate::stats::group::{aggregate_groups, GroupStats};

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error(transparent)]
    Coverage(#[from] CoverageError),

    #[error(transparent)]
    Label(#[from] LabelError),
}

/// Where a library's alignments come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentInput {
    /// SAM text, optionally gzip-compressed
    Sam(PathBuf),
    /// BAM, decoded natively
    Bam(PathBuf),
    /// A per-contig coverage table written by `cov`
    Cov(PathBuf),
}

impl AlignmentInput {
    /// Choose the format from the file extension: `.bam`, `.cov` (optionally
    /// gzipped), anything else is SAM text
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.to_string_lossy().to_lowercase();
        if name.ends_with(".bam") {
            Self::Bam(path)
        } else if [".cov", ".cov.gz", ".cov.bgz"].iter().any(|ext| name.ends_with(ext)) {
            Self::Cov(path)
        } else {
            Self::Sam(path)
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Sam(path) | Self::Bam(path) | Self::Cov(path) => path,
        }
    }
}

/// One library to ingest
#[derive(Debug, Clone)]
pub struct LibrarySource {
    pub name: String,
    pub input: AlignmentInput,
    /// Reported totals, e.g. from a saved flagstat report. For BAM input
    /// they are counted from the file when not given.
    pub reported: Option<ReadTotals>,
}

impl LibrarySource {
    pub fn new(name: impl Into<String>, input: AlignmentInput) -> Self {
        Self {
            name: name.into(),
            input,
            reported: None,
        }
    }

    /// Name a library after its file, stripping alignment and compression extensions
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let input = AlignmentInput::from_path(path);
        let name = library_name(input.path());
        Self::new(name, input)
    }

    #[must_use]
    pub fn with_reported(mut self, reported: Option<ReadTotals>) -> Self {
        self.reported = reported;
        self
    }
}

fn library_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy())
        .into_owned();
    let mut name = file_name.as_str();
    for suffix in [".gz", ".bgz", ".sam", ".bam", ".cov"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped;
        }
    }
    if name.is_empty() {
        file_name
    } else {
        name.to_string()
    }
}

fn open_error(input: &Path, error: ParseError) -> CoverageError {
    match error {
        ParseError::Io(error) => CoverageError::Io {
            input: input.display().to_string(),
            error,
        },
        other => CoverageError::Parse(other),
    }
}

/// Ingest one library against the known contig set
///
/// # Errors
///
/// Returns `CoverageError::Io` if the input cannot be opened or read,
/// `CoverageError::Parse` if a BAM file or coverage table cannot be decoded, and
/// `CoverageError::UnknownContig` if a record is placed on an unknown contig.
pub fn ingest_library(
    source: &LibrarySource,
    known_contigs: &HashSet<String>,
    progress: &dyn ProgressObserver,
) -> Result<Library, CoverageError> {
    let input = source.input.path().display().to_string();
    let aggregator = |reported: Option<ReadTotals>| {
        CoverageAggregator::new(known_contigs, input.clone())
            .with_reported(reported)
            .with_progress(progress)
    };

    let (reported, result) = match &source.input {
        AlignmentInput::Sam(path) => {
            let records = sam::open_records(path).map_err(|e| open_error(path, e))?;
            (source.reported, aggregator(source.reported).ingest(records)?)
        }
        AlignmentInput::Bam(path) => {
            let reported = match source.reported {
                Some(reported) => reported,
                None => bam::read_totals(path).map_err(|e| open_error(path, e))?,
            };
            debug!(
                library = %source.name,
                total = reported.total,
                mapped = reported.mapped,
                "Counted BAM records"
            );
            let records = bam::open_records(path).map_err(|e| open_error(path, e))?;
            (Some(reported), aggregator(Some(reported)).ingest(records)?)
        }
        AlignmentInput::Cov(path) => {
            let table = cov::parse_coverage_file(path).map_err(|e| open_error(path, e))?;
            let reported = source.reported.or(table.reported);
            (reported, aggregator(reported).ingest_table(&table)?)
        }
    };

    Ok(Library::from_ingest(&source.name, reported, result))
}

/// Ingest independent libraries in parallel.
///
/// Returns once every library has finished, in the order of `sources`.
///
/// # Errors
///
/// Returns the first error of any library; no partial results are returned.
pub fn ingest_libraries(
    sources: &[LibrarySource],
    contigs: &ContigTable,
    progress: &dyn ProgressObserver,
) -> Result<Vec<Library>, CoverageError> {
    let known = contigs.known_names();
    let libraries = sources
        .par_iter()
        .map(|source| ingest_library(source, &known, progress))
        .collect::<Result<Vec<_>, _>>()?;

    info!(libraries = libraries.len(), "Ingested all libraries");
    Ok(libraries)
}

/// Complete statistics of an assembly and its libraries
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub libraries: Vec<Library>,
    /// Groups in rank order
    pub group_order: Vec<Group>,
    /// Displayed labels in plot order
    pub display_order: Vec<DisplayLabel>,
    pub colors: BTreeMap<DisplayLabel, Color>,
    pub stats: BTreeMap<DisplayLabel, GroupStats>,
    #[serde(skip)]
    pub assignment: LabelAssignment,
}

impl Summary {
    /// Rank groups, assign labels and aggregate statistics over ingested libraries
    ///
    /// # Errors
    ///
    /// Returns a `LabelError` when two labels would share a name, see
    /// [`LabelPolicy::check_names`].
    pub fn build(
        contigs: &ContigTable,
        libraries: Vec<Library>,
        policy: &LabelPolicy,
        order: SortOrder,
    ) -> Result<Self, LabelError> {
        let group_order = rank_groups(contigs, order);
        policy.check_names(&group_order)?;
        let assignment = policy.assign(&group_order);
        let stats = aggregate_groups(contigs, &assignment, &libraries);

        let colors = stats
            .keys()
            .filter_map(|label| assignment.color(label).map(|c| (label.clone(), c)))
            .collect();

        debug!(
            groups = group_order.len(),
            displayed = assignment.display_order().len(),
            "Assigned display labels"
        );

        Ok(Self {
            libraries,
            group_order: assignment.group_order().to_vec(),
            display_order: assignment.display_order().to_vec(),
            colors,
            stats,
            assignment,
        })
    }

    #[must_use]
    pub fn library(&self, name: &str) -> Option<&Library> {
        self.libraries.iter().find(|l| l.name == name)
    }
}

/// Ingest every library, then build the summary
///
/// Label names are checked before any library is read.
///
/// # Errors
///
/// Returns `SummaryError::Label` for clashing label names and
/// `SummaryError::Coverage` for the first ingestion error of any library.
pub fn summarize(
    contigs: &ContigTable,
    sources: &[LibrarySource],
    policy: &LabelPolicy,
    order: SortOrder,
    progress: &dyn ProgressObserver,
) -> Result<Summary, SummaryError> {
    policy.check_names(&rank_groups(contigs, order))?;
    let libraries = ingest_libraries(sources, contigs, progress)?;
    Summary::build(contigs, libraries, policy, order).map_err(SummaryError::from)
}
