use serde::{Deserialize, Serialize};

use crate::coverage::aggregator::{CoverageAccumulator, IngestResult, IngestWarning};

/// Total and mapped read counts for one alignment source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadTotals {
    pub total: u64,
    pub mapped: u64,
}

impl ReadTotals {
    #[must_use]
    pub fn new(total: u64, mapped: u64) -> Self {
        Self { total, mapped }
    }
}

/// One coverage source with its finalized accumulator
#[derive(Debug, Clone, Serialize)]
pub struct Library {
    /// Library name, used as the key in per-library statistics
    pub name: String,

    /// Counts reported by the summary query, if one was available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported: Option<ReadTotals>,

    /// Counts derived while parsing the alignment stream
    pub parsed: ReadTotals,

    #[serde(skip)]
    pub coverage: CoverageAccumulator,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<IngestWarning>,
}

impl Library {
    pub fn from_ingest(
        name: impl Into<String>,
        reported: Option<ReadTotals>,
        result: IngestResult,
    ) -> Self {
        Self {
            name: name.into(),
            reported,
            parsed: ReadTotals::new(result.total_reads_parsed, result.mapped_reads_parsed),
            coverage: result.accumulator,
            warnings: result.warnings,
        }
    }

    /// Denominator for mapped-read percentages
    ///
    /// The reported total when a summary was available, the parsed total otherwise.
    #[must_use]
    pub fn total_reads(&self) -> u64 {
        self.reported.map_or(self.parsed.total, |r| r.total)
    }

    /// Mapped reads as reported by the summary query, falling back to the parsed tally
    #[must_use]
    pub fn mapped_reads_reported(&self) -> u64 {
        self.reported.map_or(self.parsed.mapped, |r| r.mapped)
    }
}
