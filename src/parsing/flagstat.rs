//! Read totals from a saved `samtools flagstat` report.
//!
//! Only two lines are used:
//!
//! ```text
//! 1000 + 0 in total (QC-passed reads + QC-failed reads)
//! 900 + 0 mapped (90.00% : N/A)
//! ```
//!
//! The QC-passed count (first number) is taken. `primary mapped` lines are ignored.

use std::path::Path;

use crate::core::library::ReadTotals;
use crate::parsing::sam::ParseError;

/// Parse a flagstat report file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if either count is missing.
pub fn parse_flagstat_file(path: &Path) -> Result<ReadTotals, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_flagstat_text(&content)
}

/// Parse flagstat report text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the `in total` or `mapped` line is missing.
pub fn parse_flagstat_text(text: &str) -> Result<ReadTotals, ParseError> {
    let mut total = None;
    let mut mapped = None;

    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        // <passed> + <failed> <label...>
        if tokens.len() < 4 || tokens[1] != "+" {
            continue;
        }
        let Ok(passed) = tokens[0].parse::<u64>() else {
            continue;
        };
        match (tokens[3], tokens.get(4)) {
            ("in", Some(&"total")) if total.is_none() => total = Some(passed),
            ("mapped", _) if mapped.is_none() => mapped = Some(passed),
            _ => {}
        }
    }

    match (total, mapped) {
        (Some(total), Some(mapped)) => Ok(ReadTotals::new(total, mapped)),
        (None, _) => Err(ParseError::InvalidFormat(
            "flagstat report has no 'in total' line".to_string(),
        )),
        (_, None) => Err(ParseError::InvalidFormat(
            "flagstat report has no 'mapped' line".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAGSTAT: &str = "\
1000 + 0 in total (QC-passed reads + QC-failed reads)
950 + 0 primary
50 + 0 secondary
0 + 0 supplementary
0 + 0 duplicates
900 + 0 mapped (90.00% : N/A)
850 + 0 primary mapped (89.47% : N/A)
";

    #[test]
    fn test_parse_flagstat_text() {
        let totals = parse_flagstat_text(FLAGSTAT).unwrap();
        assert_eq!(totals, ReadTotals::new(1000, 900));
    }

    #[test]
    fn test_parse_flagstat_missing_mapped() {
        let text = "1000 + 0 in total (QC-passed reads + QC-failed reads)\n";
        assert!(matches!(
            parse_flagstat_text(text),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_flagstat_old_format() {
        let text = "20 + 2 in total (QC-passed reads + QC-failed reads)\n\
                    18 + 1 mapped (90.91%:50.00%)\n";
        assert_eq!(parse_flagstat_text(text).unwrap(), ReadTotals::new(20, 18));
    }
}
