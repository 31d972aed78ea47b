//! Tab-separated contig attribute and group assignment tables.
//!
//! Contig table columns: `name`, `length`, `gc`, optional comma-separated
//! `groups`, optional `visible` (`true`/`false`/`1`/`0`).
//!
//! Group assignment columns: `contig`, `group`; further columns are ignored.

use std::path::Path;

use crate::core::contig::{Contig, ContigTable};
use crate::core::types::Group;
use crate::parsing::open_text;
use crate::parsing::sam::ParseError;
use crate::utils::validation::{check_contig_limit, validate_gc};

/// Parse a contig attribute table file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_contig_table_file(path: &Path) -> Result<ContigTable, ParseError> {
    let content = std::io::read_to_string(open_text(path)?)?;
    parse_contig_table_text(&content)
}

/// Parse contig attribute table text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if lines have fewer than 3 fields,
/// contain invalid numbers, repeat a contig name, or no contigs are found, or
/// `ParseError::TooManyContigs` if the limit is exceeded.
pub fn parse_contig_table_text(text: &str) -> Result<ContigTable, ParseError> {
    let mut table = ContigTable::new();
    let mut first_data_line = true;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();

        if first_data_line {
            first_data_line = false;
            let first = fields.first().map(|s| s.to_lowercase()).unwrap_or_default();
            if first == "name" || first == "contig" || first == "id" {
                continue;
            }
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        if fields.len() < 3 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 3 fields"
            )));
        }

        let name = fields[0].to_string();
        let length: u64 = fields[1].parse().map_err(|_| {
            ParseError::InvalidFormat(format!(
                "Invalid length on line {line_num}: '{}'",
                fields[1]
            ))
        })?;
        let gc: f64 = fields[2]
            .parse()
            .ok()
            .and_then(validate_gc)
            .ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "Invalid GC proportion on line {line_num}: '{}'",
                    fields[2]
                ))
            })?;

        let mut contig = Contig::new(name, length, gc);

        if let Some(groups) = fields.get(3) {
            for group in groups.split(',').map(str::trim).filter(|g| !g.is_empty()) {
                contig = contig.with_group(Group::parse(group));
            }
        }

        if let Some(visible) = fields.get(4) {
            contig.visible = parse_flag(visible).ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "Invalid visible flag on line {line_num}: '{visible}'"
                ))
            })?;
        }

        if table.contains(&contig.name) {
            return Err(ParseError::InvalidFormat(format!(
                "Duplicate contig '{}' on line {line_num}",
                contig.name
            )));
        }

        // Check contig limit for DOS protection
        if check_contig_limit(table.len()).is_some() {
            return Err(ParseError::TooManyContigs(table.len()));
        }

        table.insert(contig);
    }

    if table.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No contigs found in table".to_string(),
        ));
    }

    Ok(table)
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Parse a group assignment file into `(contig, group)` pairs
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if a line has fewer than 2 fields.
pub fn parse_group_file(path: &Path) -> Result<Vec<(String, Group)>, ParseError> {
    let content = std::io::read_to_string(open_text(path)?)?;
    parse_group_text(&content)
}

/// Parse group assignment text into `(contig, group)` pairs
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has fewer than 2 fields.
pub fn parse_group_text(text: &str) -> Result<Vec<(String, Group)>, ParseError> {
    let mut assignments = Vec::new();

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() < 2 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {} has fewer than 2 fields",
                i + 1
            )));
        }

        assignments.push((fields[0].to_string(), Group::parse(fields[1])));
    }

    Ok(assignments)
}
