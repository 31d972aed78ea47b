use serde::{Deserialize, Serialize};

/// Name used for contigs without any annotation hit
pub const NO_HIT: &str = "no-hit";

/// Name of the bucket collecting groups that are not displayed individually
pub const OTHER: &str = "other";

/// Name of the pseudo-label every contig belongs to
pub const ALL: &str = "all";

/// A raw partition key derived from annotation data
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Group {
    /// A named group, e.g. a taxon at the chosen rank
    Taxon(String),
    /// The contig had no annotation hit
    NoHit,
}

impl Group {
    /// Parse a group from its textual name. `no-hit` maps to the sentinel.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == NO_HIT {
            Self::NoHit
        } else {
            Self::Taxon(s.to_string())
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Taxon(name) => name,
            Self::NoHit => NO_HIT,
        }
    }

    /// The label this group displays under when shown individually
    #[must_use]
    pub fn own_label(&self) -> DisplayLabel {
        match self {
            Self::Taxon(name) => DisplayLabel::Raw(name.clone()),
            Self::NoHit => DisplayLabel::Sentinel(Sentinel::NoHit),
        }
    }
}

impl From<String> for Group {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Group> for String {
    fn from(group: Group) -> Self {
        group.name().to_string()
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fixed buckets with special colouring and ordering rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sentinel {
    NoHit,
    Other,
    All,
}

impl Sentinel {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::NoHit => NO_HIT,
            Self::Other => OTHER,
            Self::All => ALL,
        }
    }
}

/// A bucket contigs are aggregated into for display
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DisplayLabel {
    /// A raw group shown under its own name
    Raw(String),
    /// A user-specified label merging one or more groups
    User(String),
    Sentinel(Sentinel),
}

impl DisplayLabel {
    pub const ALL: Self = Self::Sentinel(Sentinel::All);
    pub const OTHER: Self = Self::Sentinel(Sentinel::Other);
    pub const NO_HIT: Self = Self::Sentinel(Sentinel::NoHit);

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Raw(name) | Self::User(name) => name,
            Self::Sentinel(s) => s.name(),
        }
    }

    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel(_))
    }
}

impl From<DisplayLabel> for String {
    fn from(label: DisplayLabel) -> Self {
        label.name().to_string()
    }
}

// Serialised labels lose the Raw/User distinction; names read back are raw.
impl TryFrom<String> for DisplayLabel {
    type Error = std::convert::Infallible;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(match s.as_str() {
            ALL => Self::ALL,
            OTHER => Self::OTHER,
            NO_HIT => Self::NO_HIT,
            _ => Self::Raw(s),
        })
    }
}

impl std::fmt::Display for DisplayLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb`
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Key used to rank groups before label assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Descending visible span
    #[default]
    Span,
    /// Descending visible contig count
    Count,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_parse_sentinel() {
        assert_eq!(Group::parse("no-hit"), Group::NoHit);
        assert_eq!(Group::parse(""), Group::NoHit);
        assert_eq!(
            Group::parse(" Arthropoda "),
            Group::Taxon("Arthropoda".to_string())
        );
    }

    #[test]
    fn test_group_own_label() {
        assert_eq!(Group::NoHit.own_label(), DisplayLabel::NO_HIT);
        assert_eq!(
            Group::parse("Nematoda").own_label(),
            DisplayLabel::Raw("Nematoda".to_string())
        );
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::new(0x66, 0xc2, 0xa5).to_hex(), "#66c2a5");
        assert_eq!(Color::new(255, 255, 255).to_string(), "#ffffff");
    }

    #[test]
    fn test_display_label_from_string() {
        assert_eq!(
            DisplayLabel::try_from("other".to_string()).unwrap(),
            DisplayLabel::OTHER
        );
        assert_eq!(
            DisplayLabel::try_from("Chordata".to_string()).unwrap(),
            DisplayLabel::Raw("Chordata".to_string())
        );
    }
}
