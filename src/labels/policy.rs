use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

use crate::core::contig::ContigTable;
use crate::core::types::{Color, DisplayLabel, Group, SortOrder, ALL, NO_HIT, OTHER};
use crate::labels::palette::{self, OTHER_COLOR};
use crate::utils::validation::{validate_max_display, ValidationError};

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Malformed label '{0}': expected NAME=GROUP[,GROUP...]")]
    Malformed(String),

    #[error("Group '{group}' is assigned to both '{first}' and '{second}'")]
    Conflict {
        group: String,
        first: String,
        second: String,
    },

    #[error("Label name '{0}' is reserved")]
    ReservedName(String),

    #[error("Group '{0}' has the name of a built-in label")]
    ReservedGroup(String),

    #[error("Label '{0}' has the same name as a group in the assembly")]
    NameClash(String),

    #[error("Failed to read label config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse label config: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Default number of individually displayed groups
pub const DEFAULT_MAX_DISPLAY: usize = 7;

/// Serializable label policy settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Maximum number of individually coloured groups
    pub max_display: usize,
    /// Ranking key for groups
    pub sort_order: SortOrder,
    /// User labels in `NAME=GROUP[,GROUP...]` form
    pub labels: Vec<String>,
    /// Groups always collapsed into `other`
    pub exclude: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_display: DEFAULT_MAX_DISPLAY,
            sort_order: SortOrder::default(),
            labels: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl PolicyConfig {
    /// Load settings from a JSON file; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns `LabelError::Io` if the file cannot be read or
    /// `LabelError::Json` if it is not valid JSON for this structure.
    pub fn load_from_file(path: &Path) -> Result<Self, LabelError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Build the label policy these settings describe
    ///
    /// # Errors
    ///
    /// Returns `LabelError::Malformed` or `LabelError::Conflict` for bad user
    /// labels, or `LabelError::Validation` for an out-of-range `max_display`.
    pub fn to_policy(&self) -> Result<LabelPolicy, LabelError> {
        let max_display = validate_max_display(self.max_display)?;
        Ok(LabelPolicy::new(max_display)
            .with_user_labels(parse_user_labels(&self.labels)?)
            .with_exclusions(self.exclude.iter().map(|g| Group::parse(g))))
    }
}

/// Parse `NAME=GROUP[,GROUP...]` user label specifications
///
/// # Errors
///
/// Returns `LabelError::Malformed` for an entry without a name or groups,
/// `LabelError::ReservedName` for a name of a built-in label, and
/// `LabelError::Conflict` when one group is given two different labels.
pub fn parse_user_labels<S: AsRef<str>>(specs: &[S]) -> Result<BTreeMap<Group, String>, LabelError> {
    let mut labels: BTreeMap<Group, String> = BTreeMap::new();

    for spec in specs {
        let spec = spec.as_ref();
        let (name, groups) = spec
            .split_once('=')
            .ok_or_else(|| LabelError::Malformed(spec.to_string()))?;
        let name = name.trim();
        let groups: Vec<&str> = groups
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .collect();
        if name.is_empty() || groups.is_empty() {
            return Err(LabelError::Malformed(spec.to_string()));
        }
        if is_reserved(name) {
            return Err(LabelError::ReservedName(name.to_string()));
        }

        for group in groups {
            let group = Group::parse(group);
            if let Some(existing) = labels.get(&group) {
                if existing != name {
                    return Err(LabelError::Conflict {
                        group: group.to_string(),
                        first: existing.clone(),
                        second: name.to_string(),
                    });
                }
            }
            labels.insert(group, name.to_string());
        }
    }

    Ok(labels)
}

fn is_reserved(name: &str) -> bool {
    [ALL, OTHER, NO_HIT].contains(&name)
}

/// Rank groups by descending visible span or count.
///
/// A contig in several groups counts towards each. Groups with nothing visible
/// sort last; ties are broken by group name.
#[must_use]
pub fn rank_groups(contigs: &ContigTable, order: SortOrder) -> Vec<Group> {
    let mut keys: HashMap<&Group, u64> = HashMap::new();

    for contig in contigs {
        let weight = match (contig.visible, order) {
            (false, _) => 0,
            (true, SortOrder::Span) => contig.length,
            (true, SortOrder::Count) => 1,
        };
        for group in contig.effective_groups() {
            let key = keys.entry(group).or_insert(0);
            *key = key.saturating_add(weight);
        }
    }

    let mut ranked: Vec<(&Group, u64)> = keys.into_iter().collect();
    ranked.sort_by(|a, b| (Reverse(a.1), a.0.name()).cmp(&(Reverse(b.1), b.0.name())));
    ranked.into_iter().map(|(group, _)| group.clone()).collect()
}

/// Rules for collapsing ranked groups into display labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPolicy {
    max_display: usize,
    user_labels: BTreeMap<Group, String>,
    exclusions: BTreeSet<Group>,
}

impl LabelPolicy {
    #[must_use]
    pub fn new(max_display: usize) -> Self {
        Self {
            max_display,
            user_labels: BTreeMap::new(),
            exclusions: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_user_labels(mut self, labels: BTreeMap<Group, String>) -> Self {
        self.user_labels = labels;
        self
    }

    #[must_use]
    pub fn with_exclusions(mut self, groups: impl IntoIterator<Item = Group>) -> Self {
        self.exclusions = groups.into_iter().collect();
        self
    }

    #[must_use]
    pub fn max_display(&self) -> usize {
        self.max_display
    }

    /// Check that every label produced for `group_order` has a distinct name.
    ///
    /// # Errors
    ///
    /// Returns `LabelError::ReservedGroup` for a group named like a built-in
    /// label and `LabelError::NameClash` for a user label named like a group.
    pub fn check_names(&self, group_order: &[Group]) -> Result<(), LabelError> {
        let mut names = BTreeSet::new();
        for group in group_order {
            if let Group::Taxon(name) = group {
                if is_reserved(name) {
                    return Err(LabelError::ReservedGroup(name.clone()));
                }
                names.insert(name.as_str());
            }
        }

        let labels: BTreeSet<&str> = self.user_labels.values().map(String::as_str).collect();
        match labels.into_iter().find(|label| names.contains(label)) {
            Some(label) => Err(LabelError::NameClash(label.to_string())),
            None => Ok(()),
        }
    }

    /// Map each ranked group onto its display labels.
    ///
    /// For each group in rank order the first matching rule applies:
    ///
    /// 1. excluded: `other`
    /// 2. user label `L`: `L` and the group's own name
    /// 3. rank below `max_display`: the group's own name, displayed
    /// 4. otherwise: `other` and the group's own name
    ///
    /// Every group also belongs to `all`. `other` is displayed last when used.
    /// Repeated groups in `group_order` keep their first rank.
    #[must_use]
    pub fn assign(&self, group_order: &[Group]) -> LabelAssignment {
        let mut display_order: Vec<DisplayLabel> = Vec::new();
        let mut memberships: BTreeMap<Group, BTreeSet<DisplayLabel>> = BTreeMap::new();
        let mut ranked: Vec<Group> = Vec::new();
        let mut other_used = false;

        for group in group_order {
            if memberships.contains_key(group) {
                continue;
            }
            let rank = ranked.len();
            ranked.push(group.clone());

            let mut labels = BTreeSet::from([DisplayLabel::ALL]);
            if self.exclusions.contains(group) {
                labels.insert(DisplayLabel::OTHER);
                other_used = true;
            } else if let Some(name) = self.user_labels.get(group) {
                let label = DisplayLabel::User(name.clone());
                if !display_order.contains(&label) {
                    display_order.push(label.clone());
                }
                labels.insert(label);
                labels.insert(group.own_label());
            } else if rank < self.max_display {
                let label = group.own_label();
                display_order.push(label.clone());
                labels.insert(label);
            } else {
                labels.insert(DisplayLabel::OTHER);
                labels.insert(group.own_label());
                other_used = true;
            }

            memberships.insert(group.clone(), labels);
        }

        if other_used {
            display_order.push(DisplayLabel::OTHER);
        }

        let mut colors = palette::assign_colors(&display_order);
        // Raw labels of merged groups are drawn in the colour of what they merged into.
        for (group, labels) in &memberships {
            let own = group.own_label();
            if !labels.contains(&own) || colors.contains_key(&own) {
                continue;
            }
            let merged_into = labels
                .iter()
                .find(|l| matches!(l, DisplayLabel::User(_)))
                .and_then(|l| colors.get(l).copied());
            colors.insert(own, merged_into.unwrap_or(OTHER_COLOR));
        }

        LabelAssignment {
            group_order: ranked,
            display_order,
            memberships,
            colors,
        }
    }
}

/// The outcome of applying a [`LabelPolicy`] to a group ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelAssignment {
    group_order: Vec<Group>,
    display_order: Vec<DisplayLabel>,
    memberships: BTreeMap<Group, BTreeSet<DisplayLabel>>,
    colors: BTreeMap<DisplayLabel, Color>,
}

impl LabelAssignment {
    /// Displayed labels in plot order, `other` last if present
    #[must_use]
    pub fn display_order(&self) -> &[DisplayLabel] {
        &self.display_order
    }

    /// Groups in the rank order the assignment was made from
    #[must_use]
    pub fn group_order(&self) -> &[Group] {
        &self.group_order
    }

    /// Every label a group contributes to, including `all`
    #[must_use]
    pub fn labels_for(&self, group: &Group) -> Option<&BTreeSet<DisplayLabel>> {
        self.memberships.get(group)
    }

    /// All labels any group contributes to
    #[must_use]
    pub fn labels(&self) -> BTreeSet<DisplayLabel> {
        let mut labels = BTreeSet::from([DisplayLabel::ALL]);
        for group_labels in self.memberships.values() {
            labels.extend(group_labels.iter().cloned());
        }
        labels
    }

    /// Groups contributing to a label, in rank order
    #[must_use]
    pub fn groups_in(&self, label: &DisplayLabel) -> Vec<&Group> {
        self.group_order
            .iter()
            .filter(|g| {
                self.memberships
                    .get(*g)
                    .is_some_and(|labels| labels.contains(label))
            })
            .collect()
    }

    #[must_use]
    pub fn color(&self, label: &DisplayLabel) -> Option<Color> {
        self.colors.get(label).copied()
    }
}
