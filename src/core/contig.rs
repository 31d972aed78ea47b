use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::core::types::Group;

/// A single assembled sequence with the attributes used for grouping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contig {
    /// Sequence identifier, unique within an assembly
    pub name: String,

    /// Sequence length in bases
    pub length: u64,

    /// GC proportion in [0, 1]
    pub gc: f64,

    /// Raw annotation groups; empty means no hit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,

    /// Whether the contig passes the display filters
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Contig {
    pub fn new(name: impl Into<String>, length: u64, gc: f64) -> Self {
        Self {
            name: name.into(),
            length,
            gc,
            groups: Vec::new(),
            visible: true,
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: Group) -> Self {
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
        self
    }

    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Groups the contig belongs to, with the no-hit sentinel standing in for none
    pub fn effective_groups(&self) -> impl Iterator<Item = &Group> {
        const NO_HIT: &[Group] = &[Group::NoHit];
        let groups = if self.groups.is_empty() {
            NO_HIT
        } else {
            self.groups.as_slice()
        };
        groups.iter()
    }
}

/// An ordered collection of contigs indexed by name
#[derive(Debug, Clone, Default)]
pub struct ContigTable {
    contigs: Vec<Contig>,
    index: HashMap<String, usize>,
}

impl ContigTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contig, replacing an existing one with the same name in place
    pub fn insert(&mut self, contig: Contig) {
        if let Some(&i) = self.index.get(&contig.name) {
            self.contigs[i] = contig;
        } else {
            self.index.insert(contig.name.clone(), self.contigs.len());
            self.contigs.push(contig);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Contig> {
        self.index.get(name).map(|&i| &self.contigs[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Contig> {
        self.index.get(name).map(|&i| &mut self.contigs[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contig> {
        self.contigs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    /// The set of valid contig names alignments may reference
    #[must_use]
    pub fn known_names(&self) -> HashSet<String> {
        self.index.keys().cloned().collect()
    }

    /// Hide every contig shorter than `min_length`
    pub fn apply_min_length(&mut self, min_length: u64) {
        for contig in &mut self.contigs {
            if contig.length < min_length {
                contig.visible = false;
            }
        }
    }

    /// Attach groups from a `contig -> group` assignment. Unknown names are returned.
    pub fn assign_groups<'a, I>(&mut self, assignments: I) -> Vec<String>
    where
        I: IntoIterator<Item = (&'a str, Group)>,
    {
        let mut unknown = Vec::new();
        for (name, group) in assignments {
            match self.get_mut(name) {
                Some(contig) => {
                    if !contig.groups.contains(&group) {
                        contig.groups.push(group);
                    }
                }
                None => unknown.push(name.to_string()),
            }
        }
        unknown
    }
}

impl FromIterator<Contig> for ContigTable {
    fn from_iter<T: IntoIterator<Item = Contig>>(iter: T) -> Self {
        let mut table = Self::new();
        for contig in iter {
            table.insert(contig);
        }
        table
    }
}

impl<'a> IntoIterator for &'a ContigTable {
    type Item = &'a Contig;
    type IntoIter = std::slice::Iter<'a, Contig>;

    fn into_iter(self) -> Self::IntoIter {
        self.contigs.iter()
    }
}
