use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};

use crate::error::PmotifError;

static CLASS_NAMES: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {
    IndexMap::from([
        ("011 101 110", "Triangle"),
        ("011 100 100", "3-Dash"),
        ("0110 1001 1000 0100", "4-Dash"),
        ("0111 1000 1000 1000", "Fork"),
        ("0111 1010 1100 1000", "Spoon"),
        ("0110 1001 1001 0110", "Square"),
        ("0111 1011 1100 1100", "Crossed Square"),
        ("0111 1011 1101 1110", "Double Crossed Square"),
    ])
});

/// Canonical isomorphism class of a size-k graphlet.
///
/// Stored as k rows of k binary digits separated by single spaces, e.g.
/// `"011 101 110"` for the triangle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphletClass(String);

impl GraphletClass {
    /// Parse an already canonical class string.
    pub fn parse(class: &str) -> Result<Self, PmotifError> {
        let rows: Vec<&str> = class.split(' ').collect();
        let k = rows.len();
        let well_formed = k > 0
            && rows
                .iter()
                .all(|row| row.len() == k && row.bytes().all(|b| b == b'0' || b == b'1'));
        if !well_formed {
            return Err(PmotifError::format(
                "graphlet class",
                1,
                format!("{class:?} is not a square binary matrix"),
            ));
        }
        Ok(Self(class.to_string()))
    }

    /// Build the class from the scanner's reversed, unseparated adjacency label.
    pub fn from_reversed_label(label: &str) -> Result<Self, String> {
        if label.is_empty() || !label.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(format!("label {label:?} is not a binary string"));
        }
        let k = integer_sqrt(label.len());
        if k * k != label.len() {
            return Err(format!(
                "label {label:?} has length {}, which is not a square",
                label.len()
            ));
        }
        // The scanner writes the matrix back to front.
        let reversed: Vec<u8> = label.bytes().rev().collect();
        let rows: Vec<&str> = reversed
            .chunks(k)
            .map(|row| std::str::from_utf8(row).unwrap_or_default())
            .collect();
        Ok(Self(rows.join(" ")))
    }

    /// Inverse of [`GraphletClass::from_reversed_label`].
    pub fn to_reversed_label(&self) -> String {
        self.0.chars().rev().filter(|c| *c != ' ').collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of nodes in graphlets of this class.
    pub fn size(&self) -> usize {
        self.0.split(' ').next().map(str::len).unwrap_or_default()
    }

    /// Human-readable name for the known 3- and 4-node classes.
    pub fn name(&self) -> Option<&'static str> {
        CLASS_NAMES.get(self.0.as_str()).copied()
    }

    /// Name if known, the raw class string otherwise.
    pub fn display_name(&self) -> String {
        self.name()
            .map(str::to_string)
            .unwrap_or_else(|| self.0.clone())
    }

    pub fn from_name(name: &str) -> Option<Self> {
        CLASS_NAMES
            .iter()
            .find(|(_, known)| **known == name)
            .map(|(class, _)| Self((*class).to_string()))
    }

    /// Known connected classes of the given size, in lookup-table order.
    pub fn known_classes(size: usize) -> Vec<Self> {
        CLASS_NAMES
            .keys()
            .map(|class| Self((*class).to_string()))
            .filter(|class| class.size() == size)
            .collect()
    }

    /// Pattern graph of the class over role indices `0..k`.
    pub fn to_graph(&self) -> UnGraphMap<usize, ()> {
        let mut graph = UnGraphMap::new();
        let rows: Vec<&str> = self.0.split(' ').collect();
        for i in 0..rows.len() {
            graph.add_node(i);
        }
        for (i, row) in rows.iter().enumerate() {
            for (j, cell) in row.bytes().enumerate() {
                if cell == b'1' && i != j {
                    graph.add_edge(i, j, ());
                }
            }
        }
        graph
    }
}

impl fmt::Display for GraphletClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn integer_sqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}
