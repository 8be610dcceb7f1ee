// ABOUTME: Metadata reader turning a two-column metadata block into a key/value record.
// ABOUTME: Cells pair positionally (key, value, key, value, ...); a dangling key is dropped.

use std::collections::HashMap;

use dom_query::NodeRef;

use crate::dom::selectors::DIV;
use crate::dom::tree::{children_matching, trimmed_text};
use crate::dom::ContainerKind;

/// Key naming the container type a metadata block targets.
pub const PARENT_KEY: &str = "parent";

/// Key/value directives parsed from one metadata block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    entries: HashMap<String, String>,
}

impl MetadataRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn parent(&self) -> Option<&str> {
        self.get(PARENT_KEY)
    }

    /// Raw index value for `kind`, before any integer parse.
    pub fn index_for(&self, kind: ContainerKind) -> Option<&str> {
        self.get(kind.index_key())
    }

    /// True when the record names `kind` as its parent and carries its index key.
    pub fn targets(&self, kind: ContainerKind) -> bool {
        self.parent() == Some(kind.name()) && self.index_for(kind).is_some()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Read the record out of a metadata block.
///
/// Cells are the block's `div` grandchildren (`block > div > div`) in document
/// order; other elements at either level are ignored. Pairs with an empty key or value are skipped; a repeated key keeps the
/// last value. Never fails: a malformed block yields an empty or partial record.
pub fn read_metadata(block: &NodeRef) -> MetadataRecord {
    let cells: Vec<String> = children_matching(block, &DIV)
        .iter()
        .flat_map(|row| children_matching(row, &DIV))
        .map(|cell| trimmed_text(&cell))
        .collect();

    let mut entries = HashMap::new();
    for pair in cells.chunks_exact(2) {
        let (key, value) = (&pair[0], &pair[1]);
        if key.is_empty() || value.is_empty() {
            continue;
        }
        entries.insert(key.clone(), value.clone());
    }

    MetadataRecord { entries }
}
