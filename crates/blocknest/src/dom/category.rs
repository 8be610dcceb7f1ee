// ABOUTME: Block classification by category marker: container, metadata, or content.
// ABOUTME: ContainerKind carries the per-widget names (index key, section class, slot classes).

use std::fmt;

use dom_query::NodeRef;
use serde::Serialize;

use super::tree::BLOCK_CLASS;

/// Attribute holding the stable block name, when the host provides one.
pub const BLOCK_NAME_ATTR: &str = "data-block-name";

/// Container widgets that own slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Accordion,
    Tabs,
}

impl ContainerKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "accordion" => Some(ContainerKind::Accordion),
            "tabs" => Some(ContainerKind::Tabs),
            _ => None,
        }
    }

    /// Category marker, also the value of the metadata `parent` key.
    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::Accordion => "accordion",
            ContainerKind::Tabs => "tabs",
        }
    }

    /// Metadata key naming the target slot index.
    pub fn index_key(&self) -> &'static str {
        match self {
            ContainerKind::Accordion => "accordion-item",
            ContainerKind::Tabs => "tabs-item",
        }
    }

    /// Class the host adds to a section holding this container.
    pub fn section_class(&self) -> &'static str {
        match self {
            ContainerKind::Accordion => "accordion-container",
            ContainerKind::Tabs => "tabs-container",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Category of a block, read from its marker. Never inferred from content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockCategory {
    Container(ContainerKind),
    Metadata,
    Content(String),
}

impl BlockCategory {
    /// Classify `node`. Returns `None` for elements that are not blocks.
    ///
    /// The marker is `data-block-name` when present, otherwise the first class
    /// token other than `block`.
    pub fn of(node: &NodeRef) -> Option<Self> {
        if !node.is_element() || !node.has_class(BLOCK_CLASS) {
            return None;
        }
        let marker = match node.attr(BLOCK_NAME_ATTR) {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => node
                .attr("class")
                .and_then(|class| {
                    class
                        .split_whitespace()
                        .find(|token| *token != BLOCK_CLASS)
                        .map(str::to_string)
                })?,
        };
        Some(Self::from_marker(&marker))
    }

    pub fn from_marker(marker: &str) -> Self {
        if let Some(kind) = ContainerKind::from_name(marker) {
            return BlockCategory::Container(kind);
        }
        match marker {
            "metadata" => BlockCategory::Metadata,
            other => BlockCategory::Content(other.to_string()),
        }
    }

    pub fn marker(&self) -> &str {
        match self {
            BlockCategory::Container(kind) => kind.name(),
            BlockCategory::Metadata => "metadata",
            BlockCategory::Content(name) => name,
        }
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            BlockCategory::Container(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_metadata(&self) -> bool {
        matches!(self, BlockCategory::Metadata)
    }

    /// Embedded media blocks, the candidates of same-section relocation.
    pub fn is_media(&self) -> bool {
        matches!(self, BlockCategory::Content(name) if name == "embed" || name == "video")
    }
}

impl fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}
