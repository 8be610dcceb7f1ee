// ABOUTME: Slot resolver locating the child slot of a decorated container that receives moved blocks.
// ABOUTME: Index comes from metadata (strict base-10) or a caller default; out-of-range is NotFound.

use dom_query::NodeRef;

use super::metadata::MetadataRecord;
use crate::dom::selectors::{ACCORDION_BODY, DIV};
use crate::dom::tree::{select_first, trimmed_text};
use crate::dom::ContainerKind;
use crate::error::RelocationError;

pub const ACCORDION_ITEM_CLASS: &str = "accordion-item";
pub const ACCORDION_BODY_CLASS: &str = "accordion-item-body";
pub const TABS_PANEL_CLASS: &str = "tabs-panel";

const OP: &str = "resolve slot";

/// A resolved insertion point inside a container.
#[derive(Debug, Clone)]
pub struct Slot<'a> {
    pub index: usize,
    pub node: NodeRef<'a>,
}

/// Slot-bearing children of a decorated container, in order.
///
/// Only direct children count, so slots of a container nested inside this one
/// are never picked up.
pub fn slot_items<'a>(container: &NodeRef<'a>, kind: ContainerKind) -> Vec<NodeRef<'a>> {
    let class = match kind {
        ContainerKind::Accordion => ACCORDION_ITEM_CLASS,
        ContainerKind::Tabs => TABS_PANEL_CLASS,
    };
    container
        .element_children()
        .into_iter()
        .filter(|el| el.has_class(class))
        .collect()
}

pub fn slot_count(container: &NodeRef, kind: ContainerKind) -> usize {
    slot_items(container, kind).len()
}

/// Parse a metadata index. Base 10 only; anything else, including a sign or
/// trailing text, is malformed.
pub fn parse_index(raw: &str) -> Option<usize> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Pick the target index: the record's index key when present, else `default_index`.
///
/// A present but malformed index is an error, never a silent fallback.
pub fn resolve_index(
    kind: ContainerKind,
    record: Option<&MetadataRecord>,
    default_index: usize,
) -> Result<usize, RelocationError> {
    match record.and_then(|r| r.index_for(kind)) {
        Some(raw) => parse_index(raw).ok_or_else(|| {
            RelocationError::index_unresolved(
                kind.name(),
                OP,
                Some(format!("{} = {:?} is not a base-10 index", kind.index_key(), raw)),
            )
        }),
        None => Ok(default_index),
    }
}

/// Look up slot `index` of a decorated container.
pub fn slot_at<'a>(
    container: &NodeRef<'a>,
    kind: ContainerKind,
    index: usize,
) -> Result<Slot<'a>, RelocationError> {
    let items = slot_items(container, kind);
    let available = items.len();
    let item = items.into_iter().nth(index).ok_or_else(|| {
        RelocationError::slot_not_found(
            kind.name(),
            OP,
            Some(format!("index {} of {} slots", index, available)),
        )
    })?;

    let node = match kind {
        ContainerKind::Accordion => select_first(&item, &ACCORDION_BODY).ok_or_else(|| {
            RelocationError::slot_not_found(
                kind.name(),
                OP,
                Some(format!("item {} has no body", index)),
            )
        })?,
        ContainerKind::Tabs => item,
    };

    Ok(Slot { index, node })
}

/// Resolve the slot that should receive relocated content.
///
/// Pure with respect to (container, record, default_index).
pub fn resolve_target_slot<'a>(
    container: &NodeRef<'a>,
    kind: ContainerKind,
    record: Option<&MetadataRecord>,
    default_index: usize,
) -> Result<Slot<'a>, RelocationError> {
    let index = resolve_index(kind, record, default_index)?;
    slot_at(container, kind, index)
}

/// Remove the slot's placeholder: its first `div` child carrying text.
///
/// Returns true when something was removed.
pub fn clear_placeholder(slot: &Slot) -> bool {
    let placeholder = slot
        .node
        .element_children()
        .into_iter()
        .find(|el| el.is_match(&DIV) && !trimmed_text(el).is_empty());
    match placeholder {
        Some(el) => {
            el.remove_from_parent();
            true
        }
        None => false,
    }
}
