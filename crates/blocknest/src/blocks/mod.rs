// ABOUTME: Structural block decoration and the BlockLoader seam used for moved blocks.
// ABOUTME: StructuralLoader decorates accordion and tabs blocks and marks every block loaded.

//! Block decoration.
//!
//! Structural decoration turns authored rows into slots (accordion item bodies,
//! tab panels). It must finish before any relocation targets the block.

pub mod accordion;
pub mod tabs;

use dom_query::NodeRef;
use tracing::debug;

use crate::dom::tree::{mark_loaded, needs_decoration};
use crate::dom::{BlockCategory, ContainerKind, Page};

/// Loads (decorates) a block in its current location.
///
/// The relocator calls this for every moved block that is still undecorated,
/// so the block's own behavior activates inside its new slot.
pub trait BlockLoader {
    fn load(&self, page: &Page, block: &NodeRef<'_>);
}

/// Default loader: structural decoration only.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralLoader;

impl BlockLoader for StructuralLoader {
    fn load(&self, page: &Page, block: &NodeRef<'_>) {
        decorate_structure(page, block);
    }
}

/// Run structural decoration for `block` unless it already ran.
///
/// Returns true when decoration ran.
pub fn decorate_structure(page: &Page, block: &NodeRef) -> bool {
    if !needs_decoration(block) {
        return false;
    }
    let Some(category) = BlockCategory::of(block) else {
        return false;
    };

    match category {
        BlockCategory::Container(ContainerKind::Accordion) => {
            let items = accordion::decorate(page, block);
            debug!("decorated accordion with {} items", items);
        }
        BlockCategory::Container(ContainerKind::Tabs) => {
            let panels = tabs::decorate(page, block);
            debug!("decorated tabs with {} panels", panels);
        }
        _ => {}
    }

    mark_loaded(block);
    true
}
