// ABOUTME: Page wrapper owning the parsed dom_query Document for one decoration pass.
// ABOUTME: Provides section and block discovery scoped to explicit handles, plus serialization.

use dom_query::{Document, NodeId, NodeRef};

use super::category::BlockCategory;
use super::selectors::{BLOCK, MAIN, SECTION};
use super::tree;
use crate::nesting::DecorationTracker;

/// A parsed page.
///
/// The document is mutated in place through `&self`; `dom_query` keeps its arena
/// behind interior mutability, so decoration futures can share one `&Page`.
/// The page also carries its blocks' completion signals, so a repeated pass
/// sees the relocations already claimed.
pub struct Page {
    doc: Document,
    tracker: DecorationTracker,
}

impl Page {
    /// Parse a full HTML document.
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Document::from(html),
            tracker: DecorationTracker::new(),
        }
    }

    /// Serialize the current tree.
    pub fn html(&self) -> String {
        self.doc.html().to_string()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn tracker(&self) -> &DecorationTracker {
        &self.tracker
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.doc.root()
    }

    /// Resolve a handle captured earlier in the pass.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.doc.tree.get(&id)
    }

    /// Create a detached element owned by this page.
    pub fn new_element(&self, name: &str) -> NodeRef<'_> {
        self.doc.tree.new_element(name)
    }

    /// The `<main>` element, or the document root when the page has none.
    pub fn main(&self) -> NodeRef<'_> {
        let root = self.root();
        tree::select_first(&root, &MAIN).unwrap_or(root)
    }

    /// Every section of the page in document order.
    pub fn sections(&self) -> Vec<NodeRef<'_>> {
        tree::select(&self.main(), &SECTION)
    }

    /// Every block of the page in document order.
    pub fn blocks(&self) -> Vec<NodeRef<'_>> {
        blocks_in(&self.main())
    }
}

/// Section holding `node` (ancestor-or-self).
pub fn section_of<'a>(node: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    tree::closest(node, &SECTION)
}

/// Blocks below `scope` in document order.
pub fn blocks_in<'a>(scope: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    tree::select(scope, &BLOCK)
        .into_iter()
        .filter(|el| BlockCategory::of(el).is_some())
        .collect()
}

/// First metadata block below `scope`.
pub fn metadata_in<'a>(scope: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    blocks_in(scope)
        .into_iter()
        .find(|el| BlockCategory::of(el).map_or(false, |c| c.is_metadata()))
}

/// Sections sharing `section`'s parent that come after it, in document order.
pub fn following_sections<'a>(section: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    let Some(parent) = section.parent() else {
        return Vec::new();
    };
    parent
        .element_children()
        .into_iter()
        .skip_while(|el| el.id != section.id)
        .skip(1)
        .filter(|el| el.is_match(&SECTION))
        .collect()
}

/// Sections sharing `section`'s parent that carry `class`, in document order.
pub fn sibling_sections_with_class<'a>(section: &NodeRef<'a>, class: &str) -> Vec<NodeRef<'a>> {
    let Some(parent) = section.parent() else {
        return Vec::new();
    };
    parent
        .element_children()
        .into_iter()
        .filter(|el| el.is_match(&SECTION) && el.has_class(class))
        .collect()
}
