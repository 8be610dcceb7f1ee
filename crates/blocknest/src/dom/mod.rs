// ABOUTME: DOM access layer over dom_query for decorated pages.
// ABOUTME: Exposes the Page wrapper, block classification, and tree traversal helpers.

//! DOM utilities for the page tree.
//!
//! This module owns everything that touches `dom_query` directly: parsing and
//! serializing the page, finding sections and blocks, classifying blocks by
//! their category marker, and the display suppression primitive.

pub mod category;
pub mod page;
pub mod selectors;
pub mod tree;

pub use category::{BlockCategory, ContainerKind};
pub use page::Page;
