// ABOUTME: Main library entry point for blocknest, section-scoped nested-block relocation.
// ABOUTME: Re-exports the public API: Decorator, DecoratorBuilder, Page, PageReport, RelocationError, Options.

//! Blocknest decorates authored pages built from sections and blocks, then
//! nests blocks into the slots of container blocks (accordion items, tab
//! panels) as directed by section metadata.
//!
//! # Example
//!
//! ```no_run
//! use blocknest::{Decorator, Page};
//!
//! #[tokio::main]
//! async fn main() {
//!     let page = Page::parse("<main><div class=\"section\">...</div></main>");
//!     let report = Decorator::builder().build().decorate_page(&page).await;
//!     println!("moved {} blocks", report.moved());
//!     println!("{}", page.html());
//! }
//! ```

pub mod blocks;
pub mod decorator;
pub mod dom;
pub mod error;
pub mod nesting;
pub mod options;
pub mod result;

pub use crate::blocks::{BlockLoader, StructuralLoader};
pub use crate::decorator::Decorator;
pub use crate::dom::{BlockCategory, ContainerKind, Page};
pub use crate::error::{ErrorCode, RelocationError};
pub use crate::nesting::RelocationMode;
pub use crate::options::{DecoratorBuilder, Options};
pub use crate::result::{ContainerReport, PageReport};
