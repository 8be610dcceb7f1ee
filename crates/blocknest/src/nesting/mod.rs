// ABOUTME: Section-scoped nested-block relocation: metadata reader, slot resolver, relocator.
// ABOUTME: Also holds the decoration-complete signals that sequence relocation after decoration.

pub mod metadata;
pub mod relocate;
pub mod signal;
pub mod slot;

pub use metadata::{read_metadata, MetadataRecord};
pub use relocate::{RelocationDirective, RelocationMode, RelocationPlan, RelocationReport};
pub use signal::DecorationTracker;
pub use slot::{resolve_target_slot, Slot};
