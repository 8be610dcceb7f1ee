// ABOUTME: PageReport and ContainerReport describing what one decoration pass did.
// ABOUTME: Serializable for the CLI's JSON output; includes summary helpers.

use serde::Serialize;

use crate::dom::ContainerKind;
use crate::error::RelocationError;
use crate::nesting::RelocationMode;

/// What happened to one container block.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerReport {
    pub kind: ContainerKind,
    /// `None` when the container had nothing to relocate (not the first of its
    /// section, or already relocated by an earlier pass).
    pub mode: Option<RelocationMode>,
    pub moved: usize,
    pub hidden: usize,
    pub skipped: Vec<RelocationError>,
}

impl ContainerReport {
    pub fn idle(kind: ContainerKind) -> Self {
        Self {
            kind,
            mode: None,
            moved: 0,
            hidden: 0,
            skipped: Vec::new(),
        }
    }
}

/// The result of decorating a page.
#[derive(Debug, Clone, Serialize, Default)]
pub struct PageReport {
    /// Blocks decorated during this pass.
    pub decorated: usize,
    pub containers: Vec<ContainerReport>,
}

impl PageReport {
    /// Total blocks moved across all containers.
    pub fn moved(&self) -> usize {
        self.containers.iter().map(|c| c.moved).sum()
    }

    /// Total elements hidden across all containers.
    pub fn hidden(&self) -> usize {
        self.containers.iter().map(|c| c.hidden).sum()
    }

    /// Every skipped directive, in container order.
    pub fn skipped(&self) -> impl Iterator<Item = &RelocationError> {
        self.containers.iter().flat_map(|c| c.skipped.iter())
    }

    /// Returns true if no directive was skipped.
    pub fn is_clean(&self) -> bool {
        self.skipped().next().is_none()
    }
}
