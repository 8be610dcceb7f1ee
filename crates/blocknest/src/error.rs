// ABOUTME: Error types for block nesting including the ErrorCode enum and RelocationError struct.
// ABOUTME: Provides categorized, non-fatal failures with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the reasons a relocation directive can be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MetadataMissing,
    IndexUnresolved,
    SlotNotFound,
    SectionNotFound,
    DecorationTimeout,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::MetadataMissing => "metadata missing",
            ErrorCode::IndexUnresolved => "index unresolved",
            ErrorCode::SlotNotFound => "slot not found",
            ErrorCode::SectionNotFound => "section not found",
            ErrorCode::DecorationTimeout => "decoration timeout",
        };
        write!(f, "{}", s)
    }
}

/// A skipped relocation directive.
///
/// `block` names the container the directive belonged to (its category marker),
/// `op` names the step that failed. None of these errors reach the page; they are
/// logged and collected into the page report.
#[derive(Debug, Clone, thiserror::Error, serde::Serialize)]
pub struct RelocationError {
    pub code: ErrorCode,
    pub block: String,
    pub op: String,
    pub detail: Option<String>,
}

impl fmt::Display for RelocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blocknest: {} {}: {}", self.op, self.block, self.code)?;
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl RelocationError {
    fn new(
        code: ErrorCode,
        block: impl Into<String>,
        op: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            code,
            block: block.into(),
            op: op.into(),
            detail,
        }
    }

    /// Create a MetadataMissing error.
    pub fn metadata_missing(
        block: impl Into<String>,
        op: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self::new(ErrorCode::MetadataMissing, block, op, detail)
    }

    /// Create an IndexUnresolved error.
    pub fn index_unresolved(
        block: impl Into<String>,
        op: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self::new(ErrorCode::IndexUnresolved, block, op, detail)
    }

    /// Create a SlotNotFound error.
    pub fn slot_not_found(
        block: impl Into<String>,
        op: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self::new(ErrorCode::SlotNotFound, block, op, detail)
    }

    /// Create a SectionNotFound error.
    pub fn section_not_found(
        block: impl Into<String>,
        op: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self::new(ErrorCode::SectionNotFound, block, op, detail)
    }

    /// Create a DecorationTimeout error.
    pub fn decoration_timeout(
        block: impl Into<String>,
        op: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self::new(ErrorCode::DecorationTimeout, block, op, detail)
    }

    /// Returns true if this is a MetadataMissing error.
    pub fn is_metadata_missing(&self) -> bool {
        self.code == ErrorCode::MetadataMissing
    }

    /// Returns true if this is an IndexUnresolved error.
    pub fn is_index_unresolved(&self) -> bool {
        self.code == ErrorCode::IndexUnresolved
    }

    /// Returns true if this is a SlotNotFound error.
    pub fn is_slot_not_found(&self) -> bool {
        self.code == ErrorCode::SlotNotFound
    }

    /// Returns true if this is a SectionNotFound error.
    pub fn is_section_not_found(&self) -> bool {
        self.code == ErrorCode::SectionNotFound
    }

    /// Returns true if this is a DecorationTimeout error.
    pub fn is_decoration_timeout(&self) -> bool {
        self.code == ErrorCode::DecorationTimeout
    }
}
