//! Error types for portfolio_tracker
//!
//! Only the entry builder has a domain error. Everything else bubbles up
//! as an `eyre::Report` from the command runners.

use crate::entry::FormField;
use thiserror::Error;

/// Reasons a form submission is rejected.
///
/// The TUI swallows these silently; the batch report logs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("{0} is required")]
    MissingField(FormField),
}
