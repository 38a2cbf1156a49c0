//! Row-level reconciliation for the admin list screens.

mod domain;
mod status;
mod sync;
mod view;

#[cfg(test)]
mod tests;

pub use domain::{DeleteRoute, EntityKind, EntityRef, EntityRow};
pub use status::{ConfirmationPrompt, StatusMessage, StatusRegion, StatusTone};
pub use sync::{DeleteOutcome, DeletionListener, EntityRowSync, RowSyncError};
pub use view::{ListViewModel, RowFilter};
