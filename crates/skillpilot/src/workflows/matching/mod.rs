//! Match notification: sending the "you have been matched" email for each shown pair, one
//! at a time or all together.

mod domain;
mod notifier;

#[cfg(test)]
mod tests;

pub use domain::{MatchPair, NotificationRecord, NotificationState, RenderedPair};
pub use notifier::{BulkOutcome, ControlState, DispatchOutcome, MatchNotifier, NotifyError};
