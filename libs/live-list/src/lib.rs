//! Live list synchronization for the inventory history views.
//!
//! [`LiveList`] is the cache and its merge rules; it knows nothing about
//! transport. [`LiveView`] owns one `LiveList` inside a single dispatcher
//! task and feeds it the initial bulk load and the change feed.

pub mod error;
mod event;
pub mod history;
mod list;
mod view;

pub use error::SyncError;
pub use event::FeedEvent;
pub use history::{HistoryRow, ListFilter, MovementFilter, action_text, format_timestamp};
pub use list::{LiveList, SyncState};
pub use view::{LiveView, LiveViewConfig, ViewSnapshot, ViewStatus};
