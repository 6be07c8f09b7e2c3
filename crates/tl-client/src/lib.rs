//! Remote store access for the time log dashboard.
//!
//! - [`Client`]: bearer-authenticated HTTP client for the `/timelogs` API
//! - [`EntryStore`]: the operations views need from a store
//! - [`Dashboard`]: latest-wins loading of the range view and day timeline

mod client;
pub mod dashboard;
mod store;

pub use client::{Client, ClientError};
pub use dashboard::{Dashboard, FetchSlot, FetchTicket, RangeView, ViewState};
pub use store::EntryStore;
