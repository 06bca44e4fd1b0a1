//! Fetch-on-attach / fetch-on-interval state for views that poll.

mod controller;
mod view;

pub use controller::{Fetch, FetchFn, PollingController, RefreshTarget};
pub use view::{ErrorPolicy, LoadPhase, RefreshableView, Ticket};
