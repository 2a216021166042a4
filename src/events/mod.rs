//! Corporate-Event Processor and Cash-Event Scheduler: the two components that replay dated,
//! time-indexed mutations into the account and share-availability state as the clock advances
//! (§4.6, §4.7).

pub mod cash;
pub mod corporate;
pub mod error;
