//! Daily activity tracking.
//!  - [template] is the fixed set of activities every day starts with.
//!  - [log::DailyLog] is one day's editable copy of those activities.
//!  - [store::DailyLogStore] persists days as [log::DailyRecord]s.
//!  - [aggregate::Aggregator] summarizes stored days.

pub mod aggregate;
pub mod log;
pub mod store;
pub mod template;
