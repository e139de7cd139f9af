//! Workspace Module
//!
//! Users, the folders they own, and the recurring-job descriptors (schedules) attached to
//! those folders.
//!
//! Schedules carry a cron expression and a target URL. Both are stored verbatim; nothing in
//! this crate parses or runs them.
//!
//! Owner and folder ids arrive in request bodies and are not checked against existing rows,
//! so a folder may name an unknown owner and a schedule may outlive its folder.

mod handler;
mod routes;
mod store;

pub use routes::routes;
pub use store::Workspace;
