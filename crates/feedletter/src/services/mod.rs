//! Application services shared by the HTTP handlers and the background jobs.

pub mod campaigns;
pub mod dispatch;
pub mod feed;
pub mod subscribers;
