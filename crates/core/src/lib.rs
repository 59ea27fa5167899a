//! Functional core for feedletter.
//!
//! Domain types, validation and the traits the server implements. Nothing in
//! this crate performs I/O.

pub mod campaign;
pub mod feed;
pub mod mail;
pub mod message;
pub mod serde;
pub mod storage;
pub mod subscriber;
