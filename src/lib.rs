//! Kartoteka: a record form over an embedded document store.
//!
//! [`api::DbApi`] is the connection handle; [`form::Form`] drives CRUD actions through a
//! [`form::RecordBackend`]; [`tui`] and [`cli`] are the two front ends.

pub mod api;
pub mod cli;
pub mod collection;
pub mod config;
pub mod document;
pub mod engine;
pub mod errors;
pub mod form;
pub mod fsutil;
pub mod logger;
pub mod query;
pub mod record;
pub mod snapshot;
pub mod tui;
pub mod types;

pub use api::DbApi;
pub use errors::DbError;
pub use record::Record;
