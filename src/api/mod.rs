//! Data access wrapper: a connection handle with generic CRUD calls over named collections.

mod db;
mod uri;

pub use db::{DbApi, Found, Insert};
pub use uri::ConnectionUri;
