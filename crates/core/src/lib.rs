//! Domain types shared by the catalog repository and API layers.
//!
//! Nothing in this crate touches the database: the asset write model, the
//! validation gate, and search helpers are pure logic.

pub mod asset;
pub mod error;
pub mod search;
pub mod types;
