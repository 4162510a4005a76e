//! Row models returned by the repositories.

pub mod asset;
