//! Core infrastructure for managing and accessing the location directory.
pub mod database;
pub mod error;
pub mod loadable;
pub mod query;
