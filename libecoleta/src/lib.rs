//! This is a library that provides objects and functionality to manage a
//! directory of recycling collection locations and the kinds of items that each
//! location accepts, all kept inside of a database.

use serde::{Deserialize, Deserializer};
use std::str::FromStr;

pub mod core;
pub mod item;
pub mod location;

pub use crate::core::database::Database;
pub use crate::core::error::Error;
pub use crate::core::error::Result;

/// A serde helper that treats a missing value and an empty string the same
/// way. Query strings like `?city=&uf=MG` produce `None` for `city`.
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => FromStr::from_str(s)
            .map_err(serde::de::Error::custom)
            .map(Some),
    }
}
