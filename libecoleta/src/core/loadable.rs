//! A trait for objects that live in the database and can be looked up by id
use crate::{Database, Result};
use async_trait::async_trait;

#[async_trait]
pub trait Loadable {
    type Id: Send + Sync;

    /// The id value of an object that has not been inserted into the database yet
    fn invalid_id() -> Self::Id;

    fn id(&self) -> Self::Id;

    fn set_id(&mut self, id: Self::Id);

    /// Load the object with the given id. If no such row exists the error
    /// will report [crate::Error::is_not_found()]
    async fn load(id: Self::Id, db: &Database) -> Result<Self>
    where
        Self: Sized;
}
