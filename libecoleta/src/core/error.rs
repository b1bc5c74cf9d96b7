//! Objects related to reporting errors from this library

/// A list of error types that can occur within this library
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("can't update the object, no id was specified")]
    InvalidUpdateObjectNotFound,

    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),

    #[error(transparent)]
    DatabaseMigrationError(#[from] sqlx::migrate::MigrateError),
}

impl Error {
    /// Whether this error means that the requested row does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::DatabaseError(sqlx::Error::RowNotFound))
    }
}

/// A convenience type alias for a [Result] with [Error] as its error type
pub type Result<T, E = Error> = std::result::Result<T, E>;
