use crate::validation::ValidationErrors;
use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error(transparent)]
    Libecoleta(#[from] libecoleta::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Location not found")]
    LocationNotFound,
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("The request body was rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("The provided query string was rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("The multipart request was rejected: {0}")]
    MultipartRejection(#[from] MultipartRejection),
    #[error("Unable to read multipart field: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Unexpected field '{0}'")]
    UnexpectedUploadField(String),
}

impl Error {
    /// Map a library error, turning a missing row into [Error::LocationNotFound]
    pub(crate) fn from_location_lookup(e: libecoleta::Error) -> Self {
        if e.is_not_found() {
            Error::LocationNotFound
        } else {
            e.into()
        }
    }

    pub(crate) fn to_client_status(&self) -> (StatusCode, String) {
        match self {
            Error::Database(_) | Error::Other(_) | Error::Libecoleta(_) | Error::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            // clients have always received a 400 for a missing location
            Error::LocationNotFound => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::Validation(errors) => (StatusCode::BAD_REQUEST, errors.message()),
            Error::JsonRejection(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            Error::QueryRejection(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            Error::MultipartRejection(rejection) => {
                (StatusCode::BAD_REQUEST, rejection.body_text())
            }
            Error::Multipart(e) => (e.status(), e.body_text()),
            Error::UnexpectedUploadField(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        warn!("Got error for response: {self:?}");
        let (status, message) = self.to_client_status();
        let body = match &self {
            Error::Validation(errors) => json!({
                "statusCode": status.as_u16(),
                "error": status.canonical_reason().unwrap_or("Bad Request"),
                "message": message,
                "validation": {
                    "body": {
                        "source": "body",
                        "keys": errors.keys(),
                        "message": message,
                    }
                }
            }),
            _ => json!({ "message": message }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldError;

    #[test]
    fn test_client_status() {
        let (status, msg) = Error::LocationNotFound.to_client_status();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "Location not found");

        let (status, msg) = Error::Database(sqlx::Error::PoolTimedOut).to_client_status();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, "Internal server error");

        let errors = ValidationErrors(vec![
            FieldError {
                key: "name".into(),
                message: "\"name\" is required".into(),
            },
            FieldError {
                key: "uf".into(),
                message: "\"uf\" is a required field".into(),
            },
        ]);
        let (status, msg) = Error::Validation(errors).to_client_status();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "\"name\" is required. \"uf\" is a required field");
    }

    #[test]
    fn test_not_found_mapping() {
        let e = Error::from_location_lookup(libecoleta::Error::DatabaseError(
            sqlx::Error::RowNotFound,
        ));
        assert!(matches!(e, Error::LocationNotFound));
        let e = Error::from_location_lookup(libecoleta::Error::InvalidUpdateObjectNotFound);
        assert!(matches!(e, Error::Libecoleta(_)));
    }
}
