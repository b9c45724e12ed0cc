use rocket::http::Status;
use rocket::response::{self, status, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::io;
use std::sync::PoisonError;

/// Per-field validation messages, mirrored on the wire as `{"fieldErrors": {...}}`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug)]
pub enum ApiError {
    Validation(FieldErrors),
    NotFound,
    Internal(String),
}

impl Error for ApiError {}
impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => write!(f, "Validation failed: {:?}", errors),
            ApiError::NotFound => write!(f, "Not found"),
            ApiError::Internal(what) => write!(f, "Internal error: {}", what),
        }
    }
}

impl<T> From<PoisonError<T>> for ApiError {
    fn from(e: PoisonError<T>) -> ApiError {
        ApiError::Internal(e.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> ApiError {
        match e {
            rusqlite::Error::QueryReturnedNoRows => ApiError::NotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<io::Error> for ApiError {
    fn from(e: io::Error) -> ApiError {
        ApiError::Internal(e.to_string())
    }
}

impl From<&str> for ApiError {
    fn from(s: &str) -> ApiError {
        ApiError::Internal(s.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ValidationBody {
    #[serde(rename = "fieldErrors")]
    field_errors: FieldErrors,
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        match self {
            ApiError::Validation(field_errors) => {
                let body = Json(ValidationBody { field_errors });
                status::Custom(Status::BadRequest, body).respond_to(request)
            }
            ApiError::NotFound => Err(Status::NotFound),
            ApiError::Internal(what) => {
                tracing::error!(error = %what, "request failed");
                Err(Status::InternalServerError)
            }
        }
    }
}
