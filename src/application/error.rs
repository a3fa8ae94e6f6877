// Errors returned by application services
use crate::application::telemetry_repository::FetchError;
use crate::domain::error::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(err.into())
    }
}
