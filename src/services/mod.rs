use thiserror::Error;

use crate::generator::GeneratorError;
use crate::repository::RepositoryError;

pub mod orchestrator;
pub mod products;
pub mod research;
pub mod rotation;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors returned by the use-case functions.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Repository(#[from] RepositoryError),
    #[error("invalid input: {0}")]
    Form(String),
    #[error("not found")]
    NotFound,
    #[error("text generation failed: {0}")]
    Generation(#[from] GeneratorError),
}
