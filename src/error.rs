use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use totsu::prelude::SolverError;

//

/// Ball solver errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BallError
{
    /// Empty, zero-dimensional, ragged or non-finite point set.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The conic solver stopped without an optimal solution.
    #[error("solve failure: {0}")]
    SolveFailure(#[from] SolverError),
    /// The conic solver reported success with a non-finite solution.
    #[error("solve failure: non-finite solution")]
    NonFiniteSolution,
}

//

/// Stable error kinds reported in error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind
{
    InvalidInput,
    MalformedRequest,
    SolveFailure,
    SolveTimeout,
    NotFound,
}

/// Compute service errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError
{
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("solve failure: {0}")]
    SolveFailure(String),

    #[error("solve timed out after {0:?}")]
    SolveTimeout(Duration),

    #[error("no data found for command: {0}")]
    NotFound(String),
}

impl ServiceError
{
    /// Kind of the error as reported to callers.
    pub fn kind(&self) -> ErrorKind
    {
        match self {
            ServiceError::InvalidInput(_)     => ErrorKind::InvalidInput,
            ServiceError::MalformedRequest(_) => ErrorKind::MalformedRequest,
            ServiceError::SolveFailure(_)     => ErrorKind::SolveFailure,
            ServiceError::SolveTimeout(_)     => ErrorKind::SolveTimeout,
            ServiceError::NotFound(_)         => ErrorKind::NotFound,
        }
    }
}

impl From<BallError> for ServiceError
{
    fn from(e: BallError) -> Self
    {
        match e {
            BallError::InvalidInput(msg) => ServiceError::InvalidInput(msg),
            BallError::SolveFailure(status) => ServiceError::SolveFailure(status.to_string()),
            BallError::NonFiniteSolution => ServiceError::SolveFailure("non-finite solution".into()),
        }
    }
}

//

#[test]
fn test_error_kind()
{
    let e = ServiceError::from(BallError::SolveFailure(SolverError::Infeasible));

    assert_eq!(e.kind(), ErrorKind::SolveFailure);
    assert!(e.to_string().contains("Infeasible"));

    let e = ServiceError::from(BallError::InvalidInput("empty point set".into()));

    assert_eq!(e.kind(), ErrorKind::InvalidInput);
    assert_eq!(serde_json::to_string(&e.kind()).unwrap(), "\"invalid_input\"");
}
