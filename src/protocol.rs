//! Wire messages, one JSON object per line.

use serde::{Deserialize, Serialize};
use crate::{ErrorKind, Matrices, ServiceError};

/// Request message, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request
{
    /// Stages matrices under a command key.
    Put
    {
        command: String,
        matrices: Matrices,
    },
    /// Takes the matrices staged under a command key and computes.
    Get
    {
        command: String,
        #[serde(default)]
        echo: bool,
    },
    /// Computes directly on the given matrices.
    Compute
    {
        matrices: Matrices,
        #[serde(default)]
        echo: bool,
    },
    Ping,
}

/// Response message, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response
{
    Stored
    {
        command: String,
    },
    Ok
    {
        matrices: Matrices,
    },
    Pong,
    Error
    {
        error_kind: ErrorKind,
        message: String,
    },
}

impl From<ServiceError> for Response
{
    fn from(e: ServiceError) -> Self
    {
        Response::Error {
            error_kind: e.kind(),
            message: e.to_string(),
        }
    }
}

//

#[test]
fn test_request_json()
{
    let req: Request = serde_json::from_str(
        r#"{"op":"compute","matrices":{"input":{"data":[1.0,2.0],"shape":[1,2]}}}"#
    ).unwrap();

    match &req {
        Request::Compute {matrices, echo} => {
            assert!(!*echo);
            assert_eq!(matrices["input"].shape, vec![1, 2]);
        },
        _ => panic!("unexpected request {:?}", req),
    }

    let req: Request = serde_json::from_str(r#"{"op":"get","command":"BallServer","echo":true}"#).unwrap();
    assert_eq!(req, Request::Get {command: "BallServer".into(), echo: true});

    let req: Request = serde_json::from_str(r#"{"op":"ping"}"#).unwrap();
    assert_eq!(req, Request::Ping);
}

#[test]
fn test_response_json()
{
    let resp = Response::from(ServiceError::NotFound("BallServer".into()));

    assert_eq!(
        serde_json::to_string(&resp).unwrap(),
        r#"{"status":"error","error_kind":"not_found","message":"no data found for command: BallServer"}"#
    );
    assert_eq!(serde_json::to_string(&Response::Pong).unwrap(), r#"{"status":"pong"}"#);
}
