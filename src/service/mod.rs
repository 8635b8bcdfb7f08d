//! Compute service
//!
//! Adapts named matrices to the ball solver and packages its result.

mod staging;

pub use staging::*;

use std::sync::Arc;
use crate::{BallOptions, Matrices, Matrix, ServiceError, solve_min_enclosing_ball};
use crate::protocol::{Request, Response};

/// Key of the point matrix in a request.
pub const KEY_INPUT: &str = "input";
/// Key of the radius in a response.
pub const KEY_RADIUS: &str = "radius";
/// Key of the center in a response.
pub const KEY_MIDPOINT: &str = "midpoint";
/// Key of the echoed points in a response.
pub const KEY_POINTS: &str = "points";

//

/// Request handler: takes named matrices and returns named matrices.
pub trait MatrixHandler: Send + Sync
{
    fn handle(&self, matrices: &Matrices) -> Result<Matrices, ServiceError>;
}

/// Minimum enclosing ball of the `input` points.
#[derive(Debug, Clone, Default)]
pub struct BallHandler
{
    options: BallOptions,
}

impl BallHandler
{
    pub fn new(options: BallOptions) -> Self
    {
        BallHandler {
            options,
        }
    }
}

impl MatrixHandler for BallHandler
{
    fn handle(&self, matrices: &Matrices) -> Result<Matrices, ServiceError>
    {
        let input = matrices.get(KEY_INPUT).ok_or_else(|| {
            ServiceError::MalformedRequest(format!("missing '{}' matrix", KEY_INPUT))
        })?;
        let points = input.to_points()?;

        log::info!("computing smallest enclosing ball of {} points of dimension {}", points.len(), points.dim());

        let ball = solve_min_enclosing_ball(&points, &self.options)?;

        log::debug!("radius {}, midpoint {:?}", ball.radius, ball.center);

        let mut out = Matrices::new();
        out.insert(KEY_RADIUS.into(), Matrix::scalar(ball.radius));
        out.insert(KEY_MIDPOINT.into(), Matrix::vector(ball.center));
        Ok(out)
    }
}

//

/// Compute service
///
/// Validates requests, runs a [`MatrixHandler`] and keeps staged uploads in a [`StagingStore`].
pub struct ComputeService<H: MatrixHandler = BallHandler>
{
    handler: H,
    staging: Arc<StagingStore>,
}

impl<H: MatrixHandler> ComputeService<H>
{
    /// Creates a service with its handler and staging store.
    pub fn new(handler: H, staging: Arc<StagingStore>) -> Self
    {
        ComputeService {
            handler,
            staging,
        }
    }

    /// Staging store of the service.
    pub fn staging(&self) -> &Arc<StagingStore>
    {
        &self.staging
    }

    /// Validates `matrices` and computes the result.
    ///
    /// Returns `Ok` with the handler output, plus the input points under `points` if `echo`,
    /// or `Err` with [`ServiceError`].
    /// Buffer and shape mismatches are rejected as [`ServiceError::MalformedRequest`],
    /// an input without points as [`ServiceError::InvalidInput`], both before the handler runs.
    pub fn handle_compute_request(&self, matrices: &Matrices, echo: bool) -> Result<Matrices, ServiceError>
    {
        log::debug!("matrices: {:?}", matrices.keys().collect::<Vec<_>>());

        let input = matrices.get(KEY_INPUT).ok_or_else(|| {
            ServiceError::MalformedRequest(format!("missing '{}' matrix", KEY_INPUT))
        })?;

        validate_all(matrices)?;

        match input.shape[..] {
            [0, _] => {
                return Err(ServiceError::InvalidInput("matrix has no points".into()));
            },
            [_, _] => {},
            _ => {
                return Err(ServiceError::MalformedRequest(format!(
                    "'{}' must be two-dimensional, got shape {:?}", KEY_INPUT, input.shape
                )));
            },
        }

        let mut out = self.handler.handle(matrices)?;

        if echo {
            out.insert(KEY_POINTS.into(), input.clone());
        }

        Ok(out)
    }

    /// Stages `matrices` under `command` for a later [`ComputeService::get`].
    pub fn put(&self, command: &str, matrices: Matrices) -> Result<(), ServiceError>
    {
        validate_all(&matrices)?;

        if self.staging.put(command, matrices) {
            log::debug!("replaced data for command: {}", command);
        }
        log::info!("data stored for command: {}", command);

        Ok(())
    }

    /// Takes the matrices staged under `command` and computes the result.
    pub fn get(&self, command: &str, echo: bool) -> Result<Matrices, ServiceError>
    {
        let matrices = self.staging.take(command)
                       .ok_or_else(|| ServiceError::NotFound(command.to_string()))?;

        log::info!("retrieved data for command: {}", command);

        self.handle_compute_request(&matrices, echo)
    }

    /// Serves one protocol request.
    ///
    /// Every failure is turned into [`Response::Error`].
    pub fn handle(&self, request: Request) -> Response
    {
        let rslt = match request {
            Request::Put {command, matrices} => {
                self.put(&command, matrices).map(|_| Response::Stored {command})
            },
            Request::Get {command, echo} => {
                self.get(&command, echo).map(|matrices| Response::Ok {matrices})
            },
            Request::Compute {matrices, echo} => {
                self.handle_compute_request(&matrices, echo).map(|matrices| Response::Ok {matrices})
            },
            Request::Ping => Ok(Response::Pong),
        };

        rslt.unwrap_or_else(|e| {
            log::warn!("request failed: {}", e);
            Response::from(e)
        })
    }
}

/// Checks every matrix, naming the offending one in the error.
fn validate_all(matrices: &Matrices) -> Result<(), ServiceError>
{
    for (name, m) in matrices {
        m.validate().map_err(|e| match e {
            ServiceError::MalformedRequest(msg) => {
                ServiceError::MalformedRequest(format!("matrix '{}': {}", name, msg))
            },
            e => e,
        })?;
    }

    Ok(())
}

//

#[cfg(test)]
fn service() -> ComputeService
{
    ComputeService::new(BallHandler::default(), Arc::new(StagingStore::new()))
}

#[cfg(test)]
fn request(data: Vec<f64>, shape: Vec<usize>) -> Matrices
{
    let mut m = Matrices::new();
    m.insert(KEY_INPUT.into(), Matrix {data, shape});
    m
}

#[test]
fn test_compute()
{
    use float_eq::assert_float_eq;

    let _ = env_logger::builder().is_test(true).try_init();

    let out = service().handle_compute_request(&request(vec![2., 4., 0., 0., 2.5, 2.], vec![3, 2]), false).unwrap();

    assert_eq!(out.len(), 2);
    assert_float_eq!(out[KEY_RADIUS].as_scalar().unwrap(), 5_f64.sqrt(), abs <= 1e-4);
    assert_eq!(out[KEY_MIDPOINT].shape, vec![2]);
    assert_float_eq!(out[KEY_MIDPOINT].data, vec![1., 2.], abs_all <= 1e-4);
}

#[test]
fn test_compute_echo()
{
    let req = request(vec![1., 1., 1.], vec![1, 3]);
    let out = service().handle_compute_request(&req, true).unwrap();

    assert_eq!(out[KEY_POINTS], req[KEY_INPUT]);
    assert_eq!(out[KEY_RADIUS].as_scalar(), Some(0.));
}

#[test]
fn test_compute_invalid()
{
    let s = service();

    let e = s.handle_compute_request(&request(vec![], vec![0, 2]), false).unwrap_err();
    assert!(matches!(e, ServiceError::InvalidInput(_)));

    let e = s.handle_compute_request(&request(vec![1., 2., 3.], vec![2, 2]), false).unwrap_err();
    assert_eq!(
        e.to_string(),
        "malformed request: matrix 'input': data length 3 does not match shape [2, 2] (4 elements)"
    );

    let e = s.put("BallServer", request(vec![1.], vec![3])).unwrap_err();
    assert_eq!(e.to_string().matches("malformed request").count(), 1);

    let e = s.handle_compute_request(&request(vec![1., 2.], vec![2]), false).unwrap_err();
    assert!(matches!(e, ServiceError::MalformedRequest(_)));

    let e = s.handle_compute_request(&Matrices::new(), false).unwrap_err();
    assert!(matches!(e, ServiceError::MalformedRequest(_)));
}

#[test]
fn test_put_get()
{
    let s = service();

    s.put("BallServer", request(vec![0., 0., 2., 0.], vec![2, 2])).unwrap();
    assert!(s.staging().contains("BallServer"));

    let out = s.get("BallServer", false).unwrap();
    assert!((out[KEY_RADIUS].as_scalar().unwrap() - 1.).abs() <= 1e-4);
    assert!(s.staging().is_empty());

    assert_eq!(s.get("BallServer", false), Err(ServiceError::NotFound("BallServer".into())));
}
