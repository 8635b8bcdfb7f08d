use std::sync::Arc;
use float_eq::assert_float_eq;
use cvxball::*;
use cvxball::protocol::{Request, Response};
use cvxball::service::*;

//

fn service() -> ComputeService
{
    ComputeService::new(BallHandler::default(), Arc::new(StagingStore::new()))
}

fn input(data: Vec<f64>, shape: Vec<usize>) -> Matrices
{
    let mut m = Matrices::new();
    m.insert(KEY_INPUT.into(), Matrix {data, shape});
    m
}

fn error_kind(resp: &Response) -> Option<ErrorKind>
{
    match resp {
        Response::Error {error_kind, ..} => Some(*error_kind),
        _ => None,
    }
}

//

#[test]
fn test_shape_mismatch()
{
    let s = service();

    for (data, shape) in [
        (vec![1., 2., 3., 4., 5.], vec![2, 3]),
        (vec![1., 2., 3.], vec![1, 2]),
        (vec![], vec![1, 1]),
    ] {
        let resp = s.handle(Request::Compute {matrices: input(data, shape), echo: false});
        assert_eq!(error_kind(&resp), Some(ErrorKind::MalformedRequest));
    }

    let resp = s.handle(Request::Put {command: "BallServer".into(), matrices: input(vec![1.], vec![2, 2])});
    assert_eq!(error_kind(&resp), Some(ErrorKind::MalformedRequest));
    assert!(s.staging().is_empty());
}

#[test]
fn test_invalid_input()
{
    let s = service();

    let resp = s.handle(Request::Compute {matrices: input(vec![], vec![0, 3]), echo: false});
    assert_eq!(error_kind(&resp), Some(ErrorKind::InvalidInput));

    let resp = s.handle(Request::Compute {matrices: input(vec![], vec![2, 0]), echo: false});
    assert_eq!(error_kind(&resp), Some(ErrorKind::InvalidInput));

    let resp = s.handle(Request::Compute {matrices: input(vec![1., f64::NAN], vec![1, 2]), echo: false});
    assert_eq!(error_kind(&resp), Some(ErrorKind::InvalidInput));
}

#[test]
fn test_solve_failure()
{
    let options = BallOptions::new().par(|p| {
        p.max_iter = Some(1);
    });
    let s = ComputeService::new(BallHandler::new(options), Arc::new(StagingStore::new()));

    let resp = s.handle(Request::Compute {matrices: input(vec![2., 4., 0., 0., 2.5, 2.], vec![3, 2]), echo: false});
    assert_eq!(error_kind(&resp), Some(ErrorKind::SolveFailure));
}

#[test]
fn test_put_get()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let s = service();

    let resp = s.handle(Request::Put {command: "BallServer".into(), matrices: input(vec![2., 4., 0., 0., 2.5, 2.], vec![3, 2])});
    assert_eq!(resp, Response::Stored {command: "BallServer".into()});

    let resp = s.handle(Request::Get {command: "BallServer".into(), echo: true});
    match resp {
        Response::Ok {matrices} => {
            assert_float_eq!(matrices[KEY_RADIUS].as_scalar().unwrap(), 5_f64.sqrt(), abs <= 1e-4);
            assert_float_eq!(matrices[KEY_MIDPOINT].data, vec![1., 2.], abs_all <= 1e-4);
            assert_eq!(matrices[KEY_POINTS].shape, vec![3, 2]);
        },
        _ => panic!("unexpected response {:?}", resp),
    }

    let resp = s.handle(Request::Get {command: "BallServer".into(), echo: false});
    assert_eq!(error_kind(&resp), Some(ErrorKind::NotFound));
}

#[test]
fn test_independent_requests()
{
    let s = Arc::new(service());

    let handles: Vec<_> = (0.. 4).map(|i| {
        let s = Arc::clone(&s);
        std::thread::spawn(move || {
            let c = i as f64;
            let req = Request::Compute {matrices: input(vec![c, 0., c + 2., 0.], vec![2, 2]), echo: false};
            (c, s.handle(req))
        })
    }).collect();

    for h in handles {
        let (c, resp) = h.join().unwrap();
        match resp {
            Response::Ok {matrices} => {
                assert_float_eq!(matrices[KEY_RADIUS].as_scalar().unwrap(), 1., abs <= 1e-4);
                assert_float_eq!(matrices[KEY_MIDPOINT].data, vec![c + 1., 0.], abs_all <= 1e-4);
            },
            _ => panic!("unexpected response {:?}", resp),
        }
    }
}
